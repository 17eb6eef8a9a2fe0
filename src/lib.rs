//! # HOG detectors
//!
//! `linfa-hog` trains sliding-window object detectors in the style of Dalal and Triggs: every
//! training image is described by a Histogram of Oriented Gradients, the descriptors are
//! labelled `+1` for the object and `-1` for background, and a linear support vector machine is
//! fitted on them. The normal of its separating hyperplane together with the bias forms the
//! detector.
//!
//! ## The Big Picture
//!
//! `linfa-hog` is a crate in the [`linfa`](https://crates.io/crates/linfa) ecosystem, an effort to
//! create a toolkit for classical Machine Learning implemented in pure Rust, akin to Python's
//! `scikit-learn`.
//!
//! ## Current state
//!
//! Neither the descriptor nor the solver are implemented here. The gradient histograms and block
//! normalization are computed by [`imageproc::hog`], the optimization is done by the SMO solver of
//! [`linfa_svm`]. This crate provides
//!
//! * the descriptor layout and solver configuration with [`HogParams`] and [`HogSvmParams`],
//! * the extraction of descriptors from images including their horizontal mirror,
//! * the assembly of descriptors into a training matrix with [`TrainingSet`],
//! * the extraction of the flat detector `[w_0, .., w_{n-1}, b]` as [`HogDetector`],
//! * a single- and multi-scale sliding-window search with non-maximum suppression.
//!
//! ## Example
//!
//! ```no_run
//! use linfa::ParamGuard;
//! use linfa_hog::{DetectionParams, HogDetector};
//!
//! # fn main() -> linfa_hog::Result<()> {
//! # let (positives, negatives, scene) = (vec![], vec![], image::DynamicImage::new_luma8(64, 128));
//! let detector = HogDetector::params()
//!     .c(0.01)
//!     .check()?
//!     .fit_images(&positives, &negatives)?;
//!
//! // coefficients followed by the bias
//! let flat: Vec<f32> = detector.to_vec();
//!
//! let hits = detector.detect_multi_scale(&scene, &DetectionParams::new().check()?)?;
//! # Ok(())
//! # }
//! ```
//!
//! There is a runnable demo in the `demos/` directory:
//!
//! ```bash
//! $ cargo run --release --example train_detector
//! ```
mod descriptor;
mod detector;
pub mod error;
mod hyperparams;
pub mod nms;
mod samples;
mod trainer;

pub use descriptor::to_gray;
pub use detector::HogDetector;
pub use error::{HogError, Result};
pub use hyperparams::{
    DetectionParams, DetectionValidParams, HogParams, HogSvmParams, HogSvmValidParams,
    HogValidParams,
};
pub use nms::{non_max_suppression, Detection};
pub use samples::{TrainingSet, NEGATIVE, POSITIVE};
