//! Error types in linfa-hog
//!
use thiserror::Error;

pub type Result<T> = std::result::Result<T, HogError>;

#[derive(Error, Debug)]
pub enum HogError {
    #[error("detection window must be non-empty and divisible by the cell side {cell_side}, but is {width}x{height}")]
    InvalidWindow {
        width: u32,
        height: u32,
        cell_side: usize,
    },
    #[error("{0} must be positive")]
    ZeroParameter(&'static str),
    #[error("invalid HOG block layout: {0}")]
    InvalidLayout(String),
    #[error("C should be positive and finite, but is {0}")]
    InvalidC(f32),
    #[error("loss epsilon should be positive and finite, but is {0}")]
    InvalidLossEps(f32),
    #[error("solver epsilon should be positive and finite, but is {0}")]
    InvalidSolverEps(f32),
    #[error("pyramid scale should be finite and larger than one, but is {0}")]
    InvalidScale(f32),
    #[error("NMS threshold should be in range [0, 1], but is {0}")]
    InvalidNmsThreshold(f32),
    #[error("HOG computation failed: {0}")]
    Descriptor(String),
    #[error("expected descriptors of length {expected}, but got {found}")]
    DescriptorLength { expected: usize, found: usize },
    #[error("the training set contains no descriptors")]
    EmptyTrainingSet,
    #[error(transparent)]
    Svm(#[from] linfa_svm::SvmError),
    #[error(transparent)]
    LinfaError(#[from] linfa::error::Error),
}
