use crate::error::{HogError, Result};
use imageproc::hog::{HogOptions, HogSpec};
use linfa::ParamGuard;

#[cfg(feature = "serde")]
use serde_crate::{Deserialize, Serialize};

/// A verified HOG descriptor layout
///
/// See [`HogParams`] for more information.
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde_crate")
)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HogValidParams {
    window: (u32, u32),
    cell_side: usize,
    block_side: usize,
    block_stride: usize,
    orientations: usize,
    signed: bool,
    flip: bool,
}

impl HogValidParams {
    /// Detection window as `(width, height)` in pixels
    pub fn window(&self) -> (u32, u32) {
        self.window
    }

    pub fn cell_side(&self) -> usize {
        self.cell_side
    }

    pub fn block_side(&self) -> usize {
        self.block_side
    }

    pub fn block_stride(&self) -> usize {
        self.block_stride
    }

    pub fn orientations(&self) -> usize {
        self.orientations
    }

    pub fn signed(&self) -> bool {
        self.signed
    }

    pub fn flip(&self) -> bool {
        self.flip
    }

    /// Length of a single window descriptor
    ///
    /// Every block contributes `block_side^2 * orientations` values and blocks are placed every
    /// `block_stride` cells along both axes.
    pub fn descriptor_len(&self) -> usize {
        let cells_wide = self.window.0 as usize / self.cell_side;
        let cells_high = self.window.1 as usize / self.cell_side;
        let blocks_wide = (cells_wide - self.block_side) / self.block_stride + 1;
        let blocks_high = (cells_high - self.block_side) / self.block_stride + 1;

        blocks_wide * blocks_high * self.block_side * self.block_side * self.orientations
    }

    pub(crate) fn hog_options(&self) -> HogOptions {
        HogOptions::new(
            self.orientations,
            self.signed,
            self.cell_side,
            self.block_side,
            self.block_stride,
        )
    }
}

/// HOG descriptor layout
///
/// The defaults describe a pedestrian-sized window of 64x128 pixels split into 4x4 cells, with
/// blocks of 4x4 cells placed every 2 cells and 9 unsigned orientation bins. Every training
/// image is additionally mirrored horizontally.
///
/// ```
/// use linfa::ParamGuard;
/// use linfa_hog::HogParams;
///
/// let params = HogParams::new()
///     .window(32, 64)
///     .cell_side(8)
///     .block_side(2)
///     .block_stride(1)
///     .check()
///     .unwrap();
/// assert_eq!(params.descriptor_len(), 3 * 7 * 2 * 2 * 9);
/// ```
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde_crate")
)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HogParams(pub(crate) HogValidParams);

impl Default for HogParams {
    fn default() -> Self {
        Self::new()
    }
}

impl HogParams {
    pub fn new() -> Self {
        Self(HogValidParams {
            window: (64, 128),
            cell_side: 4,
            block_side: 4,
            block_stride: 2,
            orientations: 9,
            signed: false,
            flip: true,
        })
    }

    /// Set the detection window in pixels
    ///
    /// Both sides have to be a multiple of the cell side.
    pub fn window(mut self, width: u32, height: u32) -> Self {
        self.0.window = (width, height);
        self
    }

    /// Set the side length of a square cell in pixels
    pub fn cell_side(mut self, cell_side: usize) -> Self {
        self.0.cell_side = cell_side;
        self
    }

    /// Set the side length of a square block in cells
    pub fn block_side(mut self, block_side: usize) -> Self {
        self.0.block_side = block_side;
        self
    }

    /// Set the offset between neighbouring blocks in cells
    pub fn block_stride(mut self, block_stride: usize) -> Self {
        self.0.block_stride = block_stride;
        self
    }

    /// Set the number of orientation bins per cell histogram
    pub fn orientations(mut self, orientations: usize) -> Self {
        self.0.orientations = orientations;
        self
    }

    /// Distinguish gradients pointing in opposite directions
    pub fn signed(mut self, signed: bool) -> Self {
        self.0.signed = signed;
        self
    }

    /// Add the horizontally mirrored window of every training image
    pub fn flip(mut self, flip: bool) -> Self {
        self.0.flip = flip;
        self
    }
}

impl ParamGuard for HogParams {
    type Checked = HogValidParams;
    type Error = HogError;

    fn check_ref(&self) -> Result<&Self::Checked> {
        let p = &self.0;
        if p.cell_side == 0 {
            return Err(HogError::ZeroParameter("cell side"));
        }
        if p.block_side == 0 {
            return Err(HogError::ZeroParameter("block side"));
        }
        if p.block_stride == 0 {
            return Err(HogError::ZeroParameter("block stride"));
        }
        if p.orientations == 0 {
            return Err(HogError::ZeroParameter("number of orientations"));
        }

        let (width, height) = p.window;
        if width == 0
            || height == 0
            || width as usize % p.cell_side != 0
            || height as usize % p.cell_side != 0
        {
            return Err(HogError::InvalidWindow {
                width,
                height,
                cell_side: p.cell_side,
            });
        }

        let cells = (width as usize / p.cell_side, height as usize / p.cell_side);
        if p.block_side > cells.0 || p.block_side > cells.1 {
            return Err(HogError::InvalidLayout(format!(
                "block of {} cells does not fit into {}x{} cells",
                p.block_side, cells.0, cells.1
            )));
        }

        HogSpec::from_options(width, height, p.hog_options()).map_err(HogError::InvalidLayout)?;

        Ok(&self.0)
    }

    fn check(self) -> Result<Self::Checked> {
        self.check_ref()?;
        Ok(self.0)
    }
}

/// A verified hyper-parameter set ready for training a HOG detector
///
/// See [`HogSvmParams`] for more information.
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde_crate")
)]
#[derive(Debug, Clone, PartialEq)]
pub struct HogSvmValidParams {
    pub(crate) hog: HogValidParams,
    pub(crate) c: f32,
    pub(crate) loss_eps: f32,
    pub(crate) solver_eps: f32,
    pub(crate) shrinking: bool,
}

impl HogSvmValidParams {
    pub fn hog_params(&self) -> &HogValidParams {
        &self.hog
    }

    pub fn c(&self) -> f32 {
        self.c
    }

    pub fn loss_eps(&self) -> f32 {
        self.loss_eps
    }

    pub fn solver_eps(&self) -> f32 {
        self.solver_eps
    }

    pub fn shrinking(&self) -> bool {
        self.shrinking
    }
}

/// Detector training hyperparameters
///
/// The detector is an epsilon support vector regression with a linear kernel, fitted on the
/// labels `+1` (object) and `-1` (background). The defaults are a soft margin with `C = 0.01`, a
/// loss tube of `0.1` and a solver threshold of `1e-3`.
///
/// ```
/// use linfa::ParamGuard;
/// use linfa_hog::{HogDetector, HogParams};
///
/// let params = HogDetector::params()
///     .hog(HogParams::new().window(48, 96))
///     .c(0.1)
///     .loss_eps(0.05)
///     .check()
///     .unwrap();
/// assert_eq!(params.hog_params().window(), (48, 96));
/// ```
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde_crate")
)]
#[derive(Debug, Clone, PartialEq)]
pub struct HogSvmParams(pub(crate) HogSvmValidParams);

impl Default for HogSvmParams {
    fn default() -> Self {
        Self::new()
    }
}

impl HogSvmParams {
    pub fn new() -> Self {
        Self(HogSvmValidParams {
            hog: HogParams::new().0,
            c: 0.01,
            loss_eps: 0.1,
            solver_eps: 1e-3,
            shrinking: false,
        })
    }

    /// Set the descriptor layout
    pub fn hog(mut self, hog: HogParams) -> Self {
        self.0.hog = hog.0;
        self
    }

    /// Set the penalty of samples outside the loss tube
    ///
    /// Small values give a soft margin. `c` must be positive and finite.
    pub fn c(mut self, c: f32) -> Self {
        self.0.c = c;
        self
    }

    /// Set the width of the loss tube, in which deviations from the label are not penalized
    ///
    /// `loss_eps` must be positive and finite.
    pub fn loss_eps(mut self, loss_eps: f32) -> Self {
        self.0.loss_eps = loss_eps;
        self
    }

    /// Set the stopping condition of the SMO solver
    ///
    /// The optimization stops when the gradient sum of the maximal violating pair drops below
    /// this threshold.
    pub fn solver_eps(mut self, solver_eps: f32) -> Self {
        self.0.solver_eps = solver_eps;
        self
    }

    /// Shrink the active variable set during optimization
    pub fn shrinking(mut self, shrinking: bool) -> Self {
        self.0.shrinking = shrinking;
        self
    }
}

impl ParamGuard for HogSvmParams {
    type Checked = HogSvmValidParams;
    type Error = HogError;

    fn check_ref(&self) -> Result<&Self::Checked> {
        HogParams(self.0.hog).check_ref()?;

        if !self.0.c.is_finite() || self.0.c <= 0.0 {
            Err(HogError::InvalidC(self.0.c))
        } else if !self.0.loss_eps.is_finite() || self.0.loss_eps <= 0.0 {
            Err(HogError::InvalidLossEps(self.0.loss_eps))
        } else if !self.0.solver_eps.is_finite() || self.0.solver_eps <= 0.0 {
            Err(HogError::InvalidSolverEps(self.0.solver_eps))
        } else {
            Ok(&self.0)
        }
    }

    fn check(self) -> Result<Self::Checked> {
        self.check_ref()?;
        Ok(self.0)
    }
}

/// A verified sliding-window search configuration
///
/// See [`DetectionParams`] for more information.
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde_crate")
)]
#[derive(Debug, Clone, PartialEq)]
pub struct DetectionValidParams {
    win_stride: (u32, u32),
    hit_threshold: f32,
    scale: f32,
    max_levels: usize,
    nms_threshold: f32,
}

impl DetectionValidParams {
    pub fn win_stride(&self) -> (u32, u32) {
        self.win_stride
    }

    pub fn hit_threshold(&self) -> f32 {
        self.hit_threshold
    }

    pub fn scale(&self) -> f32 {
        self.scale
    }

    pub fn max_levels(&self) -> usize {
        self.max_levels
    }

    pub fn nms_threshold(&self) -> f32 {
        self.nms_threshold
    }
}

/// Sliding-window search hyperparameters
///
/// Windows are placed every `win_stride` pixels and reported when their score exceeds
/// `hit_threshold`. The multi-scale search shrinks the image by `scale` per pyramid level, for at
/// most `max_levels` levels, and merges overlapping hits whose intersection over union is above
/// `nms_threshold`.
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde_crate")
)]
#[derive(Debug, Clone, PartialEq)]
pub struct DetectionParams(DetectionValidParams);

impl Default for DetectionParams {
    fn default() -> Self {
        Self::new()
    }
}

impl DetectionParams {
    pub fn new() -> Self {
        Self(DetectionValidParams {
            win_stride: (8, 8),
            hit_threshold: 0.0,
            scale: 1.05,
            max_levels: 64,
            nms_threshold: 0.3,
        })
    }

    pub fn win_stride(mut self, x: u32, y: u32) -> Self {
        self.0.win_stride = (x, y);
        self
    }

    pub fn hit_threshold(mut self, hit_threshold: f32) -> Self {
        self.0.hit_threshold = hit_threshold;
        self
    }

    pub fn scale(mut self, scale: f32) -> Self {
        self.0.scale = scale;
        self
    }

    pub fn max_levels(mut self, max_levels: usize) -> Self {
        self.0.max_levels = max_levels;
        self
    }

    pub fn nms_threshold(mut self, nms_threshold: f32) -> Self {
        self.0.nms_threshold = nms_threshold;
        self
    }
}

impl ParamGuard for DetectionParams {
    type Checked = DetectionValidParams;
    type Error = HogError;

    fn check_ref(&self) -> Result<&Self::Checked> {
        if self.0.win_stride.0 == 0 || self.0.win_stride.1 == 0 {
            Err(HogError::ZeroParameter("window stride"))
        } else if self.0.max_levels == 0 {
            Err(HogError::ZeroParameter("number of pyramid levels"))
        } else if !self.0.scale.is_finite() || self.0.scale <= 1.0 {
            Err(HogError::InvalidScale(self.0.scale))
        } else if !(0.0..=1.0).contains(&self.0.nms_threshold) {
            Err(HogError::InvalidNmsThreshold(self.0.nms_threshold))
        } else {
            Ok(&self.0)
        }
    }

    fn check(self) -> Result<Self::Checked> {
        self.check_ref()?;
        Ok(self.0)
    }
}
