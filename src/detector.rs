//! Linear HOG detector
//!
//! A trained detector is the hyperplane `w` of the SVM together with its bias `b`. A window with
//! descriptor `x` scores `w·x + b`; positive scores indicate the object. The flat layout
//! `[w_0, .., w_{n-1}, b]` is what sliding-window HOG implementations expect as detector.
use crate::descriptor::to_gray;
use crate::error::{HogError, Result};
use crate::hyperparams::{DetectionValidParams, HogSvmParams, HogValidParams};
use crate::nms::{non_max_suppression, Detection};

use image::imageops::{self, FilterType};
use image::{DynamicImage, GrayImage};
use linfa::traits::PredictInplace;
use log::debug;
use ndarray::{Array1, ArrayBase, Data, Ix1, Ix2};

#[cfg(feature = "serde")]
use serde_crate::{Deserialize, Serialize};

/// Fitted linear detector
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde_crate")
)]
#[derive(Debug, Clone, PartialEq)]
pub struct HogDetector {
    coefficients: Array1<f32>,
    bias: f32,
    hog: HogValidParams,
}

impl HogDetector {
    /// Create default training hyperparameters, see [`HogSvmParams`]
    pub fn params() -> HogSvmParams {
        HogSvmParams::new()
    }

    pub(crate) fn new(coefficients: Array1<f32>, bias: f32, hog: HogValidParams) -> Self {
        HogDetector {
            coefficients,
            bias,
            hog,
        }
    }

    /// Rebuild a detector from its flat representation
    ///
    /// The vector must hold one coefficient per descriptor entry followed by the bias.
    pub fn from_vec(mut detector: Vec<f32>, hog: HogValidParams) -> Result<Self> {
        let expected = hog.descriptor_len() + 1;
        if detector.len() != expected {
            return Err(HogError::DescriptorLength {
                expected,
                found: detector.len(),
            });
        }

        let bias = detector.pop().unwrap_or_default();
        Ok(HogDetector::new(Array1::from(detector), bias, hog))
    }

    /// Flat representation, the coefficients followed by the bias
    pub fn to_vec(&self) -> Vec<f32> {
        let mut detector = Vec::with_capacity(self.coefficients.len() + 1);
        detector.extend(self.coefficients.iter());
        detector.push(self.bias);
        detector
    }

    /// Normal of the separating hyperplane
    pub fn coefficients(&self) -> &Array1<f32> {
        &self.coefficients
    }

    pub fn bias(&self) -> f32 {
        self.bias
    }

    /// Descriptor layout the detector was trained on
    pub fn hog_params(&self) -> &HogValidParams {
        &self.hog
    }

    /// Score of a single window descriptor
    ///
    /// ## Panics
    ///
    /// If the descriptor length differs from the number of coefficients
    pub fn score<D: Data<Elem = f32>>(&self, descriptor: &ArrayBase<D, Ix1>) -> f32 {
        self.coefficients.dot(descriptor) + self.bias
    }

    /// Slide the window over the image at its original size
    ///
    /// All windows scoring above the hit threshold are returned, without merging overlaps.
    pub fn detect(
        &self,
        image: &DynamicImage,
        params: &DetectionValidParams,
    ) -> Result<Vec<Detection>> {
        self.scan(&to_gray(image), (1.0, 1.0), params)
    }

    /// Slide the window over an image pyramid
    ///
    /// The image is shrunk by the pyramid scale until it no longer holds a window or the level
    /// limit is reached. Hits are mapped back to source pixels and overlapping hits merged.
    pub fn detect_multi_scale(
        &self,
        image: &DynamicImage,
        params: &DetectionValidParams,
    ) -> Result<Vec<Detection>> {
        let gray = to_gray(image);
        let (win_width, win_height) = self.hog.window();

        let mut hits = Vec::new();
        let mut factor = 1.0f32;
        for level in 0..params.max_levels() {
            let width = (gray.width() as f32 / factor).round() as u32;
            let height = (gray.height() as f32 / factor).round() as u32;
            if width < win_width || height < win_height {
                break;
            }

            let level_hits = if level == 0 {
                self.scan(&gray, (1.0, 1.0), params)?
            } else {
                let resized = imageops::resize(&gray, width, height, FilterType::Triangle);
                let ratio = (
                    gray.width() as f32 / width as f32,
                    gray.height() as f32 / height as f32,
                );
                self.scan(&resized, ratio, params)?
            };
            debug!(
                "pyramid level {} ({}x{}): {} hits",
                level,
                width,
                height,
                level_hits.len()
            );

            hits.extend(level_hits);
            factor *= params.scale();
        }

        Ok(non_max_suppression(hits, params.nms_threshold()))
    }

    fn scan(
        &self,
        gray: &GrayImage,
        ratio: (f32, f32),
        params: &DetectionValidParams,
    ) -> Result<Vec<Detection>> {
        let (win_width, win_height) = self.hog.window();
        if gray.width() < win_width || gray.height() < win_height {
            return Ok(Vec::new());
        }

        let (stride_x, stride_y) = params.win_stride();
        let mut hits = Vec::new();
        for y in (0..=gray.height() - win_height).step_by(stride_y as usize) {
            for x in (0..=gray.width() - win_width).step_by(stride_x as usize) {
                let window = imageops::crop_imm(gray, x, y, win_width, win_height).to_image();
                let score = self.score(&self.hog.describe(&window)?);
                if score > params.hit_threshold() {
                    hits.push(Detection {
                        x: x as f32 * ratio.0,
                        y: y as f32 * ratio.1,
                        width: win_width as f32 * ratio.0,
                        height: win_height as f32 * ratio.1,
                        score,
                    });
                }
            }
        }

        Ok(hits)
    }
}

impl<D: Data<Elem = f32>> PredictInplace<ArrayBase<D, Ix2>, Array1<f32>> for HogDetector {
    /// Score descriptor rows of shape `(n_samples, descriptor_len)`
    fn predict_inplace(&self, x: &ArrayBase<D, Ix2>, y: &mut Array1<f32>) {
        assert_eq!(
            x.nrows(),
            y.len(),
            "The number of data points must match the number of output targets."
        );
        assert_eq!(
            x.ncols(),
            self.coefficients.len(),
            "Number of data features must match the number of features the detector was trained on."
        );

        *y = x.dot(&self.coefficients) + self.bias;
    }

    fn default_target(&self, x: &ArrayBase<D, Ix2>) -> Array1<f32> {
        Array1::zeros(x.nrows())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::nms::iou;
    use crate::{DetectionParams, HogParams};
    use approx::assert_abs_diff_eq;
    use image::Luma;
    use linfa::traits::Predict;
    use linfa::ParamGuard;
    use ndarray::{array, Array2};

    fn tiny() -> HogValidParams {
        HogParams::new()
            .window(8, 8)
            .cell_side(4)
            .block_side(1)
            .block_stride(1)
            .orientations(2)
            .check()
            .unwrap()
    }

    fn small_hog() -> HogParams {
        HogParams::new()
            .window(16, 16)
            .cell_side(4)
            .block_side(2)
            .block_stride(1)
    }

    fn stripes(vertical: bool) -> GrayImage {
        GrayImage::from_fn(16, 16, |x, y| {
            let t = if vertical { x } else { y };
            if t % 4 < 2 {
                Luma([40])
            } else {
                Luma([210])
            }
        })
    }

    fn accept_all(hog: HogValidParams) -> HogDetector {
        HogDetector::new(Array1::zeros(hog.descriptor_len()), 1.0, hog)
    }

    #[test]
    fn flat_layout() {
        let hog = tiny();
        let flat: Vec<f32> = (0..9).map(|i| i as f32).collect();
        let detector = HogDetector::from_vec(flat.clone(), hog).unwrap();
        assert_eq!(detector.coefficients().len(), 8);
        assert_abs_diff_eq!(detector.bias(), 8.);
        assert_eq!(detector.to_vec(), flat);
        assert_eq!(detector.hog_params(), &hog);

        let res = HogDetector::from_vec(vec![0.; 8], hog);
        assert!(matches!(
            res,
            Err(HogError::DescriptorLength {
                expected: 9,
                found: 8
            })
        ));
    }

    #[test]
    fn scores_are_affine() {
        let detector = HogDetector::new(array![1., -2., 0.5], 0.25, tiny());
        let window: Array1<f32> = array![1., 1., 2.];
        assert_abs_diff_eq!(detector.score(&window), 0.25);

        let records: Array2<f32> = array![[1., 1., 2.], [0., 0., 0.], [2., 0., 0.]];
        let scores = detector.predict(&records);
        assert_abs_diff_eq!(scores, array![0.25, 0.25, 2.25]);
    }

    #[test]
    fn window_positions() {
        let hog = small_hog().check().unwrap();
        let detector = accept_all(hog);
        let image = DynamicImage::ImageLuma8(GrayImage::new(32, 24));
        let params = DetectionParams::new().win_stride(8, 4).check().unwrap();

        let hits = detector.detect(&image, &params).unwrap();
        // x in {0, 8, 16}, y in {0, 4, 8}
        assert_eq!(hits.len(), 9);
        assert!(hits.iter().all(|d| d.width == 16. && d.height == 16.));
        assert!(hits.iter().any(|d| d.x == 16. && d.y == 8.));

        let small = DynamicImage::ImageLuma8(GrayImage::new(15, 40));
        assert!(detector.detect(&small, &params).unwrap().is_empty());
    }

    #[test]
    fn only_scores_above_threshold_are_hits() {
        let hog = small_hog().check().unwrap();
        let image = DynamicImage::ImageLuma8(GrayImage::new(32, 24));
        let stride = DetectionParams::new().win_stride(8, 4);

        // every window scores exactly the bias
        let detector = HogDetector::new(Array1::zeros(hog.descriptor_len()), 0.5, hog);
        let at_score = stride.clone().hit_threshold(0.5).check().unwrap();
        assert!(detector.detect(&image, &at_score).unwrap().is_empty());
        let multi = detector.detect_multi_scale(&image, &at_score).unwrap();
        assert!(multi.is_empty());

        let below = stride.clone().hit_threshold(0.25).check().unwrap();
        let hits = detector.detect(&image, &below).unwrap();
        assert_eq!(hits.len(), 9);
        assert!(hits.iter().all(|d| d.score == 0.5));

        let rejecting = HogDetector::new(Array1::zeros(hog.descriptor_len()), -0.5, hog);
        assert!(rejecting.detect(&image, &below).unwrap().is_empty());
        let negative = stride.hit_threshold(-1.0).check().unwrap();
        assert_eq!(rejecting.detect(&image, &negative).unwrap().len(), 9);
    }

    #[test]
    fn pyramid_maps_back_to_source() {
        let hog = small_hog().check().unwrap();
        let detector = accept_all(hog);
        let image = DynamicImage::ImageLuma8(GrayImage::new(32, 32));
        let params = DetectionParams::new()
            .win_stride(8, 8)
            .scale(2.0)
            .max_levels(5)
            .nms_threshold(1.0)
            .check()
            .unwrap();

        let hits = detector.detect_multi_scale(&image, &params).unwrap();
        // 9 windows at full size and a single one at half size
        assert_eq!(hits.len(), 10);
        let large: Vec<_> = hits.iter().filter(|d| d.width > 16.).collect();
        assert_eq!(large.len(), 1);
        assert_abs_diff_eq!(large[0].width, 32.);
        assert_abs_diff_eq!(large[0].height, 32.);

        let one_level = DetectionParams::new()
            .win_stride(8, 8)
            .max_levels(1)
            .nms_threshold(1.0)
            .check()
            .unwrap();
        let hits = detector.detect_multi_scale(&image, &one_level).unwrap();
        assert_eq!(hits.len(), 9);
    }

    #[test]
    fn finds_trained_pattern() {
        let positives = vec![DynamicImage::ImageLuma8(stripes(true)); 4];
        let negatives = vec![DynamicImage::ImageLuma8(stripes(false)); 4];
        let detector = HogDetector::params()
            .hog(small_hog())
            .c(1.0)
            .check()
            .unwrap()
            .fit_images(&positives, &negatives)
            .unwrap();

        // horizontal stripes with a patch of vertical ones at (24, 8)
        let patch = stripes(true);
        let scene = GrayImage::from_fn(64, 32, |x, y| {
            if (24..40).contains(&x) && (8..24).contains(&y) {
                *patch.get_pixel(x - 24, y - 8)
            } else if y % 4 < 2 {
                Luma([40])
            } else {
                Luma([210])
            }
        });
        let scene = DynamicImage::ImageLuma8(scene);

        let params = DetectionParams::new()
            .win_stride(4, 4)
            .max_levels(1)
            .check()
            .unwrap();
        let patch_box = Detection {
            x: 24.,
            y: 8.,
            width: 16.,
            height: 16.,
            score: 0.,
        };

        let hits = detector.detect(&scene, &params).unwrap();
        assert!(hits.iter().any(|d| d.x == 24. && d.y == 8.));
        assert!(hits.iter().all(|d| iou(d, &patch_box) > 0.));

        let merged = detector.detect_multi_scale(&scene, &params).unwrap();
        assert!(!merged.is_empty());
        assert!(merged.len() <= hits.len());
        assert!(merged.iter().all(|d| iou(d, &patch_box) > 0.));

        let background = DynamicImage::ImageLuma8(GrayImage::from_fn(64, 32, |_, y| {
            if y % 4 < 2 {
                Luma([40])
            } else {
                Luma([210])
            }
        }));
        assert!(detector.detect(&background, &params).unwrap().is_empty());
    }
}
