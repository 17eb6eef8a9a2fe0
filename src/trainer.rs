//! Fitting the linear SVM and extracting its hyperplane
use crate::detector::HogDetector;
use crate::error::{HogError, Result};
use crate::hyperparams::HogSvmValidParams;
use crate::samples::TrainingSet;

use image::DynamicImage;
use linfa::dataset::{AsSingleTargets, DatasetBase};
use linfa::traits::Fit;
use linfa::Dataset;
use linfa_svm::Svm;
use log::{info, warn};
use ndarray::{Array1, ArrayBase, Data, Ix2};

impl<D, T> Fit<ArrayBase<D, Ix2>, T, HogError> for HogSvmValidParams
where
    D: Data<Elem = f32>,
    T: AsSingleTargets<Elem = f32>,
{
    type Object = HogDetector;

    /// Fit a linear epsilon support vector regression on HOG descriptors
    ///
    /// The records must have shape `(n_samples, descriptor_len)` and the targets shape
    /// `(n_samples)`, usually `+1` for the object and `-1` for background.
    fn fit(&self, dataset: &DatasetBase<ArrayBase<D, Ix2>, T>) -> Result<Self::Object> {
        let records = dataset.records();
        let (nsamples, nfeatures) = records.dim();
        if nsamples == 0 {
            return Err(HogError::EmptyTrainingSet);
        }
        if nfeatures != self.hog.descriptor_len() {
            return Err(HogError::DescriptorLength {
                expected: self.hog.descriptor_len(),
                found: nfeatures,
            });
        }

        let targets = dataset.as_single_targets().to_owned();
        if targets.iter().all(|t| *t == targets[0]) {
            warn!(
                "all {} descriptors share the label {}",
                nsamples, targets[0]
            );
        }

        let dataset = Dataset::new(records.to_owned(), targets);
        let svm_params = Svm::<f32, f32>::params()
            .c_svr(self.c, Some(self.loss_eps))
            .eps(self.solver_eps)
            .shrinking(self.shrinking)
            .linear_kernel();
        let model: Svm<f32, f32> = svm_params.fit(&dataset).map_err(HogError::from)?;

        info!(
            "fitted detector on {} descriptors of length {}: {}",
            nsamples, nfeatures, model
        );

        Ok(HogDetector::new(
            hyperplane(&model, nfeatures),
            -model.rho,
            self.hog,
        ))
    }
}

/// Coefficients of a linear-kernel model
///
/// The weighted sum of a linear kernel is linear in the sample, so its value at the unit vector
/// `e_j` is coefficient `j` of the hyperplane normal. `Svm` keeps the normal only implicitly as
/// support vectors and their weights.
///
/// Every evaluation allocates a product of length `nfeatures`, which makes the extraction
/// quadratic in the descriptor length (about 2.3e8 multiplies for the default layout). It runs
/// once per fit and is dominated by the solver.
fn hyperplane(model: &Svm<f32, f32>, nfeatures: usize) -> Array1<f32> {
    let mut unit = Array1::zeros(nfeatures);
    let mut coefficients = Array1::zeros(nfeatures);
    for j in 0..nfeatures {
        unit[j] = 1.0;
        coefficients[j] = model.weighted_sum(&unit);
        unit[j] = 0.0;
    }

    coefficients
}

impl HogSvmValidParams {
    /// Train a detector on object and background images
    ///
    /// Every image at least as large as the window is center-cropped, described and, if enabled,
    /// mirrored. Positive images are labelled `+1`, negative images `-1`.
    pub fn fit_images(
        &self,
        positives: &[DynamicImage],
        negatives: &[DynamicImage],
    ) -> Result<HogDetector> {
        let mut set = TrainingSet::new(self.hog);
        let npos = set.add_positives(positives)?;
        let nneg = set.add_negatives(negatives)?;
        info!(
            "extracted {} positive and {} negative descriptors",
            npos, nneg
        );

        self.fit(&set.into_dataset()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::samples::{NEGATIVE, POSITIVE};
    use crate::HogParams;
    use approx::assert_abs_diff_eq;
    use image::{GrayImage, Luma};
    use linfa::traits::Predict;
    use linfa::ParamGuard;
    use ndarray::{array, Array2};
    use rand::rngs::SmallRng;
    use rand::{Rng, SeedableRng};

    fn small_hog() -> HogParams {
        HogParams::new()
            .window(16, 16)
            .cell_side(4)
            .block_side(2)
            .block_stride(1)
    }

    /// vertical stripes with a random phase and noise
    fn stripes(rng: &mut SmallRng, vertical: bool) -> DynamicImage {
        let phase: u32 = rng.gen_range(0..4);
        let image = GrayImage::from_fn(16, 16, |x, y| {
            let t = if vertical { x } else { y };
            let base = if (t + phase) % 4 < 2 { 40 } else { 210 };
            let noise: i16 = rng.gen_range(-10..10);
            Luma([(base + noise) as u8])
        });
        DynamicImage::ImageLuma8(image)
    }

    #[test]
    fn recovers_linear_relation() {
        // 1-d records with descriptor length 1
        let hog = HogParams::new()
            .window(4, 4)
            .cell_side(4)
            .block_side(1)
            .block_stride(1)
            .orientations(1);
        let records = Array2::from_shape_fn((40, 1), |(i, _)| i as f32 / 10.);
        let targets = records.column(0).mapv(|x| 2. * x - 1.);
        let dataset = Dataset::new(records, targets);

        let detector = HogDetector::params()
            .hog(hog)
            .c(100.)
            .loss_eps(0.01)
            .fit(&dataset)
            .unwrap();

        assert_abs_diff_eq!(detector.coefficients(), &array![2.], epsilon = 0.05);
        assert_abs_diff_eq!(detector.bias(), -1., epsilon = 0.05);
    }

    #[test]
    fn detector_matches_svm_decision() {
        let hog = small_hog().check().unwrap();
        let mut rng = SmallRng::seed_from_u64(42);
        let mut set = TrainingSet::new(hog);
        for _ in 0..10 {
            set.add_images(&[stripes(&mut rng, true)], POSITIVE)
                .unwrap();
            set.add_images(&[stripes(&mut rng, false)], NEGATIVE)
                .unwrap();
        }
        let dataset = set.into_dataset().unwrap();

        let params = HogDetector::params()
            .hog(small_hog())
            .c(1.0)
            .check()
            .unwrap();
        let detector = params.fit(&dataset).unwrap();

        let svm = Svm::<f32, f32>::params()
            .c_svr(1.0, Some(0.1))
            .eps(1e-3)
            .linear_kernel()
            .fit(&dataset)
            .unwrap();
        let expected = svm.predict(dataset.records());
        let scores = detector.predict(dataset.records());
        assert_abs_diff_eq!(scores, expected, epsilon = 1e-3);
    }

    #[test]
    fn separates_stripe_orientations() {
        let mut rng = SmallRng::seed_from_u64(7);
        let positives: Vec<_> = (0..12).map(|_| stripes(&mut rng, true)).collect();
        let negatives: Vec<_> = (0..12).map(|_| stripes(&mut rng, false)).collect();

        let params = HogDetector::params()
            .hog(small_hog())
            .c(1.0)
            .check()
            .unwrap();
        let detector = params.fit_images(&positives, &negatives).unwrap();
        assert_eq!(
            detector.to_vec().len(),
            params.hog_params().descriptor_len() + 1
        );

        let hog = params.hog_params();
        for image in (0..4).map(|_| stripes(&mut rng, true)) {
            let window = hog.describe_image(&image).unwrap();
            assert!(detector.score(&window[0]) > 0.);
        }
        for image in (0..4).map(|_| stripes(&mut rng, false)) {
            let window = hog.describe_image(&image).unwrap();
            assert!(detector.score(&window[0]) < 0.);
        }
    }

    #[test]
    fn rejects_mismatching_descriptors() {
        let dataset = Dataset::new(Array2::<f32>::zeros((4, 3)), array![1., 1., -1., -1.]);
        let res = HogDetector::params().fit(&dataset);
        assert!(matches!(res, Err(HogError::DescriptorLength { found: 3, .. })));
    }

    #[test]
    fn rejects_empty_training_set() {
        let params = HogDetector::params().hog(small_hog()).check().unwrap();
        let res = params.fit_images(&[], &[]);
        assert!(matches!(res, Err(HogError::EmptyTrainingSet)));
    }

    #[test]
    fn invalid_params_are_reported_by_fit() {
        let dataset = Dataset::new(Array2::<f32>::zeros((2, 1)), array![1., -1.]);
        let res = HogDetector::params().c(-1.).fit(&dataset);
        assert!(matches!(res, Err(HogError::InvalidC(_))));
    }
}
