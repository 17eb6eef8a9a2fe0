//! Training matrix assembly
//!
//! Descriptors are collected one row at a time and laid out contiguously, so that the final
//! `(nsamples, nfeatures)` matrix can be handed to the solver without another copy.
use crate::error::{HogError, Result};
use crate::hyperparams::HogValidParams;

use image::DynamicImage;
use linfa::Dataset;
use log::debug;
use ndarray::{Array1, Array2, ArrayBase, Data, Ix1};

/// Label of windows showing the object
pub const POSITIVE: f32 = 1.0;
/// Label of background windows
pub const NEGATIVE: f32 = -1.0;

/// Labelled HOG descriptors waiting to be fitted
#[derive(Debug, Clone, PartialEq)]
pub struct TrainingSet {
    hog: HogValidParams,
    records: Vec<f32>,
    targets: Vec<f32>,
}

impl TrainingSet {
    pub fn new(hog: HogValidParams) -> Self {
        TrainingSet {
            hog,
            records: Vec::new(),
            targets: Vec::new(),
        }
    }

    pub fn hog_params(&self) -> &HogValidParams {
        &self.hog
    }

    /// Number of descriptor rows
    pub fn nsamples(&self) -> usize {
        self.targets.len()
    }

    /// Length of every descriptor row
    pub fn nfeatures(&self) -> usize {
        self.hog.descriptor_len()
    }

    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }

    /// Append a single descriptor with its label
    pub fn push<D: Data<Elem = f32>>(
        &mut self,
        descriptor: &ArrayBase<D, Ix1>,
        label: f32,
    ) -> Result<()> {
        if descriptor.len() != self.nfeatures() {
            return Err(HogError::DescriptorLength {
                expected: self.nfeatures(),
                found: descriptor.len(),
            });
        }

        self.records.extend(descriptor.iter());
        self.targets.push(label);
        Ok(())
    }

    /// Describe every image large enough for the window and label all resulting rows
    ///
    /// Returns the number of rows added, which is twice the number of used images when the
    /// mirrored windows are included.
    pub fn add_images(&mut self, images: &[DynamicImage], label: f32) -> Result<usize> {
        let before = self.nsamples();
        for image in images {
            for descriptor in self.hog.describe_image(image)? {
                self.push(&descriptor, label)?;
            }
        }

        let added = self.nsamples() - before;
        debug!(
            "added {} descriptors with label {} from {} images",
            added,
            label,
            images.len()
        );
        Ok(added)
    }

    pub fn add_positives(&mut self, images: &[DynamicImage]) -> Result<usize> {
        self.add_images(images, POSITIVE)
    }

    pub fn add_negatives(&mut self, images: &[DynamicImage]) -> Result<usize> {
        self.add_images(images, NEGATIVE)
    }

    /// Lay the rows out as a `(nsamples, nfeatures)` training matrix
    pub fn to_dataset(&self) -> Result<Dataset<f32, f32, Ix1>> {
        self.clone().into_dataset()
    }

    pub fn into_dataset(self) -> Result<Dataset<f32, f32, Ix1>> {
        if self.is_empty() {
            return Err(HogError::EmptyTrainingSet);
        }

        let shape = (self.nsamples(), self.nfeatures());
        let records = Array2::from_shape_vec(shape, self.records).map_err(linfa::Error::from)?;
        let targets = Array1::from(self.targets);

        Ok(Dataset::new(records, targets))
    }
}
