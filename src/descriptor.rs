//! HOG descriptors of detection windows
use crate::error::{HogError, Result};
use crate::hyperparams::HogValidParams;

use image::{imageops, DynamicImage, GrayImage};
use log::debug;
use ndarray::Array1;

/// Convert an image of any color type to 8-bit luma
pub fn to_gray(image: &DynamicImage) -> GrayImage {
    image.to_luma8()
}

impl HogValidParams {
    /// Cut the detection window out of the center of `image`
    ///
    /// Returns `None` if the image is smaller than the window in either dimension.
    pub fn window_of(&self, image: &GrayImage) -> Option<GrayImage> {
        let (width, height) = self.window();
        if image.width() < width || image.height() < height {
            return None;
        }
        if image.dimensions() == (width, height) {
            return Some(image.clone());
        }

        let x = (image.width() - width) / 2;
        let y = (image.height() - height) / 2;
        Some(imageops::crop_imm(image, x, y, width, height).to_image())
    }

    /// Compute the descriptor of a window-sized gray image
    pub fn describe(&self, window: &GrayImage) -> Result<Array1<f32>> {
        let descriptor =
            imageproc::hog::hog(window, self.hog_options()).map_err(HogError::Descriptor)?;

        if descriptor.len() != self.descriptor_len() {
            return Err(HogError::DescriptorLength {
                expected: self.descriptor_len(),
                found: descriptor.len(),
            });
        }

        let mut descriptor = Array1::from(descriptor);
        // blocks without any gradient normalize to 0/0
        descriptor.mapv_inplace(|v| if v.is_finite() { v } else { 0.0 });

        Ok(descriptor)
    }

    /// Compute the training descriptors of an image
    ///
    /// The image is converted to gray and center-cropped to the window. With `flip` enabled a
    /// second descriptor of the mirrored window follows the first one. Images smaller than the
    /// window yield no descriptor.
    pub fn describe_image(&self, image: &DynamicImage) -> Result<Vec<Array1<f32>>> {
        let gray = to_gray(image);
        let window = match self.window_of(&gray) {
            Some(window) => window,
            None => {
                debug!(
                    "skipping {}x{} image, smaller than the {}x{} window",
                    gray.width(),
                    gray.height(),
                    self.window().0,
                    self.window().1
                );
                return Ok(Vec::new());
            }
        };

        let mut descriptors = vec![self.describe(&window)?];
        if self.flip() {
            let mirrored = imageops::flip_horizontal(&window);
            descriptors.push(self.describe(&mirrored)?);
        }

        Ok(descriptors)
    }
}
