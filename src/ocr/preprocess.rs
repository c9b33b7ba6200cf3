use image::{DynamicImage, GrayImage};
use imageproc::contrast::adaptive_threshold;
use imageproc::distance_transform::Norm;
use imageproc::morphology::open;

/// Neighborhood radius for adaptive thresholding. Tuned for line-art
/// figures, where global thresholds lose thin leader lines.
const THRESHOLD_BLOCK_RADIUS: u32 = 15;

/// Binarize a figure for OCR: grayscale, adaptive threshold, then a
/// minimal morphological opening to drop single-pixel speckle.
pub fn binarize_for_ocr(image: &DynamicImage) -> GrayImage {
    let gray = image.to_luma8();
    let binary = adaptive_threshold(&gray, THRESHOLD_BLOCK_RADIUS);
    open(&binary, Norm::LInf, 1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Luma;

    #[test]
    fn output_is_strictly_binary() {
        let mut gray = GrayImage::from_pixel(120, 120, Luma([230u8]));
        for x in 40..80 {
            for y in 55..65 {
                gray.put_pixel(x, y, Luma([20u8]));
            }
        }
        let binary = binarize_for_ocr(&DynamicImage::ImageLuma8(gray));
        assert!(binary.pixels().all(|p| p.0[0] == 0 || p.0[0] == 255));
    }

    #[test]
    fn dimensions_are_preserved() {
        let gray = GrayImage::from_pixel(150, 90, Luma([255u8]));
        let binary = binarize_for_ocr(&DynamicImage::ImageLuma8(gray));
        assert_eq!(binary.dimensions(), (150, 90));
    }
}
