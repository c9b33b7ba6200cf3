use std::io::Cursor;

use anyhow::{Context, Result};
use base64::engine::general_purpose::STANDARD as BASE64_STANDARD;
use base64::Engine;
use image::{DynamicImage, GenericImageView, ImageFormat};

use crate::core::geometry::BBox;

/// Padding radii in pixels. Tight keeps the numeral plus its leader-line
/// tip; wide keeps the local geometry of the referenced shape. Fixed
/// constants independent of image resolution; see the tunables note in
/// DESIGN.md.
pub const TIGHT_PAD: i32 = 28;
pub const WIDE_PAD: i32 = 160;

/// A PNG-encoded sub-image, transmittable as a base64 data URL.
#[derive(Debug, Clone)]
pub struct EncodedCrop {
    png: Vec<u8>,
}

impl EncodedCrop {
    pub fn png_bytes(&self) -> &[u8] {
        &self.png
    }

    pub fn data_url(&self) -> String {
        format!(
            "data:image/png;base64,{}",
            BASE64_STANDARD.encode(&self.png)
        )
    }
}

/// The two context windows derived for one numeral.
#[derive(Debug, Clone)]
pub struct CropPair {
    pub tight: EncodedCrop,
    pub wide: EncodedCrop,
}

/// Derive the tight and wide crops around a numeral's box.
pub fn make_crops(image: &DynamicImage, bbox: &BBox) -> Result<CropPair> {
    let (width, height) = (image.width(), image.height());
    let tight = bbox.pad(TIGHT_PAD, width, height);
    let wide = bbox.pad(WIDE_PAD, width, height);
    Ok(CropPair {
        tight: encode_region(image, &tight)?,
        wide: encode_region(image, &wide)?,
    })
}

fn encode_region(image: &DynamicImage, region: &BBox) -> Result<EncodedCrop> {
    let crop = image.crop_imm(
        region.x0 as u32,
        region.y0 as u32,
        region.width(),
        region.height(),
    );
    let mut png = Vec::new();
    crop.write_to(&mut Cursor::new(&mut png), ImageFormat::Png)
        .context("failed to encode crop as PNG")?;
    Ok(EncodedCrop { png })
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{GrayImage, Luma};

    fn figure(width: u32, height: u32) -> DynamicImage {
        DynamicImage::ImageLuma8(GrayImage::from_pixel(width, height, Luma([255u8])))
    }

    #[test]
    fn crops_have_padded_dimensions() {
        let image = figure(800, 600);
        let bbox = BBox::from([400, 300, 420, 315]);
        let crops = make_crops(&image, &bbox).unwrap();

        let tight = image::load_from_memory(crops.tight.png_bytes()).unwrap();
        assert_eq!(tight.width(), 20 + 2 * TIGHT_PAD as u32);
        assert_eq!(tight.height(), 15 + 2 * TIGHT_PAD as u32);

        let wide = image::load_from_memory(crops.wide.png_bytes()).unwrap();
        assert_eq!(wide.width(), 20 + 2 * WIDE_PAD as u32);
        assert_eq!(wide.height(), 15 + 2 * WIDE_PAD as u32);
    }

    #[test]
    fn crops_near_the_edge_stay_inside_the_image() {
        let image = figure(200, 150);
        let bbox = BBox::from([5, 5, 25, 20]);
        let crops = make_crops(&image, &bbox).unwrap();

        // Left and top edges clip at zero, right edge extends by the pad.
        let wide = image::load_from_memory(crops.wide.png_bytes()).unwrap();
        assert_eq!(wide.width(), 185);
        assert_eq!(wide.height(), 150);
    }

    #[test]
    fn data_url_is_self_contained_png() {
        let image = figure(100, 100);
        let bbox = BBox::from([40, 40, 60, 60]);
        let crops = make_crops(&image, &bbox).unwrap();
        assert!(crops.tight.data_url().starts_with("data:image/png;base64,"));
    }
}
