pub mod bridge;
pub mod locator;
pub mod preprocess;

use anyhow::Result;
use image::GrayImage;

/// One raw OCR token with its pixel geometry, as reported by an engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextToken {
    pub text: String,
    pub left: i32,
    pub top: i32,
    pub width: i32,
    pub height: i32,
}

/// External OCR engine boundary. Takes the already-binarized page and
/// returns every token it saw; filtering down to numerals happens in
/// [`locator`].
pub trait OcrEngine {
    fn read_tokens(&self, image: &GrayImage) -> Result<Vec<TextToken>>;
}
