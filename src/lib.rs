pub mod core;
pub mod crop;
pub mod export;
pub mod ocr;
pub mod oracle;
pub mod pipeline;
pub mod vocab;

pub use crate::core::model::{ComponentRecord, FigureResult, NumeralHit};
