use std::fs;
use std::path::PathBuf;
use std::process::Command;

use anyhow::{Context, Result};
use image::GrayImage;
use tracing::debug;

use crate::ocr::{OcrEngine, TextToken};

/// Tesseract subprocess bridge. Writes the binarized page into the work
/// directory and parses the TSV word list back into [`TextToken`]s.
///
/// `--psm 6` treats the page as a uniform block of text, which works far
/// better for scattered short labels than the prose-oriented default.
#[derive(Debug, Clone)]
pub struct TesseractBridge {
    work_dir: PathBuf,
    lang: String,
    psm: u8,
}

impl TesseractBridge {
    pub fn new(work_dir: PathBuf) -> Self {
        Self {
            work_dir,
            lang: "eng".to_string(),
            psm: 6,
        }
    }

    pub fn with_lang(mut self, lang: String) -> Self {
        self.lang = lang;
        self
    }

    pub fn with_psm(mut self, psm: u8) -> Self {
        self.psm = psm;
        self
    }
}

impl OcrEngine for TesseractBridge {
    fn read_tokens(&self, image: &GrayImage) -> Result<Vec<TextToken>> {
        fs::create_dir_all(&self.work_dir)?;
        let input_path = self.work_dir.join("ocr_input.png");
        image
            .save(&input_path)
            .with_context(|| format!("failed to write OCR input to {}", input_path.display()))?;

        let output = Command::new("tesseract")
            .arg(&input_path)
            .arg("stdout")
            .args(["--oem", "1"])
            .args(["--psm", &self.psm.to_string()])
            .args(["-l", &self.lang])
            .arg("tsv")
            .output()
            .with_context(|| "failed to invoke tesseract")?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            anyhow::bail!("tesseract failed: {stderr}");
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        let tokens = parse_tsv(&stdout);
        debug!(tokens = tokens.len(), "tesseract returned word tokens");
        Ok(tokens)
    }
}

/// Parse tesseract TSV output, keeping word-level rows (level 5).
fn parse_tsv(tsv: &str) -> Vec<TextToken> {
    let mut tokens = Vec::new();
    for line in tsv.lines().skip(1) {
        let cols: Vec<&str> = line.split('\t').collect();
        if cols.len() < 12 || cols[0] != "5" {
            continue;
        }
        let (Ok(left), Ok(top), Ok(width), Ok(height)) = (
            cols[6].parse::<i32>(),
            cols[7].parse::<i32>(),
            cols[8].parse::<i32>(),
            cols[9].parse::<i32>(),
        ) else {
            continue;
        };
        tokens.push(TextToken {
            text: cols[11].to_string(),
            left,
            top,
            width,
            height,
        });
    }
    tokens
}

#[cfg(test)]
mod tests {
    use super::*;

    const HEADER: &str =
        "level\tpage_num\tblock_num\tpar_num\tline_num\tword_num\tleft\ttop\twidth\theight\tconf\ttext";

    #[test]
    fn parses_word_level_rows_only() {
        let tsv = format!(
            "{HEADER}\n\
             1\t1\t0\t0\t0\t0\t0\t0\t1000\t800\t-1\t\n\
             5\t1\t1\t1\t1\t1\t120\t40\t22\t14\t91\t102\n\
             5\t1\t1\t1\t1\t2\t300\t60\t18\t12\t88\t3c\n"
        );
        let tokens = parse_tsv(&tsv);
        assert_eq!(tokens.len(), 2);
        assert_eq!(
            tokens[0],
            TextToken {
                text: "102".to_string(),
                left: 120,
                top: 40,
                width: 22,
                height: 14,
            }
        );
    }

    #[test]
    fn skips_malformed_rows() {
        let tsv = format!("{HEADER}\n5\t1\t1\t1\t1\t1\tnot_a_number\t40\t22\t14\t91\t102\n");
        assert!(parse_tsv(&tsv).is_empty());
    }
}
