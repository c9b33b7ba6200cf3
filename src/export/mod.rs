use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use tracing::info;

use crate::core::model::FigureResult;

/// Writes the terminal result document exactly once per run.
#[derive(Debug, Clone)]
pub struct JsonExporter {
    out_path: PathBuf,
}

impl JsonExporter {
    pub fn new(out_path: PathBuf) -> Self {
        Self { out_path }
    }

    pub fn export(&self, result: &FigureResult) -> Result<()> {
        if let Some(parent) = self.out_path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let data = serde_json::to_string_pretty(result)?;
        fs::write(&self.out_path, data)
            .with_context(|| format!("failed to write {}", self.out_path.display()))?;
        info!(path = %self.out_path.display(), "result written");
        Ok(())
    }
}
