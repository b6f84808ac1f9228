//! Output formatting for run results

use crate::config::OutputConfig;
use crate::error::Result;
use crate::http::response::RunResult;
use std::fs::File;
use std::io::{self, Write};
use std::path::Path;

#[cfg(test)]
mod tests;

/// Output writer that handles file vs stdout
pub struct OutputWriter {
    config: OutputConfig,
}

impl OutputWriter {
    pub fn new(config: OutputConfig) -> Self {
        Self { config }
    }

    /// Render one result as JSON
    pub fn render(&self, result: &RunResult) -> Result<String> {
        let rendered = if self.config.pretty {
            serde_json::to_string_pretty(result)?
        } else {
            serde_json::to_string(result)?
        };
        Ok(rendered)
    }

    /// Write every result to the configured output, one JSON document per line
    pub fn write_results(&self, results: &[RunResult]) -> Result<()> {
        let mut content = String::new();
        for result in results {
            content.push_str(&self.render(result)?);
            content.push('\n');
        }

        if let Some(file_path) = &self.config.file {
            self.write_to_file(&content, file_path)
        } else if self.config.silent {
            Ok(())
        } else {
            self.write_to_stdout(&content)
        }
    }

    /// Write error message
    pub fn write_error(&self, message: &str) {
        if !self.config.silent {
            eprintln!("jarhttp: error: {}", message);
        }
    }

    fn write_to_file(&self, content: &str, file_path: &Path) -> Result<()> {
        let mut file = File::create(file_path)?;
        file.write_all(content.as_bytes())?;
        Ok(())
    }

    fn write_to_stdout(&self, content: &str) -> Result<()> {
        let mut stdout = io::stdout().lock();
        stdout.write_all(content.as_bytes())?;
        stdout.flush()?;
        Ok(())
    }
}
