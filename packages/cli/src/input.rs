// ABOUTME: Input and output helpers for the command-line tool
// ABOUTME: Reads requirement text, images, and saved analyses; writes rendered output

use std::fs;
use std::io::{self, IsTerminal, Read};
use std::path::Path;

use tracing::info;
use uieasy_analyzer::AnalysisResult;

use crate::error::{CliError, Result};

/// Requirement text from the argument, a file, or piped stdin (in that order)
///
/// An argument of `-` reads stdin explicitly.
pub fn read_text(text: Option<&str>, file: Option<&Path>) -> Result<String> {
    let content = match (text, file) {
        (Some("-"), _) => read_stdin()?,
        (Some(text), _) => text.to_string(),
        (None, Some(path)) => read_file(path)?,
        (None, None) if !io::stdin().is_terminal() => read_stdin()?,
        (None, None) => String::new(),
    };

    if content.trim().is_empty() {
        return Err(CliError::EmptyInput);
    }
    Ok(content)
}

pub fn read_file(path: &Path) -> Result<String> {
    fs::read_to_string(path).map_err(|source| CliError::Read {
        path: path.to_path_buf(),
        source,
    })
}

fn read_stdin() -> Result<String> {
    let mut buffer = String::new();
    io::stdin()
        .read_to_string(&mut buffer)
        .map_err(CliError::Stdin)?;
    Ok(buffer)
}

pub fn read_image(path: &Path) -> Result<Vec<u8>> {
    let bytes = fs::read(path).map_err(|source| CliError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    info!("Attached image {} ({} bytes)", path.display(), bytes.len());
    Ok(bytes)
}

/// Load an analysis previously written with `--format json`
pub fn load_analysis(path: &Path) -> Result<AnalysisResult> {
    let content = read_file(path)?;
    serde_json::from_str(&content).map_err(|source| CliError::InvalidAnalysis {
        path: path.to_path_buf(),
        source,
    })
}

/// Write to a file, or to stdout when no path is given
pub fn write_output(content: &str, path: Option<&Path>) -> Result<()> {
    match path {
        Some(path) => {
            fs::write(path, content).map_err(|source| CliError::Write {
                path: path.to_path_buf(),
                source,
            })?;
            info!("Wrote {} bytes to {}", content.len(), path.display());
        }
        None => println!("{}", content),
    }
    Ok(())
}
