//! SVG to TGS conversion engine
//!
//! Conversion is delegated to the python-lottie command line tool; this
//! module owns the subprocess plumbing around it. The [`SvgConverter`] trait
//! is the seam between the Telegram layer and the conversion technology, so
//! a different backend can be swapped in without touching the handlers.

pub mod tgs;

use async_trait::async_trait;
use thiserror::Error;

use crate::core::config;

pub use tgs::LottieConverter;

/// Errors that can occur during conversion
#[derive(Error, Debug)]
pub enum ConversionError {
    #[error("converter timed out after {0}s")]
    ProcessTimeout(u64),

    #[error("converter exited with an error: {0}")]
    ProcessNonZeroExit(String),

    #[error("converter produced no output")]
    EmptyOutput,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type ConversionResult<T> = Result<T, ConversionError>;

/// Output parameters passed to the converter
#[derive(Debug, Clone)]
pub struct ConvertOptions {
    pub width: u32,
    pub height: u32,
    pub fps: u32,
    /// Apply Telegram sticker requirements to the output
    pub sanitize: bool,
}

impl Default for ConvertOptions {
    fn default() -> Self {
        Self {
            width: config::conversion::OUTPUT_WIDTH,
            height: config::conversion::OUTPUT_HEIGHT,
            fps: *config::conversion::OUTPUT_FPS,
            sanitize: true,
        }
    }
}

/// Converts an in-memory SVG payload into TGS bytes
#[async_trait]
pub trait SvgConverter: Send + Sync {
    async fn convert(&self, svg: &[u8], filename: &str) -> ConversionResult<Vec<u8>>;
}

/// Check if the lottie converter is available
pub async fn check_converter() -> bool {
    let (program, prefix_args) = tgs::converter_command();
    tokio::process::Command::new(program)
        .args(prefix_args)
        .arg("--help")
        .output()
        .await
        .map(|o| o.status.success())
        .unwrap_or(false)
}

/// Generate the TGS filename from the uploaded SVG filename
pub fn tgs_filename(svg_filename: &str) -> String {
    let stem = std::path::Path::new(svg_filename)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("sticker");
    format!("{}.tgs", stem)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tgs_filename_from_svg() {
        let cases = vec![
            ("icon.svg", "icon.tgs"),
            ("my animation.svg", "my animation.tgs"),
            ("archive.tar.svg", "archive.tar.tgs"),
            ("noext", "noext.tgs"),
            ("", "sticker.tgs"),
        ];

        for (input, expected) in cases {
            assert_eq!(tgs_filename(input), expected, "input: {:?}", input);
        }
    }
}
