//! Lottie-based SVG to TGS converter
//!
//! Shells out to python-lottie's `lottie_convert.py` (or `python -m lottie`
//! when no script is installed). Each conversion runs in its own temp
//! directory that is removed when the conversion ends, whatever the outcome.

use async_trait::async_trait;
use std::path::Path;
use tempfile::TempDir;
use tokio::process::Command;

use crate::core::config;
use crate::core::process::{run_with_timeout, ProcessError};

use super::{ConversionError, ConversionResult, ConvertOptions, SvgConverter};

/// Well-known install locations for the converter script
const CONVERTER_CANDIDATES: &[&str] = &[
    "/usr/local/bin/lottie_convert.py",
    "/usr/bin/lottie_convert.py",
];

/// Resolve the converter invocation: program plus the arguments that come
/// before the input/output paths.
///
/// LOTTIE_BIN takes priority, then known script locations, then
/// `python -m lottie`.
pub fn converter_command() -> (String, Vec<String>) {
    if let Some(script) = config::LOTTIE_BIN.as_deref() {
        return ("python".to_string(), vec![script.to_string()]);
    }

    for candidate in CONVERTER_CANDIDATES {
        if Path::new(candidate).exists() {
            return ("python".to_string(), vec![candidate.to_string()]);
        }
    }

    ("python".to_string(), vec!["-m".to_string(), "lottie".to_string()])
}

/// Build the converter argument list for one conversion
fn build_args(input: &Path, output: &Path, options: &ConvertOptions) -> Vec<String> {
    let mut args = vec![
        input.to_string_lossy().into_owned(),
        output.to_string_lossy().into_owned(),
    ];
    if options.sanitize {
        // Telegram sticker requirements (512x512 canvas, duration caps)
        args.push("--sanitize".to_string());
    }
    args.extend([
        "--optimize".to_string(),
        "0".to_string(),
        "--fps".to_string(),
        options.fps.to_string(),
        "--width".to_string(),
        options.width.to_string(),
        "--height".to_string(),
        options.height.to_string(),
    ]);
    args
}

/// Subprocess-backed converter using python-lottie
pub struct LottieConverter {
    options: ConvertOptions,
}

impl LottieConverter {
    pub fn new(options: ConvertOptions) -> Self {
        Self { options }
    }
}

impl Default for LottieConverter {
    fn default() -> Self {
        Self::new(ConvertOptions::default())
    }
}

#[async_trait]
impl SvgConverter for LottieConverter {
    async fn convert(&self, svg: &[u8], filename: &str) -> ConversionResult<Vec<u8>> {
        // Scratch dir is removed on drop, so cleanup holds on every exit
        // path including timeout and task cancellation.
        let scratch = TempDir::new()?;
        let input_path = scratch.path().join("input.svg");
        let output_path = scratch.path().join("output.tgs");

        tokio::fs::write(&input_path, svg).await?;

        let (program, prefix_args) = converter_command();
        let mut cmd = Command::new(&program);
        cmd.args(&prefix_args)
            .args(build_args(&input_path, &output_path, &self.options));

        log::info!("Converting {} via {} {:?}", filename, program, prefix_args);

        let output = run_with_timeout(&mut cmd, config::conversion::timeout())
            .await
            .map_err(|e| match e {
                ProcessError::Timeout(secs) => ConversionError::ProcessTimeout(secs),
                ProcessError::Io(io) => ConversionError::Io(io),
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            log::error!("Conversion of {} failed ({}): {}", filename, output.status, stderr);
            return Err(ConversionError::ProcessNonZeroExit(stderr));
        }

        let tgs = match tokio::fs::read(&output_path).await {
            Ok(bytes) if !bytes.is_empty() => bytes,
            _ => {
                log::error!("Conversion of {} completed but no TGS file was generated", filename);
                return Err(ConversionError::EmptyOutput);
            }
        };

        if tgs.len() as u64 > config::conversion::TGS_SIZE_WARN_BYTES {
            log::warn!(
                "Generated TGS for {} is {} bytes, over Telegram's 64KB sticker limit",
                filename,
                tgs.len()
            );
        }

        log::info!("Successfully converted {} to TGS ({} bytes)", filename, tgs.len());
        Ok(tgs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::path::PathBuf;

    fn options(fps: u32, sanitize: bool) -> ConvertOptions {
        ConvertOptions {
            width: 512,
            height: 512,
            fps,
            sanitize,
        }
    }

    #[test]
    fn test_build_args_with_sanitize() {
        let input = PathBuf::from("/tmp/x/input.svg");
        let output = PathBuf::from("/tmp/x/output.tgs");

        let args = build_args(&input, &output, &options(30, true));
        let args: Vec<&str> = args.iter().map(|s| s.as_str()).collect();
        assert_eq!(
            args,
            vec![
                "/tmp/x/input.svg",
                "/tmp/x/output.tgs",
                "--sanitize",
                "--optimize",
                "0",
                "--fps",
                "30",
                "--width",
                "512",
                "--height",
                "512",
            ]
        );
    }

    #[test]
    fn test_build_args_without_sanitize() {
        let input = PathBuf::from("in.svg");
        let output = PathBuf::from("out.tgs");

        let args = build_args(&input, &output, &options(60, false));
        assert!(!args.contains(&"--sanitize".to_string()));
        assert_eq!(args[3], "0");
        assert_eq!(args[5], "60");
    }

    #[test]
    fn test_converter_command_has_a_program() {
        let (program, args) = converter_command();
        assert_eq!(program, "python");
        assert!(!args.is_empty());
    }
}
