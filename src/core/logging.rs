//! Logging initialization and startup diagnostics

use anyhow::Result;
use simplelog::*;
use std::fs::File;

use crate::core::config;

/// Initialize logger for both console and file output
///
/// # Arguments
/// * `log_file_path` - Path to the log file
///
/// # Returns
/// * `Ok(())` - Logger initialized successfully
/// * `Err(anyhow::Error)` - Failed to initialize logger
pub fn init_logger(log_file_path: &str) -> Result<()> {
    let log_file = File::create(log_file_path).map_err(|e| anyhow::anyhow!("Failed to create log file: {}", e))?;

    CombinedLogger::init(vec![
        TermLogger::new(
            LevelFilter::Info,
            Config::default(),
            TerminalMode::Mixed,
            ColorChoice::Auto,
        ),
        WriteLogger::new(LevelFilter::Info, Config::default(), log_file),
    ])
    .map_err(|e| anyhow::anyhow!("Failed to initialize logger: {}", e))?;

    Ok(())
}

/// Logs the effective configuration at application startup
pub fn log_startup_configuration() {
    log::info!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    log::info!("🎨 SVG → TGS Converter Configuration");
    log::info!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");

    if *config::OWNER_ID != 0 {
        log::info!("✅ OWNER_ID: {}", *config::OWNER_ID);
    } else {
        log::warn!("⚠️  OWNER_ID not set - admin commands will be unavailable");
    }

    match config::LOTTIE_BIN.as_deref() {
        Some(path) => log::info!("✅ LOTTIE_BIN: {}", path),
        None => log::info!("LOTTIE_BIN not set - probing known converter locations"),
    }

    log::info!(
        "Limits: {} MB per file, {} files per batch, output {}x{} @ {} fps",
        config::validation::MAX_FILE_SIZE_BYTES / (1024 * 1024),
        config::batch::MAX_BATCH_SIZE,
        config::conversion::OUTPUT_WIDTH,
        config::conversion::OUTPUT_HEIGHT,
        *config::conversion::OUTPUT_FPS,
    );
    log::info!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
}
