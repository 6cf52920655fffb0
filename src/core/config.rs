use once_cell::sync::Lazy;
use std::env;
use std::time::Duration;

/// Bot token
/// Read from BOT_TOKEN or TELOXIDE_TOKEN environment variable
pub static BOT_TOKEN: Lazy<String> = Lazy::new(|| {
    env::var("BOT_TOKEN")
        .or_else(|_| env::var("TELOXIDE_TOKEN"))
        .unwrap_or_else(|_| String::new())
});

/// Bot owner user ID
/// Read from OWNER_ID environment variable
/// The owner is always an admin and can never be banned or demoted
pub static OWNER_ID: Lazy<i64> = Lazy::new(|| {
    env::var("OWNER_ID")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(0)
});

/// Log file path
/// Read from LOG_FILE_PATH environment variable
/// Default: app.log
pub static LOG_FILE_PATH: Lazy<String> =
    Lazy::new(|| env::var("LOG_FILE_PATH").unwrap_or_else(|_| "app.log".to_string()));

/// Explicit path to the lottie converter script
/// Read from LOTTIE_BIN environment variable
/// When unset, well-known install locations are probed and `python -m lottie`
/// is used as the fallback
pub static LOTTIE_BIN: Lazy<Option<String>> = Lazy::new(|| {
    env::var("LOTTIE_BIN")
        .ok()
        .and_then(|s| if s.trim().is_empty() { None } else { Some(s) })
});

/// Upload validation configuration
pub mod validation {
    /// Maximum accepted SVG upload size (5 MB)
    pub const MAX_FILE_SIZE_BYTES: u64 = 5 * 1024 * 1024;
}

/// Conversion configuration
pub mod conversion {
    use once_cell::sync::Lazy;
    use std::env;
    use std::time::Duration;

    /// Output sticker width required by Telegram
    pub const OUTPUT_WIDTH: u32 = 512;

    /// Output sticker height required by Telegram
    pub const OUTPUT_HEIGHT: u32 = 512;

    /// Output frame rate
    /// Read from TGS_FPS environment variable
    /// Default: 30 (lower fps keeps conversion fast and files small)
    pub static OUTPUT_FPS: Lazy<u32> =
        Lazy::new(|| env::var("TGS_FPS").ok().and_then(|v| v.parse().ok()).unwrap_or(30));

    /// Timeout for a single converter invocation (in seconds)
    pub const CONVERT_TIMEOUT_SECS: u64 = 120;

    /// Telegram's animated sticker size limit; larger output is still
    /// delivered but logged as a warning
    pub const TGS_SIZE_WARN_BYTES: u64 = 64 * 1024;

    /// Converter invocation timeout duration
    pub fn timeout() -> Duration {
        Duration::from_secs(CONVERT_TIMEOUT_SECS)
    }
}

/// Batch processing configuration
pub mod batch {
    use super::Duration;

    /// Maximum files accepted into one batch
    pub const MAX_BATCH_SIZE: usize = 15;

    /// Inactivity window after the last upload before a batch closes (in seconds)
    pub const INACTIVITY_WINDOW_SECS: u64 = 3;

    /// Interval between open-batch checks (in milliseconds)
    pub const CHECK_INTERVAL_MS: u64 = 250;

    /// Hard cap on a batch's total lifetime (in seconds)
    pub const BATCH_TIMEOUT_SECS: u64 = 300;

    /// Delay between sending converted files (in milliseconds)
    pub const INTER_FILE_DELAY_MS: u64 = 500;

    /// Inactivity window duration
    pub fn inactivity_window() -> Duration {
        Duration::from_secs(INACTIVITY_WINDOW_SECS)
    }

    /// Open-batch check interval duration
    pub fn check_interval() -> Duration {
        Duration::from_millis(CHECK_INTERVAL_MS)
    }

    /// Batch hard timeout duration
    pub fn hard_timeout() -> Duration {
        Duration::from_secs(BATCH_TIMEOUT_SECS)
    }

    /// Inter-file delay duration
    pub fn inter_file_delay() -> Duration {
        Duration::from_millis(INTER_FILE_DELAY_MS)
    }
}

/// Broadcast configuration
pub mod broadcast {
    use super::Duration;

    /// Delay between broadcast sends to stay under Telegram rate limits
    /// (in milliseconds)
    pub const INTER_SEND_DELAY_MS: u64 = 100;

    /// Telegram message length limit
    pub const MAX_MESSAGE_LENGTH: usize = 4096;

    /// Inter-send delay duration
    pub fn inter_send_delay() -> Duration {
        Duration::from_millis(INTER_SEND_DELAY_MS)
    }
}

/// Network configuration
pub mod network {
    use super::Duration;

    /// Request timeout for HTTP requests to the Bot API (in seconds)
    pub const REQUEST_TIMEOUT_SECS: u64 = 60;

    /// Request timeout duration
    pub fn timeout() -> Duration {
        Duration::from_secs(REQUEST_TIMEOUT_SECS)
    }
}

/// Retry configuration
pub mod retry {
    use super::Duration;

    /// Maximum number of retries for dispatcher reconnection
    pub const MAX_DISPATCHER_RETRIES: u32 = 5;

    /// Delay between dispatcher retry attempts (in seconds)
    pub const DISPATCHER_RETRY_DELAY_SECS: u64 = 5;

    /// Base for exponential backoff calculation
    pub const EXPONENTIAL_BACKOFF_BASE: u64 = 2;

    /// Dispatcher retry delay duration
    pub fn dispatcher_delay() -> Duration {
        Duration::from_secs(DISPATCHER_RETRY_DELAY_SECS)
    }
}
