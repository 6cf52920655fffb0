//! TgsForge - Telegram bot that converts SVG files into TGS animated stickers
//!
//! This library provides all the core functionality for the bot, including
//! SVG validation, subprocess-based conversion, per-user batch coordination,
//! and Telegram bot integration.
//!
//! # Module Structure
//!
//! - `core`: Configuration, errors, logging, validation, and subprocess helpers
//! - `registry`: In-memory user roles and ban state
//! - `conversion`: SVG to TGS conversion engine
//! - `batch`: Per-user batch jobs and drain coordination
//! - `telegram`: Telegram bot integration and handlers

pub mod batch;
pub mod conversion;
pub mod core;
pub mod registry;
pub mod telegram;

// Re-export commonly used types for convenience
pub use batch::{BatchCoordinator, BatchEntry, BatchError, PushOutcome};
pub use conversion::{tgs_filename, ConversionError, LottieConverter, SvgConverter};
pub use core::{config, AppError, AppResult};
pub use registry::{Role, UserRegistry};
pub use telegram::{create_bot, schema, HandlerDeps};
