//! SVG upload handling and batch draining

use teloxide::net::Download;
use teloxide::prelude::*;
use teloxide::types::{InputFile, Message, MessageId};
use tokio::time::sleep;

use super::types::{HandlerDeps, HandlerError};
use crate::batch::{BatchEntry, BatchError, PushOutcome};
use crate::conversion::tgs_filename;
use crate::core::config;
use crate::core::validation::{validate_svg, ValidationError};

pub(super) const BANNED_TEXT: &str = "❌ You have been banned from using this bot.";

/// User id of the message sender, `None` when the update has no sender
/// (channel posts etc.), so phantom users never enter the registry
pub(super) fn extract_user_id(msg: &Message) -> Option<i64> {
    msg.from.as_ref().and_then(|u| i64::try_from(u.id.0).ok())
}

/// Case-insensitive `.svg` extension check on the uploaded filename
pub(super) fn is_svg_filename(filename: &str) -> bool {
    filename.to_lowercase().ends_with(".svg")
}

/// Handle one uploaded SVG document: download it and add it to the user's
/// batch, opening a batch (and spawning its drain task) on the first file.
pub(super) async fn handle_svg_document(bot: &Bot, msg: &Message, deps: &HandlerDeps) -> Result<(), HandlerError> {
    let Some(user_id) = extract_user_id(msg) else {
        return Ok(());
    };
    let chat_id = msg.chat.id;
    deps.registry.record_user(user_id).await;

    if deps.registry.is_banned(user_id).await {
        bot.send_message(chat_id, BANNED_TEXT).await?;
        return Ok(());
    }

    let Some(document) = msg.document() else {
        return Ok(());
    };
    let filename = document.file_name.clone().unwrap_or_else(|| "file.svg".to_string());

    // Reject on declared size before spending bandwidth on the download
    let declared_size = u64::from(document.file.size);
    if declared_size > config::validation::MAX_FILE_SIZE_BYTES {
        let err = ValidationError::TooLarge {
            size: declared_size,
            limit: config::validation::MAX_FILE_SIZE_BYTES,
        };
        bot.send_message(chat_id, err.user_message()).await?;
        return Ok(());
    }

    let file = bot.get_file(document.file.id.clone()).await?;
    let mut data = Vec::with_capacity(declared_size as usize);
    bot.download_file(&file.path, &mut data).await?;

    log::info!("Received {} ({} bytes) from user {}", filename, data.len(), user_id);

    let entry = BatchEntry { filename, data };
    match deps.coordinator.push(user_id, chat_id, entry).await {
        Ok(PushOutcome::Started { job_id }) => {
            // The job only ever drains through its drain task, so the task is
            // spawned whether or not the status message made it out
            match bot
                .send_message(chat_id, "⏳ Please wait, processing for 3 seconds...")
                .await
            {
                Ok(status) => deps.coordinator.set_status_message(user_id, status.id).await,
                Err(e) => log::warn!("Failed to send status message to chat {}: {}", chat_id, e),
            }

            let bot = bot.clone();
            let deps = deps.clone();
            tokio::spawn(async move {
                drive_batch(bot, deps, chat_id, user_id).await;
            });
            log::debug!("Spawned drain task for batch {}", job_id);
        }
        Ok(PushOutcome::Added { count }) => {
            log::debug!("User {} batch now holds {} file(s)", user_id, count);
        }
        Err(BatchError::Full(limit)) => {
            bot.send_message(
                chat_id,
                format!(
                    "❌ Batch is full (maximum {} files).\nPlease wait for the current batch to finish.",
                    limit
                ),
            )
            .await?;
        }
        Err(BatchError::Busy) => {
            bot.send_message(
                chat_id,
                "⏳ Your previous batch is still processing.\nPlease wait until it finishes.",
            )
            .await?;
        }
    }

    Ok(())
}

/// Drain one batch: wait for it to close, convert every file in arrival
/// order, reply per file, and keep the status message up to date.
///
/// Runs in its own task, so failures are logged rather than propagated.
async fn drive_batch(bot: Bot, deps: HandlerDeps, chat_id: ChatId, user_id: i64) {
    let entries = deps.coordinator.close_when_ready(user_id).await;
    let status_message = deps.coordinator.status_message(user_id).await;

    if entries.is_empty() {
        deps.coordinator.finish(user_id).await;
        return;
    }

    edit_status(&bot, chat_id, status_message, &format!("🔄 Converting {} files...", entries.len())).await;

    let mut successful = 0usize;
    let mut failed = 0usize;
    let mut cancelled = false;
    let total = entries.len();

    for (index, entry) in entries.into_iter().enumerate() {
        // A ban takes effect immediately; remaining files are dropped
        if deps.registry.is_banned(user_id).await {
            log::info!("User {} was banned mid-batch, dropping remaining files", user_id);
            send_or_log(&bot, chat_id, BANNED_TEXT.to_string()).await;
            cancelled = true;
            break;
        }

        match process_entry(&bot, &deps, chat_id, &entry).await {
            Ok(()) => successful += 1,
            Err(user_text) => {
                failed += 1;
                send_or_log(&bot, chat_id, user_text).await;
            }
        }

        if index + 1 < total {
            sleep(config::batch::inter_file_delay()).await;
        }
    }

    let final_text = if cancelled {
        "❌ Batch cancelled.".to_string()
    } else if successful == 0 {
        "❌ No files could be converted".to_string()
    } else if failed > 0 {
        format!("Done ✅\n✅ {} converted | ❌ {} failed", successful, failed)
    } else {
        "Done ✅".to_string()
    };
    edit_status(&bot, chat_id, status_message, &final_text).await;

    log::info!(
        "Batch for user {} finished: {} converted, {} failed",
        user_id,
        successful,
        failed
    );
    deps.coordinator.finish(user_id).await;
}

/// Validate and convert a single batch entry, sending the sticker back on
/// success. On failure returns the text to show the user.
async fn process_entry(bot: &Bot, deps: &HandlerDeps, chat_id: ChatId, entry: &BatchEntry) -> Result<(), String> {
    if let Err(e) = validate_svg(entry.data.len() as u64, &entry.data) {
        return Err(format!("❌ {}\n{}", entry.filename, e.user_message()));
    }

    match deps.converter.convert(&entry.data, &entry.filename).await {
        Ok(tgs) => {
            let tgs_name = tgs_filename(&entry.filename);
            let sticker = InputFile::memory(tgs).file_name(tgs_name.clone());
            bot.send_document(chat_id, sticker)
                .caption(format!("✅ {} → {}", entry.filename, tgs_name))
                .await
                .map_err(|e| {
                    log::error!("Failed to send converted {}: {}", entry.filename, e);
                    format!("❌ {}\nConversion failed", entry.filename)
                })?;
            Ok(())
        }
        Err(e) => {
            log::error!("Conversion of {} failed: {}", entry.filename, e);
            Err(format!("❌ {}\nConversion failed", entry.filename))
        }
    }
}

/// Fallback for everything that is not a command or an SVG upload
pub(super) async fn handle_other_message(bot: &Bot, msg: &Message, deps: &HandlerDeps) -> Result<(), HandlerError> {
    let Some(user_id) = extract_user_id(msg) else {
        return Ok(());
    };
    deps.registry.record_user(user_id).await;

    if deps.registry.is_banned(user_id).await {
        bot.send_message(msg.chat.id, BANNED_TEXT).await?;
        return Ok(());
    }

    let reply = if msg.document().is_some() {
        "❌ Only SVG files are supported.\n\n\
         Please send a valid SVG file for conversion to TGS format.\n\
         You can create SVG files using tools like:\n\
         • Inkscape (free)\n\
         • Adobe Illustrator\n\
         • Figma\n\
         • Canva"
    } else if msg.photo().is_some() {
        "📷 I can only convert SVG files, not images.\n\n\
         To convert your image to SVG:\n\
         1. Use an online converter like convertio.co\n\
         2. Or recreate it as an SVG in a vector graphics editor\n\
         3. Then send me the SVG file!"
    } else if msg.text().map(|t| !t.starts_with('/')).unwrap_or(false) {
        "👋 Hi! Send me SVG files and I'll convert them to TGS format.\n\n\
         📝 Supported: SVG files only\n\
         🎯 Output: TGS stickers for Telegram\n\
         ⚡ Batch processing: Send multiple files at once!\n\n\
         Type /start for more information."
    } else {
        "🤔 I'm not sure what to do with that.\n\n\
         Send me SVG files for conversion to TGS format.\n\
         Type /start for help."
    };

    bot.send_message(msg.chat.id, reply).await?;
    Ok(())
}

async fn edit_status(bot: &Bot, chat_id: ChatId, message_id: Option<MessageId>, text: &str) {
    let Some(message_id) = message_id else {
        return;
    };
    if let Err(e) = bot.edit_message_text(chat_id, message_id, text).await {
        log::warn!("Failed to update status message: {}", e);
    }
}

async fn send_or_log(bot: &Bot, chat_id: ChatId, text: String) {
    if let Err(e) = bot.send_message(chat_id, text).await {
        log::warn!("Failed to send message to chat {}: {}", chat_id, e);
    }
}
