//! Command handler implementations (/start)

use teloxide::prelude::*;
use teloxide::types::{Message, ParseMode};

use super::types::{HandlerDeps, HandlerError};
use super::uploads::extract_user_id;

const WELCOME_TEXT: &str = "🎨 **SVG to TGS Converter Bot**\n\n\
Welcome! I can convert your SVG files to TGS format for Telegram stickers.\n\n\
📝 **How to use:**\n\
• Send me SVG files (one or multiple)\n\
• Files will be automatically resized to 512×512 pixels\n\
• I'll convert them to TGS format and send them back\n\n\
📋 **Requirements:**\n\
• SVG format only\n\
• Maximum file size: 5MB\n\
• Batch processing: up to 15 files at once\n\n\
🚀 **Ready to convert your SVG files!**";

/// Handle /start command
pub(super) async fn handle_start_command(bot: &Bot, msg: &Message, deps: &HandlerDeps) -> Result<(), HandlerError> {
    let Some(user_id) = extract_user_id(msg) else {
        return Ok(());
    };
    deps.registry.record_user(user_id).await;

    if deps.registry.is_banned(user_id).await {
        bot.send_message(msg.chat.id, "❌ You have been banned from using this bot.")
            .await?;
        return Ok(());
    }

    log::info!("User {} started the bot", user_id);
    bot.send_message(msg.chat.id, WELCOME_TEXT)
        .parse_mode(ParseMode::Markdown)
        .await?;

    Ok(())
}
