//! Admin functionality for the Telegram bot
//!
//! All admin commands are hidden (not registered in the Telegram UI) and are
//! gated on the registry: broadcast, ban/unban, and stats require admin or
//! owner; makeadmin/removeadmin require the owner. Every handler answers the
//! caller, including on permission failure.

use anyhow::Result;
use std::sync::Arc;
use teloxide::prelude::*;
use teloxide::types::ParseMode;
use tokio::time::sleep;

use crate::core::config;
use crate::registry::{RegistryError, RegistryStats, Role, UserRegistry};

const NO_PERMISSION: &str = "❌ You don't have permission to use this command.";
const OWNER_ONLY: &str = "❌ Only the bot owner can use this command.";
const INVALID_USER_ID: &str = "❌ Invalid user ID. Please provide a numeric user ID.";

/// Extract the `<user_id>` argument from commands like `/ban 12345`
fn parse_target_id(text: &str, command: &str) -> Result<i64, ArgError> {
    let rest = text.strip_prefix(command).unwrap_or(text).trim();
    if rest.is_empty() {
        return Err(ArgError::Missing);
    }
    rest.split_whitespace()
        .next()
        .and_then(|tok| tok.parse::<i64>().ok())
        .ok_or(ArgError::NotNumeric)
}

#[derive(Debug, PartialEq, Eq)]
enum ArgError {
    Missing,
    NotNumeric,
}

/// Handle /broadcast - send a message to every known, non-banned user
pub async fn handle_broadcast_command(
    bot: &Bot,
    registry: &Arc<UserRegistry>,
    chat_id: ChatId,
    user_id: i64,
    text: &str,
) -> Result<()> {
    if !registry.is_admin(user_id).await {
        bot.send_message(chat_id, NO_PERMISSION).await?;
        return Ok(());
    }

    let message_text = text.strip_prefix("/broadcast").unwrap_or(text).trim();
    if message_text.is_empty() {
        bot.send_message(
            chat_id,
            "📢 Usage: /broadcast <message>\n\nThis command will send a message to all bot users.",
        )
        .await?;
        return Ok(());
    }

    let targets = registry.broadcast_targets().await;
    if targets.is_empty() {
        bot.send_message(chat_id, "❌ No users found to broadcast to.").await?;
        return Ok(());
    }

    let confirmation = bot
        .send_message(chat_id, format!("📢 Starting broadcast to {} users...", targets.len()))
        .await?;

    let mut sent_count = 0usize;
    let mut failed_count = 0usize;

    for target in &targets {
        match bot.send_message(ChatId(*target), message_text).await {
            Ok(_) => {
                sent_count += 1;
                sleep(config::broadcast::inter_send_delay()).await;
            }
            Err(e) => {
                failed_count += 1;
                log::warn!("Failed to send broadcast to user {}: {}", target, e);
            }
        }
    }

    bot.edit_message_text(
        chat_id,
        confirmation.id,
        format!(
            "📢 Broadcast completed!\n✅ Sent: {}\n❌ Failed: {}\n📊 Total users: {}",
            sent_count,
            failed_count,
            targets.len()
        ),
    )
    .await?;

    Ok(())
}

/// Handle /ban <user_id> - admin only
pub async fn handle_ban_command(
    bot: &Bot,
    registry: &Arc<UserRegistry>,
    chat_id: ChatId,
    user_id: i64,
    text: &str,
) -> Result<()> {
    if !registry.is_admin(user_id).await {
        bot.send_message(chat_id, NO_PERMISSION).await?;
        return Ok(());
    }

    let target_id = match parse_target_id(text, "/ban") {
        Ok(id) => id,
        Err(ArgError::Missing) => {
            bot.send_message(chat_id, "Usage: /ban <user_id>").await?;
            return Ok(());
        }
        Err(ArgError::NotNumeric) => {
            bot.send_message(chat_id, INVALID_USER_ID).await?;
            return Ok(());
        }
    };

    if target_id == user_id {
        bot.send_message(chat_id, "❌ You cannot ban yourself.").await?;
        return Ok(());
    }

    match registry.set_banned(user_id, target_id, true).await {
        Ok(()) => {
            log::info!("User {} banned by admin {}", target_id, user_id);
            bot.send_message(chat_id, format!("✅ User {} has been banned.", target_id))
                .await?;
        }
        Err(RegistryError::ProtectedUser) => {
            bot.send_message(chat_id, "❌ Cannot ban the bot owner.").await?;
        }
        Err(RegistryError::Unauthorized) => {
            bot.send_message(chat_id, NO_PERMISSION).await?;
        }
    }

    Ok(())
}

/// Handle /unban <user_id> - admin only
pub async fn handle_unban_command(
    bot: &Bot,
    registry: &Arc<UserRegistry>,
    chat_id: ChatId,
    user_id: i64,
    text: &str,
) -> Result<()> {
    if !registry.is_admin(user_id).await {
        bot.send_message(chat_id, NO_PERMISSION).await?;
        return Ok(());
    }

    let target_id = match parse_target_id(text, "/unban") {
        Ok(id) => id,
        Err(ArgError::Missing) => {
            bot.send_message(chat_id, "Usage: /unban <user_id>").await?;
            return Ok(());
        }
        Err(ArgError::NotNumeric) => {
            bot.send_message(chat_id, INVALID_USER_ID).await?;
            return Ok(());
        }
    };

    match registry.set_banned(user_id, target_id, false).await {
        Ok(()) => {
            log::info!("User {} unbanned by admin {}", target_id, user_id);
            bot.send_message(chat_id, format!("✅ User {} has been unbanned.", target_id))
                .await?;
        }
        Err(_) => {
            bot.send_message(chat_id, NO_PERMISSION).await?;
        }
    }

    Ok(())
}

/// Builds the /stats report text
fn build_stats_text(stats: &RegistryStats) -> String {
    format!(
        "📊 **Bot Statistics**\n\n👥 Total Users: {}\n🚫 Banned Users: {}\n✅ Active Users: {}\n🤖 Bot Status: Running",
        stats.total, stats.banned, stats.active
    )
}

/// Handle /stats - admin only
pub async fn handle_stats_command(bot: &Bot, registry: &Arc<UserRegistry>, chat_id: ChatId, user_id: i64) -> Result<()> {
    if !registry.is_admin(user_id).await {
        bot.send_message(chat_id, NO_PERMISSION).await?;
        return Ok(());
    }

    let stats = registry.stats().await;
    bot.send_message(chat_id, build_stats_text(&stats))
        .parse_mode(ParseMode::Markdown)
        .await?;

    Ok(())
}

/// Handle /makeadmin <user_id> - owner only
pub async fn handle_makeadmin_command(
    bot: &Bot,
    registry: &Arc<UserRegistry>,
    chat_id: ChatId,
    user_id: i64,
    text: &str,
) -> Result<()> {
    if !registry.is_owner(user_id).await {
        bot.send_message(chat_id, OWNER_ONLY).await?;
        return Ok(());
    }

    let target_id = match parse_target_id(text, "/makeadmin") {
        Ok(id) => id,
        Err(ArgError::Missing) => {
            bot.send_message(chat_id, "Usage: /makeadmin <user_id>").await?;
            return Ok(());
        }
        Err(ArgError::NotNumeric) => {
            bot.send_message(chat_id, INVALID_USER_ID).await?;
            return Ok(());
        }
    };

    match registry.set_role(user_id, target_id, Role::Admin).await {
        Ok(()) => {
            log::info!("User {} promoted to admin by owner", target_id);
            bot.send_message(chat_id, format!("✅ User {} is now an admin.", target_id))
                .await?;
        }
        Err(RegistryError::ProtectedUser) => {
            // Owner promoting themselves is a no-op; they already outrank admin
            bot.send_message(chat_id, "✅ The owner already has admin privileges.")
                .await?;
        }
        Err(RegistryError::Unauthorized) => {
            bot.send_message(chat_id, OWNER_ONLY).await?;
        }
    }

    Ok(())
}

/// Handle /removeadmin <user_id> - owner only
pub async fn handle_removeadmin_command(
    bot: &Bot,
    registry: &Arc<UserRegistry>,
    chat_id: ChatId,
    user_id: i64,
    text: &str,
) -> Result<()> {
    if !registry.is_owner(user_id).await {
        bot.send_message(chat_id, OWNER_ONLY).await?;
        return Ok(());
    }

    let target_id = match parse_target_id(text, "/removeadmin") {
        Ok(id) => id,
        Err(ArgError::Missing) => {
            bot.send_message(chat_id, "Usage: /removeadmin <user_id>").await?;
            return Ok(());
        }
        Err(ArgError::NotNumeric) => {
            bot.send_message(chat_id, INVALID_USER_ID).await?;
            return Ok(());
        }
    };

    match registry.set_role(user_id, target_id, Role::Regular).await {
        Ok(()) => {
            log::info!("Admin privileges removed from user {} by owner", target_id);
            bot.send_message(chat_id, format!("✅ Admin privileges removed from user {}.", target_id))
                .await?;
        }
        Err(RegistryError::ProtectedUser) => {
            bot.send_message(chat_id, "❌ Cannot remove admin privileges from the owner.")
                .await?;
        }
        Err(RegistryError::Unauthorized) => {
            bot.send_message(chat_id, OWNER_ONLY).await?;
        }
    }

    Ok(())
}

/// Builds the /adminhelp text; the owner section is only shown to the owner
fn build_admin_help(is_owner: bool) -> String {
    let mut help_text = String::from("🛠 **Admin Commands**\n\n");
    help_text.push_str("📢 `/broadcast <message>` - Send message to all users\n");
    help_text.push_str("🚫 `/ban <user_id>` - Ban a user\n");
    help_text.push_str("✅ `/unban <user_id>` - Unban a user\n");
    help_text.push_str("📊 `/stats` - View bot statistics\n");
    help_text.push_str("❓ `/adminhelp` - Show this help\n");

    if is_owner {
        help_text.push_str("\n🔧 **Owner Commands**\n");
        help_text.push_str("👑 `/makeadmin <user_id>` - Grant admin privileges\n");
        help_text.push_str("👤 `/removeadmin <user_id>` - Remove admin privileges\n");
    }

    help_text.push_str("\n💡 **Tips:**\n");
    help_text.push_str("• Use `/stats` to monitor bot usage and user activity\n");
    help_text.push_str("• Banned users cannot use the bot until unbanned");
    help_text
}

/// Handle /adminhelp - admin only
pub async fn handle_adminhelp_command(
    bot: &Bot,
    registry: &Arc<UserRegistry>,
    chat_id: ChatId,
    user_id: i64,
) -> Result<()> {
    if !registry.is_admin(user_id).await {
        bot.send_message(chat_id, NO_PERMISSION).await?;
        return Ok(());
    }

    let is_owner = registry.is_owner(user_id).await;
    bot.send_message(chat_id, build_admin_help(is_owner))
        .parse_mode(ParseMode::Markdown)
        .await?;

    Ok(())
}
