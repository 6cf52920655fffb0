//! Dispatcher schema and handler chain builders

use teloxide::dispatching::{UpdateFilterExt, UpdateHandler};
use teloxide::prelude::*;
use teloxide::types::{ChatKind, Message};

use super::commands::handle_start_command;
use super::types::{HandlerDeps, HandlerError};
use super::uploads::{extract_user_id, handle_other_message, handle_svg_document, is_svg_filename};
use crate::telegram::admin::{
    handle_adminhelp_command, handle_ban_command, handle_broadcast_command, handle_makeadmin_command,
    handle_removeadmin_command, handle_stats_command, handle_unban_command,
};
use crate::telegram::bot::Command;

/// Creates the main dispatcher schema for the Telegram bot.
///
/// This function returns a handler tree that can be used with teloxide's
/// Dispatcher. Admin commands come first; they are hidden text handlers that
/// the Command enum never exposes. SVG uploads are matched by filename, and
/// everything else in a private chat falls through to the guidance handler.
pub fn schema(deps: HandlerDeps) -> UpdateHandler<HandlerError> {
    let deps_broadcast = deps.clone();
    let deps_ban = deps.clone();
    let deps_unban = deps.clone();
    let deps_stats = deps.clone();
    let deps_makeadmin = deps.clone();
    let deps_removeadmin = deps.clone();
    let deps_adminhelp = deps.clone();
    let deps_commands = deps.clone();
    let deps_svg = deps.clone();
    let deps_messages = deps.clone();

    dptree::entry()
        // Hidden admin commands (not in Command enum)
        .branch(hidden_admin_handler(deps_broadcast, "/broadcast", |bot, deps, msg, user_id, text| {
            Box::pin(async move { handle_broadcast_command(&bot, &deps.registry, msg.chat.id, user_id, &text).await })
        }))
        .branch(hidden_admin_handler(deps_ban, "/ban", |bot, deps, msg, user_id, text| {
            Box::pin(async move { handle_ban_command(&bot, &deps.registry, msg.chat.id, user_id, &text).await })
        }))
        .branch(hidden_admin_handler(deps_unban, "/unban", |bot, deps, msg, user_id, text| {
            Box::pin(async move { handle_unban_command(&bot, &deps.registry, msg.chat.id, user_id, &text).await })
        }))
        .branch(hidden_admin_handler(deps_stats, "/stats", |bot, deps, msg, user_id, _text| {
            Box::pin(async move { handle_stats_command(&bot, &deps.registry, msg.chat.id, user_id).await })
        }))
        .branch(hidden_admin_handler(deps_makeadmin, "/makeadmin", |bot, deps, msg, user_id, text| {
            Box::pin(async move { handle_makeadmin_command(&bot, &deps.registry, msg.chat.id, user_id, &text).await })
        }))
        .branch(hidden_admin_handler(deps_removeadmin, "/removeadmin", |bot, deps, msg, user_id, text| {
            Box::pin(async move { handle_removeadmin_command(&bot, &deps.registry, msg.chat.id, user_id, &text).await })
        }))
        .branch(hidden_admin_handler(deps_adminhelp, "/adminhelp", |bot, deps, msg, user_id, _text| {
            Box::pin(async move { handle_adminhelp_command(&bot, &deps.registry, msg.chat.id, user_id).await })
        }))
        // Command handler
        .branch(command_handler(deps_commands))
        // SVG uploads
        .branch(svg_document_handler(deps_svg))
        // Guidance for everything else in private chats
        .branch(message_handler(deps_messages))
}

type AdminFuture = std::pin::Pin<Box<dyn std::future::Future<Output = anyhow::Result<()>> + Send>>;
type AdminHandlerFn = fn(Bot, HandlerDeps, Message, i64, String) -> AdminFuture;

/// True when the message text is exactly `command`, or `command` followed by
/// arguments. A plain prefix check would route "/banana" to /ban.
fn is_command(text: &str, command: &str) -> bool {
    text.strip_prefix(command)
        .map(|rest| rest.is_empty() || rest.starts_with(' '))
        .unwrap_or(false)
}

/// Builds a handler for one hidden admin command matched by its keyword
fn hidden_admin_handler(deps: HandlerDeps, prefix: &'static str, handler: AdminHandlerFn) -> UpdateHandler<HandlerError> {
    Update::filter_message()
        .filter(move |msg: Message| msg.text().map(|text| is_command(text, prefix)).unwrap_or(false))
        .endpoint(move |bot: Bot, msg: Message| {
            let deps = deps.clone();
            async move {
                let Some(user_id) = extract_user_id(&msg) else {
                    return Ok(());
                };
                let text = msg.text().unwrap_or_default().to_string();
                deps.registry.record_user(user_id).await;

                if let Err(e) = handler(bot, deps, msg, user_id, text).await {
                    log::error!("{} handler failed for user {}: {}", prefix, user_id, e);
                }
                Ok(())
            }
        })
}

/// Handler for commands in the Command enum
fn command_handler(deps: HandlerDeps) -> UpdateHandler<HandlerError> {
    Update::filter_message()
        .filter_command::<Command>()
        .endpoint(move |bot: Bot, msg: Message, cmd: Command| {
            let deps = deps.clone();
            async move {
                match cmd {
                    Command::Start => handle_start_command(&bot, &msg, &deps).await,
                }
            }
        })
}

/// Handler for documents whose filename ends in .svg
fn svg_document_handler(deps: HandlerDeps) -> UpdateHandler<HandlerError> {
    Update::filter_message()
        .filter(|msg: Message| {
            msg.document()
                .and_then(|doc| doc.file_name.as_deref())
                .map(is_svg_filename)
                .unwrap_or(false)
        })
        .endpoint(move |bot: Bot, msg: Message| {
            let deps = deps.clone();
            async move { handle_svg_document(&bot, &msg, &deps).await }
        })
}

/// Fallback handler for private chat messages that match nothing above
fn message_handler(deps: HandlerDeps) -> UpdateHandler<HandlerError> {
    Update::filter_message()
        .filter(|msg: Message| matches!(msg.chat.kind, ChatKind::Private(_)))
        .endpoint(move |bot: Bot, msg: Message| {
            let deps = deps.clone();
            async move { handle_other_message(&bot, &msg, &deps).await }
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_command_matches_exact_keyword_and_arguments() {
        assert!(is_command("/ban", "/ban"));
        assert!(is_command("/ban 12345", "/ban"));
        assert!(is_command("/broadcast hello there", "/broadcast"));
    }

    #[test]
    fn test_is_command_rejects_longer_keywords() {
        assert!(!is_command("/banana recipe", "/ban"));
        assert!(!is_command("/statistics", "/stats"));
        assert!(!is_command("/unban 5", "/ban"));
        assert!(!is_command("ban 5", "/ban"));
    }
}
