//! Chat-bot replies summarising pending reviews for a user or group.
//!
//! Replies are plain lines; the caller decides where they are sent.

pub mod command;

pub use command::ChatCommand;

use tracing::{debug, warn};

use crate::config::ChatConfig;
use crate::reviewboard::{pending_reviews, PendingFilter, ReviewServer};

/// Where a message came from
#[derive(Debug, Clone)]
pub struct ChatContext {
    /// Channel name (starting with `#`) or the nick for a private message
    pub sender: String,
    pub nick: String,
}

impl ChatContext {
    pub fn is_channel(&self) -> bool {
        self.sender.starts_with('#')
    }

    /// Result cap for replies in this context
    pub fn limit(&self, config: &ChatConfig) -> u32 {
        if self.is_channel() {
            config.max_results_channel
        } else {
            config.max_results_private
        }
    }
}

/// Reply lines for a chat message, `None` when the message is not a command.
pub async fn respond(
    server: &dyn ReviewServer,
    config: &ChatConfig,
    context: &ChatContext,
    message: &str,
) -> Option<Vec<String>> {
    let command = ChatCommand::parse(message)?;
    debug!(?command, sender = %context.sender, nick = %context.nick, "chat command");

    let filter = match command {
        ChatCommand::Help => return Some(help(config)),
        ChatCommand::Reviews if context.is_channel() => {
            match config.channel_groups.get(&context.sender) {
                Some(group) => PendingFilter::ToGroup(group.clone()),
                None => {
                    return Some(vec![format!(
                        "Error: no channel-to-group mapping for channel {}.",
                        context.sender
                    )])
                }
            }
        }
        ChatCommand::Reviews | ChatCommand::ReviewsMe => PendingFilter::ToUser(context.nick.clone()),
        ChatCommand::ReviewsUser(user) => PendingFilter::ToUser(user),
        ChatCommand::ReviewsGroup(group) => PendingFilter::ToGroup(group),
    };

    Some(reviews_for(server, &filter, context.limit(config)).await)
}

async fn reviews_for(server: &dyn ReviewServer, filter: &PendingFilter, limit: u32) -> Vec<String> {
    let pending = match pending_reviews(server, filter, Some(limit)).await {
        Ok(pending) => pending,
        Err(e) => {
            warn!("could not list reviews for {}: {:#}", filter.describe(), e);
            let (kind, name) = target(filter);
            return vec![format!("Error getting reviews for {} {}.", kind, name)];
        }
    };

    let total = pending.total_results;
    if total < 1 {
        return vec![format!("Found 0 pending reviews for {}.", filter.describe())];
    }
    let header = if total < limit as usize {
        format!("Found {} pending reviews for {}:", total, filter.describe())
    } else {
        format!(
            "Found {} pending reviews for {}. First {}:",
            total,
            filter.describe(),
            limit
        )
    };

    let base = server.base_url().trim_end_matches('/');
    std::iter::once(header)
        .chain(pending.reviews.iter().take(limit as usize).map(|review| {
            format!(
                "({}) {} <{}/r/{}/>",
                review.submitter, review.summary, base, review.id
            )
        }))
        .collect()
}

fn target(filter: &PendingFilter) -> (&'static str, &str) {
    match filter {
        PendingFilter::ToUser(name) | PendingFilter::FromUser(name) => ("user", name),
        PendingFilter::ToGroup(name) => ("group", name),
    }
}

fn help(config: &ChatConfig) -> Vec<String> {
    vec![
        "Usage:  reviews (in channel) - list open reviews for this channel's group.   \
         reviews (private) - list open reviews for your user.   \
         reviews me - list open reviews for your user.   \
         reviews user <username> - show open reviews for RB user <username>.   \
         reviews group <group> - show open reviews for RB group <group>."
            .to_string(),
        format!(
            "All lists limited to {} results in public channels and {} results in private messages.",
            config.max_results_channel, config.max_results_private
        ),
    ]
}
