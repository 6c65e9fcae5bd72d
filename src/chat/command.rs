use once_cell::sync::Lazy;
use regex::Regex;

static REVIEWS: Lazy<Regex> = Lazy::new(|| Regex::new(r"^reviews$").unwrap());
static REVIEWS_ME: Lazy<Regex> = Lazy::new(|| Regex::new(r"^reviews me$").unwrap());
static REVIEWS_USER: Lazy<Regex> = Lazy::new(|| Regex::new(r"^reviews user (.+)$").unwrap());
static REVIEWS_GROUP: Lazy<Regex> = Lazy::new(|| Regex::new(r"^reviews group (.+)$").unwrap());
static REVIEWS_HELP: Lazy<Regex> = Lazy::new(|| Regex::new(r"^reviews help\??$").unwrap());

/// A chat message the bot answers
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatCommand {
    /// Channel group's reviews in a channel, the sender's own in private
    Reviews,
    ReviewsMe,
    ReviewsUser(String),
    ReviewsGroup(String),
    Help,
}

impl ChatCommand {
    /// `None` for messages that are not addressed to the bot
    pub fn parse(message: &str) -> Option<Self> {
        let message = message.trim();
        if REVIEWS.is_match(message) {
            return Some(ChatCommand::Reviews);
        }
        if REVIEWS_ME.is_match(message) {
            return Some(ChatCommand::ReviewsMe);
        }
        if REVIEWS_HELP.is_match(message) {
            return Some(ChatCommand::Help);
        }
        if let Some(name) = capture(&REVIEWS_USER, message) {
            return Some(ChatCommand::ReviewsUser(name));
        }
        capture(&REVIEWS_GROUP, message).map(ChatCommand::ReviewsGroup)
    }
}

fn capture(re: &Regex, message: &str) -> Option<String> {
    let name = re.captures(message)?.get(1)?.as_str().trim();
    (!name.is_empty()).then(|| name.to_string())
}
