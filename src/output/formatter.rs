use chrono::Duration;
use owo_colors::OwoColorize;
use std::io::IsTerminal;

use crate::reviewboard::types::ReviewRequest;

/// Result labels printed in front of outcome lines
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Label {
    Shipped,
    Merged,
    Error,
}

impl Label {
    fn text(&self) -> &'static str {
        match self {
            Label::Shipped => "SHIPPED",
            Label::Merged => "MERGED",
            Label::Error => "ERROR",
        }
    }
}

/// Prefix `message` with a label, e.g. "SHIPPED: ..."
pub fn labelled(label: Label, message: &str, use_colors: bool) -> String {
    if !use_colors {
        return format!("{}: {}", label.text(), message);
    }
    match label {
        Label::Shipped => format!("{}: {}", label.text().green().bold(), message),
        Label::Merged => format!("{}: {}", label.text().yellow().bold(), message),
        Label::Error => format!("{}: {}", label.text().red().bold(), message),
    }
}

pub fn should_use_colors() -> bool {
    std::io::stdout().is_terminal()
}

/// One line per review: "{id} - {submitter} - {summary}"
pub fn format_review_line(review: &ReviewRequest, use_colors: bool) -> String {
    if use_colors {
        format!(
            "{} - {} - {}",
            review.id.bold(),
            review.submitter.yellow(),
            review.summary
        )
    } else {
        format!("{} - {} - {}", review.id, review.submitter, review.summary)
    }
}

/// Multi-line entry with repository, age and link
pub fn format_review_detail(review: &ReviewRequest, use_colors: bool) -> String {
    let repo = review.repository.as_deref().unwrap_or("");
    let age = format_age(review.age());

    if use_colors {
        format!(
            "{} - {} (updated {} ago)\n\t{}\n\t{}",
            review.id.bold(),
            repo.cyan(),
            age,
            review.url.underline(),
            review.summary
        )
    } else {
        format!(
            "{} - {} (updated {} ago)\n\t{}\n\t{}",
            review.id, repo, age, review.url, review.summary
        )
    }
}

pub fn format_age(duration: Duration) -> String {
    let hours = duration.num_hours();
    let days = duration.num_days();
    let weeks = days / 7;

    if weeks >= 1 {
        format!("{}w", weeks)
    } else if days >= 1 {
        format!("{}d", days)
    } else if hours >= 1 {
        format!("{}h", hours)
    } else {
        let minutes = duration.num_minutes();
        if minutes >= 1 {
            format!("{}m", minutes)
        } else {
            "now".to_string()
        }
    }
}
