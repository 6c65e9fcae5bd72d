use std::io::Write;

use super::CommandError;
use crate::output::{format_review_detail, format_review_line};
use crate::reviewboard::{pending_reviews, PendingFilter, ReviewServer};

#[derive(Debug, Clone)]
pub struct ListMineOptions {
    pub filter: PendingFilter,
    pub use_colors: bool,
}

/// Summary line for a pending-review listing
pub fn summary_line(count: usize, filter: &PendingFilter) -> String {
    match filter {
        PendingFilter::FromUser(_) => {
            format!("Got {} pending/unsubmitted reviews {}", count, filter.describe())
        }
        _ => format!(
            "Got {} pending/unsubmitted reviews for {}",
            count,
            filter.describe()
        ),
    }
}

/// Print every pending review for the filter and return how many there were.
pub async fn run(
    server: &dyn ReviewServer,
    options: &ListMineOptions,
    out: &mut dyn Write,
) -> Result<usize, CommandError> {
    let pending = pending_reviews(server, &options.filter, None).await?;

    for review in &pending.reviews {
        let line = match options.filter {
            PendingFilter::FromUser(_) => format_review_detail(review, options.use_colors),
            _ => format_review_line(review, options.use_colors),
        };
        writeln!(out, "{}", line)?;
    }
    writeln!(out, "{}", summary_line(pending.total_results, &options.filter))?;
    Ok(pending.total_results)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reviewboard::fake::{review_request, FakeServer};

    fn server() -> FakeServer {
        FakeServer::new()
            .with_targeted_request(review_request(1, "a", "alice"), &["dave"], &[])
            .with_targeted_request(review_request(2, "b", "bob"), &["dave"], &["ops"])
            .with_targeted_request(review_request(3, "c", "carol"), &["dave"], &[])
            .with_targeted_request(review_request(4, "d", "dave"), &["erin"], &["ops"])
    }

    #[tokio::test]
    async fn test_lists_reviews_for_user_across_pages() {
        let options = ListMineOptions {
            filter: PendingFilter::ToUser("dave".to_string()),
            use_colors: false,
        };
        let mut out = Vec::new();

        let count = run(&server(), &options, &mut out).await.unwrap();

        assert_eq!(count, 3);
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "1 - alice - Review 1\n\
             2 - bob - Review 2\n\
             3 - carol - Review 3\n\
             Got 3 pending/unsubmitted reviews for user 'dave'\n"
        );
    }

    #[tokio::test]
    async fn test_lists_reviews_for_group() {
        let options = ListMineOptions {
            filter: PendingFilter::ToGroup("ops".to_string()),
            use_colors: false,
        };
        let mut out = Vec::new();

        let count = run(&server(), &options, &mut out).await.unwrap();

        assert_eq!(count, 2);
        let text = String::from_utf8(out).unwrap();
        assert!(text.ends_with("Got 2 pending/unsubmitted reviews for group 'ops'\n"));
    }

    #[tokio::test]
    async fn test_posted_uses_detail_format() {
        let options = ListMineOptions {
            filter: PendingFilter::FromUser("dave".to_string()),
            use_colors: false,
        };
        let mut out = Vec::new();

        let count = run(&server(), &options, &mut out).await.unwrap();

        assert_eq!(count, 1);
        let text = String::from_utf8(out).unwrap();
        assert!(text.starts_with("4 -  (updated "));
        assert!(text.contains("\n\thttps://rb.example.com/r/4/\n\tReview 4\n"));
        assert!(text.ends_with("Got 1 pending/unsubmitted reviews posted by 'dave'\n"));
    }

    #[tokio::test]
    async fn test_server_failure_propagates() {
        let options = ListMineOptions {
            filter: PendingFilter::ToUser("dave".to_string()),
            use_colors: false,
        };
        let err = run(&FakeServer::new().failing(), &options, &mut Vec::new())
            .await
            .unwrap_err();
        assert_eq!(err.exit_code(), crate::commands::EXIT_FAILURE);
    }
}
