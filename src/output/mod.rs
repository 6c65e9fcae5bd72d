pub mod formatter;

pub use formatter::{
    format_age, format_review_detail, format_review_line, labelled, should_use_colors, Label,
};
