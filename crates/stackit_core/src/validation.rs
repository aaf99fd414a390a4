//! crates/stackit_core/src/validation.rs
//!
//! Input normalisation shared by the forum operations.

use regex::Regex;
use std::collections::BTreeSet;
use std::sync::LazyLock;

use crate::error::{ForumError, ForumResult};

pub const MAX_TAGS: usize = 5;
pub const MAX_TAG_LEN: usize = 32;
pub const MAX_TITLE_LEN: usize = 200;

static TAG_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[a-z0-9][a-z0-9+#.\-]*$").expect("tag pattern is a valid regex")
});

/// Trims `value` and rejects it if nothing is left.
pub fn required_text(field: &str, value: &str) -> ForumResult<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ForumError::Validation(format!("{field} is required")));
    }
    Ok(trimmed.to_string())
}

pub fn title(value: &str) -> ForumResult<String> {
    let title = required_text("title", value)?;
    if title.chars().count() > MAX_TITLE_LEN {
        return Err(ForumError::Validation(format!(
            "title must be at most {MAX_TITLE_LEN} characters"
        )));
    }
    Ok(title)
}

pub fn email(value: &str) -> ForumResult<String> {
    let email = required_text("email", value)?;
    match email.split_once('@') {
        Some((local, domain)) if !local.is_empty() && !domain.is_empty() => {
            Ok(email.to_lowercase())
        }
        _ => Err(ForumError::Validation(format!(
            "'{email}' is not a valid email address"
        ))),
    }
}

/// Lower-cases, trims and de-duplicates tags, dropping blank entries.
pub fn tags(raw: &[String]) -> ForumResult<BTreeSet<String>> {
    let mut tags = BTreeSet::new();
    for tag in raw {
        let tag = tag.trim().to_lowercase();
        if tag.is_empty() {
            continue;
        }
        if tag.len() > MAX_TAG_LEN || !TAG_PATTERN.is_match(&tag) {
            return Err(ForumError::Validation(format!("invalid tag '{tag}'")));
        }
        tags.insert(tag);
    }
    if tags.len() > MAX_TAGS {
        return Err(ForumError::Validation(format!(
            "a question can have at most {MAX_TAGS} tags"
        )));
    }
    Ok(tags)
}
