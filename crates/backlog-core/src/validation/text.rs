//! Field-level rules for free text and item status

use std::borrow::Cow;
use std::sync::LazyLock;

use regex::Regex;
use validator::ValidationError;

use crate::models::{status_choices_message, ItemStatus};

/// Angle brackets and C0 control characters other than tab, LF and CR.
static FORBIDDEN_TEXT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[<>]|[\x00-\x08\x0B\x0C\x0E-\x1F]").expect("forbidden text pattern is valid")
});

pub const FORBIDDEN_TEXT_MESSAGE: &str =
    "text contains forbidden control or angle bracket characters";

pub fn contains_forbidden_text(value: &str) -> bool {
    FORBIDDEN_TEXT.is_match(value)
}

pub fn validate_safe_text(value: &str) -> Result<(), ValidationError> {
    if contains_forbidden_text(value) {
        let mut err = ValidationError::new("safe_text")
            .with_message(Cow::Borrowed(FORBIDDEN_TEXT_MESSAGE));
        err.add_param(Cow::Borrowed("value"), &value);
        return Err(err);
    }
    Ok(())
}

pub fn validate_status(value: &str) -> Result<(), ValidationError> {
    if ItemStatus::parse(value).is_none() {
        let mut err =
            ValidationError::new("status").with_message(Cow::Owned(status_choices_message()));
        err.add_param(Cow::Borrowed("value"), &value);
        return Err(err);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_text_passes() {
        assert!(validate_safe_text("Write release notes").is_ok());
        assert!(validate_safe_text("tabs\tand\nnewlines\r\nare fine").is_ok());
        assert!(validate_safe_text("").is_ok());
    }

    #[test]
    fn test_forbidden_characters() {
        for bad in ["<b>", "a > b", "bell\x07", "nul\x00", "esc\x1b[0m", "\x0bvt"] {
            let err = validate_safe_text(bad).unwrap_err();
            assert_eq!(err.code, "safe_text");
            assert_eq!(err.message.as_deref(), Some(FORBIDDEN_TEXT_MESSAGE));
        }
    }

    #[test]
    fn test_status_rule() {
        assert!(validate_status("in_progress").is_ok());
        let err = validate_status("archived").unwrap_err();
        assert_eq!(
            err.message.as_deref(),
            Some("status must be one of: done, draft, in_progress")
        );
    }
}
