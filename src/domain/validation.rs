//! Field limits enforced before a request reaches the services.

use super::error::DomainError;

pub const USERNAME_MAX: usize = 50;
pub const EMAIL_MAX: usize = 255;
pub const TITLE_MAX: usize = 200;
pub const SUMMARY_MAX: usize = 500;
pub const TAG_NAME_MAX: usize = 50;
pub const COMMENT_AUTHOR_MAX: usize = 100;

/// Reject values longer than `max` characters.
pub fn max_chars(field: &'static str, value: &str, max: usize) -> Result<(), DomainError> {
    if value.chars().count() > max {
        return Err(DomainError::validation(format!(
            "`{field}` must be at most {max} characters"
        )));
    }
    Ok(())
}

/// Reject values that are empty after trimming.
pub fn required(field: &'static str, value: &str) -> Result<(), DomainError> {
    if value.trim().is_empty() {
        return Err(DomainError::validation(format!("`{field}` must not be empty")));
    }
    Ok(())
}

/// Trim tag names, drop blanks and duplicates while keeping first-seen order.
pub fn normalize_tags(names: &[String]) -> Result<Vec<String>, DomainError> {
    let mut normalized: Vec<String> = Vec::with_capacity(names.len());
    for name in names {
        let name = name.trim();
        if name.is_empty() {
            continue;
        }
        max_chars("tags", name, TAG_NAME_MAX)?;
        if !normalized.iter().any(|existing| existing == name) {
            normalized.push(name.to_string());
        }
    }
    Ok(normalized)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn max_chars_counts_characters_not_bytes() {
        assert!(max_chars("title", "ééé", 3).is_ok());
        assert!(max_chars("title", "éééé", 3).is_err());
    }

    #[test]
    fn required_rejects_whitespace() {
        assert!(required("username", "  ").is_err());
        assert!(required("username", "ada").is_ok());
    }

    #[test]
    fn normalize_tags_dedupes_and_trims() {
        let tags = vec![
            " rust ".to_string(),
            "".to_string(),
            "rust".to_string(),
            "cache".to_string(),
        ];
        assert_eq!(normalize_tags(&tags).unwrap(), vec!["rust", "cache"]);
    }

    #[test]
    fn normalize_tags_enforces_length() {
        let tags = vec!["x".repeat(TAG_NAME_MAX + 1)];
        assert!(matches!(
            normalize_tags(&tags),
            Err(DomainError::Validation { .. })
        ));
    }
}
