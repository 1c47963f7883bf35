//! Input validation for the public API
//! Bounds every user-supplied string before it reaches storage

use anyhow::{anyhow, Result};
use regex::Regex;
use std::sync::OnceLock;

/// Maximum lengths for stored fields
pub const MAX_EMAIL_LENGTH: usize = 254;
pub const MAX_NAME_LENGTH: usize = 128; // display names (users, lists)
pub const MAX_ITEM_NAME_LENGTH: usize = 256;
pub const MAX_FREE_TEXT_LENGTH: usize = 1_000; // descriptions, quantity, characteristics, messages
pub const MIN_PASSWORD_LENGTH: usize = 6;
pub const MAX_PASSWORD_LENGTH: usize = 512;

fn email_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    // Deliberately loose: one @, non-empty local and domain, a dot in the domain
    RE.get_or_init(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("static regex"))
}

/// Validate an email address
pub fn validate_email(email: &str) -> Result<()> {
    if email.trim().is_empty() {
        return Err(anyhow!("email cannot be empty"));
    }

    if email.len() > MAX_EMAIL_LENGTH {
        return Err(anyhow!(
            "email too long: {} chars (max: {})",
            email.len(),
            MAX_EMAIL_LENGTH
        ));
    }

    if !email_regex().is_match(email) {
        return Err(anyhow!("invalid email address"));
    }

    Ok(())
}

/// Validate a password at registration time
pub fn validate_password(password: &str) -> Result<()> {
    if password.len() < MIN_PASSWORD_LENGTH {
        return Err(anyhow!(
            "password must be at least {MIN_PASSWORD_LENGTH} characters"
        ));
    }

    if password.len() > MAX_PASSWORD_LENGTH {
        return Err(anyhow!(
            "password too long: {} chars (max: {})",
            password.len(),
            MAX_PASSWORD_LENGTH
        ));
    }

    Ok(())
}

/// Validate a list name
pub fn validate_list_name(name: &str) -> Result<()> {
    if name.trim().is_empty() {
        return Err(anyhow!("name cannot be empty"));
    }

    if name.len() > MAX_NAME_LENGTH {
        return Err(anyhow!(
            "name too long: {} chars (max: {})",
            name.len(),
            MAX_NAME_LENGTH
        ));
    }

    Ok(())
}

/// Validate an item name. Empty-after-trim names are rejected here so the
/// similarity matcher never sees a zero-length needle (it would match
/// every history entry).
pub fn validate_item_name(name: &str) -> Result<()> {
    if name.trim().is_empty() {
        return Err(anyhow!("name cannot be empty"));
    }

    if name.len() > MAX_ITEM_NAME_LENGTH {
        return Err(anyhow!(
            "name too long: {} chars (max: {})",
            name.len(),
            MAX_ITEM_NAME_LENGTH
        ));
    }

    Ok(())
}

/// Validate optional free text (descriptions, quantity, characteristics,
/// notification messages)
pub fn validate_free_text(text: &str) -> Result<()> {
    if text.len() > MAX_FREE_TEXT_LENGTH {
        return Err(anyhow!(
            "text too long: {} chars (max: {})",
            text.len(),
            MAX_FREE_TEXT_LENGTH
        ));
    }

    Ok(())
}
