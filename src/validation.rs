//! Form validation. Each check appends a user-facing message; an empty list
//! means the input is acceptable.

pub const USERNAME_MIN: usize = 3;
pub const USERNAME_MAX: usize = 12;
pub const PASSWORD_MIN: usize = 8;
pub const PASSWORD_MAX: usize = 64;

pub const USERNAME_TAKEN: &str = "Username already taken";
pub const INVALID_CREDENTIALS: &str = "Invalid username / password";

/// `username` is expected trimmed; `password` is taken as submitted.
/// `taken` reports whether a user with that name already exists.
pub fn registration_errors(username: &str, password: &str, taken: bool) -> Vec<String> {
    let mut errors = Vec::new();
    let username_len = username.chars().count();
    let password_len = password.chars().count();

    if username.is_empty() {
        errors.push("You must provide a username".to_string());
    }
    if taken {
        errors.push(USERNAME_TAKEN.to_string());
    }
    if !username.is_empty() && username_len < USERNAME_MIN {
        errors.push(format!(
            "Username must be at least {} characters",
            USERNAME_MIN
        ));
    }
    if username_len > USERNAME_MAX {
        errors.push(format!("Username cannot exceed {} characters", USERNAME_MAX));
    }
    if !username.is_empty() && !username.chars().all(|c| c.is_ascii_alphanumeric()) {
        errors.push("Username can only contain letters and numbers".to_string());
    }

    if password.is_empty() {
        errors.push("You must provide a password".to_string());
    }
    if !password.is_empty() && password_len < PASSWORD_MIN {
        errors.push(format!(
            "Password must be at least {} characters",
            PASSWORD_MIN
        ));
    }
    if password_len > PASSWORD_MAX {
        errors.push(format!("Password cannot exceed {} characters", PASSWORD_MAX));
    }

    errors
}

/// Presence checks only; credential mismatches are added by the handler.
pub fn login_errors(username: &str, password: &str) -> Vec<String> {
    let mut errors = Vec::new();
    if username.is_empty() {
        errors.push("You must provide a username".to_string());
    }
    if password.is_empty() {
        errors.push("You must provide a password".to_string());
    }
    errors
}

/// Title must be non-blank after trimming; content only non-empty as sent.
pub fn post_errors(title: &str, content: &str) -> Vec<String> {
    let mut errors = Vec::new();
    if title.trim().is_empty() {
        errors.push("You must provide a title".to_string());
    }
    if content.is_empty() {
        errors.push("You must provide content".to_string());
    }
    errors
}

/// Positive decimal integer, or `None` (treated as not found by callers).
pub fn parse_post_id(raw: &str) -> Option<i64> {
    if raw.is_empty() || !raw.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    raw.parse::<i64>().ok().filter(|id| *id > 0)
}
