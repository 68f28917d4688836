// Request field validation shared by the public and protected handlers
use chrono::NaiveDate;

use crate::database::models::BIRTH_DATE_FORMAT;
use crate::error::ApiError;

pub const MIN_PASSWORD_LEN: usize = 6;
const MAX_NAME_LEN: usize = 255;

pub fn validate_username_format(username: &str) -> Result<(), String> {
    if username.is_empty() {
        return Err("Username cannot be empty".to_string());
    }

    if username.chars().count() < 3 {
        return Err("Username must be at least 3 characters".to_string());
    }

    if username.chars().count() > 50 {
        return Err("Username must be less than 50 characters".to_string());
    }

    // Allow alphanumeric, underscore, hyphen, dot
    if !username
        .chars()
        .all(|c| c.is_alphanumeric() || c == '_' || c == '-' || c == '.')
    {
        return Err("Username can only contain letters, numbers, underscore, hyphen and dot".to_string());
    }

    if !username.chars().next().is_some_and(char::is_alphanumeric) {
        return Err("Username must start with a letter or number".to_string());
    }

    Ok(())
}

pub fn validate_email_format(email: &str) -> Result<(), String> {
    if email.is_empty() {
        return Err("Email cannot be empty".to_string());
    }

    let Some((local, domain)) = email.split_once('@') else {
        return Err("Invalid email format".to_string());
    };
    if local.is_empty() || domain.is_empty() || domain.contains('@') || !domain.contains('.') {
        return Err("Invalid email format".to_string());
    }
    if domain.starts_with('.') || domain.ends_with('.') || email.chars().any(char::is_whitespace) {
        return Err("Invalid email format".to_string());
    }

    Ok(())
}

pub fn validate_password(password: &str) -> Result<(), String> {
    if password.is_empty() {
        return Err("Password cannot be empty".to_string());
    }
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(format!("Password must be at least {} characters", MIN_PASSWORD_LEN));
    }
    Ok(())
}

/// Non-blank name/title bounded to the column width
pub fn validate_name(value: &str) -> Result<(), String> {
    if value.trim().is_empty() {
        return Err("is required".to_string());
    }
    if value.chars().count() > MAX_NAME_LEN {
        return Err(format!("must be at most {} characters", MAX_NAME_LEN));
    }
    Ok(())
}

pub fn validate_id(value: i64) -> Result<(), String> {
    if value <= 0 {
        return Err("must be a positive id".to_string());
    }
    Ok(())
}

/// `DD-MM-YYYY`; blank means unset
pub fn parse_birth_date(raw: Option<&str>) -> Result<Option<NaiveDate>, String> {
    match raw.map(str::trim) {
        None | Some("") => Ok(None),
        Some(s) => NaiveDate::parse_from_str(s, BIRTH_DATE_FORMAT)
            .map(Some)
            .map_err(|_| "must be a date in DD-MM-YYYY format".to_string()),
    }
}

/// Run a field check and turn failure into a 400 naming the field
pub fn check(field: &str, result: Result<(), String>) -> Result<(), ApiError> {
    result.map_err(|problem| ApiError::invalid_field(field, problem))
}
