/// Input validators for the HTTP layer
///
/// Every function returns the normalized value on success so handlers can
/// validate and bind in one step.

use lazy_static::lazy_static;
use regex::Regex;
use url::Url;

const MIN_LOGIN_LENGTH: usize = 4;
const MAX_LOGIN_LENGTH: usize = 128;
const MIN_PASSWORD_LENGTH: usize = 8;
const MAX_PASSWORD_BYTES: usize = 72; // bcrypt input limit
const MAX_URL_LENGTH: usize = 2048;
const PASSWORD_SPECIAL_CHARACTERS: &str = "!*&^?#@)(-+=$_";

lazy_static! {
    static ref ALIAS_REGEX: Regex = Regex::new(r"^[A-Za-z0-9_-]{1,64}$").unwrap();
}

#[derive(Debug, thiserror::Error)]
pub enum ValidationError {
    #[error("{0} is empty")]
    EmptyField(&'static str),
    #[error("{0} is too short (minimum {1} characters)")]
    TooShort(&'static str, usize),
    #[error("{0} is too long (maximum {1})")]
    TooLong(&'static str, usize),
    #[error("{0} has invalid format")]
    InvalidFormat(&'static str),
    #[error("password must contain one of {}", PASSWORD_SPECIAL_CHARACTERS)]
    MissingSpecialCharacter,
}

/// Login used at sign up: 4 to 128 characters after trimming.
pub fn is_valid_login(login: &str) -> Result<String, ValidationError> {
    let trimmed = is_present("login", login)?;

    let length = trimmed.chars().count();
    if length < MIN_LOGIN_LENGTH {
        return Err(ValidationError::TooShort("login", MIN_LOGIN_LENGTH));
    }
    if length > MAX_LOGIN_LENGTH {
        return Err(ValidationError::TooLong("login", MAX_LOGIN_LENGTH));
    }
    if trimmed.chars().any(|c| c.is_control()) {
        return Err(ValidationError::InvalidFormat("login"));
    }

    Ok(trimmed.to_string())
}

/// Password used at sign up. Not trimmed: whitespace is part of the secret.
pub fn is_valid_password(password: &str) -> Result<String, ValidationError> {
    if password.is_empty() {
        return Err(ValidationError::EmptyField("password"));
    }
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(ValidationError::TooShort("password", MIN_PASSWORD_LENGTH));
    }
    if password.len() > MAX_PASSWORD_BYTES {
        return Err(ValidationError::TooLong("password", MAX_PASSWORD_BYTES));
    }
    if !password.chars().any(|c| PASSWORD_SPECIAL_CHARACTERS.contains(c)) {
        return Err(ValidationError::MissingSpecialCharacter);
    }

    Ok(password.to_string())
}

/// Absolute http(s) URL with a host.
pub fn is_valid_url(raw: &str) -> Result<String, ValidationError> {
    let trimmed = is_present("url", raw)?;
    if trimmed.len() > MAX_URL_LENGTH {
        return Err(ValidationError::TooLong("url", MAX_URL_LENGTH));
    }

    let parsed = Url::parse(trimmed).map_err(|_| ValidationError::InvalidFormat("url"))?;
    if !matches!(parsed.scheme(), "http" | "https") || parsed.host_str().is_none() {
        return Err(ValidationError::InvalidFormat("url"));
    }

    Ok(trimmed.to_string())
}

/// Optional custom alias. `None` or blank means "generate one".
pub fn is_valid_alias(alias: Option<&str>) -> Result<Option<String>, ValidationError> {
    match alias.map(str::trim) {
        None | Some("") => Ok(None),
        Some(alias) if ALIAS_REGEX.is_match(alias) => Ok(Some(alias.to_string())),
        Some(_) => Err(ValidationError::InvalidFormat("alias")),
    }
}

/// Non-blank value, trimmed.
pub fn is_present<'a>(field: &'static str, value: &'a str) -> Result<&'a str, ValidationError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::EmptyField(field));
    }
    Ok(trimmed)
}
