//! Input validation utilities

use regex::Regex;
use std::ops::RangeInclusive;
use std::sync::OnceLock;

use crate::models::{NewUser, Patch, Role, UpdateUser};

const MAX_BIO_LEN: usize = 512;

const USERNAME_LEN: RangeInclusive<usize> = 3..=32;
const MAX_EMAIL_LEN: usize = 254;

fn username_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^[A-Za-z0-9_]+$").expect("username pattern compiles"))
}

fn email_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}$")
            .expect("email pattern compiles")
    })
}

/// Validate username
pub fn validate_username(username: &str) -> Result<(), String> {
    if username.is_empty() {
        return Err("Username is required".to_string());
    }

    if !USERNAME_LEN.contains(&username.chars().count()) {
        return Err(format!(
            "Username must be between {} and {} characters long",
            USERNAME_LEN.start(),
            USERNAME_LEN.end()
        ));
    }

    if !username_pattern().is_match(username) {
        return Err("Username can only contain letters, numbers, and underscores".to_string());
    }

    Ok(())
}

/// Validate email
pub fn validate_email(email: &str) -> Result<(), String> {
    match email.len() {
        0 => Err("Email is required".to_string()),
        n if n > MAX_EMAIL_LEN => Err(format!(
            "Email must be at most {} characters long",
            MAX_EMAIL_LEN
        )),
        _ if !email_pattern().is_match(email) => Err("Invalid email format".to_string()),
        _ => Ok(()),
    }
}

const PASSWORD_LEN: RangeInclusive<usize> = 8..=128;

/// Character classes a password must draw from, checked in order
const PASSWORD_CLASSES: [(fn(char) -> bool, &str); 4] = [
    (|c| c.is_ascii_uppercase(), "an uppercase letter"),
    (|c| c.is_ascii_lowercase(), "a lowercase letter"),
    (|c| c.is_ascii_digit(), "a digit"),
    (|c| !c.is_alphanumeric() && !c.is_whitespace(), "a special character"),
];

/// Validate password strength
pub fn validate_password(password: &str) -> Result<(), String> {
    if password.is_empty() {
        return Err("Password is required".to_string());
    }

    if !PASSWORD_LEN.contains(&password.chars().count()) {
        return Err(format!(
            "Password must be between {} and {} characters long",
            PASSWORD_LEN.start(),
            PASSWORD_LEN.end()
        ));
    }

    for (in_class, class) in PASSWORD_CLASSES {
        if !password.chars().any(in_class) {
            return Err(format!("Password must contain at least {}", class));
        }
    }

    Ok(())
}

/// Validate bio; empty is allowed
pub fn validate_bio(bio: &str) -> Result<(), String> {
    if bio.chars().count() > MAX_BIO_LEN {
        return Err(format!("Bio must be at most {} characters long", MAX_BIO_LEN));
    }
    Ok(())
}

/// Validate an explicit role list
pub fn validate_roles(roles: &[Role]) -> Result<(), String> {
    if roles.is_empty() {
        return Err("At least one role is required".to_string());
    }
    Ok(())
}

/// Validate a registration payload
pub fn validate_new_user(user: &NewUser) -> Result<(), String> {
    validate_username(&user.username)?;
    validate_email(&user.email)?;
    validate_password(&user.password)?;
    if let Some(bio) = &user.bio {
        validate_bio(bio)?;
    }
    Ok(())
}

/// Validate every present field of an update
pub fn validate_update(update: &UpdateUser) -> Result<(), String> {
    if let Some(username) = &update.username {
        validate_username(username)?;
    }
    if let Some(email) = &update.email {
        validate_email(email)?;
    }
    if let Some(password) = &update.password {
        validate_password(password)?;
    }
    if let Patch::Set(bio) = &update.bio {
        validate_bio(bio)?;
    }
    Ok(())
}
