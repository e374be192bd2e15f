//! Form schemas for the auth flows.
//!
//! Each form validates itself independently of any rendering layer and
//! returns plain messages for the page to display. Uniqueness and credential
//! checks live in the services; only field-level rules are here.

use serde::Deserialize;

pub const MIN_PASSWORD_LEN: usize = 6;
pub const MAX_USERNAME_LEN: usize = 20;
pub const MAX_EMAIL_LEN: usize = 120;

pub fn validate_username(username: &str, errors: &mut Vec<String>) {
    let length = username.chars().count();
    if length < 2 || length > MAX_USERNAME_LEN {
        errors.push(format!(
            "Usernames must be between 2 and {MAX_USERNAME_LEN} characters."
        ));
    } else if username.chars().any(char::is_whitespace) {
        errors.push("Usernames cannot contain spaces.".to_string());
    }
}

pub fn validate_email(email: &str, errors: &mut Vec<String>) {
    let well_formed = email.len() <= MAX_EMAIL_LEN
        && !email.contains(char::is_whitespace)
        && matches!(
            email.split_once('@'),
            Some((local, domain))
                if !local.is_empty()
                    && domain.contains('.')
                    && !domain.starts_with('.')
                    && !domain.ends_with('.')
        );
    if !well_formed {
        errors.push("That does not look like a valid email address.".to_string());
    }
}

pub fn validate_password(password: &str, confirmation: &str, errors: &mut Vec<String>) {
    if password.len() < MIN_PASSWORD_LEN {
        errors.push(format!(
            "Passwords must be at least {MIN_PASSWORD_LEN} characters."
        ));
    }
    if password != confirmation {
        errors.push("The password confirmation does not match.".to_string());
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct RegistrationForm {
    pub username: String,
    pub email: String,
    pub password: String,
    pub confirm_password: String,
}

impl RegistrationForm {
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();
        validate_username(&self.username, &mut errors);
        validate_email(&self.email, &mut errors);
        validate_password(&self.password, &self.confirm_password, &mut errors);
        errors
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoginForm {
    pub email: String,
    pub password: String,
    /// Checkbox: present ("on") when ticked, absent otherwise
    #[serde(default)]
    pub remember: Option<String>,
    /// Hidden field round-tripping the ?next= redirect target
    #[serde(default)]
    pub next: Option<String>,
}

impl LoginForm {
    pub fn remember(&self) -> bool {
        self.remember.is_some()
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct RequestResetForm {
    pub email: String,
}

impl RequestResetForm {
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();
        validate_email(&self.email, &mut errors);
        errors
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ResetPasswordForm {
    pub password: String,
    pub confirm_password: String,
}

impl ResetPasswordForm {
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();
        validate_password(&self.password, &self.confirm_password, &mut errors);
        errors
    }
}
