//! Typed form errors.
//!
//! Field messages come from two places: local rules checked before a request
//! is sent, and the `data` map of a 422 response. Both land in a
//! [`FormErrors`] keyed by the form's own field enum, so a message can only
//! be attached to a field the form actually has.

use std::collections::BTreeMap;
use std::fmt;

use tracing::warn;

use shoplet_core::{Email, EmailError};

use crate::api::types::Credentials;

/// Shortest accepted password.
pub const PASSWORD_MIN_LENGTH: usize = 6;
/// Longest accepted password.
pub const PASSWORD_MAX_LENGTH: usize = 160;

/// A field of a form, addressable by its wire name.
pub trait FormField: Copy + Ord + fmt::Debug + 'static {
    /// Every field of the form.
    const ALL: &'static [Self];

    /// Name the backend uses for this field.
    fn name(self) -> &'static str;

    /// Look a field up by its wire name.
    #[must_use]
    fn from_name(name: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|field| field.name() == name)
    }
}

/// Fields of the login form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum AuthField {
    Email,
    Password,
}

impl FormField for AuthField {
    const ALL: &'static [Self] = &[Self::Email, Self::Password];

    fn name(self) -> &'static str {
        match self {
            Self::Email => "email",
            Self::Password => "password",
        }
    }
}

/// Fields of the registration form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum RegisterField {
    Email,
    Password,
    ConfirmPassword,
}

impl FormField for RegisterField {
    const ALL: &'static [Self] = &[Self::Email, Self::Password, Self::ConfirmPassword];

    fn name(self) -> &'static str {
        match self {
            Self::Email => "email",
            Self::Password => "password",
            Self::ConfirmPassword => "confirm_password",
        }
    }
}

/// Error messages attached to the fields of one form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormErrors<F: FormField> {
    fields: BTreeMap<F, String>,
}

impl<F: FormField> Default for FormErrors<F> {
    fn default() -> Self {
        Self {
            fields: BTreeMap::new(),
        }
    }
}

impl<F: FormField> FormErrors<F> {
    /// Create an empty set of errors.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Distribute a backend field map onto this form.
    ///
    /// Names the form does not know are logged and dropped.
    #[must_use]
    pub fn from_field_map(map: &BTreeMap<String, String>) -> Self {
        let mut errors = Self::new();
        for (name, message) in map {
            match F::from_name(name) {
                Some(field) => errors.insert(field, message.clone()),
                None => warn!(field = %name, message = %message, "Dropping error for unknown form field"),
            }
        }
        errors
    }

    /// Attach a message to a field, replacing any earlier one.
    pub fn insert(&mut self, field: F, message: impl Into<String>) {
        self.fields.insert(field, message.into());
    }

    /// Message attached to `field`.
    #[must_use]
    pub fn get(&self, field: F) -> Option<&str> {
        self.fields.get(&field).map(String::as_str)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Fields with their messages, in field order.
    pub fn iter(&self) -> impl Iterator<Item = (F, &str)> {
        self.fields.iter().map(|(field, message)| (*field, message.as_str()))
    }

    /// `Ok(value)` when no field has an error, otherwise `Err(self)`.
    ///
    /// # Errors
    ///
    /// Returns `self` when at least one field has an error.
    pub fn into_result<T>(self, value: T) -> Result<T, Self> {
        if self.is_empty() { Ok(value) } else { Err(self) }
    }
}

impl<F: FormField> fmt::Display for FormErrors<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (field, message) in self.iter() {
            if !first {
                f.write_str("; ")?;
            }
            write!(f, "{}: {message}", field.name())?;
            first = false;
        }
        Ok(())
    }
}

// =============================================================================
// Local Rules
// =============================================================================

fn email_message(error: &EmailError) -> String {
    match error {
        EmailError::TooShort { min } => format!("Email must be at least {min} characters"),
        EmailError::TooLong { max } => format!("Email must be at most {max} characters"),
        EmailError::Malformed => "Email is not valid".to_string(),
    }
}

fn password_message(password: &str) -> Option<String> {
    let len = password.chars().count();
    if len < PASSWORD_MIN_LENGTH {
        Some(format!(
            "Password must be at least {PASSWORD_MIN_LENGTH} characters"
        ))
    } else if len > PASSWORD_MAX_LENGTH {
        Some(format!(
            "Password must be at most {PASSWORD_MAX_LENGTH} characters"
        ))
    } else {
        None
    }
}

/// Check the login form and build its request body.
///
/// # Errors
///
/// Returns the field errors when the email or password breaks a local rule.
pub fn validate_login(email: &str, password: &str) -> Result<Credentials, FormErrors<AuthField>> {
    let mut errors = FormErrors::new();
    let parsed = Email::parse(email)
        .inspect_err(|e| errors.insert(AuthField::Email, email_message(e)))
        .ok();
    if let Some(message) = password_message(password) {
        errors.insert(AuthField::Password, message);
    }

    match parsed {
        Some(email) => errors.into_result(Credentials::new(email.into_inner(), password)),
        None => Err(errors),
    }
}

/// Check the registration form and build its request body.
///
/// `confirm_password` must equal `password`; it is never sent.
///
/// # Errors
///
/// Returns the field errors when any field breaks a local rule.
pub fn validate_register(
    email: &str,
    password: &str,
    confirm_password: &str,
) -> Result<Credentials, FormErrors<RegisterField>> {
    let mut errors = FormErrors::new();
    let parsed = Email::parse(email)
        .inspect_err(|e| errors.insert(RegisterField::Email, email_message(e)))
        .ok();
    if let Some(message) = password_message(password) {
        errors.insert(RegisterField::Password, message);
    }
    if confirm_password.is_empty() {
        errors.insert(RegisterField::ConfirmPassword, "Please confirm the password");
    } else if confirm_password != password {
        errors.insert(RegisterField::ConfirmPassword, "Passwords do not match");
    }

    match parsed {
        Some(email) => errors.into_result(Credentials::new(email.into_inner(), password)),
        None => Err(errors),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use secrecy::ExposeSecret;

    use super::*;

    #[test]
    fn test_from_name() {
        assert_eq!(RegisterField::from_name("confirm_password"), Some(RegisterField::ConfirmPassword));
        assert_eq!(AuthField::from_name("confirm_password"), None);
        assert_eq!(AuthField::from_name("email"), Some(AuthField::Email));
    }

    #[test]
    fn test_from_field_map_drops_unknown() {
        let map = BTreeMap::from([
            ("email".to_string(), "Email already exists".to_string()),
            ("nickname".to_string(), "ignored".to_string()),
        ]);

        let errors = FormErrors::<RegisterField>::from_field_map(&map);

        assert_eq!(errors.len(), 1);
        assert_eq!(errors.get(RegisterField::Email), Some("Email already exists"));
        assert_eq!(errors.get(RegisterField::Password), None);
    }

    #[test]
    fn test_display() {
        let mut errors = FormErrors::new();
        errors.insert(AuthField::Password, "too short");
        errors.insert(AuthField::Email, "taken");
        assert_eq!(errors.to_string(), "email: taken; password: too short");
    }

    #[test]
    fn test_validate_login_ok() {
        let credentials = validate_login("  lan@shop.vn ", "secret1").unwrap();
        assert_eq!(credentials.email, "lan@shop.vn");
        assert_eq!(credentials.password.expose_secret(), "secret1");
    }

    #[test]
    fn test_validate_login_reports_each_field() {
        let errors = validate_login("a@b", "123").unwrap_err();
        assert!(errors.get(AuthField::Email).unwrap().contains("at least 5"));
        assert!(errors.get(AuthField::Password).unwrap().contains("at least 6"));
    }

    #[test]
    fn test_validate_login_password_bounds() {
        assert!(validate_login("lan@shop.vn", &"x".repeat(160)).is_ok());
        let errors = validate_login("lan@shop.vn", &"x".repeat(161)).unwrap_err();
        assert!(errors.get(AuthField::Email).is_none());
        assert!(errors.get(AuthField::Password).is_some());
    }

    #[test]
    fn test_validate_register_confirm() {
        let errors = validate_register("lan@shop.vn", "secret1", "secret2").unwrap_err();
        assert_eq!(
            errors.get(RegisterField::ConfirmPassword),
            Some("Passwords do not match")
        );
        assert_eq!(errors.len(), 1);

        let errors = validate_register("lan@shop.vn", "secret1", "").unwrap_err();
        assert!(errors.get(RegisterField::ConfirmPassword).is_some());

        assert!(validate_register("lan@shop.vn", "secret1", "secret1").is_ok());
    }

    #[test]
    fn test_validate_register_malformed_email() {
        let errors = validate_register("lan@localhost", "secret1", "secret1").unwrap_err();
        assert_eq!(errors.get(RegisterField::Email), Some("Email is not valid"));
    }
}
