//! Authentication error types.

use thiserror::Error;

use crate::api::ApiError;
use crate::forms::{FormErrors, FormField};
use crate::storage::StorageError;

/// Errors that can occur during login, registration and logout.
///
/// `F` is the field enum of the form that started the operation.
#[derive(Debug, Error)]
pub enum AuthError<F: FormField> {
    /// One or more fields were rejected, locally or by the backend (HTTP 422).
    #[error("invalid form: {0}")]
    Form(FormErrors<F>),

    /// The backend call failed for any other reason.
    #[error("api error: {0}")]
    Api(#[source] ApiError),

    /// The session could not be persisted or removed.
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),
}

impl<F: FormField> AuthError<F> {
    /// Field errors, when the failure was a validation failure.
    #[must_use]
    pub const fn form_errors(&self) -> Option<&FormErrors<F>> {
        match self {
            Self::Form(errors) => Some(errors),
            _ => None,
        }
    }
}

impl<F: FormField> From<ApiError> for AuthError<F> {
    /// A 422 is distributed onto the form's fields. A 422 naming none of
    /// them, and anything else, stays an API error with its message.
    fn from(error: ApiError) -> Self {
        if let ApiError::UnprocessableEntity { fields, .. } = &error {
            let errors = FormErrors::from_field_map(fields);
            if !errors.is_empty() {
                return Self::Form(errors);
            }
        }
        Self::Api(error)
    }
}

impl<F: FormField> From<FormErrors<F>> for AuthError<F> {
    fn from(errors: FormErrors<F>) -> Self {
        Self::Form(errors)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;
    use crate::forms::{AuthField, RegisterField};

    #[test]
    fn test_unprocessable_maps_to_form() {
        let error: AuthError<RegisterField> = ApiError::UnprocessableEntity {
            message: "Lỗi".to_string(),
            fields: BTreeMap::from([("email".to_string(), "Email đã tồn tại".to_string())]),
        }
        .into();

        let errors = error.form_errors().map(|f| f.get(RegisterField::Email));
        assert_eq!(errors, Some(Some("Email đã tồn tại")));
    }

    #[test]
    fn test_unprocessable_without_known_fields_keeps_message() {
        let error: AuthError<AuthField> = ApiError::UnprocessableEntity {
            message: "Email hoặc mật khẩu không đúng".to_string(),
            fields: BTreeMap::from([("captcha".to_string(), "sai".to_string())]),
        }
        .into();

        assert!(error.form_errors().is_none());
        assert!(matches!(error, AuthError::Api(ApiError::UnprocessableEntity { .. })));
        assert!(error.to_string().contains("Email hoặc mật khẩu không đúng"));

        let error: AuthError<AuthField> = ApiError::UnprocessableEntity {
            message: "Lỗi".to_string(),
            fields: BTreeMap::new(),
        }
        .into();
        assert_eq!(error.to_string(), "api error: Validation failed: Lỗi");
    }

    #[test]
    fn test_other_errors_pass_through() {
        let error: AuthError<RegisterField> = ApiError::NotFound("gone".to_string()).into();
        assert!(matches!(error, AuthError::Api(ApiError::NotFound(_))));
        assert!(error.form_errors().is_none());
    }
}
