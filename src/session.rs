use std::fmt;

use thiserror::Error;

use crate::backend::FormFields;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    #[error("Fill up all of the fields!")]
    MissingFields,
}

/// Login pair kept in memory for the running session only.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

impl Credentials {
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Result<Self, SessionError> {
        let email = email.into();
        let password = password.into();
        if email.is_empty() || password.is_empty() {
            return Err(SessionError::MissingFields);
        }
        Ok(Self { email, password })
    }

    pub fn form_fields(&self) -> FormFields {
        vec![
            ("email", self.email.clone()),
            ("password", self.password.clone()),
        ]
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}

#[derive(Clone, Default, PartialEq, Eq)]
pub struct SignUpForm {
    pub email: String,
    pub first_name: String,
    pub password: String,
    pub repeated_password: String,
}

impl SignUpForm {
    /// Only checks that every field is filled; matching passwords is the server's call.
    pub fn validate(&self) -> Result<Credentials, SessionError> {
        if self.first_name.is_empty() || self.repeated_password.is_empty() {
            return Err(SessionError::MissingFields);
        }
        Credentials::new(self.email.clone(), self.password.clone())
    }

    pub fn form_fields(&self) -> FormFields {
        vec![
            ("email", self.email.clone()),
            ("firstName", self.first_name.clone()),
            ("password", self.password.clone()),
            ("repeatedPassword", self.repeated_password.clone()),
        ]
    }
}

impl fmt::Debug for SignUpForm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SignUpForm")
            .field("email", &self.email)
            .field("first_name", &self.first_name)
            .finish_non_exhaustive()
    }
}
