//! Request DTOs for the local vault API
//!
//! Defines the structure of incoming HTTP request bodies.

use serde::Deserialize;

/// Maximum accepted username length in bytes
const MAX_USERNAME_LENGTH: usize = 64;

/// Request body for `POST /__pokevault/register` and `POST /__pokevault/login`
#[derive(Debug, Clone, Deserialize)]
pub struct CredentialsRequest {
    pub username: String,
    pub password: String,
}

impl CredentialsRequest {
    /// Validates the request data
    ///
    /// Returns an error message if validation fails, None if valid.
    pub fn validate(&self) -> Option<String> {
        if self.username.is_empty() {
            return Some("Username cannot be empty".to_string());
        }
        if self.username.len() > MAX_USERNAME_LENGTH {
            return Some(format!(
                "Username exceeds maximum length of {} characters",
                MAX_USERNAME_LENGTH
            ));
        }
        if self.password.is_empty() {
            return Some("Password cannot be empty".to_string());
        }
        None
    }
}
