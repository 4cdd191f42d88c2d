use argon2::Config;
use chrono::{DateTime, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::{
    api::id::ApiId,
    db::user::{NewUser, User},
};

pub const MIN_PASSWORD_LENGTH: usize = 8;

/// Details for a new account, received from a user. These are never stored
/// directly, since the password is in plaintext.
#[derive(Clone, Deserialize, Serialize)]
pub struct SignupRequest {
    pub name: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Error)]
pub enum SignupError {
    #[error("Name must not be empty")]
    EmptyName,
    #[error("Invalid email address: {0:?}")]
    InvalidEmail(String),
    #[error("Password must be at least {MIN_PASSWORD_LENGTH} characters")]
    ShortPassword,
    #[error(transparent)]
    Hash(#[from] argon2::Error),
}

impl TryFrom<SignupRequest> for NewUser {
    type Error = SignupError;

    /// Convert a [`SignupRequest`] to a new [`User`] by hashing the password.
    /// Emails are compared case-insensitively, so they are stored lowercase.
    fn try_from(request: SignupRequest) -> Result<Self, Self::Error> {
        let name = request.name.trim();
        if name.is_empty() {
            return Err(SignupError::EmptyName);
        }
        let email = request.email.trim().to_lowercase();
        if email.is_empty() || !email.contains('@') {
            return Err(SignupError::InvalidEmail(request.email));
        }
        if request.password.chars().count() < MIN_PASSWORD_LENGTH {
            return Err(SignupError::ShortPassword);
        }

        // 16 bytes is recommended for password hashing:
        //  https://en.wikipedia.org/wiki/Argon2
        let mut salt = [0_u8; 16];
        rand::thread_rng().fill(&mut salt);
        let password_hash =
            argon2::hash_encoded(request.password.as_bytes(), &salt, &Config::default())?;

        Ok(Self {
            name: name.to_string(),
            email,
            password_hash,
            created_at: Utc::now(),
        })
    }
}

/// Credentials for signing in.
#[derive(Clone, Deserialize, Serialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

impl LoginRequest {
    /// The email as it would have been stored.
    pub fn normalised_email(&self) -> String {
        self.email.trim().to_lowercase()
    }
}

/// A user as seen by the API. Never includes the password hash.
#[derive(Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserDescription {
    pub id: ApiId,
    pub name: String,
    pub email: String,
    pub created_at: DateTime<Utc>,
}

impl From<User> for UserDescription {
    fn from(user: User) -> Self {
        Self {
            id: user.id.into(),
            name: user.user.name,
            email: user.user.email,
            created_at: user.user.created_at,
        }
    }
}

#[cfg(test)]
mod examples {
    use super::*;

    impl SignupRequest {
        pub fn example1() -> Self {
            Self {
                name: "Ada Lovelace".into(),
                email: "ada@example.org".into(),
                password: "analytical-engine".into(),
            }
        }

        pub fn example2() -> Self {
            Self {
                name: "Charles Babbage".into(),
                email: "charles@example.org".into(),
                password: "difference-engine".into(),
            }
        }
    }

    impl LoginRequest {
        pub fn example1() -> Self {
            let signup = SignupRequest::example1();
            Self {
                email: signup.email,
                password: signup.password,
            }
        }

        pub fn example2() -> Self {
            let signup = SignupRequest::example2();
            Self {
                email: signup.email,
                password: signup.password,
            }
        }
    }
}
