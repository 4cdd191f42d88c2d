use std::ops::{Deref, DerefMut};

use chrono::{DateTime, Utc};
use mongodb::bson::serde_helpers::chrono_datetime_as_bson_datetime;
use serde::{Deserialize, Serialize};

use crate::model::mongodb::Id;

/// Core account data.
#[derive(Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserCore {
    pub name: String,
    pub email: String,
    pub password_hash: String,
    #[serde(with = "chrono_datetime_as_bson_datetime")]
    pub created_at: DateTime<Utc>,
}

impl UserCore {
    /// Check whether the given password is correct.
    pub fn verify_password<T: AsRef<[u8]>>(&self, password: T) -> bool {
        // A stored hash that fails to parse can never match.
        argon2::verify_encoded(&self.password_hash, password.as_ref()).unwrap_or(false)
    }
}

/// A user without an ID.
pub type NewUser = UserCore;

/// A user from the database, with its unique ID.
#[derive(Debug, Serialize, Deserialize)]
pub struct User {
    #[serde(rename = "_id")]
    pub id: Id,
    #[serde(flatten)]
    pub user: UserCore,
}

impl Deref for User {
    type Target = UserCore;

    fn deref(&self) -> &Self::Target {
        &self.user
    }
}

impl DerefMut for User {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.user
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    use crate::model::api::auth::SignupRequest;

    #[test]
    fn verify_password() {
        let user = UserCore::example();
        assert!(user.verify_password(SignupRequest::example1().password));
        assert!(!user.verify_password("wrong password"));
        assert!(!user.verify_password(""));
    }

    #[test]
    fn malformed_hash_never_verifies() {
        let mut user = UserCore::example();
        user.password_hash = "plaintext".to_string();
        assert!(!user.verify_password("plaintext"));
    }
}
