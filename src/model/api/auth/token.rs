use chrono::{serde::ts_seconds, DateTime, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, TokenData, Validation};
use rocket::{
    http::{Cookie, SameSite, Status},
    request::{FromRequest, Outcome},
    time::Duration,
    Request,
};
use serde::{Deserialize, Serialize};

use crate::config::Config;
use crate::error::{Error, Result};
use crate::model::{
    db::user::User,
    mongodb::{Coll, Id},
};

pub const AUTH_TOKEN_COOKIE: &str = "auth_token";

/// An authentication token representing a signed-in user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthToken {
    pub id: Id,
}

impl AuthToken {
    /// Create a new [`AuthToken`] for the given user.
    pub fn new(user: &User) -> Self {
        Self { id: user.id }
    }

    /// Serialize this token into a cookie.
    pub fn into_cookie(self, config: &Config) -> Result<Cookie<'static>> {
        let claims = Claims {
            token: self,
            expire_at: Utc::now() + config.auth_ttl(),
        };

        let token = jsonwebtoken::encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(config.jwt_secret()),
        )?;

        Ok(Cookie::build((AUTH_TOKEN_COOKIE, token))
            .max_age(Duration::seconds(config.auth_ttl().num_seconds()))
            .http_only(true)
            .same_site(SameSite::Strict)
            .path("/")
            .build())
    }

    /// Deserialize a token from a cookie.
    pub fn from_cookie(cookie: &Cookie<'static>, config: &Config) -> Result<Self> {
        let token = jsonwebtoken::decode(
            cookie.value(),
            &DecodingKey::from_secret(config.jwt_secret()),
            &Validation::default(),
        )
        .map(|claims: TokenData<Claims>| claims.claims.token)?;
        Ok(token)
    }
}

/// Cookie claims: the token itself plus an expiry datetime.
#[derive(Serialize, Deserialize)]
struct Claims {
    #[serde(flatten)]
    token: AuthToken,
    #[serde(rename = "exp", with = "ts_seconds")]
    expire_at: DateTime<Utc>,
}

#[rocket::async_trait]
impl<'r> FromRequest<'r> for AuthToken {
    type Error = Error;

    /// Get an [`AuthToken`] from the cookie and check the user it names still
    /// exists. Forwards with 401 when there is no usable token.
    async fn from_request(req: &'r Request<'_>) -> Outcome<Self, Self::Error> {
        let (Some(config), Some(db)) = (
            req.rocket().state::<Config>(),
            req.rocket().state::<mongodb::Database>(),
        ) else {
            return Outcome::Error((
                Status::InternalServerError,
                Error::Status(
                    Status::InternalServerError,
                    "Authentication is not configured".to_string(),
                ),
            ));
        };

        let Some(cookie) = req.cookies().get(AUTH_TOKEN_COOKIE) else {
            return Outcome::Forward(Status::Unauthorized);
        };

        let token = match Self::from_cookie(cookie, config) {
            Ok(token) => token,
            Err(err) => {
                debug!("Rejected auth token: {err}");
                return Outcome::Forward(Status::Unauthorized);
            }
        };

        match Coll::<User>::from_db(db)
            .find_one(token.id.as_doc(), None)
            .await
        {
            Ok(Some(_)) => Outcome::Success(token),
            Ok(None) => Outcome::Forward(Status::Unauthorized),
            Err(err) => Outcome::Error((Status::InternalServerError, err.into())),
        }
    }
}
