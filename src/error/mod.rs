use argon2::Error as Argon2Error;
use jsonwebtoken::errors::{Error as JwtError, ErrorKind as JwtErrorKind};
use mongodb::error::Error as DbError;
use rocket::{
    http::Status,
    response::{self, Responder},
    serde::json::{json, Json},
    Request,
};
use thiserror::Error;

use crate::{ai::AiError, results::ExportError};

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Db(#[from] DbError),
    #[error(transparent)]
    Jwt(#[from] JwtError),
    #[error(transparent)]
    Argon2(#[from] Argon2Error),
    #[error(transparent)]
    Ai(#[from] AiError),
    #[error(transparent)]
    Export(#[from] ExportError),
    #[error("{1}")]
    Status(Status, String),
}

impl Error {
    /// Shorthand for a 404 naming the thing that wasn't found.
    pub fn not_found(what: impl Into<String>) -> Self {
        Self::Status(Status::NotFound, format!("Not found: {}", what.into()))
    }

    /// Shorthand for a 400 with an explanation.
    pub fn bad_request(why: impl Into<String>) -> Self {
        Self::Status(Status::BadRequest, why.into())
    }

    /// The HTTP status this error maps to.
    pub fn status(&self) -> Status {
        match self {
            Self::Db(_) | Self::Argon2(_) => Status::InternalServerError,
            Self::Jwt(err) => match err.kind() {
                JwtErrorKind::ExpiredSignature | JwtErrorKind::ImmatureSignature => {
                    Status::Unauthorized
                }
                _ => Status::BadRequest,
            },
            Self::Ai(err) => err.status(),
            Self::Export(ExportError::Empty) => Status::UnprocessableEntity,
            Self::Export(ExportError::Workbook(_)) => Status::InternalServerError,
            Self::Status(status, _) => *status,
        }
    }
}

impl<'r, 'o: 'r> Responder<'r, 'o> for Error {
    fn respond_to(self, req: &'r Request<'_>) -> response::Result<'o> {
        let status = self.status();
        if status.code >= 500 {
            error!("{self}");
        } else {
            debug!("{self}");
        }
        // Internal details stay in the log.
        let message = if status.code >= 500 {
            status.reason_lossy().to_string()
        } else {
            self.to_string()
        };
        let body = Json(json!({ "message": message }));
        response::Response::build_from(body.respond_to(req)?)
            .status(status)
            .ok()
    }
}
