mod credentials;
mod token;

pub use credentials::{
    LoginRequest, SignupError, SignupRequest, UserDescription, MIN_PASSWORD_LENGTH,
};
pub use token::{AuthToken, AUTH_TOKEN_COOKIE};
