use mongodb::bson::doc;
use rocket::{
    http::{CookieJar, Status},
    serde::json::Json,
    Route, State,
};

use crate::{
    error::{Error, Result},
    model::{
        api::auth::{
            AuthToken, LoginRequest, SignupError, SignupRequest, UserDescription,
            AUTH_TOKEN_COOKIE,
        },
        db::user::{NewUser, User},
        mongodb::{is_duplicate_key_error, Coll, Id},
    },
    Config,
};

pub fn routes() -> Vec<Route> {
    routes![signup, login, logout, me]
}

#[post("/auth/signup", data = "<request>", format = "json")]
pub async fn signup(
    request: Json<SignupRequest>,
    new_users: Coll<NewUser>,
    users: Coll<User>,
) -> Result<(Status, Json<UserDescription>)> {
    let user: NewUser = request.0.try_into().map_err(|err| match err {
        SignupError::Hash(err) => Error::from(err),
        other => Error::bad_request(other.to_string()),
    })?;

    // Check email uniqueness. The unique index catches any race.
    let already_registered = || {
        Error::bad_request(format!("An account already exists for {}", user.email))
    };
    if users.find_one(doc! { "email": &user.email }, None).await?.is_some() {
        return Err(already_registered());
    }
    let new_id: Id = match new_users.insert_one(&user, None).await {
        Ok(result) => result
            .inserted_id
            .as_object_id()
            .ok_or_else(|| Error::Status(Status::InternalServerError, "Bad user ID".to_string()))?
            .into(),
        Err(err) if is_duplicate_key_error(&err) => return Err(already_registered()),
        Err(err) => return Err(err.into()),
    };

    let user = users
        .find_one(new_id.as_doc(), None)
        .await?
        .ok_or_else(|| Error::not_found(format!("User {new_id}")))?;
    info!("Registered user {}", user.id);
    Ok((Status::Created, Json(user.into())))
}

#[post("/auth/login", data = "<credentials>", format = "json")]
pub async fn login(
    cookies: &CookieJar<'_>,
    credentials: Json<LoginRequest>,
    users: Coll<User>,
    config: &State<Config>,
) -> Result<Json<UserDescription>> {
    let with_email = doc! {
        "email": credentials.normalised_email(),
    };

    let user = users
        .find_one(with_email, None)
        .await?
        .filter(|user| user.verify_password(&credentials.password))
        .ok_or_else(|| {
            Error::Status(
                Status::Unauthorized,
                "No user found with the provided email and password combination.".to_string(),
            )
        })?;

    let token = AuthToken::new(&user);
    cookies.add(token.into_cookie(config)?);

    Ok(Json(user.into()))
}

#[delete("/auth")]
pub fn logout(cookies: &CookieJar<'_>) -> Status {
    cookies.remove(AUTH_TOKEN_COOKIE);
    Status::Ok
}

#[get("/auth/me")]
pub async fn me(token: AuthToken, users: Coll<User>) -> Result<Json<UserDescription>> {
    let user = users
        .find_one(token.id.as_doc(), None)
        .await?
        .ok_or_else(|| Error::not_found(format!("User {}", token.id)))?;
    Ok(Json(user.into()))
}
