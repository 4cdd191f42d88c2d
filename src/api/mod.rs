use rocket::Route;

mod ai;
pub(crate) mod auth;
mod common;
mod forms;
mod public;
mod results;

pub fn routes() -> Vec<Route> {
    let mut routes = Vec::new();
    routes.extend(auth::routes());
    routes.extend(forms::routes());
    routes.extend(results::routes());
    routes.extend(public::routes());
    routes.extend(ai::routes());
    routes
}
