use axum::{
    extract::{FromRef, State},
    http::{header, HeaderMap, HeaderValue, StatusCode},
    response::{Html, IntoResponse, Redirect, Response},
    routing::get,
    Form, Router,
};
use lazy_static::lazy_static;
use regex::Regex;
use tracing::{error, info, instrument, warn};

use crate::{
    auth::{
        dto::{LoginForm, SignupForm},
        password::{hash_password, verify_password},
        repo,
        session::{clear_cookie, SessionKeys},
    },
    state::AppState,
    views,
};

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/login", get(login_form).post(login))
        .route("/signup", get(signup_form).post(signup))
        .route("/logout", get(logout))
}

fn is_valid_username(username: &str) -> bool {
    lazy_static! {
        static ref USERNAME_RE: Regex = Regex::new(r"^[A-Za-z0-9_.-]{3,32}$").unwrap();
    }
    USERNAME_RE.is_match(username)
}

fn internal<E: Into<anyhow::Error>>(err: E) -> (StatusCode, String) {
    let err = err.into();
    error!(error = %err, "internal error");
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        "internal server error".into(),
    )
}

async fn login_form() -> Html<String> {
    Html(views::login_page(None))
}

async fn signup_form() -> Html<String> {
    Html(views::signup_page(None))
}

#[instrument(skip(state, form))]
async fn login(
    State(state): State<AppState>,
    Form(form): Form<LoginForm>,
) -> Result<Response, (StatusCode, String)> {
    let mut conn = state.acquire().await.map_err(internal)?;
    let user = repo::find_by_username(&mut conn, &form.username)
        .await
        .map_err(internal)?;
    drop(conn);

    // One generic message for both failure modes; do not reveal whether the
    // username exists.
    let Some(user) = user else {
        warn!(username = %form.username, "login unknown username");
        return Ok(Html(views::login_page(Some("Invalid username or password"))).into_response());
    };

    if !verify_password(&form.password, &user.password_hash).map_err(internal)? {
        warn!(username = %form.username, user_id = user.id, "login invalid password");
        return Ok(Html(views::login_page(Some("Invalid username or password"))).into_response());
    }

    let keys = SessionKeys::from_ref(&state);
    let token = keys
        .sign(user.id, &user.username, &user.nickname)
        .map_err(internal)?;

    let mut headers = HeaderMap::new();
    headers.insert(
        header::SET_COOKIE,
        HeaderValue::from_str(&keys.cookie(&token)).map_err(internal)?,
    );

    info!(user_id = user.id, username = %user.username, "user logged in");
    Ok((headers, Redirect::to("/main")).into_response())
}

#[instrument(skip(state, form))]
async fn signup(
    State(state): State<AppState>,
    Form(form): Form<SignupForm>,
) -> Result<Response, (StatusCode, String)> {
    let username = form.username.trim();

    if !is_valid_username(username) {
        warn!(username = %username, "signup invalid username");
        return Ok(Html(views::signup_page(Some(
            "Usernames are 3 to 32 letters, digits, dots, dashes or underscores",
        )))
        .into_response());
    }

    let mut conn = state.acquire().await.map_err(internal)?;
    if repo::find_by_username(&mut conn, username)
        .await
        .map_err(internal)?
        .is_some()
    {
        warn!(username = %username, "signup username taken");
        return Ok(
            Html(views::signup_page(Some("That username is already taken"))).into_response(),
        );
    }

    let hash = hash_password(&form.password).map_err(internal)?;
    match repo::create(&mut conn, username, &hash, &form.nickname).await {
        Ok(user) => {
            info!(user_id = user.id, username = %user.username, "user registered");
            Ok(Redirect::to("/login").into_response())
        }
        // A concurrent signup can slip past the pre-check; the unique
        // constraint is the arbiter.
        Err(e) if repo::is_unique_violation(&e) => {
            warn!(username = %username, "signup username taken");
            Ok(Html(views::signup_page(Some("That username is already taken"))).into_response())
        }
        Err(e) => Err(internal(e)),
    }
}

#[instrument]
async fn logout() -> (HeaderMap, Redirect) {
    let mut headers = HeaderMap::new();
    headers.insert(header::SET_COOKIE, HeaderValue::from_static(clear_cookie()));
    (headers, Redirect::to("/login"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn username_format() {
        assert!(is_valid_username("alice"));
        assert!(is_valid_username("a_b.c-d"));
        assert!(!is_valid_username("ab"));
        assert!(!is_valid_username("has space"));
        assert!(!is_valid_username("way-too-long-for-a-username-way-too-long"));
        assert!(!is_valid_username(""));
    }
}
