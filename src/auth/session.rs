use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts},
    http::{header, request::Parts},
    response::Redirect,
};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::state::AppState;

pub const SESSION_COOKIE: &str = "session";

const CLEAR_COOKIE: &str = "session=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0";

/// Claims carried by the signed session cookie. The cookie is the only
/// session state; nothing is held server-side between requests.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionClaims {
    pub sub: i64,
    pub username: String,
    pub nickname: String,
    pub iat: usize,
    pub exp: usize,
}

/// Signing and verification keys for the session cookie.
#[derive(Clone)]
pub struct SessionKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl: Duration,
}

impl FromRef<AppState> for SessionKeys {
    fn from_ref(state: &AppState) -> Self {
        let cfg = &state.config.session;
        Self::new(&cfg.secret, cfg.ttl_minutes)
    }
}

impl SessionKeys {
    pub fn new(secret: &str, ttl_minutes: i64) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            ttl: Duration::minutes(ttl_minutes),
        }
    }

    pub fn sign(&self, user_id: i64, username: &str, nickname: &str) -> anyhow::Result<String> {
        let now = Utc::now();
        let claims = SessionClaims {
            sub: user_id,
            username: username.to_string(),
            nickname: nickname.to_string(),
            iat: now.timestamp() as usize,
            exp: (now + self.ttl).timestamp() as usize,
        };
        let token = encode(&Header::default(), &claims, &self.encoding)?;
        debug!(user_id, "session signed");
        Ok(token)
    }

    pub fn verify(&self, token: &str) -> anyhow::Result<SessionClaims> {
        let data = decode::<SessionClaims>(token, &self.decoding, &Validation::default())?;
        Ok(data.claims)
    }

    /// Set-Cookie value carrying a freshly signed token.
    pub fn cookie(&self, token: &str) -> String {
        format!(
            "{}={}; Path=/; HttpOnly; SameSite=Lax; Max-Age={}",
            SESSION_COOKIE,
            token,
            self.ttl.num_seconds()
        )
    }
}

/// Set-Cookie value that drops the session.
pub fn clear_cookie() -> &'static str {
    CLEAR_COOKIE
}

/// Authenticated identity for the current request, decoded from the session
/// cookie. Endpoints gate on this extractor; a missing or invalid cookie
/// redirects to the login page.
#[derive(Debug, Clone)]
pub struct SessionUser {
    pub user_id: i64,
    pub username: String,
    pub nickname: String,
}

fn cookie_token(parts: &Parts) -> Option<&str> {
    let cookies = parts.headers.get(header::COOKIE)?.to_str().ok()?;
    cookies.split(';').find_map(|pair| {
        let (name, value) = pair.trim().split_once('=')?;
        (name == SESSION_COOKIE).then_some(value)
    })
}

#[async_trait]
impl<S> FromRequestParts<S> for SessionUser
where
    S: Send + Sync,
    SessionKeys: FromRef<S>,
{
    type Rejection = Redirect;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let keys = SessionKeys::from_ref(state);
        let token = cookie_token(parts).ok_or_else(|| Redirect::to("/login"))?;
        let claims = match keys.verify(token) {
            Ok(claims) => claims,
            Err(_) => {
                warn!("invalid or expired session cookie");
                return Err(Redirect::to("/login"));
            }
        };
        Ok(SessionUser {
            user_id: claims.sub,
            username: claims.username,
            nickname: claims.nickname,
        })
    }
}
