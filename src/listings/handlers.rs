use axum::{
    extract::{DefaultBodyLimit, Multipart, Path, State},
    http::StatusCode,
    response::{Html, IntoResponse, Redirect, Response},
    routing::get,
    Router,
};
use tracing::{error, instrument, warn};

use crate::{
    auth::session::SessionUser,
    listings::service::{self, PostError},
    state::AppState,
    views,
};

pub fn read_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(index))
        .route("/main", get(main_page))
        .route("/item/:id", get(item_detail))
}

pub fn write_routes() -> Router<AppState> {
    Router::new()
        .route("/post_item", get(post_item_form).post(post_item))
        .route("/item/:id/bid", get(bid_form).post(post_bid))
        .layer(DefaultBodyLimit::max(20 * 1024 * 1024)) // 20MB
}

fn internal<E: Into<anyhow::Error>>(err: E) -> (StatusCode, String) {
    let err = err.into();
    error!(error = %err, "internal error");
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        "internal server error".into(),
    )
}

fn not_found() -> (StatusCode, String) {
    (StatusCode::NOT_FOUND, "item not found".into())
}

async fn index(user: Option<SessionUser>) -> Redirect {
    if user.is_some() {
        Redirect::to("/main")
    } else {
        Redirect::to("/login")
    }
}

#[instrument(skip(state))]
async fn main_page(
    State(state): State<AppState>,
    user: SessionUser,
) -> Result<Html<String>, (StatusCode, String)> {
    let items = service::list_items(&state).await.map_err(internal)?;
    Ok(Html(views::main_page(&user.username, &items)))
}

#[instrument(skip(state))]
async fn item_detail(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Html<String>, (StatusCode, String)> {
    match service::item_detail(&state, id).await.map_err(internal)? {
        Some((item, bids)) => Ok(Html(views::item_detail_page(&item, &bids))),
        None => {
            warn!(item_id = id, "item detail for unknown id");
            Err(not_found())
        }
    }
}

async fn post_item_form(_user: SessionUser) -> Html<String> {
    Html(views::post_item_page(None))
}

#[instrument(skip(state, multipart))]
async fn post_item(
    State(state): State<AppState>,
    user: SessionUser,
    mut multipart: Multipart,
) -> Result<Response, (StatusCode, String)> {
    let form = service::read_listing_form(&mut multipart)
        .await
        .map_err(internal)?;

    match service::create_item(&state, &user, &form).await {
        Ok(_) => Ok(Redirect::to("/main").into_response()),
        Err(PostError::Upload(e)) => {
            warn!(user_id = user.user_id, error = %e, "item submission rejected");
            Ok(Html(views::post_item_page(Some(&e.to_string()))).into_response())
        }
        Err(PostError::UnknownItem) => Err(not_found()),
        Err(PostError::Internal(e)) => Err(internal(e)),
    }
}

#[instrument(skip(state))]
async fn bid_form(
    State(state): State<AppState>,
    _user: SessionUser,
    Path(id): Path<i64>,
) -> Result<Html<String>, (StatusCode, String)> {
    if !service::item_exists(&state, id).await.map_err(internal)? {
        warn!(item_id = id, "bid form for unknown id");
        return Err(not_found());
    }
    Ok(Html(views::bid_page(id, None)))
}

#[instrument(skip(state, multipart))]
async fn post_bid(
    State(state): State<AppState>,
    user: SessionUser,
    Path(id): Path<i64>,
    mut multipart: Multipart,
) -> Result<Response, (StatusCode, String)> {
    let form = service::read_listing_form(&mut multipart)
        .await
        .map_err(internal)?;

    match service::create_bid(&state, &user, id, &form).await {
        Ok(_) => Ok(Redirect::to(&format!("/item/{}", id)).into_response()),
        Err(PostError::Upload(e)) => {
            warn!(user_id = user.user_id, item_id = id, error = %e, "bid submission rejected");
            Ok(Html(views::bid_page(id, Some(&e.to_string()))).into_response())
        }
        Err(PostError::UnknownItem) => {
            warn!(item_id = id, "bid against unknown id");
            Err(not_found())
        }
        Err(PostError::Internal(e)) => Err(internal(e)),
    }
}
