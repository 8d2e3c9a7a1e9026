use anyhow::Context;
use axum::extract::Multipart;
use chrono::Local;
use thiserror::Error;
use tracing::info;

use crate::{
    auth::session::SessionUser,
    listings::{
        dto::{BidView, ImageUpload, ItemView, ListingForm},
        repo::{self, Bid, Item, NewListing},
    },
    state::AppState,
    uploads::{self, UploadError},
};

/// Failure modes for posting an item or a bid.
#[derive(Debug, Error)]
pub enum PostError {
    /// The submitted file was rejected; the form is re-shown with the
    /// message and no row is created.
    #[error(transparent)]
    Upload(#[from] UploadError),
    /// The bid targets an item id that does not exist.
    #[error("item not found")]
    UnknownItem,
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

/// Collect title, description and the image file out of a multipart body.
/// Unknown fields are ignored; a field with an empty filename counts as no
/// upload at all.
pub async fn read_listing_form(multipart: &mut Multipart) -> anyhow::Result<ListingForm> {
    let mut form = ListingForm::default();
    while let Some(field) = multipart
        .next_field()
        .await
        .context("read multipart field")?
    {
        let name = field.name().map(|s| s.to_string());
        match name.as_deref() {
            Some("title") => form.title = field.text().await.context("read title field")?,
            Some("description") => {
                form.description = field.text().await.context("read description field")?
            }
            Some("image") => {
                let filename = field.file_name().map(|s| s.to_string()).unwrap_or_default();
                let body = field.bytes().await.context("read image field")?;
                if !filename.is_empty() {
                    form.image = Some(ImageUpload { filename, body });
                }
            }
            _ => {}
        }
    }
    Ok(form)
}

/// Formatted local creation timestamp, stored as-is.
pub fn timestamp() -> String {
    Local::now().format("%Y-%m-%d %H:%M:%S").to_string()
}

/// Validate and persist an uploaded image, returning the store-relative path
/// recorded on the row.
pub async fn store_image(
    state: &AppState,
    upload: Option<&ImageUpload>,
) -> Result<String, PostError> {
    let upload = upload.ok_or(UploadError::Missing)?;
    uploads::validate(&upload.filename)?;
    let filename = uploads::sanitized_name(&upload.filename);
    let path = state
        .images
        .save(&filename, upload.body.clone())
        .await
        .context("store upload")?;
    Ok(path)
}

pub async fn create_item(
    state: &AppState,
    user: &SessionUser,
    form: &ListingForm,
) -> Result<Item, PostError> {
    let image_path = store_image(state, form.image.as_ref()).await?;
    let created_at = timestamp();
    let new = NewListing {
        title: &form.title,
        description: &form.description,
        image_path: &image_path,
        user_id: user.user_id,
        nickname: &user.nickname,
        created_at: &created_at,
    };

    let mut conn = state.acquire().await?;
    let item = repo::insert_item(&mut conn, &new).await?;
    info!(item_id = item.id, user_id = user.user_id, "item posted");
    Ok(item)
}

pub async fn create_bid(
    state: &AppState,
    user: &SessionUser,
    item_id: i64,
    form: &ListingForm,
) -> Result<Bid, PostError> {
    if !item_exists(state, item_id).await? {
        return Err(PostError::UnknownItem);
    }

    let image_path = store_image(state, form.image.as_ref()).await?;
    let created_at = timestamp();
    let new = NewListing {
        title: &form.title,
        description: &form.description,
        image_path: &image_path,
        user_id: user.user_id,
        nickname: &user.nickname,
        created_at: &created_at,
    };

    let mut conn = state.acquire().await?;
    let bid = repo::insert_bid(&mut conn, item_id, &new).await?;
    info!(bid_id = bid.id, item_id, user_id = user.user_id, "bid posted");
    Ok(bid)
}

pub async fn item_exists(state: &AppState, item_id: i64) -> anyhow::Result<bool> {
    let mut conn = state.acquire().await?;
    Ok(repo::get_item(&mut conn, item_id).await?.is_some())
}

pub async fn list_items(state: &AppState) -> anyhow::Result<Vec<ItemView>> {
    let mut conn = state.acquire().await?;
    let items = repo::list_items(&mut conn).await?;
    Ok(items
        .into_iter()
        .map(|item| item_view(state, item))
        .collect())
}

/// One item with its bids, each decorated with a servable URL. `None` when
/// the id is unknown.
pub async fn item_detail(
    state: &AppState,
    item_id: i64,
) -> anyhow::Result<Option<(ItemView, Vec<BidView>)>> {
    let mut conn = state.acquire().await?;
    let Some(item) = repo::get_item(&mut conn, item_id).await? else {
        return Ok(None);
    };
    let bids = repo::list_bids(&mut conn, item_id).await?;
    Ok(Some((
        item_view(state, item),
        bids.into_iter().map(|bid| bid_view(state, bid)).collect(),
    )))
}

fn item_view(state: &AppState, item: Item) -> ItemView {
    ItemView {
        id: item.id,
        title: item.title,
        description: item.description,
        image_url: state.images.public_url(&item.image_path),
        nickname: item.nickname,
        created_at: item.created_at,
    }
}

fn bid_view(state: &AppState, bid: Bid) -> BidView {
    BidView {
        id: bid.id,
        item_id: bid.item_id,
        title: bid.title,
        description: bid.description,
        image_url: state.images.public_url(&bid.image_path),
        nickname: bid.nickname,
        created_at: bid.created_at,
    }
}
