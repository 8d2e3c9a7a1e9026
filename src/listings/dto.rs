use bytes::Bytes;
use serde::Serialize;

/// Raw uploaded file read out of a multipart field.
#[derive(Debug)]
pub struct ImageUpload {
    pub filename: String,
    pub body: Bytes,
}

/// One multipart submission for an item or a bid.
#[derive(Debug, Default)]
pub struct ListingForm {
    pub title: String,
    pub description: String,
    pub image: Option<ImageUpload>,
}

/// Item decorated with its servable image URL.
#[derive(Debug, Serialize)]
pub struct ItemView {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub image_url: String,
    pub nickname: String,
    pub created_at: String,
}

/// Bid decorated with its servable image URL.
#[derive(Debug, Serialize)]
pub struct BidView {
    pub id: i64,
    pub item_id: i64,
    pub title: String,
    pub description: String,
    pub image_url: String,
    pub nickname: String,
    pub created_at: String,
}
