//! Minimal server-rendered pages. Markup is deliberately plain; the pages
//! exist to carry the forms and listings, not to be a frontend.

use crate::listings::dto::{BidView, ItemView};

pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

fn page(title: &str, body: &str) -> String {
    format!(
        "<!doctype html>\n<html><head><meta charset=\"utf-8\"><title>{}</title></head>\n<body>{}</body></html>",
        escape(title),
        body
    )
}

fn flash_line(flash: Option<&str>) -> String {
    match flash {
        Some(message) => format!("<p class=\"flash\">{}</p>", escape(message)),
        None => String::new(),
    }
}

pub fn login_page(flash: Option<&str>) -> String {
    page(
        "Log in",
        &format!(
            "{}<h1>Log in</h1>\
             <form method=\"post\" action=\"/login\">\
             <p><input name=\"username\" placeholder=\"username\"></p>\
             <p><input name=\"password\" type=\"password\" placeholder=\"password\"></p>\
             <p><button type=\"submit\">Log in</button></p>\
             </form>\
             <p><a href=\"/signup\">Sign up</a></p>",
            flash_line(flash)
        ),
    )
}

pub fn signup_page(flash: Option<&str>) -> String {
    page(
        "Sign up",
        &format!(
            "{}<h1>Sign up</h1>\
             <form method=\"post\" action=\"/signup\">\
             <p><input name=\"username\" placeholder=\"username\"></p>\
             <p><input name=\"password\" type=\"password\" placeholder=\"password\"></p>\
             <p><input name=\"nickname\" placeholder=\"nickname\"></p>\
             <p><button type=\"submit\">Sign up</button></p>\
             </form>\
             <p><a href=\"/login\">Log in</a></p>",
            flash_line(flash)
        ),
    )
}

pub fn main_page(username: &str, items: &[ItemView]) -> String {
    let rows: String = items
        .iter()
        .map(|item| {
            format!(
                "<li><a href=\"/item/{}\"><img src=\"{}\" alt=\"\" width=\"120\"> {}</a> by {} at {}</li>",
                item.id,
                escape(&item.image_url),
                escape(&item.title),
                escape(&item.nickname),
                escape(&item.created_at)
            )
        })
        .collect();
    page(
        "Marketplace",
        &format!(
            "<h1>Marketplace</h1>\
             <p>Signed in as {} (<a href=\"/logout\">log out</a>)</p>\
             <p><a href=\"/post_item\">Post an item</a></p>\
             <ul>{}</ul>",
            escape(username),
            rows
        ),
    )
}

pub fn item_detail_page(item: &ItemView, bids: &[BidView]) -> String {
    let bid_rows: String = bids
        .iter()
        .map(|bid| {
            format!(
                "<li><img src=\"{}\" alt=\"\" width=\"120\"> <b>{}</b> {} by {} at {}</li>",
                escape(&bid.image_url),
                escape(&bid.title),
                escape(&bid.description),
                escape(&bid.nickname),
                escape(&bid.created_at)
            )
        })
        .collect();
    page(
        &item.title,
        &format!(
            "<h1>{}</h1>\
             <p><img src=\"{}\" alt=\"\" width=\"320\"></p>\
             <p>{}</p>\
             <p>by {} at {}</p>\
             <p><a href=\"/item/{}/bid\">Place a bid</a></p>\
             <h2>Bids</h2><ul>{}</ul>\
             <p><a href=\"/main\">Back to listing</a></p>",
            escape(&item.title),
            escape(&item.image_url),
            escape(&item.description),
            escape(&item.nickname),
            escape(&item.created_at),
            item.id,
            bid_rows
        ),
    )
}

pub fn post_item_page(flash: Option<&str>) -> String {
    page(
        "Post an item",
        &format!(
            "{}<h1>Post an item</h1>\
             <form method=\"post\" action=\"/post_item\" enctype=\"multipart/form-data\">\
             <p><input name=\"title\" placeholder=\"title\"></p>\
             <p><textarea name=\"description\" placeholder=\"description\"></textarea></p>\
             <p><input name=\"image\" type=\"file\"></p>\
             <p><button type=\"submit\">Post</button></p>\
             </form>\
             <p><a href=\"/main\">Back to listing</a></p>",
            flash_line(flash)
        ),
    )
}

pub fn bid_page(item_id: i64, flash: Option<&str>) -> String {
    page(
        "Place a bid",
        &format!(
            "{}<h1>Place a bid</h1>\
             <form method=\"post\" action=\"/item/{}/bid\" enctype=\"multipart/form-data\">\
             <p><input name=\"title\" placeholder=\"title\"></p>\
             <p><textarea name=\"description\" placeholder=\"description\"></textarea></p>\
             <p><input name=\"image\" type=\"file\"></p>\
             <p><button type=\"submit\">Bid</button></p>\
             </form>\
             <p><a href=\"/item/{}\">Back to item</a></p>",
            flash_line(flash),
            item_id,
            item_id
        ),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_item() -> ItemView {
        ItemView {
            id: 7,
            title: "Old <chair>".into(),
            description: "worn & wobbly".into(),
            image_url: "/static/uploads/chair.png".into(),
            nickname: "Al".into(),
            created_at: "2026-08-06 12:00:00".into(),
        }
    }

    #[test]
    fn escape_covers_markup_characters() {
        assert_eq!(escape("<b>&\"'</b>"), "&lt;b&gt;&amp;&quot;&#39;&lt;/b&gt;");
        assert_eq!(escape("plain"), "plain");
    }

    #[test]
    fn main_page_escapes_user_content() {
        let html = main_page("alice", &[sample_item()]);
        assert!(html.contains("Old &lt;chair&gt;"));
        assert!(html.contains("/item/7"));
        assert!(!html.contains("Old <chair>"));
    }

    #[test]
    fn flash_is_rendered_when_present() {
        let html = login_page(Some("Invalid username or password"));
        assert!(html.contains("Invalid username or password"));
        assert!(login_page(None).find("class=\"flash\"").is_none());
    }

    #[test]
    fn bid_page_targets_the_item() {
        let html = bid_page(42, None);
        assert!(html.contains("action=\"/item/42/bid\""));
    }
}
