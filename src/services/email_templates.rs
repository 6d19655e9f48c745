//! HTML bodies for outgoing mail, rendered from `templates/email`.

use anyhow::Result;
use askama::Template;

use crate::models::PostRecord;

pub const DIGEST_SIZE: usize = 5;
const EXCERPT_CHARS: usize = 150;

#[derive(Template)]
#[template(path = "email/welcome.html")]
struct WelcomeTemplate<'a> {
    site_url: &'a str,
    name: &'a str,
}

#[derive(Template)]
#[template(path = "email/subscribed.html")]
struct SubscribedTemplate<'a> {
    site_url: &'a str,
}

#[derive(Template)]
#[template(path = "email/digest.html")]
struct DigestTemplate<'a> {
    site_url: &'a str,
    items: Vec<DigestItem<'a>>,
}

struct DigestItem<'a> {
    link: String,
    title: &'a str,
    image_url: Option<&'a str>,
    excerpt: String,
    author: &'a str,
    published_on: String,
}

impl<'a> DigestItem<'a> {
    fn new(site_url: &str, post: &'a PostRecord) -> Self {
        DigestItem {
            link: format!("{site_url}/blog/{}", post.id),
            title: post.title.as_deref().unwrap_or("Untitled"),
            image_url: post.image_url.as_deref(),
            excerpt: excerpt(post.content.as_deref().unwrap_or_default()),
            author: post.author_name.as_deref().unwrap_or("Unknown"),
            published_on: post.created_at.format("%B %-d, %Y").to_string(),
        }
    }
}

/// First 150 characters of the post body, with an ellipsis when cut.
pub fn excerpt(content: &str) -> String {
    if content.chars().count() > EXCERPT_CHARS {
        let cut: String = content.chars().take(EXCERPT_CHARS).collect();
        format!("{cut}...")
    } else {
        content.to_string()
    }
}

pub fn welcome(site_url: &str, name: &str) -> Result<(String, String)> {
    let body = WelcomeTemplate { site_url, name }.render()?;
    Ok(("Welcome to SmartBlog!".to_string(), body))
}

pub fn subscription_confirmation(site_url: &str) -> Result<(String, String)> {
    let body = SubscribedTemplate { site_url }.render()?;
    Ok(("You're subscribed to SmartBlog Weekly".to_string(), body))
}

pub fn weekly_digest(site_url: &str, posts: &[PostRecord]) -> Result<(String, String)> {
    let items = posts
        .iter()
        .take(DIGEST_SIZE)
        .map(|post| DigestItem::new(site_url, post))
        .collect();
    let body = DigestTemplate { site_url, items }.render()?;
    Ok(("This week's top posts from SmartBlog".to_string(), body))
}
