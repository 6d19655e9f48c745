//! Third-party collaborators: outbound email, image hosting, the AI suggestion proxy
//! and Google sign-in.
//!
//! Email and image hosting sit behind traits so the application context can carry
//! whichever implementation the configuration allows (or a fake in tests).

mod email;
pub mod email_templates;
mod google;
mod images;
mod suggestions;

pub use email::*;
pub use google::*;
pub use images::*;
pub use suggestions::*;

use anyhow::Result;

use crate::data_formats::Upload;

#[async_trait::async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, to: &str, subject: &str, html_body: &str) -> Result<()>;
}

#[async_trait::async_trait]
pub trait ImageHost: Send + Sync {
    /// Stores the image and returns its public URL.
    async fn upload(&self, image: Upload) -> Result<String>;

    /// Removes the image behind `url`. Already-missing images are not an error.
    async fn delete(&self, url: &str) -> Result<()>;
}
