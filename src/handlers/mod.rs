mod comments;
mod drafts;
mod misc;
mod newsletter;
mod oauth;
mod posts;
mod users;

pub use comments::*;
pub use drafts::*;
pub use misc::*;
pub use newsletter::*;
pub use oauth::*;
pub use posts::*;
pub use users::*;

use axum::Json;

use crate::data_formats::Upload;
use crate::errors::RequestError;
use crate::state::AppContext;

type JsonResult<T> = Result<Json<T>, RequestError>;

// ----------------- Shared Helpers -----------------
fn parse_id(raw: &str) -> Result<i64, RequestError> {
    raw.trim()
        .parse()
        .map_err(|_| RequestError::bad_request(format!("Invalid id: {raw}")))
}

/// Uploads the attached image, if any, and returns its public URL.
async fn store_image(
    ctx: &AppContext,
    image: Option<Upload>,
) -> Result<Option<String>, RequestError> {
    match image {
        Some(image) => Ok(Some(ctx.images.upload(image).await?)),
        None => Ok(None),
    }
}
