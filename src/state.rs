use std::sync::Arc;

use anyhow::Result;
use sqlx::SqlitePool;

use crate::config::Config;
use crate::services::{
    image_host_from_config, mailer_from_config, GoogleOAuth, ImageHost, Mailer, SuggestionClient,
};

/// Everything a handler or the newsletter job needs. Shared as `Extension<Arc<AppContext>>`.
pub struct AppContext {
    pub pool: SqlitePool,
    pub config: Config,
    pub mailer: Arc<dyn Mailer>,
    pub images: Arc<dyn ImageHost>,
    pub suggestions: SuggestionClient,
    pub google: Option<GoogleOAuth>,
}

impl AppContext {
    /// Wires the real collaborators described by `config`.
    pub fn from_config(pool: SqlitePool, config: Config) -> Result<Self> {
        let mailer = mailer_from_config(config.mail.as_ref())?;
        let images = image_host_from_config(config.cloudinary_url.as_deref())?;
        Ok(Self::with_collaborators(pool, config, mailer, images))
    }

    /// Same as [`AppContext::from_config`] but with caller-supplied email and image collaborators.
    pub fn with_collaborators(
        pool: SqlitePool,
        config: Config,
        mailer: Arc<dyn Mailer>,
        images: Arc<dyn ImageHost>,
    ) -> Self {
        let suggestions =
            SuggestionClient::new(config.openrouter.clone(), config.frontend_url.clone());
        let google = match &config.google {
            Some(google) => Some(GoogleOAuth::new(google, config.google_redirect_uri())),
            None => {
                tracing::info!("Google OAuth is not configured");
                None
            }
        };
        AppContext {
            pool,
            config,
            mailer,
            images,
            suggestions,
            google,
        }
    }
}
