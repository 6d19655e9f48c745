use std::sync::Arc;

use smartblog::{config::Config, init_db, newsletter::scheduler, run_app, state::AppContext};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = Config::from_env()?;
    let pool = init_db(&config.database_url).await?;
    let ctx = Arc::new(AppContext::from_config(pool, config)?);

    let newsletter = scheduler::start(Arc::clone(&ctx));
    let result = run_app(ctx).await;
    newsletter.cancel();
    if let Err(error) = &result {
        tracing::error!("Server stopped: {:#}", error);
    }
    result
}
