use std::sync::Arc;

use tracing_subscriber::EnvFilter;

use labdesk::{api, config, core_state::CoreState, db, seed};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config::default_log_filter())),
        )
        .init();

    tracing::info!("{} starting v{}", config::APP_NAME, config::APP_VERSION);

    let data_dir = config::app_data_dir();
    std::fs::create_dir_all(&data_dir)?;

    let db_path = config::database_path();
    let conn = db::open_database(&db_path)?;
    seed::seed_if_empty(&conn)?;
    drop(conn);

    let core = Arc::new(CoreState::new(db_path));
    api::server::serve(core, config::bind_addr()).await?;
    Ok(())
}
