use mongodb::{Client, Database, options::ClientOptions};
use orgdesk_config::DatabaseSettings;
use tracing::info;

/// Opens the store and pings it so a bad URL fails at startup, not on the first request.
pub async fn connect(settings: &DatabaseSettings) -> Result<Database, mongodb::error::Error> {
    let mut options = ClientOptions::parse(&settings.url).await?;
    options.app_name = Some("orgdesk".to_string());
    options.max_pool_size = settings.max_pool_size.or(options.max_pool_size);
    options.min_pool_size = settings.min_pool_size.or(options.min_pool_size);

    let db = Client::with_options(options)?.database(&settings.name);
    db.run_command(bson::doc! { "ping": 1 }).await?;

    info!(db = %settings.name, "Connected to MongoDB");
    Ok(db)
}
