use migration::{Migrator, MigratorTrait};

mod settings;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let settings = settings::Settings::new()?;

    tracing_subscriber::fmt()
        .with_env_filter(format!(
            "petalpos={level},server={level},engine={level}",
            level = settings.app.level
        ))
        .init();

    let timezone: chrono_tz::Tz = settings
        .shop
        .timezone
        .parse()
        .map_err(|err| format!("invalid shop timezone {}: {err}", settings.shop.timezone))?;

    let database = sea_orm::Database::connect(&settings.database.url).await?;
    Migrator::up(&database, None).await?;
    tracing::info!("database ready at {}", settings.database.url);

    let engine = engine::Engine::builder()
        .database(database)
        .default_vat_rate(engine::VatRate::try_from(settings.shop.default_vat_rate)?)
        .labor_surcharge_percent(settings.shop.labor_surcharge_percent)
        .timezone(timezone)
        .build()
        .await?;

    let bind = settings
        .server
        .bind
        .unwrap_or_else(|| "127.0.0.1".to_string());
    server::run(engine, &format!("{}:{}", bind, settings.server.port)).await;

    Ok(())
}
