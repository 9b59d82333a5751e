use std::sync::Arc;

use actix_cors::Cors;
use actix_web::{middleware::Logger, web, App, HttpServer};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use opensplit_ledger::config::{Backend, Settings};
use opensplit_ledger::routes;
use opensplit_ledger::store::{LedgerStore, MemoryStore, MongoStore};

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "opensplit_ledger=info,actix_web=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let settings = Settings::load()?;

    let store: Arc<dyn LedgerStore> = match settings.storage.backend {
        Backend::Mongo => {
            tracing::info!(database = %settings.storage.database, "connecting to MongoDB");
            let store = MongoStore::connect(
                &settings.storage.mongodb_uri,
                &settings.storage.database,
                settings.storage.snapshot_reads,
            )
            .await?;
            tracing::info!("connected");
            Arc::new(store)
        }
        Backend::Memory => {
            tracing::warn!("using the in-memory store; data is lost on restart");
            Arc::new(MemoryStore::new())
        }
    };
    let store = web::Data::from(store);

    let (host, port) = settings.bind_address();
    tracing::info!(%host, port, "starting server");

    HttpServer::new(move || {
        App::new()
            .wrap(Logger::default())
            .wrap(Cors::permissive())
            .app_data(store.clone())
            .configure(routes::configure)
    })
    .bind((host, port))?
    .run()
    .await?;

    Ok(())
}
