use actix_cors::Cors;
use actix_web::{middleware::Logger, web, App, HttpServer};
use dotenv::dotenv;
use std::io;
use std::sync::Arc;

mod config;
mod contacts;
mod controllers;
mod db;
mod email;
mod error;
mod integrations;
mod middleware;
mod models;
mod scheduler;
mod social;
mod spheresync;
mod transactions;

use config::Config;
use db::Database;
use integrations::Integrations;
use scheduler::Scheduler;

pub struct AppState {
    pub db: Arc<Database>,
    pub config: Config,
    pub integrations: Arc<Integrations>,
}

fn startup_error(msg: String) -> io::Error {
    log::error!("{}", msg);
    io::Error::other(msg)
}

#[actix_web::main]
async fn main() -> io::Result<()> {
    dotenv().ok();
    env_logger::init();

    // Check ./config first, then ../config (for running from the crate directory)
    let config_dir = config::find_config_dir();
    log::info!("Using config directory: {:?}", config_dir);
    let integrations_config = config::load_integrations(config_dir.as_deref()).map_err(startup_error)?;

    let config = Config::from_env(integrations_config).map_err(startup_error)?;
    let port = config.port;

    log::info!("Initializing database at {}", config.database_url);
    let db = Database::new(&config.database_url)
        .map_err(|e| startup_error(format!("Failed to initialize database: {}", e)))?;
    let db = Arc::new(db);

    let integrations = Arc::new(Integrations::new(config.integrations.clone(), db.clone()));

    log::info!("Initializing scheduler");
    let scheduler = Scheduler::new(db.clone(), integrations.clone(), &config).map_err(startup_error)?;
    let (scheduler_shutdown_tx, scheduler_shutdown_rx) = tokio::sync::oneshot::channel();
    let scheduler_task = tokio::spawn(async move {
        scheduler.start(scheduler_shutdown_rx).await;
    });

    log::info!("Starting agency backend on port {}", port);

    let result = HttpServer::new(move || {
        let cors = Cors::default()
            .allow_any_origin()
            .allow_any_method()
            .allow_any_header()
            .max_age(3600);

        App::new()
            .app_data(web::Data::new(AppState {
                db: Arc::clone(&db),
                config: config.clone(),
                integrations: Arc::clone(&integrations),
            }))
            .wrap(Logger::default())
            .wrap(cors)
            .configure(controllers::health::config)
            .configure(controllers::auth::config)
            .configure(controllers::dashboard::config)
            .configure(controllers::api_keys::config)
            .configure(controllers::contacts::config)
            .configure(controllers::spheresync::config)
            .configure(controllers::transactions::config)
            .configure(controllers::social::config)
            .configure(controllers::emails::config)
    })
    .bind(("0.0.0.0", port))?
    .run()
    .await;

    // The receiver is gone if the scheduler already stopped
    let _ = scheduler_shutdown_tx.send(());
    if let Err(e) = scheduler_task.await {
        log::error!("[SCHEDULER] Task ended abnormally: {}", e);
    }

    result
}
