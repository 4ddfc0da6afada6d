pub mod config;
pub mod dispatcher;
pub mod errors;
pub mod locale;
pub mod metrics_defs;
pub mod protocol;
pub mod service;
pub mod strategies;
pub mod wiki_client;

#[cfg(test)]
mod testutils;

pub use dispatcher::Dispatcher;
pub use errors::LookupError;

use service::LookupService;
use shared::admin_service::AdminService;
use shared::http::run_http_service;
use std::sync::Arc;

/// Serves batch lookups and the admin probes until either listener fails.
pub async fn run(config: config::Config) -> Result<(), LookupError> {
    let dispatcher = Arc::new(Dispatcher::from_config(&config)?);
    metrics_defs::describe_all();

    let lookup_task = run_http_service(
        &config.listener.host,
        config.listener.port,
        LookupService::new(dispatcher),
    );
    let admin_task = run_http_service(
        &config.admin_listener.host,
        config.admin_listener.port,
        AdminService::<_, LookupError>::new(|| true),
    );

    tokio::try_join!(lookup_task, admin_task)?;
    Ok(())
}
