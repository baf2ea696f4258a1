use std::{net::TcpListener, sync::Arc};

use env_logger::Env;
use tokio::sync::mpsc;
use trawl::{
    configuration::get_configuration,
    services::{
        run_event_handler, search_worker_handler, RunEvent, RunRegistry, SearchRequest,
        SearchRequestSender,
    },
    startup::run,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    let configuration = get_configuration()?;
    let address = format!(
        "{}:{}",
        configuration.application.host, configuration.application.port
    );
    let listener = TcpListener::bind(&address)?;
    log::info!("Listening on {}", address);

    let registry = Arc::new(RunRegistry::with_retention(
        configuration.application.retained_runs,
    ));
    let (search_sender, search_receiver) = mpsc::unbounded_channel::<SearchRequest>();
    let (event_sender, event_receiver) = mpsc::unbounded_channel::<RunEvent>();

    // Spawn background tasks
    let worker_settings = configuration.clone();
    tokio::spawn(async move {
        search_worker_handler(search_receiver, worker_settings, event_sender).await
    });

    let registry_clone = registry.clone();
    tokio::spawn(async move { run_event_handler(event_receiver, registry_clone).await });

    run(
        listener,
        registry,
        SearchRequestSender {
            sender: search_sender,
        },
    )?
    .await?;

    Ok(())
}
