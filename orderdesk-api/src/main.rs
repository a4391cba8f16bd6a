use anyhow::Result;
use dotenvy::dotenv;
use envconfig::Envconfig;
use orderdesk_api::{config::ServerConfig, server::Server};
use orderdesk_domain::telemetry::{get_subscriber, init_subscriber};
use tracing::info;

fn main() -> Result<()> {
    dotenv().ok();
    let config = ServerConfig::init_from_env()?;

    let subscriber = get_subscriber("orderdesk", "info", std::io::stdout);
    init_subscriber(subscriber)?;

    info!("Starting orderdesk with config:\n{config}");

    tokio::runtime::Builder::new_multi_thread()
        .worker_threads(config.worker_threads.unwrap_or(num_cpus::get()))
        .enable_all()
        .build()?
        .block_on(async move {
            let server = Server::init(&config).await?;
            server.run().await
        })
}
