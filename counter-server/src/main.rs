use downloads_counter_server::Settings;
use tracing_subscriber::EnvFilter;

fn log_error(err: anyhow::Error) -> anyhow::Error {
    tracing::error!("service failed with error: {err:#}");
    err
}

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let settings = Settings::new().map_err(log_error)?;
    downloads_counter_server::run(settings).await.map_err(log_error)
}
