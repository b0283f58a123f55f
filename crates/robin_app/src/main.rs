use robin_app::app::{run, AppConfig};
use tracing_subscriber::EnvFilter;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();
    let config = AppConfig::from_env();
    if let Err(err) = run(config) {
        eprintln!("Failed to run Robin preview: {err:#}");
    }
}
