use fusion_risk_monitor::{
    config::{LoggingSettings, Settings},
    models::ProtocolIdentifier,
    services::DashboardOrchestrator,
    utils::time::format_timestamp,
};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

fn init_logging(logging: &LoggingSettings) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&logging.level));
    let builder = tracing_subscriber::fmt().with_env_filter(filter).with_writer(std::io::stderr);

    match logging.format.as_str() {
        "pretty" => builder.pretty().init(),
        "full" => builder.init(),
        _ => builder.compact().init(),
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    let settings = Settings::new()?;
    init_logging(&settings.logging);

    info!(base_url = %settings.api.base_url, "Starting Fusion Risk Monitor");

    let protocol = std::env::args()
        .nth(1)
        .unwrap_or_else(|| settings.dashboard.default_protocol.clone());
    let protocol = ProtocolIdentifier::new(protocol);

    let orchestrator = DashboardOrchestrator::from_settings(&settings)?;

    match orchestrator.load_dashboard(&protocol).await {
        Some(snapshot) => {
            info!(
                protocol = %snapshot.protocol,
                loaded_at = %format_timestamp(snapshot.loaded_at),
                "Snapshot ready"
            );
            println!("{}", serde_json::to_string_pretty(&snapshot)?);
        }
        None => warn!(protocol = %protocol, "Dashboard load was superseded"),
    }

    orchestrator.deactivate().await;
    Ok(())
}
