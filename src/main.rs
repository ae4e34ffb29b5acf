use anomaly_events::{AnomalyAlarmView, Config, DataSource, InitArgs, SnapshotBackend};
use anyhow::{bail, Context};
use log::{error, info};
use std::sync::Arc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    anomaly_events::init()?;

    info!("anomaly-events v{} starting", anomaly_events::VERSION);

    let Some(config_path) = std::env::args().nth(1) else {
        error!("Usage: anomaly-events <config.yaml>");
        std::process::exit(1);
    };

    let config = Config::from_file(&config_path)
        .with_context(|| format!("loading configuration from {}", config_path))?;

    let Some(snapshot) = config.backend.snapshot.as_ref() else {
        bail!("backend.snapshot must point to an alarm snapshot file");
    };
    let backend = SnapshotBackend::from_json_file(snapshot)
        .with_context(|| format!("loading alarm snapshot {}", snapshot.display()))?;
    info!("Loaded {} alarm entries from {}", backend.len(), snapshot.display());

    let mut view = AnomalyAlarmView::new(config.view.clone());
    info!("Listing anomaly alarms of source {}", view.config().source_id);
    view.on_init(InitArgs::new(Arc::new(backend))?)?;
    view.on_arguments_processed()?;
    view.on_prepare_fetch()?;

    let header: Vec<_> = view.columns().iter().map(|c| c.name).collect();
    println!("{}", serde_json::to_string(&header)?);

    let page = view.next_page().await?;
    for row in &page.rows {
        println!("{}", row.to_json());
    }

    info!("Emitted {} anomaly rows", page.len());
    Ok(())
}
