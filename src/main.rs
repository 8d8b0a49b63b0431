mod aqi;
mod config;
mod dashboard;
mod error;
mod firebase;
mod history;
mod models;
mod status;
mod utils;

use log::{debug, error, info, warn};
use tokio::sync::{mpsc, watch};

use config::DashboardConfig;
use dashboard::{Dashboard, DashboardView};
use firebase::FirebaseClient;
use utils::render_view;

const EVENT_BUFFER_SIZE: usize = 32;

fn log_view(view: &DashboardView) {
    for line in render_view(view) {
        info!("{}", line);
    }

    match serde_json::to_string(view) {
        Ok(json) => debug!("View: {}", json),
        Err(e) => warn!("Failed to serialize view: {}", e),
    }
}

/// Render every published view until the dashboard stops
async fn render_loop(mut views: watch::Receiver<DashboardView>) {
    log_view(&views.borrow_and_update());

    while views.changed().await.is_ok() {
        let view = views.borrow_and_update().clone();
        log_view(&view);
    }

    warn!("Subscription ended, no more updates will arrive");
}

// One thread: events are applied in delivery order, and the local offset
// lookup in the config only succeeds while the process is single-threaded
#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .format_timestamp_secs()
        .init();

    // Load configuration
    let config = match DashboardConfig::new() {
        Ok(config) => config,
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            return Err(e.into());
        }
    };

    let client = match FirebaseClient::new(&config) {
        Ok(client) => client,
        Err(e) => {
            error!("Failed to create database client: {}", e);
            return Err(e.into());
        }
    };

    let (event_tx, event_rx) = mpsc::channel(EVENT_BUFFER_SIZE);
    let dashboard = Dashboard::new(&config);
    let (view_tx, view_rx) = watch::channel(dashboard.view());

    let subscription = client.subscribe(&config.sensor_path, event_tx)?;
    let consumer = tokio::spawn(dashboard.run(event_rx, view_tx));

    // Handle Ctrl+C gracefully
    let (tx, mut rx) = tokio::sync::oneshot::channel();
    tokio::spawn(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to listen for Ctrl+C: {}", e);
            return;
        }
        let _ = tx.send(());
    });

    // Render until the stream gives up or the user stops us
    tokio::select! {
        _ = render_loop(view_rx) => {}
        Ok(()) = &mut rx => {
            info!("Program terminated by user. Exiting gracefully.");
        }
    }

    info!("Closing subscription to '{}'", subscription.path());
    subscription.unsubscribe();
    if let Err(e) = consumer.await {
        error!("Dashboard task failed: {}", e);
    }
    drop(client);

    Ok(())
}
