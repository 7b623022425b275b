use crate::app_config::AppConfig;
use crate::auth::SessionStore;
use crate::backend::{DeviceResolveError, resolve_device};
use crate::map::SceneBuilder;
use crate::route::TrackingWindow;
use crate::run_loader::load_run;
use crate::scene_listener::scene_listener;
use crate::traccar::{RouteQuery, fetch_devices_with_positions};
use crate::tracker::RouteTracker;
use std::sync::Arc;
use tokio::{signal, task};
use tracing::{debug, info, warn};

mod app_config;
mod auth;
mod backend;
mod domain;
mod extensions;
mod lenient_deserializer;
mod map;
mod route;
mod run_loader;
mod scene_listener;
mod traccar;
mod tracker;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt().with_max_level(tracing::Level::INFO).init();

    info!("🪵 Starting {} v{}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"));

    let config = AppConfig::load()?;
    info!("✅  Loaded configuration");

    let session_store = SessionStore::new(config.auth().session_file());
    let mut session = session_store.load().await?;
    if let Some(token) = config.auth().token() {
        session = session_store.sign_in(session, token).await?;
    }
    info!(role = ?session.role(), user_id = ?session.user_id(), "✅  Signed in");

    let backend_client = backend::new_client(config.backend(), &session)?;
    let traccar_client = Arc::new(traccar::new_client(config.traccar(), session.traccar_base_url())?);

    match fetch_devices_with_positions(&traccar_client).await {
        Ok(devices) => {
            for device in &devices {
                debug!(
                    speed = device.speed,
                    last_update = device.last_update.as_deref(),
                    "📡 {}",
                    device.device.get("name").and_then(|name| name.as_str()).unwrap_or("unnamed device")
                );
            }
            info!(
                "✅  {} of {} Traccar device(s) reporting a position",
                devices.iter().filter(|device| device.position.is_some()).count(),
                devices.len()
            );
        }
        Err(e) => warn!("⚠️ Unable to reach Traccar at {}: {}", traccar_client.base_url(), e),
    }

    let run = load_run(config.tracking().run_file()).await?;
    info!(
        status = run.delivery_status,
        "✅  Loaded run '{}', {} driven by {}",
        run.id,
        run.vehicle_description,
        run.driver_name
    );

    let mut tracker = RouteTracker::new(traccar_client.clone(), config.tracking().poll_interval());
    let mut builder = SceneBuilder::new(run.stops.clone(), config.map().clone());
    if let Some(stop_id) = builder.selected().map(str::to_string) {
        match builder.select(&stop_id, config.map().default_zoom()) {
            Some(view) => info!("📍 Selected stop '{}', flying to {} @ z{:.1}", stop_id, view.center, view.zoom),
            None => info!("📍 Selected stop '{}', it has no location", stop_id),
        }
    }
    let scene_rx = tracker.subscribe();

    task::spawn(async move {
        scene_listener(scene_rx, builder).await;
    });
    info!("✅  Initialized scene listener");

    let device_id = run.device_id.as_deref().unwrap_or_default();
    match resolve_device(&backend_client, config.backend(), device_id).await {
        Ok(device) => match TrackingWindow::resolve(run.delivery_date.as_deref()) {
            Some(window) => {
                if !window.should_poll() {
                    let report = RouteQuery::new(device.traccar_id, window.from(), window.to());
                    match traccar_client.fetch_device_route(&report).await {
                        Ok(records) => info!("✅  Traccar route report holds {} record(s) for the day", records.len()),
                        Err(e) => warn!("⚠️ Unable to fetch the route report: {}", e),
                    }
                }
                tracker.start(device, window);
            }
            None => warn!("⚠️ Run '{}' has no valid delivery date, not tracking", run.id),
        },
        Err(DeviceResolveError::Backend(e)) if e.is_unauthorized() => {
            session = session_store.clear(&session).await?;
            tracker.fail("The session expired, sign in again.");
            warn!(authenticated = session.is_authenticated(), "🔑 Signed out");
        }
        Err(e) => tracker.fail(e.to_string()),
    }

    info!("🔥 {} is up and running", env!("CARGO_PKG_NAME"));

    signal::ctrl_c().await?;
    let snapshot = tracker.snapshot();
    info!(
        running = tracker.is_running(),
        route_points = snapshot.route.len(),
        "🛑 Stopping tracking"
    );
    tracker.cancel();
    info!("👋 {} stopped", env!("CARGO_PKG_NAME"));

    Ok(())
}
