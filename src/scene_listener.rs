use crate::map::{MapScene, SceneBuilder};
use crate::tracker::TrackingSnapshot;
use tokio::sync::watch::Receiver;
use tracing::{debug, info, instrument, warn};

#[instrument(skip_all)]
pub async fn scene_listener(mut rx: Receiver<TrackingSnapshot>, builder: SceneBuilder) {
    while rx.changed().await.is_ok() {
        let snapshot: TrackingSnapshot = rx.borrow_and_update().clone();
        let scene = builder.build(&snapshot);
        report(&scene, &snapshot);
    }
}

fn report(scene: &MapScene, snapshot: &TrackingSnapshot) {
    if let Some(error) = &scene.error {
        warn!("⚠️ {}", error);
    }

    info!(
        phase = ?scene.phase,
        device = snapshot.device.as_ref().map(|device| device.label.as_str()),
        last_seen = snapshot.last_seen,
        stops = scene.stops.len(),
        markers = scene.markers.len(),
        route_points = scene.route.as_ref().map_or(0, Vec::len),
        live = scene.vehicle.live,
        "🗺️ Vehicle at {}, view {} @ z{:.1}",
        scene.vehicle.coordinate,
        scene.viewport.center,
        scene.viewport.zoom
    );

    for marker in &scene.markers {
        debug!(
            pin_color = marker.pin_color,
            selected = marker.selected,
            "📍 {} at {}, {}",
            marker.id,
            marker.coordinate,
            marker.status_label
        );
    }
    for stop in scene.stops.iter().filter(|stop| !stop.is_mapped()) {
        debug!(
            selected = scene.selected.as_deref() == Some(stop.id.as_str()),
            address = %stop.address,
            exit_number = %stop.exit_number,
            priority_order = stop.priority_order,
            raw_location = %stop.raw_location,
            "📍 {} {} has no location, {}",
            stop.id,
            stop.client,
            stop.status.label()
        );
    }
}
