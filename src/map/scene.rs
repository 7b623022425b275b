use crate::app_config::MapConfig;
use crate::domain::{Coordinate, DeliveryStop};
use crate::map::viewport::{Extent, FitOptions, Viewport, fit};
use crate::tracker::{TrackingPhase, TrackingSnapshot};

#[derive(Clone, Debug, PartialEq)]
pub struct StopMarker {
    pub id: String,
    pub coordinate: Coordinate,
    pub status_label: &'static str,
    pub pin_color: &'static str,
    pub selected: bool,
}

/// Where the truck icon goes. `live` is false while it only stands in at a fallback position.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct VehicleMarker {
    pub coordinate: Coordinate,
    pub live: bool,
}

/// Everything needed to draw the route view of a run.
#[derive(Clone, Debug, PartialEq)]
pub struct MapScene {
    pub stops: Vec<DeliveryStop>,
    pub markers: Vec<StopMarker>,
    pub route: Option<Vec<Coordinate>>,
    pub vehicle: VehicleMarker,
    pub viewport: Viewport,
    pub selected: Option<String>,
    pub phase: TrackingPhase,
    pub error: Option<String>,
}

#[derive(Clone, Debug)]
pub struct SceneBuilder {
    stops: Vec<DeliveryStop>,
    map: MapConfig,
    selected: Option<String>,
}

impl SceneBuilder {
    pub fn new(stops: Vec<DeliveryStop>, map: MapConfig) -> Self {
        let selected = stops.first().map(|stop| stop.id.clone());
        SceneBuilder { stops, map, selected }
    }

    pub fn selected(&self) -> Option<&str> {
        self.selected.as_deref()
    }

    /// Selects a stop. Returns the viewport centered on it when the stop is on the map.
    pub fn select(&mut self, id: &str, current_zoom: f64) -> Option<Viewport> {
        let stop = self.stops.iter().find(|stop| stop.id == id)?;
        self.selected = Some(stop.id.clone());

        stop.coordinate.map(|center| Viewport {
            center,
            zoom: current_zoom.max(self.map.fly_to_min_zoom()),
        })
    }

    pub fn build(&self, snapshot: &TrackingSnapshot) -> MapScene {
        let markers: Vec<StopMarker> = self
            .stops
            .iter()
            .filter_map(|stop| {
                stop.coordinate.map(|coordinate| StopMarker {
                    id: stop.id.clone(),
                    coordinate,
                    status_label: stop.status.label(),
                    pin_color: stop.status.pin_color(),
                    selected: self.selected.as_deref() == Some(stop.id.as_str()),
                })
            })
            .collect();

        let route_coordinates: Vec<Coordinate> = snapshot.route.iter().map(|point| point.coordinate()).collect();
        let vehicle_position = snapshot.vehicle_position().map(|point| point.coordinate());

        let vehicle = match vehicle_position {
            Some(coordinate) => VehicleMarker { coordinate, live: true },
            None => VehicleMarker {
                coordinate: markers
                    .first()
                    .map_or(self.map.default_center(), |marker| marker.coordinate),
                live: false,
            },
        };

        let geometry = markers
            .iter()
            .map(|marker| marker.coordinate)
            .chain(route_coordinates.iter().copied())
            .chain(vehicle_position);
        let viewport = Extent::bounding(geometry)
            .map(|extent| fit(&extent, &self.fit_options()))
            .unwrap_or(Viewport {
                center: self.map.default_center(),
                zoom: self.map.default_zoom(),
            });

        MapScene {
            stops: self.stops.clone(),
            markers,
            route: (route_coordinates.len() >= 2).then_some(route_coordinates),
            vehicle,
            viewport,
            selected: self.selected.clone(),
            phase: snapshot.phase,
            error: snapshot.error.clone(),
        }
    }

    fn fit_options(&self) -> FitOptions {
        FitOptions {
            width_px: self.map.width_px(),
            height_px: self.map.height_px(),
            padding_px: self.map.fit_padding_px(),
            max_zoom: self.map.max_fit_zoom(),
        }
    }
}
