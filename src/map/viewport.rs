use crate::domain::Coordinate;
use crate::map::projection::{MAX_RESOLUTION, MercatorPoint, from_mercator, to_mercator};

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Viewport {
    pub center: Coordinate,
    pub zoom: f64,
}

/// Bounding box of plotted geometry in Web Mercator meters.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Extent {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

impl Extent {
    pub fn bounding(coordinates: impl IntoIterator<Item = Coordinate>) -> Option<Self> {
        coordinates.into_iter().map(to_mercator).fold(None, |extent, point| {
            Some(match extent {
                None => Extent {
                    min_x: point.x,
                    min_y: point.y,
                    max_x: point.x,
                    max_y: point.y,
                },
                Some(extent) => Extent {
                    min_x: extent.min_x.min(point.x),
                    min_y: extent.min_y.min(point.y),
                    max_x: extent.max_x.max(point.x),
                    max_y: extent.max_y.max(point.y),
                },
            })
        })
    }

    pub fn width(&self) -> f64 {
        self.max_x - self.min_x
    }

    pub fn height(&self) -> f64 {
        self.max_y - self.min_y
    }

    pub fn center(&self) -> Coordinate {
        from_mercator(MercatorPoint {
            x: (self.min_x + self.max_x) / 2.0,
            y: (self.min_y + self.max_y) / 2.0,
        })
    }
}

/// Size of the map in pixels and the padding kept free around fitted geometry.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FitOptions {
    pub width_px: f64,
    pub height_px: f64,
    pub padding_px: f64,
    pub max_zoom: f64,
}

/// The viewport that shows all of `extent` inside the padded map, never zoomed in beyond
/// `max_zoom`. A single point has no size and ends up at `max_zoom`.
pub fn fit(extent: &Extent, options: &FitOptions) -> Viewport {
    let available_width = (options.width_px - 2.0 * options.padding_px).max(1.0);
    let available_height = (options.height_px - 2.0 * options.padding_px).max(1.0);
    let resolution = (extent.width() / available_width).max(extent.height() / available_height);

    let zoom = if resolution > 0.0 {
        (MAX_RESOLUTION / resolution).log2().clamp(0.0, options.max_zoom)
    } else {
        options.max_zoom
    };

    Viewport {
        center: extent.center(),
        zoom,
    }
}
