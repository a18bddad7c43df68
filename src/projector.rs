//! Equal-aspect lat/lng → canvas projection, fitted to a set of points.

use crate::geo::Coordinates;

const EPSILON: f64 = 1e-6;

/// Projects geographic coordinates onto a canvas of `(max_width, max_height)`
/// with `padding` on every side, preserving aspect ratio via a single zoom
/// coefficient shared by both axes.
pub struct SphereProjector {
    padding: f64,
    min_lng: f64,
    max_lat: f64,
    zoom: f64,
}

impl SphereProjector {
    pub fn new<'a>(
        points: impl Iterator<Item = &'a Coordinates>,
        max_width: f64,
        max_height: f64,
        padding: f64,
    ) -> Self {
        let mut min_lat = f64::INFINITY;
        let mut max_lat = f64::NEG_INFINITY;
        let mut min_lng = f64::INFINITY;
        let mut max_lng = f64::NEG_INFINITY;
        let mut any = false;
        for p in points {
            any = true;
            min_lat = min_lat.min(p.lat);
            max_lat = max_lat.max(p.lat);
            min_lng = min_lng.min(p.lng);
            max_lng = max_lng.max(p.lng);
        }
        if !any {
            return SphereProjector {
                padding,
                min_lng: 0.0,
                max_lat: 0.0,
                zoom: 0.0,
            };
        }

        let lon_span = max_lng - min_lng;
        let lat_span = max_lat - min_lat;
        let zoom_x = (lon_span > EPSILON).then(|| (max_width - 2.0 * padding) / lon_span);
        let zoom_y = (lat_span > EPSILON).then(|| (max_height - 2.0 * padding) / lat_span);
        let zoom = match (zoom_x, zoom_y) {
            (Some(x), Some(y)) => x.min(y),
            (Some(x), None) => x,
            (None, Some(y)) => y,
            (None, None) => 0.0,
        };

        SphereProjector {
            padding,
            min_lng,
            max_lat,
            zoom,
        }
    }

    pub fn project(&self, coordinates: Coordinates) -> (f64, f64) {
        let x = (coordinates.lng - self.min_lng) * self.zoom + self.padding;
        let y = (self.max_lat - coordinates.lat) * self.zoom + self.padding;
        (x, y)
    }
}
