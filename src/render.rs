//! Layered SVG composition from catalogue output: route polylines, route
//! labels, stop circles, stop labels — painted in that fixed order so later
//! layers sit on top of earlier ones.

use serde::{Deserialize, Serialize};

use crate::catalogue::{Catalogue, Route, RouteId, StopId};
use crate::projector::SphereProjector;
use crate::svg::{Circle, Color, Document, Drawable, Point, Polyline, Text};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RenderSettings {
    pub width: f64,
    pub height: f64,
    pub padding: f64,
    pub line_width: f64,
    pub stop_radius: f64,
    pub bus_label_font_size: u32,
    pub bus_label_offset: Point,
    pub stop_label_font_size: u32,
    pub stop_label_offset: Point,
    pub underlayer_color: Color,
    pub underlayer_width: f64,
    pub color_palette: Vec<Color>,
}

impl Default for RenderSettings {
    fn default() -> Self {
        RenderSettings {
            width: 0.0,
            height: 0.0,
            padding: 0.0,
            line_width: 0.0,
            stop_radius: 0.0,
            bus_label_font_size: 0,
            bus_label_offset: Point(0.0, 0.0),
            stop_label_font_size: 0,
            stop_label_offset: Point(0.0, 0.0),
            underlayer_color: Color::Named("none".to_string()),
            underlayer_width: 0.0,
            color_palette: Vec::new(),
        }
    }
}

pub struct MapRenderer<'a> {
    settings: &'a RenderSettings,
}

impl<'a> MapRenderer<'a> {
    pub fn new(settings: &'a RenderSettings) -> Self {
        MapRenderer { settings }
    }

    /// Renders the whole network: routes (by insertion order, skipping
    /// routes with no stops), then their name labels, then stop circles and
    /// labels for the sorted-by-name set of stops actually used by a route.
    pub fn render(&self, catalogue: &Catalogue) -> Document {
        let mut doc = Document::new();
        let used_stops = catalogue.used_stops();
        let coords: Vec<_> = used_stops
            .iter()
            .map(|id| catalogue.stop(*id).coordinates)
            .collect();
        let projector = SphereProjector::new(coords.iter(), self.settings.width, self.settings.height, self.settings.padding);

        let non_empty_routes: Vec<(RouteId, &Route)> = catalogue
            .routes()
            .filter(|(_, route)| !route.materialized.is_empty())
            .collect();

        if self.settings.color_palette.is_empty() && !non_empty_routes.is_empty() {
            log::warn!("render settings carry an empty color_palette; falling back to black for every route");
        }

        self.render_polylines(&mut doc, &non_empty_routes, catalogue, &projector);
        self.render_route_labels(&mut doc, &non_empty_routes, catalogue, &projector);
        self.render_stop_circles(&mut doc, catalogue, &used_stops, &projector);
        self.render_stop_labels(&mut doc, catalogue, &used_stops, &projector);
        doc
    }

    /// Falls back to black rather than indexing an empty palette: a request
    /// document may omit `render_settings` entirely and still ask for a map.
    fn palette_color(&self, ordinal: usize) -> Color {
        match self.settings.color_palette.len() {
            0 => Color::Named("black".to_string()),
            len => self.settings.color_palette[ordinal % len].clone(),
        }
    }

    fn render_polylines(
        &self,
        doc: &mut Document,
        routes: &[(RouteId, &Route)],
        catalogue: &Catalogue,
        projector: &SphereProjector,
    ) {
        for (ordinal, (_, route)) in routes.iter().enumerate() {
            let points = route
                .materialized
                .iter()
                .map(|stop_id| {
                    let (x, y) = projector.project(catalogue.stop(*stop_id).coordinates);
                    Point(x, y)
                })
                .collect();
            doc.push(Drawable::Polyline(Polyline {
                points,
                stroke: self.palette_color(ordinal),
                stroke_width: self.settings.line_width,
            }));
        }
    }

    fn render_route_labels(
        &self,
        doc: &mut Document,
        routes: &[(RouteId, &Route)],
        catalogue: &Catalogue,
        projector: &SphereProjector,
    ) {
        for (ordinal, (_, route)) in routes.iter().enumerate() {
            let color = self.palette_color(ordinal);
            let first = route.materialized[0];
            self.push_route_label(doc, route, first, color.clone(), projector, catalogue);

            // The materialized out-and-back path's midpoint is always the
            // route's last canonical stop (where it turns around); label it
            // too, unless it coincides with the first stop.
            if !route.is_roundtrip {
                let turnaround = *route.canonical.last().unwrap();
                if turnaround != first {
                    self.push_route_label(doc, route, turnaround, color, projector, catalogue);
                }
            }
        }
    }

    fn push_route_label(
        &self,
        doc: &mut Document,
        route: &Route,
        anchor: StopId,
        color: Color,
        projector: &SphereProjector,
        catalogue: &Catalogue,
    ) {
        let (x, y) = projector.project(catalogue.stop(anchor).coordinates);
        let position = Point(x, y);
        let underlayer = Text {
            position,
            offset: self.settings.bus_label_offset,
            font_size: self.settings.bus_label_font_size,
            font_family: "Verdana",
            font_weight: Some("bold"),
            data: route.name.clone(),
            fill: self.settings.underlayer_color.clone(),
            stroke: Some(self.settings.underlayer_color.clone()),
            stroke_width: Some(self.settings.underlayer_width),
        };
        let foreground = Text {
            position,
            offset: self.settings.bus_label_offset,
            font_size: self.settings.bus_label_font_size,
            font_family: "Verdana",
            font_weight: Some("bold"),
            data: route.name.clone(),
            fill: color,
            stroke: None,
            stroke_width: None,
        };
        doc.push(Drawable::Text(underlayer));
        doc.push(Drawable::Text(foreground));
    }

    fn render_stop_circles(
        &self,
        doc: &mut Document,
        catalogue: &Catalogue,
        used_stops: &[StopId],
        projector: &SphereProjector,
    ) {
        for stop_id in used_stops {
            let (x, y) = projector.project(catalogue.stop(*stop_id).coordinates);
            doc.push(Drawable::Circle(Circle {
                center: Point(x, y),
                radius: self.settings.stop_radius,
                fill: Color::Named("white".to_string()),
            }));
        }
    }

    fn render_stop_labels(
        &self,
        doc: &mut Document,
        catalogue: &Catalogue,
        used_stops: &[StopId],
        projector: &SphereProjector,
    ) {
        for stop_id in used_stops {
            let stop = catalogue.stop(*stop_id);
            let (x, y) = projector.project(stop.coordinates);
            let position = Point(x, y);
            let underlayer = Text {
                position,
                offset: self.settings.stop_label_offset,
                font_size: self.settings.stop_label_font_size,
                font_family: "Verdana",
                font_weight: None,
                data: stop.name.clone(),
                fill: self.settings.underlayer_color.clone(),
                stroke: Some(self.settings.underlayer_color.clone()),
                stroke_width: Some(self.settings.underlayer_width),
            };
            let foreground = Text {
                position,
                offset: self.settings.stop_label_offset,
                font_size: self.settings.stop_label_font_size,
                font_family: "Verdana",
                font_weight: None,
                data: stop.name.clone(),
                fill: Color::Named("black".to_string()),
                stroke: None,
                stroke_width: None,
            };
            doc.push(Drawable::Text(underlayer));
            doc.push(Drawable::Text(foreground));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geo::Coordinates;
    use crate::svg::Color;

    fn settings_with_palette(colors: &[&str]) -> RenderSettings {
        RenderSettings {
            width: 600.0,
            height: 400.0,
            padding: 20.0,
            line_width: 14.0,
            stop_radius: 5.0,
            bus_label_font_size: 20,
            bus_label_offset: Point(7.0, 15.0),
            stop_label_font_size: 18,
            stop_label_offset: Point(7.0, -3.0),
            underlayer_color: Color::Rgba(255, 255, 255, 0.85),
            underlayer_width: 3.0,
            color_palette: colors.iter().map(|c| Color::Named(c.to_string())).collect(),
        }
    }

    fn three_route_catalogue() -> Catalogue {
        let mut c = Catalogue::new();
        for (name, lat, lng) in [("A", 0.0, 0.0), ("B", 0.1, 0.1), ("C", 0.2, 0.0)] {
            c.add_stop(name, Coordinates::new(lat, lng)).unwrap();
        }
        c.set_stop_distances("A", &[("B".to_string(), 1000)]).unwrap();
        c.set_stop_distances("B", &[("C".to_string(), 1000), ("A".to_string(), 1000)]).unwrap();
        c.set_stop_distances("C", &[("B".to_string(), 1000)]).unwrap();
        c.add_route("R1", &["A".to_string(), "B".to_string()], false).unwrap();
        c.add_route("R2", &["B".to_string(), "C".to_string()], false).unwrap();
        c.add_route("R3", &["A".to_string(), "B".to_string(), "C".to_string(), "B".to_string(), "A".to_string()], true)
            .unwrap();
        c
    }

    #[test]
    fn palette_cycles_across_routes_in_insertion_order() {
        let settings = settings_with_palette(&["red", "green"]);
        let catalogue = three_route_catalogue();
        let renderer = MapRenderer::new(&settings);
        let doc = renderer.render(&catalogue);
        let svg = doc.render();
        let mut strokes = Vec::new();
        for line in svg.lines() {
            if let Some(idx) = line.find("stroke=\"") {
                if line.starts_with("<polyline") {
                    let rest = &line[idx + 8..];
                    let end = rest.find('"').unwrap();
                    strokes.push(rest[..end].to_string());
                }
            }
        }
        assert_eq!(strokes, vec!["red", "green", "red"]);
    }

    #[test]
    fn empty_palette_falls_back_to_black_instead_of_panicking() {
        let settings = settings_with_palette(&[]);
        let catalogue = three_route_catalogue();
        let renderer = MapRenderer::new(&settings);
        let svg = renderer.render(&catalogue).render();
        let stroke_count = svg.matches("stroke=\"black\"").count();
        assert!(stroke_count >= 3, "expected every route polyline to fall back to black, got: {svg}");
    }

    #[test]
    fn empty_catalogue_renders_bare_envelope() {
        let settings = settings_with_palette(&["red"]);
        let catalogue = Catalogue::new();
        let renderer = MapRenderer::new(&settings);
        let svg = renderer.render(&catalogue).render();
        assert!(svg.starts_with("<?xml"));
        assert!(svg.trim_end().ends_with("</svg>"));
    }
}
