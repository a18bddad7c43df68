//! Binary persistence codec, built on `bincode::serialize_into` /
//! `bincode::deserialize_from`. The on-disk shape is a deliberately compact
//! artifact, not a dump of `Catalogue` itself: routes store only their
//! canonical stop list (materialization is re-derived on load) and
//! distances store only the explicit `(from,to)` entries actually inserted.

use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::catalogue::Catalogue;
use crate::error::Error;
use crate::geo::Coordinates;
use crate::graph::RoutingSettings;
use crate::render::RenderSettings;

#[derive(Debug, Serialize, Deserialize)]
struct PersistedStop {
    name: String,
    lat: f64,
    lng: f64,
    /// Explicit `(destination_index, meters)` pairs, source order.
    distances: Vec<(u32, u32)>,
}

#[derive(Debug, Serialize, Deserialize)]
struct PersistedRoute {
    name: String,
    is_roundtrip: bool,
    /// The canonical stop list, as indices into the stop array. Never the
    /// materialized traversal — that's re-derived on load.
    stops: Vec<u32>,
}

#[derive(Debug, Serialize, Deserialize)]
struct PersistedArtifact {
    stops: Vec<PersistedStop>,
    routes: Vec<PersistedRoute>,
    render_settings: RenderSettings,
    routing_settings: RoutingSettings,
}

pub fn save(
    path: &Path,
    catalogue: &Catalogue,
    render_settings: &RenderSettings,
    routing_settings: &RoutingSettings,
) -> Result<(), Error> {
    let stops = catalogue
        .stops()
        .map(|(id, stop)| PersistedStop {
            name: stop.name.clone(),
            lat: stop.coordinates.lat,
            lng: stop.coordinates.lng,
            distances: catalogue
                .distances_from(id)
                .map(|(to, meters)| (to.0, meters))
                .collect(),
        })
        .collect();
    let routes = catalogue
        .routes()
        .map(|(_, route)| PersistedRoute {
            name: route.name.clone(),
            is_roundtrip: route.is_roundtrip,
            stops: route.canonical.iter().map(|id| id.0).collect(),
        })
        .collect();
    let artifact = PersistedArtifact {
        stops,
        routes,
        render_settings: render_settings.clone(),
        routing_settings: *routing_settings,
    };

    let file = File::create(path)?;
    bincode::serialize_into(BufWriter::new(file), &artifact)?;
    log::info!("persisted catalogue to {}", path.display());
    Ok(())
}

pub fn load(path: &Path) -> Result<(Catalogue, RenderSettings, RoutingSettings), Error> {
    let file = File::open(path)?;
    let artifact: PersistedArtifact = bincode::deserialize_from(BufReader::new(file))?;
    log::info!("loaded catalogue from {}", path.display());

    let names: Vec<String> = artifact.stops.iter().map(|s| s.name.clone()).collect();
    let mut catalogue = Catalogue::new();
    for stop in &artifact.stops {
        catalogue.add_stop(&stop.name, Coordinates::new(stop.lat, stop.lng))?;
    }
    for stop in &artifact.stops {
        let distances: Vec<(String, u32)> = stop
            .distances
            .iter()
            .map(|(index, meters)| (names[*index as usize].clone(), *meters))
            .collect();
        catalogue.set_stop_distances(&stop.name, &distances)?;
    }
    for route in &artifact.routes {
        let canonical: Vec<String> = route.stops.iter().map(|index| names[*index as usize].clone()).collect();
        catalogue.add_route(&route.name, &canonical, route.is_roundtrip)?;
    }

    Ok((catalogue, artifact.render_settings, artifact.routing_settings))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::request::{ingest_base_requests, BaseRequest};

    fn build_sample() -> Catalogue {
        let mut catalogue = Catalogue::new();
        let base_requests: Vec<BaseRequest> = serde_json::from_str(
            r#"[
                {"type": "Stop", "name": "A", "latitude": 55.611087, "longitude": 37.20829, "road_distances": {"B": 3900}},
                {"type": "Stop", "name": "B", "latitude": 55.595884, "longitude": 37.209755, "road_distances": {"A": 3900}},
                {"type": "Stop", "name": "C", "latitude": 55.580, "longitude": 37.21, "road_distances": {"C": 100}},
                {"type": "Bus", "name": "R1", "stops": ["A", "B", "A"], "is_roundtrip": true},
                {"type": "Bus", "name": "R2", "stops": ["A", "B", "C"], "is_roundtrip": false}
            ]"#,
        )
        .unwrap();
        ingest_base_requests(&mut catalogue, &base_requests).unwrap();
        catalogue
    }

    #[test]
    fn round_trip_preserves_observable_query_behavior() {
        let catalogue = build_sample();
        let render_settings = RenderSettings::default();
        let routing_settings = RoutingSettings {
            bus_wait_time: 6.0,
            bus_velocity: 40.0,
        };

        let path = std::env::temp_dir().join(format!("transit-catalogue-persist-test-{}.db", std::process::id()));
        save(&path, &catalogue, &render_settings, &routing_settings).unwrap();
        let (loaded, loaded_render, loaded_routing) = load(&path).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(loaded_routing.bus_wait_time, routing_settings.bus_wait_time);
        assert_eq!(loaded_routing.bus_velocity, routing_settings.bus_velocity);
        assert_eq!(loaded_render.color_palette.len(), render_settings.color_palette.len());

        for name in ["A", "B", "C"] {
            assert_eq!(
                catalogue.stop_stat(name).cloned(),
                loaded.stop_stat(name).cloned(),
                "stop stat mismatch for {name}"
            );
        }
        for name in ["R1", "R2"] {
            assert_eq!(catalogue.route_stat(name), loaded.route_stat(name), "route stat mismatch for {name}");
        }
    }
}
