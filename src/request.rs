//! Request document schema and the thin coordinator that dispatches each
//! `stat_request` to a catalogue lookup, a map render, or a shortest-time
//! itinerary. Payload shapes are plain `serde`-derived structs and enums.

use std::collections::HashMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::catalogue::{Catalogue, CatalogueError};
use crate::geo::Coordinates;
use crate::graph::{RoutingSettings, TransitGraph};
use crate::render::{MapRenderer, RenderSettings};
use crate::router::{ItineraryItem, RouteEngine};

#[derive(Debug, Deserialize)]
pub struct RequestDocument {
    #[serde(default)]
    pub base_requests: Vec<BaseRequest>,
    #[serde(default)]
    pub stat_requests: Vec<StatRequest>,
    #[serde(default)]
    pub render_settings: RenderSettings,
    #[serde(default)]
    pub routing_settings: RoutingSettings,
    pub serialization_settings: SerializationSettings,
}

#[derive(Debug, Deserialize)]
pub struct SerializationSettings {
    pub file: PathBuf,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type")]
pub enum BaseRequest {
    Stop {
        name: String,
        latitude: f64,
        longitude: f64,
        #[serde(default)]
        road_distances: HashMap<String, u32>,
    },
    Bus {
        name: String,
        stops: Vec<String>,
        is_roundtrip: bool,
    },
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type")]
pub enum StatRequest {
    Stop { id: u64, name: String },
    Bus { id: u64, name: String },
    Map { id: u64 },
    Route { id: u64, from: String, to: String },
}

#[derive(Debug, Serialize, PartialEq)]
#[serde(tag = "type")]
pub enum ReplyItem {
    Wait { stop_name: String, time: f64 },
    Bus { bus: String, span_count: usize, time: f64 },
}

#[derive(Debug, Serialize, PartialEq)]
#[serde(untagged)]
pub enum Reply {
    Stop {
        request_id: u64,
        buses: Vec<String>,
    },
    Bus {
        request_id: u64,
        curvature: f64,
        route_length: u64,
        stop_count: usize,
        unique_stop_count: usize,
    },
    Map {
        request_id: u64,
        map: String,
    },
    Route {
        request_id: u64,
        items: Vec<ReplyItem>,
        total_time: f64,
    },
    NotFound {
        request_id: u64,
        error_message: &'static str,
    },
}

/// Ingests `base_requests` into `catalogue` in the order its construct-then-
/// freeze lifecycle demands: every stop, then every distance, then every
/// route. The requests themselves may arrive in any interleaving.
pub fn ingest_base_requests(
    catalogue: &mut Catalogue,
    base_requests: &[BaseRequest],
) -> Result<(), CatalogueError> {
    for request in base_requests {
        if let BaseRequest::Stop { name, latitude, longitude, .. } = request {
            catalogue.add_stop(name, Coordinates::new(*latitude, *longitude))?;
        }
    }
    for request in base_requests {
        if let BaseRequest::Stop { name, road_distances, .. } = request {
            let distances: Vec<(String, u32)> = road_distances
                .iter()
                .map(|(to, meters)| (to.clone(), *meters))
                .collect();
            catalogue.set_stop_distances(name, &distances)?;
        }
    }
    for request in base_requests {
        if let BaseRequest::Bus { name, stops, is_roundtrip } = request {
            catalogue.add_route(name, stops, *is_roundtrip)?;
        }
    }
    Ok(())
}

/// Answers every `stat_request` against a frozen catalogue, building the
/// transit graph at most once and only if a `Route` query actually needs it.
pub fn answer_requests(
    catalogue: &Catalogue,
    render_settings: &RenderSettings,
    routing_settings: &RoutingSettings,
    stat_requests: &[StatRequest],
) -> Result<Vec<Reply>, crate::error::Error> {
    let needs_graph = stat_requests.iter().any(|r| matches!(r, StatRequest::Route { .. }));
    let graph = if needs_graph {
        Some(TransitGraph::build(catalogue, routing_settings)?)
    } else {
        None
    };
    let engine = graph.as_ref().map(RouteEngine::new);
    let renderer = MapRenderer::new(render_settings);

    let replies = stat_requests
        .iter()
        .map(|request| match request {
            StatRequest::Stop { id, name } => answer_stop(catalogue, *id, name),
            StatRequest::Bus { id, name } => answer_bus(catalogue, *id, name),
            StatRequest::Map { id } => Reply::Map {
                request_id: *id,
                map: renderer.render(catalogue).render(),
            },
            StatRequest::Route { id, from, to } => answer_route(catalogue, engine.as_ref(), *id, from, to),
        })
        .collect();
    Ok(replies)
}

fn not_found(request_id: u64) -> Reply {
    Reply::NotFound {
        request_id,
        error_message: "not found",
    }
}

fn answer_stop(catalogue: &Catalogue, id: u64, name: &str) -> Reply {
    match catalogue.stop_stat(name) {
        Some(buses) => Reply::Stop {
            request_id: id,
            buses: buses.iter().cloned().collect(),
        },
        None => {
            log::warn!("stop '{name}' not found for request {id}");
            not_found(id)
        }
    }
}

fn answer_bus(catalogue: &Catalogue, id: u64, name: &str) -> Reply {
    match catalogue.route_stat(name) {
        Some(stat) => Reply::Bus {
            request_id: id,
            curvature: stat.curvature(),
            route_length: stat.road_length,
            stop_count: stat.stops_count,
            unique_stop_count: stat.unique_stops_count,
        },
        None => {
            log::warn!("bus '{name}' not found for request {id}");
            not_found(id)
        }
    }
}

fn answer_route(catalogue: &Catalogue, engine: Option<&RouteEngine>, id: u64, from: &str, to: &str) -> Reply {
    if from == to {
        return Reply::Route {
            request_id: id,
            items: Vec::new(),
            total_time: 0.0,
        };
    }
    let (Some(from_id), Some(to_id)) = (catalogue.find_stop(from), catalogue.find_stop(to)) else {
        log::warn!("route request {id}: unknown stop '{from}' or '{to}'");
        return not_found(id);
    };
    let Some(itinerary) = engine.and_then(|engine| engine.build_route(from_id, to_id)) else {
        log::warn!("route request {id}: no path from '{from}' to '{to}'");
        return not_found(id);
    };
    let items = itinerary
        .items
        .into_iter()
        .map(|item| match item {
            ItineraryItem::Wait { stop, minutes } => ReplyItem::Wait {
                stop_name: catalogue.stop(stop).name.clone(),
                time: minutes,
            },
            ItineraryItem::Ride { route, span_count, minutes } => ReplyItem::Bus {
                bus: catalogue.route(route).name.clone(),
                span_count,
                time: minutes,
            },
        })
        .collect();
    Reply::Route {
        request_id: id,
        items,
        total_time: itinerary.total_time,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_document() -> RequestDocument {
        serde_json::from_str(
            r#"{
                "base_requests": [
                    {"type": "Stop", "name": "A", "latitude": 55.611087, "longitude": 37.20829, "road_distances": {"B": 12000}},
                    {"type": "Stop", "name": "B", "latitude": 55.595884, "longitude": 37.209755, "road_distances": {"A": 12000}},
                    {"type": "Bus", "name": "R", "stops": ["A", "B", "A"], "is_roundtrip": true}
                ],
                "stat_requests": [
                    {"id": 1, "type": "Stop", "name": "A"},
                    {"id": 2, "type": "Bus", "name": "R"},
                    {"id": 3, "type": "Route", "from": "A", "to": "A"},
                    {"id": 4, "type": "Stop", "name": "Ghost"}
                ],
                "routing_settings": {"bus_wait_time": 6.0, "bus_velocity": 40.0},
                "serialization_settings": {"file": "/tmp/does-not-matter.db"}
            }"#,
        )
        .unwrap()
    }

    #[test]
    fn document_parses_and_ingests() {
        let document = sample_document();
        let mut catalogue = Catalogue::new();
        ingest_base_requests(&mut catalogue, &document.base_requests).unwrap();
        assert_eq!(catalogue.stop_count(), 2);
        assert!(catalogue.find_route("R").is_some());
    }

    #[test]
    fn stop_bus_degenerate_route_and_not_found_replies() {
        let document = sample_document();
        let mut catalogue = Catalogue::new();
        ingest_base_requests(&mut catalogue, &document.base_requests).unwrap();
        let replies = answer_requests(
            &catalogue,
            &document.render_settings,
            &document.routing_settings,
            &document.stat_requests,
        )
        .unwrap();

        assert!(matches!(&replies[0], Reply::Stop { request_id: 1, buses } if buses == &["R".to_string()]));
        assert!(matches!(&replies[1], Reply::Bus { request_id: 2, stop_count: 3, unique_stop_count: 2, .. }));
        assert!(matches!(&replies[2], Reply::Route { request_id: 3, items, total_time } if items.is_empty() && *total_time == 0.0));
        assert!(matches!(&replies[3], Reply::NotFound { request_id: 4, error_message: "not found" }));
    }

    #[test]
    fn route_request_reconstructs_itinerary() {
        let document = serde_json::from_str::<RequestDocument>(
            r#"{
                "base_requests": [
                    {"type": "Stop", "name": "A", "latitude": 0.0, "longitude": 0.0, "road_distances": {"B": 12000}},
                    {"type": "Stop", "name": "B", "latitude": 0.1, "longitude": 0.1, "road_distances": {"A": 12000}},
                    {"type": "Bus", "name": "R", "stops": ["A", "B", "A"], "is_roundtrip": true}
                ],
                "stat_requests": [{"id": 1, "type": "Route", "from": "A", "to": "B"}],
                "routing_settings": {"bus_wait_time": 6.0, "bus_velocity": 40.0},
                "serialization_settings": {"file": "/tmp/does-not-matter.db"}
            }"#,
        )
        .unwrap();
        let mut catalogue = Catalogue::new();
        ingest_base_requests(&mut catalogue, &document.base_requests).unwrap();
        let replies = answer_requests(
            &catalogue,
            &document.render_settings,
            &document.routing_settings,
            &document.stat_requests,
        )
        .unwrap();
        match &replies[0] {
            Reply::Route { items, total_time, .. } => {
                assert_eq!(items.len(), 2);
                assert_eq!(items[0], ReplyItem::Wait { stop_name: "A".to_string(), time: 6.0 });
                assert_eq!(items[1], ReplyItem::Bus { bus: "R".to_string(), span_count: 1, time: 18.0 });
                assert!((*total_time - 24.0).abs() < 1e-9);
            }
            other => panic!("expected Route reply, got {other:?}"),
        }
    }
}
