//! Translates a frozen catalogue into a time-weighted directed graph: two
//! vertices per stop (`wait`/`board`) and the wait/ride edges that connect
//! them, built on `petgraph::graph::DiGraph`.

use petgraph::graph::{DiGraph, NodeIndex};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::catalogue::{Catalogue, RouteId, StopId};

const MINUTES_PER_METER_PER_KMH: f64 = 60.0 / 1000.0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RoutingSettings {
    pub bus_wait_time: f64,
    pub bus_velocity: f64,
}

impl Default for RoutingSettings {
    fn default() -> Self {
        RoutingSettings {
            bus_wait_time: 0.0,
            bus_velocity: 0.0,
        }
    }
}

/// The two vertex identities a stop owns in the transit graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Vertex {
    Wait(StopId),
    Board(StopId),
}

/// What an edge represents, carried alongside its weight so an itinerary can
/// be reconstructed into human-readable segments.
#[derive(Debug, Clone, PartialEq)]
pub enum EdgeAnnotation {
    Wait { stop: StopId, minutes: f64 },
    Ride { route: RouteId, span_count: usize, minutes: f64 },
}

impl EdgeAnnotation {
    pub fn minutes(&self) -> f64 {
        match self {
            EdgeAnnotation::Wait { minutes, .. } => *minutes,
            EdgeAnnotation::Ride { minutes, .. } => *minutes,
        }
    }
}

#[derive(Error, Debug)]
pub enum GraphError {
    #[error("no road distance known for adjacent stops '{0}' <-> '{1}' on route '{2}'")]
    MissingAdjacency(String, String, String),
}

/// The directed weighted graph plus the stop→vertex lookup needed to seed a
/// shortest-path query at a named stop.
pub struct TransitGraph {
    pub(crate) graph: DiGraph<Vertex, EdgeAnnotation>,
    wait_vertex: Vec<NodeIndex>,
    board_vertex: Vec<NodeIndex>,
}

impl TransitGraph {
    pub fn build(catalogue: &Catalogue, settings: &RoutingSettings) -> Result<TransitGraph, GraphError> {
        let stop_count = catalogue.stop_count();
        let mut graph = DiGraph::with_capacity(stop_count * 2, 0);
        let mut wait_vertex = Vec::with_capacity(stop_count);
        let mut board_vertex = Vec::with_capacity(stop_count);

        for (stop_id, _) in catalogue.stops() {
            let wait = graph.add_node(Vertex::Wait(stop_id));
            let board = graph.add_node(Vertex::Board(stop_id));
            wait_vertex.push(wait);
            board_vertex.push(board);
            graph.add_edge(
                wait,
                board,
                EdgeAnnotation::Wait {
                    stop: stop_id,
                    minutes: settings.bus_wait_time,
                },
            );
        }

        for (route_id, route) in catalogue.routes() {
            let stops = &route.materialized;
            for i in 0..stops.len() {
                let mut minutes = 0.0;
                for j in (i + 1)..stops.len() {
                    let (from, to) = (stops[j - 1], stops[j]);
                    let distance = catalogue.effective_distance(from, to).ok_or_else(|| {
                        GraphError::MissingAdjacency(
                            catalogue.stop(from).name.clone(),
                            catalogue.stop(to).name.clone(),
                            route.name.clone(),
                        )
                    })?;
                    minutes += ride_minutes(distance, settings.bus_velocity);

                    let from_board = board_vertex[stops[i].0 as usize];
                    let to_wait = wait_vertex[stops[j].0 as usize];
                    graph.add_edge(
                        from_board,
                        to_wait,
                        EdgeAnnotation::Ride {
                            route: route_id,
                            span_count: j - i,
                            minutes,
                        },
                    );
                }
            }
        }

        log::info!(
            "transit graph: {} vertices, {} edges",
            graph.node_count(),
            graph.edge_count()
        );

        Ok(TransitGraph {
            graph,
            wait_vertex,
            board_vertex,
        })
    }

    pub fn wait_vertex(&self, stop: StopId) -> NodeIndex {
        self.wait_vertex[stop.0 as usize]
    }
}

fn ride_minutes(distance_meters: u32, velocity_kmh: f64) -> f64 {
    distance_meters as f64 / velocity_kmh * MINUTES_PER_METER_PER_KMH
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geo::Coordinates;

    #[test]
    fn roundtrip_route_produces_one_hop_edge() {
        let mut c = Catalogue::new();
        c.add_stop("A", Coordinates::new(0.0, 0.0)).unwrap();
        c.add_stop("B", Coordinates::new(0.1, 0.1)).unwrap();
        c.set_stop_distances("A", &[("B".to_string(), 12000)]).unwrap();
        c.set_stop_distances("B", &[("A".to_string(), 12000)]).unwrap();
        c.add_route("R", &["A".to_string(), "B".to_string(), "A".to_string()], true)
            .unwrap();
        let settings = RoutingSettings {
            bus_wait_time: 6.0,
            bus_velocity: 40.0,
        };
        let graph = TransitGraph::build(&c, &settings).unwrap();
        assert_eq!(graph.graph.node_count(), 4);
        // Two wait edges, plus one ride edge per (i, j) pair over the
        // 3-stop materialized path [A, B, A]: A->B span1, A->A span2,
        // B->A span1.
        assert_eq!(graph.graph.edge_count(), 5);
    }

    #[test]
    fn missing_adjacency_distance_is_an_error() {
        let mut c = Catalogue::new();
        c.add_stop("A", Coordinates::new(0.0, 0.0)).unwrap();
        c.add_stop("B", Coordinates::new(0.1, 0.1)).unwrap();
        c.add_route("R", &["A".to_string(), "B".to_string()], true).unwrap();
        let settings = RoutingSettings {
            bus_wait_time: 1.0,
            bus_velocity: 10.0,
        };
        assert!(TransitGraph::build(&c, &settings).is_err());
    }
}
