//! The in-memory relational model: stops, routes, the asymmetric road-distance
//! table, and the reverse stop→routes index. Built phase-by-phase and frozen
//! once any query is served.

use std::collections::{BTreeSet, HashMap};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::geo::{self, Coordinates};

/// Stable reference to a stop. Indices never change once assigned — the
/// catalogue's `stops` vector is append-only for its whole lifetime, so a
/// `StopId` stays valid for as long as the catalogue itself does.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct StopId(pub u32);

/// Stable reference to a route, same discipline as `StopId`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RouteId(pub u32);

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Stop {
    pub name: String,
    pub coordinates: Coordinates,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Route {
    pub name: String,
    pub is_roundtrip: bool,
    /// The stop list exactly as supplied by the caller.
    pub canonical: Vec<StopId>,
    /// The canonical list mirrored for non-roundtrip routes.
    pub materialized: Vec<StopId>,
    pub unique_stops_count: usize,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RouteStat {
    pub stops_count: usize,
    pub unique_stops_count: usize,
    pub geo_length: f64,
    pub road_length: u64,
}

impl RouteStat {
    pub fn curvature(&self) -> f64 {
        if self.geo_length == 0.0 {
            return 1.0;
        }
        self.road_length as f64 / self.geo_length
    }
}

#[derive(Error, Debug)]
pub enum CatalogueError {
    #[error("stop '{0}' already exists")]
    DuplicateStop(String),
    #[error("route '{0}' already exists")]
    DuplicateRoute(String),
    #[error("unknown stop '{0}'")]
    UnknownStop(String),
}

/// Entity store + indices + distance table + stats. Mutable only during
/// ingestion (`add_stop` / `set_stop_distances` / `add_route`); every read
/// method treats it as frozen. `persist.rs` rebuilds one of these from a
/// compact on-disk artifact by replaying the same ingestion calls, so the
/// name→id indices never need a separate deserialization path.
#[derive(Debug, Default)]
pub struct Catalogue {
    stops: Vec<Stop>,
    routes: Vec<Route>,
    stop_index: HashMap<String, StopId>,
    route_index: HashMap<String, RouteId>,
    distances: HashMap<(StopId, StopId), u32>,
    /// Route names incident to each stop, sorted lexicographically.
    /// Indexed in parallel with `stops`.
    incidence: Vec<BTreeSet<String>>,
}

impl Catalogue {
    pub fn new() -> Self {
        Catalogue::default()
    }

    pub fn add_stop(&mut self, name: &str, coordinates: Coordinates) -> Result<StopId, CatalogueError> {
        if self.stop_index.contains_key(name) {
            return Err(CatalogueError::DuplicateStop(name.to_string()));
        }
        let id = StopId(self.stops.len() as u32);
        self.stops.push(Stop {
            name: name.to_string(),
            coordinates,
        });
        self.incidence.push(BTreeSet::new());
        self.stop_index.insert(name.to_string(), id);
        log::debug!("catalogue: added stop '{name}'");
        Ok(id)
    }

    pub fn set_stop_distances(
        &mut self,
        from_name: &str,
        distances: &[(String, u32)],
    ) -> Result<(), CatalogueError> {
        let from = self.stop_id(from_name)?;
        for (to_name, meters) in distances {
            let to = self.stop_id(to_name)?;
            self.distances.insert((from, to), *meters);
        }
        Ok(())
    }

    pub fn add_route(
        &mut self,
        name: &str,
        canonical_names: &[String],
        is_roundtrip: bool,
    ) -> Result<RouteId, CatalogueError> {
        if self.route_index.contains_key(name) {
            return Err(CatalogueError::DuplicateRoute(name.to_string()));
        }
        let canonical: Vec<StopId> = canonical_names
            .iter()
            .map(|n| self.stop_id(n))
            .collect::<Result<_, _>>()?;

        let unique_stops_count = canonical.iter().collect::<std::collections::HashSet<_>>().len();

        let materialized = if is_roundtrip {
            canonical.clone()
        } else {
            let mut full = canonical.clone();
            full.extend(canonical.iter().rev().skip(1));
            full
        };

        let id = RouteId(self.routes.len() as u32);
        self.routes.push(Route {
            name: name.to_string(),
            is_roundtrip,
            canonical,
            materialized,
            unique_stops_count,
        });

        for stop in &self.routes[id.0 as usize].canonical.clone() {
            self.incidence[stop.0 as usize].insert(name.to_string());
        }
        self.route_index.insert(name.to_string(), id);
        log::debug!("catalogue: added route '{name}' ({} stops)", canonical_names.len());
        Ok(id)
    }

    pub fn stop_id(&self, name: &str) -> Result<StopId, CatalogueError> {
        self.stop_index
            .get(name)
            .copied()
            .ok_or_else(|| CatalogueError::UnknownStop(name.to_string()))
    }

    pub fn find_stop(&self, name: &str) -> Option<StopId> {
        self.stop_index.get(name).copied()
    }

    pub fn find_route(&self, name: &str) -> Option<RouteId> {
        self.route_index.get(name).copied()
    }

    pub fn stop(&self, id: StopId) -> &Stop {
        &self.stops[id.0 as usize]
    }

    pub fn route(&self, id: RouteId) -> &Route {
        &self.routes[id.0 as usize]
    }

    pub fn stops(&self) -> impl Iterator<Item = (StopId, &Stop)> {
        self.stops
            .iter()
            .enumerate()
            .map(|(i, s)| (StopId(i as u32), s))
    }

    pub fn routes(&self) -> impl Iterator<Item = (RouteId, &Route)> {
        self.routes
            .iter()
            .enumerate()
            .map(|(i, r)| (RouteId(i as u32), r))
    }

    pub fn stop_count(&self) -> usize {
        self.stops.len()
    }

    /// The effective distance from `a` to `b`: the explicit `(a,b)` entry if
    /// present, else the `(b,a)` fallback, else absent.
    pub fn effective_distance(&self, a: StopId, b: StopId) -> Option<u32> {
        self.distances
            .get(&(a, b))
            .or_else(|| self.distances.get(&(b, a)))
            .copied()
    }

    /// Explicit `(from, ·)` distance entries, for the persistence codec —
    /// unlike `effective_distance` this does not fall back to the reverse
    /// pair, since the codec must round-trip exactly what was inserted.
    /// Sorted by destination so two runs over identical input produce
    /// byte-identical persisted output regardless of hash-map iteration order.
    pub(crate) fn distances_from(&self, from: StopId) -> impl Iterator<Item = (StopId, u32)> {
        let mut entries: Vec<(StopId, u32)> = self
            .distances
            .iter()
            .filter(move |((a, _), _)| *a == from)
            .map(|((_, b), meters)| (*b, *meters))
            .collect();
        entries.sort_by_key(|(to, _)| to.0);
        entries.into_iter()
    }

    /// Subset of stops whose incidence set is non-empty, sorted by name.
    pub fn used_stops(&self) -> Vec<StopId> {
        let mut used: Vec<StopId> = (0..self.stops.len())
            .filter(|&i| !self.incidence[i].is_empty())
            .map(|i| StopId(i as u32))
            .collect();
        used.sort_by(|a, b| self.stop(*a).name.cmp(&self.stop(*b).name));
        used
    }

    pub fn stop_stat(&self, name: &str) -> Option<&BTreeSet<String>> {
        let id = self.stop_index.get(name)?;
        Some(&self.incidence[id.0 as usize])
    }

    pub fn route_stat(&self, name: &str) -> Option<RouteStat> {
        let id = *self.route_index.get(name)?;
        let route = self.route(id);
        let (geo_length, road_length) = self.calculate_length(route);
        Some(RouteStat {
            stops_count: route.materialized.len(),
            unique_stops_count: route.unique_stops_count,
            geo_length,
            road_length,
        })
    }

    fn calculate_length(&self, route: &Route) -> (f64, u64) {
        let mut geo_length = 0.0;
        let mut road_length: u64 = 0;
        for window in route.materialized.windows(2) {
            let (from, to) = (window[0], window[1]);
            geo_length += geo::compute_distance(self.stop(from).coordinates, self.stop(to).coordinates);
            if let Some(d) = self.effective_distance(from, to) {
                road_length += d as u64;
            }
        }
        if !route.is_roundtrip {
            // The materialized traversal's midpoint is always the route's
            // last canonical stop: an out-and-back path of length 2n-1
            // turns around exactly there. A route with no stops has no
            // midpoint to turn around at.
            if let Some(&mid) = route.canonical.last() {
                if let Some(turnaround) = self.effective_distance(mid, mid) {
                    road_length += turnaround as u64;
                }
            }
        }
        (geo_length, road_length)
    }
}
