//! All-pairs-on-demand Dijkstra over the transit graph, with itinerary
//! reconstruction into alternating wait/ride segments.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use petgraph::graph::{EdgeIndex, NodeIndex};
use petgraph::visit::EdgeRef;

use crate::catalogue::StopId;
use crate::graph::{EdgeAnnotation, TransitGraph};

/// A single leg of an itinerary: either waiting at a stop for a bus, or
/// riding a route for some number of spans.
#[derive(Debug, Clone, PartialEq)]
pub enum ItineraryItem {
    Wait { stop: StopId, minutes: f64 },
    Ride { route: crate::catalogue::RouteId, span_count: usize, minutes: f64 },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Itinerary {
    pub items: Vec<ItineraryItem>,
    pub total_time: f64,
}

struct HeapItem {
    cost: f64,
    seq: u64,
    node: NodeIndex,
}

impl PartialEq for HeapItem {
    fn eq(&self, other: &Self) -> bool {
        self.cost == other.cost && self.seq == other.seq
    }
}
impl Eq for HeapItem {}

impl PartialOrd for HeapItem {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for HeapItem {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reversed so `BinaryHeap` (a max-heap) pops the smallest cost
        // first; ties broken by the smallest (earliest) insertion sequence,
        // for a FIFO-stable tie-break.
        other
            .cost
            .partial_cmp(&self.cost)
            .unwrap_or(Ordering::Equal)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

/// Shortest-time route engine over a shared, read-only transit graph. Each
/// query allocates its own Dijkstra state — the engine itself holds nothing
/// mutable.
pub struct RouteEngine<'a> {
    graph: &'a TransitGraph,
}

impl<'a> RouteEngine<'a> {
    pub fn new(graph: &'a TransitGraph) -> Self {
        RouteEngine { graph }
    }

    /// Dijkstra from `from`'s wait vertex, terminating once `to`'s wait
    /// vertex is settled. Returns `None` when no path exists.
    pub fn build_route(&self, from: StopId, to: StopId) -> Option<Itinerary> {
        let source = self.graph.wait_vertex(from);
        let target = self.graph.wait_vertex(to);

        let node_count = self.graph.graph.node_count();
        let mut dist = vec![f64::INFINITY; node_count];
        let mut prev: Vec<Option<(NodeIndex, EdgeIndex)>> = vec![None; node_count];
        let mut settled = vec![false; node_count];

        let mut heap = BinaryHeap::new();
        let mut seq = 0u64;
        dist[source.index()] = 0.0;
        heap.push(HeapItem { cost: 0.0, seq, node: source });
        seq += 1;

        while let Some(HeapItem { cost, node, .. }) = heap.pop() {
            if settled[node.index()] {
                continue;
            }
            settled[node.index()] = true;
            if node == target {
                break;
            }
            if cost > dist[node.index()] {
                continue;
            }
            for edge in self.graph.graph.edges(node) {
                let next = edge.target();
                if settled[next.index()] {
                    continue;
                }
                let weight = edge.weight().minutes();
                let candidate = cost + weight;
                if candidate < dist[next.index()] {
                    dist[next.index()] = candidate;
                    prev[next.index()] = Some((node, edge.id()));
                    heap.push(HeapItem { cost: candidate, seq, node: next });
                    seq += 1;
                }
            }
        }

        if !settled[target.index()] {
            return None;
        }

        let mut edges = Vec::new();
        let mut current = target;
        while current != source {
            let (previous, edge_id) = prev[current.index()]?;
            edges.push(edge_id);
            current = previous;
        }
        edges.reverse();

        let items: Vec<ItineraryItem> = edges
            .iter()
            .map(|&edge_id| match self.graph.graph.edge_weight(edge_id).unwrap() {
                EdgeAnnotation::Wait { stop, minutes } => ItineraryItem::Wait {
                    stop: *stop,
                    minutes: *minutes,
                },
                EdgeAnnotation::Ride { route, span_count, minutes } => ItineraryItem::Ride {
                    route: *route,
                    span_count: *span_count,
                    minutes: *minutes,
                },
            })
            .collect();

        Some(Itinerary {
            total_time: dist[target.index()],
            items,
        })
    }
}
