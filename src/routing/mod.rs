use itertools::iproduct;
use log::{debug, info};

use crate::geo::{can_connect, chord_distance, Position};
use crate::graph::{RelayId, VisibilityGraph};

/// Transmitter or receiver on the surface, with the relays above its horizon.
#[derive(Debug, Clone, PartialEq)]
pub struct GroundPoint {
    pub position: Position,
    visible: Vec<RelayId>,
}

impl GroundPoint {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            position: Position::surface(latitude, longitude),
            visible: Vec::new(),
        }
    }

    pub fn find_visible_relays(&mut self, graph: &VisibilityGraph) {
        self.visible = graph
            .relays()
            .iter()
            .filter(|r| can_connect(self.position, r.position))
            .map(|r| r.id())
            .collect();
    }

    pub fn visible_relays(&self) -> &[RelayId] {
        &self.visible
    }
}

/// Relay chain between the two ground points. The endpoints are implicit.
#[derive(Debug, Clone, PartialEq)]
pub struct Route {
    pub hops: Vec<RelayId>,
    /// Transmitter to receiver, km.
    pub distance_km: f64,
}

impl Route {
    pub fn names<'a>(&self, graph: &'a VisibilityGraph) -> Vec<&'a str> {
        self.hops
            .iter()
            .filter_map(|&id| graph.relay(id))
            .map(|r| r.name.as_str())
            .collect()
    }
}

/// Cheapest transmitter → relays → receiver chain, or `None` when the two
/// ground points can't be joined through the constellation.
pub fn resolve_route(
    graph: &VisibilityGraph,
    transmitter: &mut GroundPoint,
    receiver: &mut GroundPoint,
) -> Option<Route> {
    if graph.is_empty() {
        info!("no relays loaded, no route");
        return None;
    }

    transmitter.find_visible_relays(graph);
    receiver.find_visible_relays(graph);
    debug!(
        "transmitter sees {} relays, receiver sees {}",
        transmitter.visible_relays().len(),
        receiver.visible_relays().len()
    );

    let mut best: Option<Route> = None;

    for (&start, &end) in iproduct!(transmitter.visible_relays(), receiver.visible_relays()) {
        let Some(hops) = graph.path(start, end) else {
            continue;
        };
        let Some(relayed) = graph.hops_cost(&hops) else {
            continue;
        };
        let (Some(first), Some(last)) = (graph.relay(start), graph.relay(end)) else {
            continue;
        };

        let total = chord_distance(transmitter.position, first.position)
            + relayed
            + chord_distance(receiver.position, last.position);

        // strict: on ties the first candidate found stays
        if best.as_ref().is_none_or(|b| total < b.distance_km) {
            best = Some(Route { hops, distance_km: total });
        }
    }

    match &best {
        Some(route) => info!(
            "route over {} relays, {:.3} km",
            route.hops.len(),
            route.distance_km
        ),
        None => info!("no route between transmitter and receiver"),
    }
    best
}
