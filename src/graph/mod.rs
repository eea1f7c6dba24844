use std::cmp::Ordering;
use std::collections::{BTreeMap, BinaryHeap};

use itertools::Itertools;
use log::{debug, warn};

use crate::geo::{can_connect, chord_distance, Position};

/// Stable index of a relay inside a [`VisibilityGraph`] (load order).
pub type RelayId = usize;

#[derive(Debug, Clone, PartialEq)]
pub struct RelayNode {
    pub(crate) id: RelayId,
    pub name: String,
    pub position: Position,
    /// Chord distance (km) to every directly visible relay.
    pub(crate) neighbors: BTreeMap<RelayId, f64>,
    /// First relay to route through for each reachable destination.
    pub(crate) next_hop: BTreeMap<RelayId, RelayId>,
}

impl RelayNode {
    pub fn new(name: impl Into<String>, position: Position) -> Self {
        Self {
            id: 0,
            name: name.into(),
            position,
            neighbors: BTreeMap::new(),
            next_hop: BTreeMap::new(),
        }
    }

    /// Index in the owning graph. Only meaningful once the node went through
    /// [`VisibilityGraph::build`].
    pub fn id(&self) -> RelayId {
        self.id
    }

    pub fn neighbors(&self) -> &BTreeMap<RelayId, f64> {
        &self.neighbors
    }

    pub fn next_hops(&self) -> &BTreeMap<RelayId, RelayId> {
        &self.next_hop
    }
}

/// Relays plus their line-of-sight links and cached next-hop tables.
#[derive(Debug, Clone, PartialEq)]
pub struct VisibilityGraph {
    relays: Vec<RelayNode>,
}

impl VisibilityGraph {
    /// Assigns ids, links every mutually visible pair, then fills the
    /// next-hop tables. Linking must finish before any routing starts since
    /// routing walks the neighbor maps of other nodes.
    pub fn build(relays: Vec<RelayNode>) -> Self {
        let mut graph = Self {
            relays: relays
                .into_iter()
                .enumerate()
                .map(|(id, mut relay)| {
                    relay.id = id;
                    relay.neighbors.clear();
                    relay.next_hop.clear();
                    relay
                })
                .collect(),
        };

        graph.link_visible_pairs();
        graph.populate_next_hops();
        graph
    }

    fn link_visible_pairs(&mut self) {
        let mut links = 0;
        for (a, b) in (0..self.relays.len()).tuple_combinations() {
            let (pa, pb) = (self.relays[a].position, self.relays[b].position);
            if !can_connect(pa, pb) {
                continue;
            }
            let d = chord_distance(pa, pb);

            // a direct hop is always the shortest way to that neighbor
            self.relays[a].neighbors.insert(b, d);
            self.relays[a].next_hop.insert(b, b);
            self.relays[b].neighbors.insert(a, d);
            self.relays[b].next_hop.insert(a, a);
            links += 1;
        }
        debug!("{} relays, {} direct links", self.relays.len(), links);
    }

    fn populate_next_hops(&mut self) {
        let tables: Vec<BTreeMap<RelayId, RelayId>> = (0..self.relays.len())
            .map(|source| self.first_hops_from(source))
            .collect();

        for (relay, table) in self.relays.iter_mut().zip(tables) {
            for (target, hop) in table {
                relay.next_hop.entry(target).or_insert(hop);
            }
        }
    }

    /// Dijkstra from `source` over the direct links, tracking which neighbor
    /// of `source` each settled node was first reached through.
    fn first_hops_from(&self, source: RelayId) -> BTreeMap<RelayId, RelayId> {
        let n = self.relays.len();
        let mut cost = vec![f64::INFINITY; n];
        let mut first_hop: Vec<Option<RelayId>> = vec![None; n];
        let mut settled = vec![false; n];
        let mut heap = BinaryHeap::new();

        cost[source] = 0.0;
        heap.push(Frontier { cost: 0.0, id: source });

        while let Some(Frontier { cost: c, id: u }) = heap.pop() {
            if settled[u] {
                continue;
            }
            settled[u] = true;

            for (&v, &d) in &self.relays[u].neighbors {
                if settled[v] {
                    continue;
                }
                let candidate = c + d;
                if candidate < cost[v] {
                    cost[v] = candidate;
                    first_hop[v] = if u == source { Some(v) } else { first_hop[u] };
                    heap.push(Frontier { cost: candidate, id: v });
                }
            }
        }

        first_hop
            .into_iter()
            .enumerate()
            .filter(|&(target, _)| target != source)
            .filter_map(|(target, hop)| hop.map(|h| (target, h)))
            .collect()
    }

    pub fn relays(&self) -> &[RelayNode] {
        &self.relays
    }

    pub fn relay(&self, id: RelayId) -> Option<&RelayNode> {
        self.relays.get(id)
    }

    pub fn len(&self) -> usize {
        self.relays.len()
    }

    pub fn is_empty(&self) -> bool {
        self.relays.is_empty()
    }

    pub fn neighbors(&self, id: RelayId) -> impl Iterator<Item = (RelayId, f64)> + '_ {
        self.relays
            .get(id)
            .into_iter()
            .flat_map(|r| r.neighbors.iter().map(|(&n, &d)| (n, d)))
    }

    /// Chord distance of a direct link, `None` when the relays can't see each other.
    pub fn distance(&self, a: RelayId, b: RelayId) -> Option<f64> {
        self.relays.get(a)?.neighbors.get(&b).copied()
    }

    pub fn next_hop(&self, from: RelayId, to: RelayId) -> Option<RelayId> {
        self.relays.get(from)?.next_hop.get(&to).copied()
    }

    /// Relay sequence from `from` to `to` (both included) following the
    /// next-hop tables. `None` when `to` is unreachable.
    pub fn path(&self, from: RelayId, to: RelayId) -> Option<Vec<RelayId>> {
        if from >= self.relays.len() || to >= self.relays.len() {
            return None;
        }

        let mut path = vec![from];
        let mut current = from;
        while current != to {
            // a simple path never has more hops than there are relays
            if path.len() > self.relays.len() {
                warn!(
                    "next-hop loop from {} toward {}",
                    self.relays[from].name, self.relays[to].name
                );
                return None;
            }
            current = self.next_hop(current, to)?;
            path.push(current);
        }
        Some(path)
    }

    /// Summed chord distance along [`Self::path`], km.
    pub fn path_cost(&self, from: RelayId, to: RelayId) -> Option<f64> {
        self.hops_cost(&self.path(from, to)?)
    }

    /// Summed chord distance over consecutive relays, `None` if any pair isn't linked.
    pub fn hops_cost(&self, hops: &[RelayId]) -> Option<f64> {
        hops.iter()
            .tuple_windows()
            .map(|(&a, &b)| self.distance(a, b))
            .sum()
    }
}

#[derive(Debug, Clone, Copy)]
struct Frontier {
    cost: f64,
    id: RelayId,
}

impl PartialEq for Frontier {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Frontier {}

impl PartialOrd for Frontier {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Frontier {
    // reversed so BinaryHeap pops the cheapest entry, ties go to the lower id
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .cost
            .total_cmp(&self.cost)
            .then_with(|| other.id.cmp(&self.id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_corrupt_next_hops_report_no_path() {
        let mut graph = VisibilityGraph::build(vec![
            RelayNode::new("A", Position::from_degrees(0.0, 0.0, 500.0)),
            RelayNode::new("B", Position::from_degrees(0.0, 30.0, 500.0)),
            RelayNode::new("C", Position::from_degrees(0.0, 60.0, 500.0)),
        ]);
        // B sends traffic for C back to A
        graph.relays[1].next_hop.insert(2, 0);

        assert_eq!(graph.path(0, 2), None);
        assert_eq!(graph.path_cost(0, 2), None);
    }

    #[test]
    fn test_frontier_pops_cheapest() {
        let mut heap = BinaryHeap::new();
        heap.push(Frontier { cost: 3.0, id: 0 });
        heap.push(Frontier { cost: 1.0, id: 2 });
        heap.push(Frontier { cost: 1.0, id: 1 });

        let order: Vec<RelayId> = std::iter::from_fn(|| heap.pop().map(|f| f.id)).collect();
        assert_eq!(order, vec![1, 2, 0]);
    }
}
