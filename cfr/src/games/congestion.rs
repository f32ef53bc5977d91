use std::{
    collections::HashMap,
    fmt::Display,
};

pub mod complex;
pub mod rounds;
pub mod simple;

pub use complex::ComplexCongestionGame;
pub use simple::SimpleCongestionGame;

#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub enum Vertex {
    A,
    B,
    C,
    D,
    E,
    F,
}

impl Display for Vertex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}", self)
    }
}

/// A directed road between two vertices. Taking it moves a player from `from` to `to`.
#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub struct Edge {
    pub from: Vertex,
    pub to: Vertex,
}

impl Edge {
    pub const fn new(from: Vertex, to: Vertex) -> Self {
        Edge {
            from,
            to,
        }
    }
}

impl Display for Edge {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}{}", self.from, self.to)
    }
}

/// Road network of a congestion game: every edge with its marginal cost schedule, indexed by
/// congestion (`costs[k - 1]` is paid by each of the `k` players sharing the edge).
#[derive(Debug, Clone, PartialEq)]
pub struct Network {
    costs: Vec<(Edge, Vec<f64>)>,
}

impl Network {
    pub fn new(costs: &[(Edge, &[f64])]) -> Self {
        Network {
            costs: costs.iter().map(|(edge, c)| (*edge, c.to_vec())).collect(),
        }
    }

    pub fn edges(&self) -> impl Iterator<Item = Edge> + '_ {
        self.costs.iter().map(|(edge, _)| *edge)
    }

    /// Outgoing edges of `vertex`, in table order.
    pub fn edges_from(&self, vertex: Vertex) -> Vec<Edge> {
        self.edges().filter(|edge| edge.from == vertex).collect()
    }

    pub fn marginal_costs(&self, edge: Edge) -> &[f64] {
        self.costs.iter().find(|(e, _)| *e == edge).map(|(_, c)| c.as_slice()).unwrap_or(&[])
    }

    /// Cost paid by each user of `edge` when `congestion` players take it.
    pub fn cost(&self, edge: Edge, congestion: usize) -> f64 {
        if congestion == 0 {
            return 0.0;
        }
        let costs = self.marginal_costs(edge);
        debug_assert!(
            congestion <= costs.len(),
            "{} has no cost for {} players",
            edge,
            congestion
        );
        costs[congestion - 1]
    }

    /// Zero-sum payoffs for a finished episode given who took which edge.
    pub fn utility(&self, num_players: usize, players: &[usize], edges: &[Edge]) -> Vec<f64> {
        let congestion = count_congestion(edges);
        let mut utility = vec![0.0; num_players];
        for (player, edge) in players.iter().zip(edges) {
            utility[*player] -= self.cost(*edge, congestion[edge]);
        }
        let mean = utility.iter().sum::<f64>() / num_players as f64;
        utility.iter().map(|u| u - mean).collect()
    }

    /// Rosenthal potential of a finished episode: every edge contributes its marginal costs up to
    /// its realized congestion.
    pub fn potential(&self, edges: &[Edge]) -> f64 {
        let congestion = count_congestion(edges);
        -self
            .edges()
            .map(|edge| {
                let used = congestion.get(&edge).copied().unwrap_or(0);
                self.marginal_costs(edge).iter().take(used).sum::<f64>()
            })
            .sum::<f64>()
    }
}

fn count_congestion(edges: &[Edge]) -> HashMap<Edge, usize> {
    let mut congestion = HashMap::new();
    for edge in edges {
        *congestion.entry(*edge).or_insert(0) += 1;
    }
    congestion
}
