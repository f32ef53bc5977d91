use std::fmt::Display;

use crate::{
    games::Game,
    solvers::{
        self,
        InfosetKey,
    },
};

/// Regret minimizer of a single infoset for the potential solver.
///
/// The potential is shared by every player, so utilities are scalars. Regrets start at one.
pub struct RegretMinimizer<G>
where
    G: Game,
{
    regret_sum: Vec<f64>,
    strategy_sum: Vec<f64>,
    reach_sum: f64,

    action_utils: Vec<f64>,
    infostate_util: f64,

    actions: Vec<G::Action>,
    key: InfosetKey<G::InfoState>,
}

impl<G> RegretMinimizer<G>
where
    G: Game,
{
    pub fn new(actions: Vec<G::Action>, key: InfosetKey<G::InfoState>) -> Self {
        let actions_len = actions.len();
        Self {
            regret_sum: vec![1.0; actions_len],
            strategy_sum: vec![0.0; actions_len],
            reach_sum: 0.0,

            action_utils: vec![0.0; actions_len],
            infostate_util: 0.0,

            actions,
            key,
        }
    }

    pub fn get_actions(&self) -> &[G::Action] {
        &self.actions
    }

    pub fn key(&self) -> &InfosetKey<G::InfoState> {
        &self.key
    }

    pub fn regrets(&self) -> &[f64] {
        &self.regret_sum
    }

    pub fn infostate_util(&self) -> f64 {
        self.infostate_util
    }

    pub fn next_strategy(&self) -> Vec<f64> {
        solvers::regret_matching(&self.regret_sum)
    }

    pub fn accumulate_strategy(&mut self, strategy: &[f64], reach: f64, t: usize) {
        let weight = reach * t as f64;
        for (sum, s) in self.strategy_sum.iter_mut().zip(strategy) {
            *sum += s * weight;
        }
        self.reach_sum += weight;
    }

    pub fn reset_utilities(&mut self) {
        self.action_utils.iter_mut().for_each(|u| *u = 0.0);
        self.infostate_util = 0.0;
    }

    pub fn add_action_utility(&mut self, action_index: usize, utility: f64, weight: f64) {
        self.action_utils[action_index] = utility;
        self.infostate_util += utility * weight;
    }

    /// Only the sampled action learns from this visit.
    pub fn accumulate_regret(&mut self, action_index: usize, reach: f64) {
        self.regret_sum[action_index] += (self.action_utils[action_index] - self.infostate_util) * reach;
    }

    pub fn to_average_strategy(&self) -> Vec<f64> {
        solvers::to_average_strategy(&self.strategy_sum, self.reach_sum)
    }

    pub fn average_regret_bound(&self, t: usize) -> f64 {
        solvers::average_regret_bound(&self.regret_sum, t)
    }
}

impl<G> Display for RegretMinimizer<G>
where
    G: Game,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.key)?;

        let avg_strategy = self.to_average_strategy();
        write!(f, " Avg Strategy[")?;
        for (act, p) in self.actions.iter().zip(&avg_strategy) {
            write!(f, "{}: {:.03}, ", act, p)?;
        }
        write!(f, "]")?;

        write!(f, " Regret[")?;
        for (act, regret) in self.actions.iter().zip(&self.regret_sum) {
            write!(f, "{}: {:.03}, ", act, regret)?;
        }
        write!(f, "]")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::games::congestion::{
        Edge,
        SimpleCongestionGame,
        Vertex,
    };

    fn node() -> RegretMinimizer<SimpleCongestionGame> {
        let actions = vec![Edge::new(Vertex::A, Vertex::B), Edge::new(Vertex::A, Vertex::C)];
        RegretMinimizer::new(actions, InfosetKey::new(1, Vertex::A))
    }

    #[test]
    fn test_regret_is_warm_started() {
        let node = node();
        assert_eq!(&[1.0, 1.0], node.regrets());
        assert_eq!(vec![0.5, 0.5], node.next_strategy());
        assert_eq!(0.5, node.average_regret_bound(2));
        assert_eq!(vec![0.5, 0.5], node.to_average_strategy());
    }

    #[test]
    fn test_only_sampled_action_is_updated() {
        let mut node = node();
        node.reset_utilities();
        node.add_action_utility(1, -4.0, 0.5);
        assert_eq!(-2.0, node.infostate_util());

        node.accumulate_regret(1, 0.25);
        // (-4 - -2) * 0.25
        assert_eq!(&[1.0, 0.5], node.regrets());
        assert_eq!(vec![2.0 / 3.0, 1.0 / 3.0], node.next_strategy());
    }

    #[test]
    fn test_display() {
        let node = node();
        assert_eq!(
            "p1 A Avg Strategy[AB: 0.500, AC: 0.500, ] Regret[AB: 1.000, AC: 1.000, ]",
            node.to_string()
        );
    }
}
