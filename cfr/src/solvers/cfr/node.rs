use std::fmt::Display;

use crate::{
    games::Game,
    solvers::{
        self,
        InfosetKey,
    },
};

/// Regret minimizer of a single infoset for the zero-sum solver.
///
/// Besides the regret and strategy accumulators it caches, for the visit in progress, the utility
/// vector (one entry per player) returned by each action and the aggregated infoset utility.
pub struct RegretMinimizer<G>
where
    G: Game,
{
    regret_sum: Vec<f64>,
    strategy_sum: Vec<f64>,
    reach_sum: f64,

    action_utils: Vec<Vec<f64>>,
    infostate_util: Vec<f64>,

    actions: Vec<G::Action>,
    key: InfosetKey<G::InfoState>,
}

impl<G> RegretMinimizer<G>
where
    G: Game,
{
    pub fn new(actions: Vec<G::Action>, key: InfosetKey<G::InfoState>, num_players: usize) -> Self {
        let actions_len = actions.len();
        Self {
            regret_sum: vec![0.0; actions_len],
            strategy_sum: vec![0.0; actions_len],
            reach_sum: 0.0,

            action_utils: vec![vec![0.0; num_players]; actions_len],
            infostate_util: vec![0.0; num_players],

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

    pub fn infostate_util(&self) -> &[f64] {
        &self.infostate_util
    }

    pub fn next_strategy(&self) -> Vec<f64> {
        solvers::regret_matching(&self.regret_sum)
    }

    /// Linear averaging: iteration `t` counts `t` times.
    pub fn accumulate_strategy(&mut self, strategy: &[f64], reach: f64, t: usize) {
        let weight = reach * t as f64;
        for (sum, s) in self.strategy_sum.iter_mut().zip(strategy) {
            *sum += s * weight;
        }
        self.reach_sum += weight;
    }

    pub fn reset_utilities(&mut self) {
        self.action_utils.iter_mut().flatten().for_each(|u| *u = 0.0);
        self.infostate_util.iter_mut().for_each(|u| *u = 0.0);
    }

    /// Caches the utility of action `action_index` and adds it, scaled by `weight`, to the infoset
    /// utility.
    pub fn add_action_utility(&mut self, action_index: usize, utility: Vec<f64>, weight: f64) {
        for (total, u) in self.infostate_util.iter_mut().zip(&utility) {
            *total += u * weight;
        }
        self.action_utils[action_index] = utility;
    }

    pub fn accumulate_regret(&mut self, player: usize, reach: f64) {
        let realized = self.infostate_util[player];
        for (regret, utility) in self.regret_sum.iter_mut().zip(&self.action_utils) {
            *regret += (utility[player] - realized) * reach;
        }
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
        for (i, act) in self.actions.iter().enumerate() {
            write!(f, "{}: {:.03}, ", act, avg_strategy[i])?;
        }
        write!(f, "]")?;

        write!(f, " Regret[")?;
        for (i, regret) in self.regret_sum.iter().enumerate() {
            write!(f, "{}: {:.03}, ", self.actions[i], regret)?;
        }
        write!(f, "]")?;

        Ok(())
    }
}
