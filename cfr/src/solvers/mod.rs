use std::{
    fmt::Display,
    path::PathBuf,
};

use clap::{
    Args,
    ValueHint,
};
use more_asserts::debug_assert_ge;

use crate::{
    games::Game,
    report::{
        RegretRecord,
        Strategy,
        StrategyProfile,
    },
};

pub mod cfr;
pub mod potential;

#[derive(Args, Debug, Clone)]
pub struct TrainingArgs {
    /// Minimum number of iterations.
    #[clap(long, short, value_parser, default_value_t = 1000)]
    pub iterations: usize,

    /// Keep training past `iterations` until the overall regret drops below this. Under `compare`
    /// it only applies to the zero-sum run.
    #[clap(long, short, value_parser, default_value_t = f64::INFINITY)]
    pub epsilon: f64,

    /// Record the regret and the average strategies every `update_rate` iterations (0: never).
    #[clap(long, short, value_parser, default_value_t = 1)]
    pub update_rate: usize,

    #[clap(long, short, value_parser, value_hint(ValueHint::FilePath))]
    pub log_path: Option<PathBuf>,
}

impl TrainingArgs {
    pub fn new(iterations: usize) -> Self {
        TrainingArgs {
            iterations,
            epsilon: f64::INFINITY,
            update_rate: 1,
            log_path: None,
        }
    }

    pub fn with_epsilon(mut self, epsilon: f64) -> Self {
        self.epsilon = epsilon;
        self
    }

    pub fn with_update_rate(mut self, update_rate: usize) -> Self {
        self.update_rate = update_rate;
        self
    }

    pub(crate) fn should_record(&self, iteration: usize) -> bool {
        self.update_rate > 0 && iteration % self.update_rate == 0
    }
}

pub trait Solver<G: Game>: Strategy<G> {
    fn game_ref(&self) -> &G;

    /// Iterations run by the latest `train` call.
    fn iteration(&self) -> usize;

    /// Runs one traversal from every start state and returns the overall regret.
    fn train_one_epoch(&mut self, args: &TrainingArgs) -> Vec<f64>;

    /// Trains until the stopping rule holds and returns the number of iterations run.
    fn train(&mut self, args: &TrainingArgs) -> usize;

    fn regret_columns(&self) -> Vec<String>;

    fn regret_table(&self) -> &[RegretRecord];

    fn strategy_history(&self) -> &[StrategyProfile<G>];

    fn average_strategies(&self) -> StrategyProfile<G>;

    fn print_strategy(&self);
}

/// Identifies a decision point: who acts, and what they observe.
#[derive(Debug, Clone, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub struct InfosetKey<I> {
    pub player: usize,
    pub infostate: I,
}

impl<I> InfosetKey<I> {
    pub fn new(player: usize, infostate: I) -> Self {
        InfosetKey {
            player,
            infostate,
        }
    }
}

impl<I: Display> Display for InfosetKey<I> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "p{} {}", self.player, self.infostate)
    }
}

/// Probabilities each player used for the action they scheduled in the current round.
///
/// A traversal threads one context through the recursion. Opening a round saves the previous
/// round's entries and starts from all ones; closing it puts them back.
#[derive(Debug, Clone, PartialEq)]
pub struct RoundContext {
    strategies: Vec<f64>,
}

impl RoundContext {
    pub fn new(num_players: usize) -> Self {
        RoundContext {
            strategies: vec![1.0; num_players],
        }
    }

    pub fn open_round(&mut self) -> Vec<f64> {
        let num_players = self.strategies.len();
        std::mem::replace(&mut self.strategies, vec![1.0; num_players])
    }

    pub fn close_round(&mut self, snapshot: Vec<f64>) {
        self.strategies = snapshot;
    }

    pub fn record(&mut self, player: usize, probability: f64) {
        self.strategies[player] = probability;
    }

    /// Joint probability of everyone but `player` in this round.
    pub fn others_reach(&self, player: usize) -> f64 {
        self.strategies.iter().enumerate().filter(|(i, _)| *i != player).map(|(_, s)| s).product()
    }
}

pub(crate) fn uniform(actions_len: usize) -> Vec<f64> {
    vec![1.0 / actions_len as f64; actions_len]
}

/// Regret matching: play proportionally to positive regret, uniformly when there is none.
pub(crate) fn regret_matching(regret_sum: &[f64]) -> Vec<f64> {
    let normalizing_sum: f64 = regret_sum.iter().map(|r| r.max(0.0)).sum();
    if normalizing_sum <= 0.0 {
        return uniform(regret_sum.len());
    }
    regret_sum
        .iter()
        .map(|r| {
            let p = r.max(0.0) / normalizing_sum;
            debug_assert_ge!(p, 0.0);
            p
        })
        .collect()
}

pub(crate) fn to_average_strategy(strategy_sum: &[f64], reach_sum: f64) -> Vec<f64> {
    if reach_sum <= 0.0 {
        return uniform(strategy_sum.len());
    }
    strategy_sum.iter().map(|s| s / reach_sum).collect()
}

pub(crate) fn average_regret_bound(regret_sum: &[f64], t: usize) -> f64 {
    if regret_sum.is_empty() || t == 0 {
        return 0.0;
    }
    regret_sum.iter().copied().fold(f64::NEG_INFINITY, f64::max) / t as f64
}
