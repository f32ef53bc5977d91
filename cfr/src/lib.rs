//! Counterfactual regret minimization on simultaneous-move congestion games.
//!
//! [`solvers::cfr`] walks the full game tree and learns from zero-sum payoffs, while
//! [`solvers::potential`] samples one outcome per decision and learns from the game's potential.

pub mod games;
pub mod report;
pub mod solvers;
