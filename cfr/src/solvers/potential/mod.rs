//! Outcome-sampling CFR driven by the shared potential of a congestion game.

pub mod node;
pub mod trainer;

pub use trainer::{
    SolverArgs,
    Trainer,
};
