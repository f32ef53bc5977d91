use std::{
    fmt::{
        Debug,
        Display,
    },
    hash::Hash,
};

use rand::Rng;
use thiserror::Error;

pub mod congestion;

#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub enum PlayerId {
    Player(usize),
    /// Nobody is left to move in the current episode.
    Terminal,
}

impl PlayerId {
    pub fn index(&self) -> usize {
        match self {
            PlayerId::Player(i) => *i,
            PlayerId::Terminal => panic!("the terminal sentinel has no player index"),
        }
    }

    /// Returns true when `self` still belongs to the simultaneous round in which `player` just
    /// scheduled an action.
    pub fn is_later_in_round_than(&self, player: usize) -> bool {
        match self {
            PlayerId::Player(i) => *i > player,
            PlayerId::Terminal => false,
        }
    }
}

impl Display for PlayerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PlayerId::Player(i) => write!(f, "p{}", i),
            PlayerId::Terminal => write!(f, "-"),
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum GameError {
    #[error("{game} is only defined for 2 or 3 player games, got {num_players}")]
    UnsupportedPlayerCount {
        game: &'static str,
        num_players: usize,
    },
}

/// A game with simultaneous moves played as a sequence of rounds.
///
/// Within a round players schedule their actions one at a time in index order; nothing is applied
/// until every eligible player has scheduled, at which point the whole round is committed at once.
/// `undo_action` must be the exact inverse of the preceding `take_action`, including the case
/// where that action committed a round.
pub trait Game: Clone + Debug {
    type Action: Display + Debug + Copy + Hash + Eq + Ord;
    /// What a player observes at a decision point. Compared structurally: equal observations are
    /// the same decision point and share one regret minimizer.
    type InfoState: Display + Debug + Clone + Hash + Eq + Ord;
    type StartState: Debug + Clone;

    fn num_players(&self) -> usize;

    fn reset(&mut self, start_state: &Self::StartState);

    fn sample_start_state<R: Rng>(&self, rng: &mut R) -> Self::StartState;

    fn reset_random<R: Rng>(&mut self, rng: &mut R) {
        let start_state = self.sample_start_state(rng);
        self.reset(&start_state);
    }

    fn enumerate_start_states(&self) -> Vec<Self::StartState>;

    fn infostate(&self, player: PlayerId) -> Self::InfoState;

    fn valid_actions(&self) -> Vec<Self::Action>;

    fn next_player(&self) -> PlayerId;

    fn scheduled_actions(&self) -> &[Option<Self::Action>];

    fn has_scheduled_actions(&self) -> bool {
        self.scheduled_actions().iter().any(Option::is_some)
    }

    /// Actions outside of `valid_actions()` are ignored.
    fn take_action(&mut self, action: Self::Action);

    fn undo_action(&mut self);

    fn is_terminal(&self) -> bool;

    /// Zero-sum payoffs. Only meaningful at terminal states.
    fn utility(&self) -> Vec<f64>;

    /// Shared potential of the outcome. Only meaningful at terminal states.
    fn potential(&mut self) -> f64;
}
