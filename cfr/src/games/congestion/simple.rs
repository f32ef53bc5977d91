use log::debug;
use rand::Rng;

use crate::games::{
    Game,
    GameError,
    PlayerId,
};

use super::{
    rounds::RoundState,
    Edge,
    Network,
    Vertex,
};

use Vertex::*;

const COSTS_2P: &[(Edge, &[f64])] = &[
    (Edge::new(A, B), &[3.0, 6.0]),
    (Edge::new(B, D), &[5.0, 5.0]),
    (Edge::new(A, C), &[7.0, 7.0]),
    (Edge::new(B, C), &[0.0, 0.0]),
    (Edge::new(C, D), &[2.0, 4.0]),
];

const COSTS_3P: &[(Edge, &[f64])] = &[
    (Edge::new(A, B), &[2.0, 3.0, 5.0]),
    (Edge::new(B, D), &[2.0, 3.0, 6.0]),
    (Edge::new(A, C), &[4.0, 6.0, 7.0]),
    (Edge::new(B, C), &[1.0, 2.0, 8.0]),
    (Edge::new(C, D), &[1.0, 5.0, 6.0]),
];

const START: Vertex = A;
const TERMINAL: Vertex = D;

/// Every player travels from `A` to `D` and only observes its own position.
///
/// The potential is reported relative to the best outcome seen so far in the run, so it is never
/// positive.
#[derive(Debug, Clone)]
pub struct SimpleCongestionGame {
    network: Network,
    state: RoundState,
    max_potential: f64,
}

impl SimpleCongestionGame {
    pub fn new(num_players: usize) -> Result<Self, GameError> {
        let costs = match num_players {
            2 => COSTS_2P,
            3 => COSTS_3P,
            _ => {
                return Err(GameError::UnsupportedPlayerCount {
                    game: "Simple Congestion Game",
                    num_players,
                })
            }
        };
        Ok(SimpleCongestionGame {
            network: Network::new(costs),
            state: RoundState::new(vec![START; num_players], TERMINAL),
            max_potential: f64::NEG_INFINITY,
        })
    }

    pub fn round_state(&self) -> &RoundState {
        &self.state
    }
}

impl Game for SimpleCongestionGame {
    type Action = Edge;
    type InfoState = Vertex;
    type StartState = Vec<Vertex>;

    fn num_players(&self) -> usize {
        self.state.num_players()
    }

    fn reset(&mut self, start_state: &Vec<Vertex>) {
        self.state.reset(start_state);
    }

    fn sample_start_state<R: Rng>(&self, _rng: &mut R) -> Vec<Vertex> {
        vec![START; self.num_players()]
    }

    fn enumerate_start_states(&self) -> Vec<Vec<Vertex>> {
        vec![vec![START; self.num_players()]]
    }

    fn infostate(&self, player: PlayerId) -> Vertex {
        self.state.position(player.index())
    }

    fn valid_actions(&self) -> Vec<Edge> {
        match self.state.next_player() {
            PlayerId::Player(i) => self.network.edges_from(self.state.position(i)),
            PlayerId::Terminal => vec![],
        }
    }

    fn next_player(&self) -> PlayerId {
        self.state.next_player()
    }

    fn scheduled_actions(&self) -> &[Option<Edge>] {
        self.state.scheduled()
    }

    fn take_action(&mut self, action: Edge) {
        if !self.valid_actions().contains(&action) {
            debug!("ignoring invalid action {} for {}", action, self.next_player());
            return;
        }
        self.state.schedule(action);
    }

    fn undo_action(&mut self) {
        self.state.undo();
    }

    fn is_terminal(&self) -> bool {
        self.state.is_terminal()
    }

    fn utility(&self) -> Vec<f64> {
        debug_assert!(self.is_terminal(), "utility of a non-terminal state");
        self.network.utility(
            self.num_players(),
            self.state.player_history(),
            self.state.action_history(),
        )
    }

    fn potential(&mut self) -> f64 {
        debug_assert!(self.is_terminal(), "potential of a non-terminal state");
        let potential = self.network.potential(self.state.action_history());
        self.max_potential = self.max_potential.max(potential);
        potential - self.max_potential
    }
}
