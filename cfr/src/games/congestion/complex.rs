use std::fmt::Display;

use itertools::Itertools;
use log::debug;
use rand::{
    seq::SliceRandom,
    Rng,
};

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
    (Edge::new(A, F), &[2.0, 2.0]),
    (Edge::new(A, D), &[0.0, 0.0]),
    (Edge::new(B, D), &[0.0, 0.0]),
    (Edge::new(B, E), &[0.0, 0.0]),
    (Edge::new(C, E), &[0.0, 0.0]),
    (Edge::new(D, F), &[0.0, 2.0]),
    (Edge::new(E, F), &[0.0, 3.0]),
    (Edge::new(C, F), &[2.0, 2.0]),
];
const TERMINAL_2P: Vertex = F;

const COSTS_3P: &[(Edge, &[f64])] = &[
    (Edge::new(A, B), &[2.0, 3.0, 5.0]),
    (Edge::new(B, D), &[2.0, 3.0, 6.0]),
    (Edge::new(A, C), &[4.0, 6.0, 7.0]),
    (Edge::new(B, C), &[1.0, 2.0, 8.0]),
    (Edge::new(C, D), &[1.0, 5.0, 6.0]),
];
const TERMINAL_3P: Vertex = D;

const START_VERTICES: [Vertex; 3] = [A, B, C];

#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub struct ComplexInfoState {
    pub position: Vertex,
    /// Other players on the same vertex, when the game is played with information.
    pub accompanying: Option<usize>,
}

impl Display for ComplexInfoState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.position)?;
        if let Some(n) = self.accompanying {
            write!(f, "+{}", n)?;
        }
        Ok(())
    }
}

/// Players start on distinct vertices and race to a common terminal vertex.
#[derive(Debug, Clone)]
pub struct ComplexCongestionGame {
    network: Network,
    state: RoundState,
    with_information: bool,
}

impl ComplexCongestionGame {
    /// Builds the game with the players on randomly drawn start vertices.
    pub fn new<R: Rng>(
        num_players: usize,
        with_information: bool,
        rng: &mut R,
    ) -> Result<Self, GameError> {
        let (costs, terminal) = match num_players {
            2 => (COSTS_2P, TERMINAL_2P),
            3 => (COSTS_3P, TERMINAL_3P),
            _ => {
                return Err(GameError::UnsupportedPlayerCount {
                    game: "Complex Congestion Game",
                    num_players,
                })
            }
        };
        let mut game = ComplexCongestionGame {
            network: Network::new(costs),
            state: RoundState::new(START_VERTICES[..num_players].to_vec(), terminal),
            with_information,
        };
        game.reset_random(rng);
        Ok(game)
    }

    pub fn round_state(&self) -> &RoundState {
        &self.state
    }
}

impl Game for ComplexCongestionGame {
    type Action = Edge;
    type InfoState = ComplexInfoState;
    type StartState = Vec<Vertex>;

    fn num_players(&self) -> usize {
        self.state.num_players()
    }

    fn reset(&mut self, start_state: &Vec<Vertex>) {
        self.state.reset(start_state);
    }

    /// Distinct start vertices for two players; the three player game always starts on `[A, B, C]`.
    fn sample_start_state<R: Rng>(&self, rng: &mut R) -> Vec<Vertex> {
        let num_players = self.num_players();
        if num_players == START_VERTICES.len() {
            return START_VERTICES.to_vec();
        }
        let mut vertices = START_VERTICES;
        vertices.shuffle(rng);
        vertices[..num_players].to_vec()
    }

    fn enumerate_start_states(&self) -> Vec<Vec<Vertex>> {
        START_VERTICES.into_iter().permutations(self.num_players()).collect()
    }

    fn infostate(&self, player: PlayerId) -> ComplexInfoState {
        let i = player.index();
        ComplexInfoState {
            position: self.state.position(i),
            accompanying: self.with_information.then(|| self.state.accompanying(i)),
        }
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
        self.network.potential(self.state.action_history())
    }
}

#[cfg(test)]
mod tests {
    use more_asserts::assert_le;
    use rand::SeedableRng;
    use wyhash::WyRng;

    use super::*;

    #[test]
    fn test_player_count_validation() {
        let mut rng = WyRng::seed_from_u64(42);
        assert!(ComplexCongestionGame::new(2, false, &mut rng).is_ok());
        assert!(ComplexCongestionGame::new(3, true, &mut rng).is_ok());
        assert!(ComplexCongestionGame::new(4, false, &mut rng).is_err());
        assert!(ComplexCongestionGame::new(0, false, &mut rng).is_err());
    }

    #[test]
    fn test_random_start_is_distinct_and_seedable() {
        let game_a = ComplexCongestionGame::new(2, false, &mut WyRng::seed_from_u64(7)).unwrap();
        let game_b = ComplexCongestionGame::new(2, false, &mut WyRng::seed_from_u64(7)).unwrap();
        let positions = game_a.round_state().positions();
        assert_eq!(positions, game_b.round_state().positions());
        assert_eq!(2, positions.len());
        assert_ne!(positions[0], positions[1]);
        assert!(positions.iter().all(|p| START_VERTICES.contains(p)));
    }

    #[test]
    fn test_reset_random_clears_the_episode() {
        let mut game = ComplexCongestionGame::new(2, false, &mut WyRng::seed_from_u64(3)).unwrap();
        game.reset(&vec![A, B]);
        game.take_action(Edge::new(A, D));
        game.take_action(Edge::new(B, D));
        assert_eq!(&[D, D], game.round_state().positions());

        let mut rng = WyRng::seed_from_u64(5);
        game.reset_random(&mut rng);
        let positions = game.round_state().positions().to_vec();
        assert_ne!(positions[0], positions[1]);
        assert!(positions.iter().all(|p| START_VERTICES.contains(p)));
        assert!(game.round_state().action_history().is_empty());
        assert!(game.round_state().commits().is_empty());
        assert_eq!(PlayerId::Player(0), game.next_player());

        // Same seed, same draw.
        let mut other = game.clone();
        other.reset_random(&mut WyRng::seed_from_u64(5));
        assert_eq!(positions, other.round_state().positions());

        let mut game = ComplexCongestionGame::new(3, false, &mut rng).unwrap();
        game.reset_random(&mut rng);
        assert_eq!(&[A, B, C], game.round_state().positions());
    }

    #[test]
    fn test_start_states() {
        let mut rng = WyRng::seed_from_u64(42);
        let game = ComplexCongestionGame::new(2, false, &mut rng).unwrap();
        let states = game.enumerate_start_states();
        assert_eq!(6, states.len());
        assert!(states.contains(&vec![A, B]));
        assert!(states.contains(&vec![C, A]));

        let game = ComplexCongestionGame::new(3, false, &mut rng).unwrap();
        assert_eq!(&[A, B, C], game.round_state().positions());
        assert_eq!(6, game.enumerate_start_states().len());
    }

    #[test]
    fn test_infostate_with_information() {
        let mut rng = WyRng::seed_from_u64(42);
        let mut game = ComplexCongestionGame::new(2, true, &mut rng).unwrap();
        game.reset(&vec![A, B]);
        game.take_action(Edge::new(A, D));
        game.take_action(Edge::new(B, D));
        assert_eq!(
            ComplexInfoState {
                position: D,
                accompanying: Some(1),
            },
            game.infostate(PlayerId::Player(0))
        );
        assert_eq!("D+1", game.infostate(PlayerId::Player(1)).to_string());

        let mut game = ComplexCongestionGame::new(2, false, &mut rng).unwrap();
        game.reset(&vec![A, B]);
        assert_eq!("A", game.infostate(PlayerId::Player(0)).to_string());
    }

    #[test]
    fn test_utility_and_potential() {
        let mut rng = WyRng::seed_from_u64(42);
        let mut game = ComplexCongestionGame::new(2, false, &mut rng).unwrap();
        game.reset(&vec![A, C]);
        // p0: A-D-F, p1: C-E-F
        for action in [Edge::new(A, D), Edge::new(C, E), Edge::new(D, F), Edge::new(E, F)] {
            game.take_action(action);
        }
        assert!(game.is_terminal());
        let utility = game.utility();
        assert_le!(utility.iter().sum::<f64>().abs(), 1e-12);
        assert_eq!(vec![0.0, 0.0], utility);
        assert_eq!(0.0, game.potential());

        game.reset(&vec![A, B]);
        // Both go through D and share DF.
        for action in [Edge::new(A, D), Edge::new(B, D), Edge::new(D, F), Edge::new(D, F)] {
            game.take_action(action);
        }
        assert_eq!(vec![0.0, 0.0], game.utility());
        assert_eq!(-2.0, game.potential());
    }

    #[test]
    fn test_uneven_paths_charge_the_right_player() {
        let mut rng = WyRng::seed_from_u64(42);
        let mut game = ComplexCongestionGame::new(2, false, &mut rng).unwrap();
        game.reset(&vec![A, C]);
        // p0: A-F directly, p1: C-E-F
        game.take_action(Edge::new(A, F));
        game.take_action(Edge::new(C, E));
        assert_eq!(PlayerId::Player(1), game.next_player());
        game.take_action(Edge::new(E, F));
        assert!(game.is_terminal());
        // p0 pays 2, p1 pays 0.
        assert_eq!(vec![-1.0, 1.0], game.utility());
    }
}
