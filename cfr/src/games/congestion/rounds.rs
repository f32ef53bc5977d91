use crate::games::PlayerId;

use super::{
    Edge,
    Vertex,
};

/// Simultaneous-move bookkeeping shared by the congestion games.
///
/// Actions are scheduled one player at a time and only applied when every player still on the
/// road has scheduled one. Committed actions are appended to two parallel logs (edge, player) and
/// the number committed in that round is pushed onto `commits`, so that undo can pop exactly one
/// round at a time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoundState {
    next_player: PlayerId,
    positions: Vec<Vertex>,
    scheduled: Vec<Option<Edge>>,

    action_history: Vec<Edge>,
    player_history: Vec<usize>,
    commits: Vec<usize>,

    terminal: Vertex,
}

impl RoundState {
    pub fn new(positions: Vec<Vertex>, terminal: Vertex) -> Self {
        let num_players = positions.len();
        let mut state = RoundState {
            next_player: PlayerId::Player(0),
            positions,
            scheduled: vec![None; num_players],
            action_history: vec![],
            player_history: vec![],
            commits: vec![],
            terminal,
        };
        state.next_player = state.first_remaining_player();
        state
    }

    pub fn reset(&mut self, positions: &[Vertex]) {
        debug_assert_eq!(self.positions.len(), positions.len());
        self.positions.copy_from_slice(positions);
        self.scheduled.iter_mut().for_each(|s| *s = None);
        self.action_history.clear();
        self.player_history.clear();
        self.commits.clear();
        self.next_player = self.first_remaining_player();
    }

    pub fn num_players(&self) -> usize {
        self.positions.len()
    }

    pub fn next_player(&self) -> PlayerId {
        self.next_player
    }

    pub fn positions(&self) -> &[Vertex] {
        &self.positions
    }

    pub fn position(&self, player: usize) -> Vertex {
        self.positions[player]
    }

    pub fn scheduled(&self) -> &[Option<Edge>] {
        &self.scheduled
    }

    pub fn action_history(&self) -> &[Edge] {
        &self.action_history
    }

    pub fn player_history(&self) -> &[usize] {
        &self.player_history
    }

    pub fn commits(&self) -> &[usize] {
        &self.commits
    }

    pub fn is_terminal(&self) -> bool {
        self.positions.iter().all(|p| *p == self.terminal)
    }

    /// Number of players other than `player` standing on the same vertex.
    pub fn accompanying(&self, player: usize) -> usize {
        let position = self.positions[player];
        self.positions.iter().filter(|p| **p == position).count() - 1
    }

    fn is_remaining(&self, player: usize) -> bool {
        self.scheduled[player].is_none() && self.positions[player] != self.terminal
    }

    fn first_remaining_player(&self) -> PlayerId {
        match (0..self.num_players()).find(|i| self.is_remaining(*i)) {
            Some(i) => PlayerId::Player(i),
            None => PlayerId::Terminal,
        }
    }

    /// Schedules `edge` for the player to move. The caller is responsible for the edge being one
    /// of that player's valid actions.
    pub fn schedule(&mut self, edge: Edge) {
        let player = self.next_player.index();
        debug_assert_eq!(self.positions[player], edge.from);
        self.scheduled[player] = Some(edge);

        self.next_player = self.first_remaining_player();
        if self.next_player == PlayerId::Terminal {
            self.commit();
        }
    }

    fn commit(&mut self) {
        let mut committed = 0;
        for (player, slot) in self.scheduled.iter_mut().enumerate() {
            if let Some(edge) = slot.take() {
                self.positions[player] = edge.to;
                self.action_history.push(edge);
                self.player_history.push(player);
                committed += 1;
            }
        }
        self.commits.push(committed);
        self.next_player = self.first_remaining_player();
    }

    pub fn undo(&mut self) {
        let round_open = self.scheduled.iter().any(Option::is_some);
        if !round_open {
            if let Some(committed) = self.commits.pop() {
                self.reopen_round(committed);
            }
            return;
        }

        // Slots are filled in player order, so the highest filled slot is the latest one.
        if let Some(player) = self.scheduled.iter().rposition(Option::is_some) {
            self.scheduled[player] = None;
            self.next_player = PlayerId::Player(player);
        }
    }

    /// Moves the last committed round back into the schedule, leaving its last player to move.
    fn reopen_round(&mut self, committed: usize) {
        let start = self.action_history.len() - committed;
        let mut last_player = None;
        for (edge, player) in self.action_history.drain(start..).zip(self.player_history.drain(start..))
        {
            self.positions[player] = edge.from;
            self.scheduled[player] = Some(edge);
            last_player = Some(player);
        }
        if let Some(player) = last_player {
            self.scheduled[player] = None;
            self.next_player = PlayerId::Player(player);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use Vertex::*;

    const AB: Edge = Edge::new(A, B);
    const AC: Edge = Edge::new(A, C);
    const BD: Edge = Edge::new(B, D);
    const CD: Edge = Edge::new(C, D);

    #[test]
    fn test_schedule_does_not_move_players() {
        let mut state = RoundState::new(vec![A, A], D);
        assert_eq!(PlayerId::Player(0), state.next_player());

        state.schedule(AB);
        assert_eq!(PlayerId::Player(1), state.next_player());
        assert_eq!(&[Some(AB), None], state.scheduled());
        assert_eq!(&[A, A], state.positions());
        assert!(state.action_history().is_empty());
    }

    #[test]
    fn test_undo_inside_round() {
        let mut state = RoundState::new(vec![A, A], D);
        let before = state.clone();
        state.schedule(AB);
        state.undo();
        assert_eq!(before, state);
    }

    #[test]
    fn test_commit_and_undo_round() {
        let mut state = RoundState::new(vec![A, A], D);
        state.schedule(AB);
        let mid_round = state.clone();

        state.schedule(AC);
        assert_eq!(&[B, C], state.positions());
        assert_eq!(&[None, None], state.scheduled());
        assert_eq!(&[AB, AC], state.action_history());
        assert_eq!(&[0, 1], state.player_history());
        assert_eq!(&[2], state.commits());
        assert_eq!(PlayerId::Player(0), state.next_player());

        state.undo();
        assert_eq!(mid_round, state);
        state.undo();
        assert_eq!(RoundState::new(vec![A, A], D), state);
    }

    #[test]
    fn test_finished_players_sit_out() {
        let mut state = RoundState::new(vec![A, C], D);
        state.schedule(AB);
        state.schedule(CD);
        assert_eq!(&[B, D], state.positions());
        // Only player 0 is still on the road.
        assert_eq!(PlayerId::Player(0), state.next_player());

        let before = state.clone();
        state.schedule(BD);
        assert!(state.is_terminal());
        assert_eq!(PlayerId::Terminal, state.next_player());
        assert_eq!(&[2, 1], state.commits());

        state.undo();
        assert_eq!(before, state);
        assert_eq!(2, state.action_history().len());
    }

    #[test]
    fn test_undo_on_fresh_state_is_noop() {
        let mut state = RoundState::new(vec![A, A, A], D);
        let before = state.clone();
        state.undo();
        assert_eq!(before, state);
    }

    #[test]
    fn test_accompanying() {
        let state = RoundState::new(vec![A, A, B], D);
        assert_eq!(1, state.accompanying(0));
        assert_eq!(0, state.accompanying(2));
    }
}
