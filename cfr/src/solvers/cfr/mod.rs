pub mod node;

use std::{
    collections::{
        BTreeMap,
        HashMap,
    },
    time::{
        Duration,
        Instant,
    },
};

use itertools::Itertools;
use log::{
    debug,
    info,
};
use more_asserts::assert_gt;
use node::RegretMinimizer;

use crate::{
    games::Game,
    report::{
        RegretRecord,
        Strategy,
        StrategyProfile,
    },
    solvers::{
        InfosetKey,
        RoundContext,
        Solver,
        TrainingArgs,
    },
};

/// Full-width CFR over a simultaneous-move game with zero-sum payoffs.
pub struct Trainer<G>
where
    G: Game,
{
    game: G,
    nodes: HashMap<InfosetKey<G::InfoState>, RegretMinimizer<G>>,
    t: usize,

    regret_table: Vec<RegretRecord>,
    strategy_history: Vec<StrategyProfile<G>>,
}

impl<G> Trainer<G>
where
    G: Game,
{
    pub fn new(game: G) -> Self {
        Trainer {
            game,
            nodes: HashMap::new(),
            t: 0,
            regret_table: vec![],
            strategy_history: vec![],
        }
    }

    pub fn node(&self, key: &InfosetKey<G::InfoState>) -> Option<&RegretMinimizer<G>> {
        self.nodes.get(key)
    }

    /// Every regret minimizer, ordered by infoset key.
    pub fn nodes(&self) -> impl Iterator<Item = &RegretMinimizer<G>> {
        self.nodes.values().sorted_by(|a, b| a.key().cmp(b.key()))
    }

    fn node_mut(&mut self, key: &InfosetKey<G::InfoState>) -> &mut RegretMinimizer<G> {
        self.nodes.get_mut(key).expect("regret minimizer is created before its actions are walked")
    }

    /// Walks every action below the current state and returns the utility vector together with
    /// the reach to hand back to the caller.
    ///
    /// `reach` is the joint probability of the path so far. `info_reach` is the reach at the start
    /// of the current round, shared by every player scheduling in that round.
    pub fn cfr(&mut self, round: &mut RoundContext, reach: f64, info_reach: f64) -> (Vec<f64>, f64) {
        if self.game.is_terminal() {
            return (self.game.utility(), reach);
        }

        let player = self.game.next_player();
        let p = player.index();
        let key = InfosetKey::new(p, self.game.infostate(player));
        let num_players = self.game.num_players();
        let t = self.t;

        let game = &self.game;
        let node = self.nodes.entry(key.clone()).or_insert_with(|| {
            RegretMinimizer::new(game.valid_actions(), key.clone(), num_players)
        });
        let actions = node.get_actions().to_vec();
        assert_gt!(actions.len(), 0);
        let strategy = node.next_strategy();
        node.accumulate_strategy(&strategy, info_reach, t);
        node.reset_utilities();
        debug!("CFR node: {} strategy: {:?}", key, strategy);

        let snapshot = if self.game.has_scheduled_actions() {
            None
        } else {
            Some(round.open_round())
        };

        let mut action_reach = reach;
        for (i, act) in actions.iter().enumerate() {
            let new_reach = reach * strategy[i];
            round.record(p, strategy[i]);

            self.game.take_action(*act);
            let next_info_reach = if self.game.next_player().is_later_in_round_than(p) {
                info_reach
            } else {
                new_reach
            };
            let (action_util, r) = self.cfr(round, new_reach, next_info_reach);
            action_reach = r;
            self.game.undo_action();

            let weight = strategy[i] * round.others_reach(p);
            self.node_mut(&key).add_action_utility(i, action_util, weight);
        }

        let node = self.node_mut(&key);
        match snapshot {
            Some(snapshot) => {
                // This node opened the round, which is fully closed again after the undo.
                node.accumulate_regret(p, reach);
                round.close_round(snapshot);
                (node.infostate_util().to_vec(), reach)
            }
            None => {
                node.accumulate_regret(p, action_reach);
                (node.infostate_util().to_vec(), action_reach)
            }
        }
    }

    /// Sum over each player's infosets of their positive average regret.
    pub fn overall_regret(&self) -> Vec<f64> {
        let mut overall = vec![0.0; self.game.num_players()];
        for node in self.nodes() {
            overall[node.key().player] += node.average_regret_bound(self.t).max(0.0);
        }
        overall
    }
}

impl<G> Strategy<G> for Trainer<G>
where
    G: Game,
{
    fn get_strategy(&self, key: &InfosetKey<G::InfoState>) -> Option<Vec<f64>> {
        self.nodes.get(key).map(|node| node.to_average_strategy())
    }
}

impl<G> Solver<G> for Trainer<G>
where
    G: Game,
{
    fn game_ref(&self) -> &G {
        &self.game
    }

    fn iteration(&self) -> usize {
        self.t
    }

    fn train_one_epoch(&mut self, args: &TrainingArgs) -> Vec<f64> {
        self.t += 1;
        for start_state in self.game.enumerate_start_states() {
            self.game.reset(&start_state);
            let mut round = RoundContext::new(self.game.num_players());
            self.cfr(&mut round, 1.0, 1.0);
        }

        let regret = self.overall_regret();
        if args.should_record(self.t) {
            self.regret_table.push(RegretRecord {
                iteration: self.t,
                regrets: regret.clone(),
            });
            let strategies = self.average_strategies();
            self.strategy_history.push(strategies);
        }
        regret
    }

    fn train(&mut self, args: &TrainingArgs) -> usize {
        self.t = 0;
        let threshold = args.epsilon / self.game.num_players() as f64;
        let converged = |regret: &[f64]| regret.iter().all(|r| *r < threshold);

        let start_t = Instant::now();
        let mut timer = Instant::now();
        let mut regret = self.train_one_epoch(args);
        while self.t < args.iterations || !converged(regret.as_slice()) {
            regret = self.train_one_epoch(args);
            if timer.elapsed() > Duration::from_secs(5) {
                info!("epoch {:10}: overall regret: {:?}", self.t, regret);
                timer = Instant::now();
            }
        }
        info!("Training has finished after {} epochs in {:?}", self.t, start_t.elapsed());

        self.print_strategy();
        info!("# of infoset: {}", self.nodes.len());
        info!("overall regret: {:?}", regret);
        self.t
    }

    fn regret_columns(&self) -> Vec<String> {
        let mut columns = vec!["Iteration".to_string()];
        columns.extend((1..=self.game.num_players()).map(|i| format!("Player {}", i)));
        columns
    }

    fn regret_table(&self) -> &[RegretRecord] {
        &self.regret_table
    }

    fn strategy_history(&self) -> &[StrategyProfile<G>] {
        &self.strategy_history
    }

    /// Average strategy per infostate, averaged over the players who share it.
    fn average_strategies(&self) -> StrategyProfile<G> {
        let num_players = self.game.num_players() as f64;
        let mut profile: StrategyProfile<G> = BTreeMap::new();
        for node in self.nodes() {
            let avg_strategy = node.to_average_strategy();
            let strategy = profile.entry(node.key().infostate.clone()).or_default();
            for (act, prob) in node.get_actions().iter().zip(avg_strategy) {
                *strategy.entry(*act).or_insert(0.0) += prob / num_players;
            }
        }
        profile
    }

    fn print_strategy(&self) {
        info!("Nodes [");
        for node in self.nodes() {
            info!("    {}", node);
        }
        info!("]");
    }
}

#[cfg(test)]
mod tests {
    use more_asserts::{
        assert_gt,
        assert_le,
        assert_lt,
    };
    use rand::SeedableRng;
    use wyhash::WyRng;

    use super::*;
    use crate::games::congestion::{
        ComplexCongestionGame,
        Edge,
        SimpleCongestionGame,
        Vertex,
    };

    const AB: Edge = Edge::new(Vertex::A, Vertex::B);
    const AC: Edge = Edge::new(Vertex::A, Vertex::C);
    const BC: Edge = Edge::new(Vertex::B, Vertex::C);
    const CD: Edge = Edge::new(Vertex::C, Vertex::D);

    fn assert_distributions<G: Game>(profile: &StrategyProfile<G>) {
        for strategy in profile.values() {
            assert!(strategy.values().all(|p| *p >= 0.0));
            assert_le!((strategy.values().sum::<f64>() - 1.0).abs(), 1e-9);
        }
    }

    #[test]
    fn test_simple_game_reaches_equilibrium() {
        let game = SimpleCongestionGame::new(2).unwrap();
        let mut trainer = Trainer::new(game);
        let args = TrainingArgs::new(20_000).with_epsilon(0.01).with_update_rate(100);
        assert_eq!(20_000, trainer.train(&args));

        for regret in trainer.overall_regret() {
            assert_lt!(regret, 0.01 / 2.0);
        }

        // A-B-C-D is the cheapest path whatever the other player does, so both players end up
        // taking it.
        let profile = trainer.average_strategies();
        assert_distributions::<SimpleCongestionGame>(&profile);
        assert_gt!(profile[&Vertex::A][&AB], 0.99);
        assert_lt!(profile[&Vertex::A][&AC], 0.01);
        assert_gt!(profile[&Vertex::B][&BC], 0.99);
        assert_eq!(1.0, profile[&Vertex::C][&CD]);

        for player in 0..2 {
            let strategy = trainer.safe_get_strategy(2, &InfosetKey::new(player, Vertex::A));
            assert_gt!(strategy[0], 0.99);
        }
    }

    #[test]
    fn test_traversal_leaves_game_unwound() {
        let game = SimpleCongestionGame::new(3).unwrap();
        let mut trainer = Trainer::new(game);
        trainer.train(&TrainingArgs::new(3));

        let state = trainer.game_ref().round_state();
        assert!(state.action_history().is_empty());
        assert!(state.player_history().is_empty());
        assert!(state.commits().is_empty());
        assert!(state.scheduled().iter().all(Option::is_none));
        assert_eq!(&[Vertex::A; 3], state.positions());
    }

    #[test]
    fn test_infosets_are_reused() {
        let game = SimpleCongestionGame::new(2).unwrap();
        let mut trainer = Trainer::new(game);
        trainer.train(&TrainingArgs::new(1));
        let count = trainer.nodes().count();
        // Two players, each deciding at A, B and C.
        assert_eq!(6, count);

        trainer.train(&TrainingArgs::new(10));
        assert_eq!(count, trainer.nodes().count());
        assert!(trainer.node(&InfosetKey::new(1, Vertex::B)).is_some());
        assert!(trainer.node(&InfosetKey::new(0, Vertex::D)).is_none());
    }

    #[test]
    fn test_regret_table_cadence() {
        let game = SimpleCongestionGame::new(3).unwrap();
        let mut trainer = Trainer::new(game);
        trainer.train(&TrainingArgs::new(10).with_update_rate(5));

        let iterations: Vec<usize> = trainer.regret_table().iter().map(|r| r.iteration).collect();
        assert_eq!(vec![5, 10], iterations);
        assert!(trainer.regret_table().iter().all(|r| r.regrets.len() == 3));
        assert_eq!(2, trainer.strategy_history().len());
        assert_eq!(
            vec!["Iteration", "Player 1", "Player 2", "Player 3"],
            trainer.regret_columns()
        );
        assert_distributions::<SimpleCongestionGame>(&trainer.average_strategies());
    }

    #[test]
    fn test_epsilon_extends_training() {
        let game = SimpleCongestionGame::new(2).unwrap();
        let mut trainer = Trainer::new(game);
        let epsilon = 1e-3;
        let iterations = trainer.train(&TrainingArgs::new(1).with_epsilon(epsilon));
        assert_gt!(iterations, 10);
        assert!(trainer.overall_regret().iter().all(|r| *r < epsilon / 2.0));
    }

    #[test]
    fn test_complex_game() {
        let mut rng = WyRng::seed_from_u64(42);
        let game = ComplexCongestionGame::new(2, true, &mut rng).unwrap();
        let mut trainer = Trainer::new(game);
        assert_eq!(50, trainer.train(&TrainingArgs::new(50)));

        assert_eq!(50, trainer.regret_table().len());
        for record in trainer.regret_table() {
            assert!(record.regrets.iter().all(|r| r.is_finite() && *r >= 0.0));
        }
        let profile = trainer.average_strategies();
        assert!(!profile.is_empty());
        for strategy in profile.values() {
            assert!(strategy.values().all(|p| p.is_finite() && *p >= 0.0));
        }
    }
}
