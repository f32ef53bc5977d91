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

use clap::Args;
use itertools::Itertools;
use log::{
    debug,
    info,
};
use more_asserts::assert_gt;
use rand::SeedableRng;
use rand_distr::{
    Distribution,
    WeightedIndex,
};
use wyhash::WyRng;

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

use super::node::RegretMinimizer;

#[derive(Args, Debug, Clone)]
pub struct SolverArgs {
    /// Seed of the action sampler.
    #[clap(long, short, value_parser, default_value_t = 42)]
    pub seed: u64,
}

impl Default for SolverArgs {
    fn default() -> Self {
        SolverArgs {
            seed: 42,
        }
    }
}

/// Outcome-sampling CFR: one action is drawn per decision and every player learns from the
/// potential of the sampled outcome.
pub struct Trainer<G>
where
    G: Game,
{
    game: G,
    nodes: HashMap<InfosetKey<G::InfoState>, RegretMinimizer<G>>,
    rng: WyRng,
    t: usize,

    regret_table: Vec<RegretRecord>,
    strategy_history: Vec<StrategyProfile<G>>,
}

impl<G> Trainer<G>
where
    G: Game,
{
    pub fn new(game: G, args: &SolverArgs) -> Self {
        Trainer {
            game,
            nodes: HashMap::new(),
            rng: WyRng::seed_from_u64(args.seed),
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

    /// Samples a single path below the current state and returns the value to hand back to the
    /// caller together with its reach.
    ///
    /// The value is the infoset's aggregated potential when this decision opened a round that is
    /// now closed, and the raw utility of the sampled action otherwise.
    pub fn sampling(&mut self, round: &mut RoundContext, reach: f64, info_reach: f64) -> (f64, f64) {
        if self.game.is_terminal() {
            return (self.game.potential(), reach);
        }

        let player = self.game.next_player();
        let p = player.index();
        let key = InfosetKey::new(p, self.game.infostate(player));
        let t = self.t;

        let game = &self.game;
        let node = self
            .nodes
            .entry(key.clone())
            .or_insert_with(|| RegretMinimizer::new(game.valid_actions(), key.clone()));
        assert_gt!(node.get_actions().len(), 0);
        let strategy = node.next_strategy();
        node.accumulate_strategy(&strategy, info_reach, t);
        node.reset_utilities();

        let i = sample_index(&mut self.rng, &strategy);
        let action = node.get_actions()[i];
        debug!("potential node: {} strategy: {:?} sampled: {}", key, strategy, action);

        let snapshot = if self.game.has_scheduled_actions() {
            None
        } else {
            Some(round.open_round())
        };

        let new_reach = reach * strategy[i];
        round.record(p, strategy[i]);

        self.game.take_action(action);
        let next_info_reach = if self.game.next_player().is_later_in_round_than(p) {
            info_reach
        } else {
            new_reach
        };
        let (action_util, action_reach) = self.sampling(round, new_reach, next_info_reach);
        self.game.undo_action();

        let weight = strategy[i] * round.others_reach(p);
        let node = self
            .nodes
            .get_mut(&key)
            .expect("regret minimizer is created before its action is sampled");
        node.add_action_utility(i, action_util, weight);
        node.accumulate_regret(i, action_reach);

        match snapshot {
            Some(snapshot) => {
                round.close_round(snapshot);
                (node.infostate_util(), reach)
            }
            None => (action_util, action_reach),
        }
    }

    /// Sum over every infoset of its positive average regret.
    pub fn overall_regret(&self) -> f64 {
        self.nodes().map(|node| node.average_regret_bound(self.t).max(0.0)).sum()
    }
}

fn sample_index(rng: &mut WyRng, probs: &[f64]) -> usize {
    let dist = WeightedIndex::new(probs).unwrap_or_else(|e| {
        panic!("Invalid weights: e: {} probs: {:?}", e, probs);
    });
    dist.sample(rng)
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
            self.sampling(&mut round, 1.0, 1.0);
        }

        let regret = self.overall_regret();
        if args.should_record(self.t) {
            self.regret_table.push(RegretRecord {
                iteration: self.t,
                regrets: vec![regret],
            });
            let strategies = self.average_strategies();
            self.strategy_history.push(strategies);
        }
        vec![regret]
    }

    fn train(&mut self, args: &TrainingArgs) -> usize {
        self.t = 0;

        let start_t = Instant::now();
        let mut timer = Instant::now();
        let mut regret = self.train_one_epoch(args)[0];
        while self.t < args.iterations || regret > args.epsilon {
            regret = self.train_one_epoch(args)[0];
            if timer.elapsed() > Duration::from_secs(5) {
                info!("epoch {:10}: overall regret: {:.6}", self.t, regret);
                timer = Instant::now();
            }
        }
        info!("Training has finished after {} epochs in {:?}", self.t, start_t.elapsed());

        self.print_strategy();
        info!("# of infoset: {}", self.nodes.len());
        info!("overall regret: {:.6}", regret);
        self.t
    }

    fn regret_columns(&self) -> Vec<String> {
        vec!["Iteration".to_string(), "Regret".to_string()]
    }

    fn regret_table(&self) -> &[RegretRecord] {
        &self.regret_table
    }

    fn strategy_history(&self) -> &[StrategyProfile<G>] {
        &self.strategy_history
    }

    /// Running mean of the average strategies of every infoset sharing an infostate.
    fn average_strategies(&self) -> StrategyProfile<G> {
        let mut profile: StrategyProfile<G> = BTreeMap::new();
        let mut hits: BTreeMap<G::InfoState, f64> = BTreeMap::new();
        for node in self.nodes() {
            let infostate = &node.key().infostate;
            let n = hits.entry(infostate.clone()).or_insert(0.0);
            let strategy = profile.entry(infostate.clone()).or_default();
            for (act, p) in node.get_actions().iter().zip(node.to_average_strategy()) {
                let mean = strategy.entry(*act).or_insert(0.0);
                *mean = (*n * *mean + p) / (*n + 1.0);
            }
            *n += 1.0;
        }
        profile
    }

    fn print_strategy(&self) {
        info!("Average strategies [");
        for node in self.nodes() {
            info!("    {}", node);
        }
        info!("]");
    }
}
