use std::{
    error::Error,
    path::{
        Path,
        PathBuf,
    },
};

use clap::{
    Parser,
    Subcommand,
    ValueEnum,
};
use log::{
    info,
    warn,
};
use rand::SeedableRng;
use wyhash::WyRng;

use congestion_cfr::{
    games::{
        congestion::{
            ComplexCongestionGame,
            SimpleCongestionGame,
        },
        Game,
    },
    report,
    solvers::{
        self,
        potential::SolverArgs,
        Solver,
        TrainingArgs,
    },
};

#[derive(Parser)]
struct AppArgs {
    #[clap(long, short, value_enum, default_value_t = GameKind::Simple)]
    game: GameKind,

    #[clap(long, short, value_parser, default_value_t = 2)]
    players: usize,

    /// Let players observe how many others share their vertex (complex game only).
    #[clap(long)]
    with_information: bool,

    /// Seed of the start position sampler.
    #[clap(long, value_parser, default_value_t = 42)]
    game_seed: u64,

    #[clap(subcommand)]
    solver: SolverKind,
}

#[derive(Subcommand)]
enum SolverKind {
    /// Full-width CFR on zero-sum payoffs.
    Cfr(TrainingArgs),
    /// Outcome-sampling CFR on the potential.
    Potential {
        #[clap(flatten)]
        training: TrainingArgs,
        #[clap(flatten)]
        solver: SolverArgs,
    },
    /// Both solvers, the potential one for as many iterations as the zero-sum one needed.
    Compare {
        #[clap(flatten)]
        training: TrainingArgs,
        #[clap(flatten)]
        solver: SolverArgs,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum GameKind {
    Simple,
    Complex,
}

fn main() -> Result<(), Box<dyn Error>> {
    // Initialize env_logger with a default log level of INFO.
    env_logger::init_from_env(
        env_logger::Env::default().filter_or(env_logger::DEFAULT_FILTER_ENV, "info"),
    );

    let args = AppArgs::parse();
    match args.game {
        GameKind::Simple => {
            if args.with_information {
                warn!("--with-information has no effect on the simple game");
            }
            run(SimpleCongestionGame::new(args.players)?, args.solver)
        }
        GameKind::Complex => {
            let mut rng = WyRng::seed_from_u64(args.game_seed);
            let game = ComplexCongestionGame::new(args.players, args.with_information, &mut rng)?;
            run(game, args.solver)
        }
    }
}

fn run<G: Game>(game: G, solver: SolverKind) -> Result<(), Box<dyn Error>> {
    match solver {
        SolverKind::Cfr(training) => {
            let mut trainer = solvers::cfr::Trainer::new(game);
            trainer.train(&training);
            save::<G, _>(&trainer, training.log_path.as_deref())?;
        }
        SolverKind::Potential {
            training,
            solver,
        } => {
            let mut trainer = solvers::potential::Trainer::new(game, &solver);
            trainer.train(&training);
            save::<G, _>(&trainer, training.log_path.as_deref())?;
        }
        SolverKind::Compare {
            training,
            solver,
        } => {
            let mut zero_sum = solvers::cfr::Trainer::new(game.clone());
            let iterations = zero_sum.train(&training);
            info!("zero-sum CFR stopped after {} iterations", iterations);

            let mut potential = solvers::potential::Trainer::new(game, &solver);
            let potential_args = TrainingArgs::new(iterations).with_update_rate(training.update_rate);
            potential.train(&potential_args);

            report::log_strategy_profile::<G>("zero-sum CFR", &zero_sum.average_strategies());
            report::log_strategy_profile::<G>("potential CFR", &potential.average_strategies());

            if let Some(path) = &training.log_path {
                save::<G, _>(&zero_sum, Some(with_suffix(path, "zerosum").as_path()))?;
                save::<G, _>(&potential, Some(with_suffix(path, "potential").as_path()))?;
            }
        }
    }
    Ok(())
}

fn save<G: Game, S: Solver<G>>(solver: &S, path: Option<&Path>) -> Result<(), Box<dyn Error>> {
    if let Some(path) = path {
        report::save_regret_table(path, &solver.regret_columns(), solver.regret_table())?;
    }
    Ok(())
}

/// `out/run.csv` becomes `out/run_<suffix>.csv`.
fn with_suffix(path: &Path, suffix: &str) -> PathBuf {
    let stem = path.file_stem().map(|s| s.to_string_lossy().into_owned()).unwrap_or_default();
    path.with_file_name(format!("{}_{}.csv", stem, suffix))
}
