use std::fs;
use std::path::PathBuf;

use clap::{Parser, Subcommand};
use itertools::Itertools;

use crate::batch::{print_summary, run_batch};
use crate::catalog;
use crate::display::{print_error, print_report, print_success};
use crate::error::SolverResult;
use crate::game::{Game, Support};
use crate::lemke::{solve, SolveOptions};
use crate::numeric::{Field, Rat};

#[derive(Parser)]
#[command(
    name = "seqnash",
    version = "1.0.0",
    about = "Nash equilibria of two-player extensive games via sequence-form complementary pivoting."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Solve a game file for Nash equilibria
    Solve {
        game: PathBuf,
        /// Stop after this many equilibria (0 = unbounded)
        #[arg(long, default_value_t = 0)]
        stop_after: usize,
        /// Maximum enumeration depth (0 = unbounded)
        #[arg(long, default_value_t = 0)]
        max_depth: usize,
        /// Decimal digits when printing probabilities
        #[arg(long, default_value_t = 6)]
        decimals: usize,
        /// Use exact rational arithmetic
        #[arg(long)]
        exact: bool,
        /// Restrict the game to a support file
        #[arg(long)]
        support: Option<PathBuf>,
        /// Stream labeled CSV lines instead of tables
        #[arg(long)]
        csv: bool,
    },
    /// Solve a built-in demo game
    Demo {
        name: Option<String>,
        /// List the available demo games
        #[arg(long)]
        list: bool,
        #[arg(long, default_value_t = 0)]
        stop_after: usize,
        #[arg(long, default_value_t = 0)]
        max_depth: usize,
        #[arg(long, default_value_t = 6)]
        decimals: usize,
        #[arg(long)]
        exact: bool,
    },
    /// Generate, optionally save, and solve a seeded random game
    Random {
        #[arg(long, default_value_t = 1)]
        seed: u64,
        /// Personal decision levels (1-4)
        #[arg(long, default_value_t = 2)]
        levels: usize,
        /// Actions per decision (2-4)
        #[arg(long, default_value_t = 2)]
        actions: usize,
        /// Write the generated game to this path
        #[arg(long)]
        save: Option<PathBuf>,
        #[arg(long, default_value_t = 6)]
        decimals: usize,
    },
    /// Solve many game files in parallel
    Batch {
        games: Vec<PathBuf>,
        #[arg(long, default_value_t = 1)]
        stop_after: usize,
        #[arg(long)]
        exact: bool,
    },
}

pub fn run() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let cli = Cli::parse();
    if let Err(e) = dispatch(cli.command) {
        print_error(&e.to_string());
        std::process::exit(1);
    }
}

fn dispatch(command: Commands) -> SolverResult<()> {
    match command {
        Commands::Solve {
            game,
            stop_after,
            max_depth,
            decimals,
            exact,
            support,
            csv,
        } => {
            let game = Game::load(&game)?;
            let support = match support {
                Some(path) => {
                    let support: Support = serde_json::from_str(&fs::read_to_string(path)?)?;
                    support.validate(&game)?;
                    support
                }
                None => Support::full(&game),
            };
            let opts = SolveOptions {
                stop_after,
                max_depth,
            };
            if exact {
                solve_and_print::<Rat>(&game, &support, opts, decimals, csv)
            } else {
                solve_and_print::<f64>(&game, &support, opts, decimals, csv)
            }
        }
        Commands::Demo {
            name,
            list,
            stop_after,
            max_depth,
            decimals,
            exact,
        } => {
            let name = match (list, name) {
                (true, _) | (false, None) => {
                    println!("Built-in games: {}", catalog::names().iter().join(", "));
                    return Ok(());
                }
                (false, Some(name)) => name,
            };
            let game = catalog::get(&name)?;
            let support = Support::full(&game);
            let opts = SolveOptions {
                stop_after,
                max_depth,
            };
            if exact {
                solve_and_print::<Rat>(&game, &support, opts, decimals, false)
            } else {
                solve_and_print::<f64>(&game, &support, opts, decimals, false)
            }
        }
        Commands::Random {
            seed,
            levels,
            actions,
            save,
            decimals,
        } => {
            let game = catalog::random_game(seed, levels, actions);
            if let Some(path) = save {
                game.save(&path)?;
                print_success(&format!("Saved {}", path.display()));
            }
            let support = Support::full(&game);
            solve_and_print::<f64>(&game, &support, SolveOptions::default(), decimals, false)
        }
        Commands::Batch {
            games,
            stop_after,
            exact,
        } => {
            let opts = SolveOptions {
                stop_after,
                max_depth: 0,
            };
            let outcomes = run_batch(&games, opts, exact);
            print_summary(&outcomes);
            Ok(())
        }
    }
}

fn solve_and_print<T: Field>(
    game: &Game,
    support: &Support,
    opts: SolveOptions,
    decimals: usize,
    csv: bool,
) -> SolverResult<()> {
    let report = solve::<T>(game, support, opts)?;
    if csv {
        let mut out = std::io::stdout().lock();
        for profile in &report.equilibria {
            profile.write_labeled(&mut out, "NE", decimals)?;
        }
        if report.incomplete {
            log::warn!("search incomplete due to degeneracy");
        }
    } else {
        print_report(game, support, &report, decimals);
    }
    Ok(())
}
