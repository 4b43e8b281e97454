//! Batch solve: run the solver over many game files in parallel and
//! summarize equilibrium counts and timing.

use std::path::{Path, PathBuf};
use std::time::Instant;

use colored::Colorize;
use comfy_table::{Cell, CellAlignment, ContentArrangement, Table};
use rayon::prelude::*;

use crate::error::SolverResult;
use crate::game::{Game, Support};
use crate::lemke::{solve, SolveOptions};
use crate::numeric::Rat;

/// Result of one batch entry. `error` carries the failure message when
/// the file could not be loaded or solved.
#[derive(Debug, Clone)]
pub struct BatchOutcome {
    pub path: PathBuf,
    pub equilibria: usize,
    pub incomplete: bool,
    pub millis: u128,
    pub error: Option<String>,
}

/// Solve every game file, in parallel, with the full support.
pub fn run_batch(paths: &[PathBuf], opts: SolveOptions, exact: bool) -> Vec<BatchOutcome> {
    paths
        .par_iter()
        .map(|path| {
            let start = Instant::now();
            match solve_file(path, opts, exact) {
                Ok((equilibria, incomplete)) => BatchOutcome {
                    path: path.clone(),
                    equilibria,
                    incomplete,
                    millis: start.elapsed().as_millis(),
                    error: None,
                },
                Err(e) => BatchOutcome {
                    path: path.clone(),
                    equilibria: 0,
                    incomplete: false,
                    millis: start.elapsed().as_millis(),
                    error: Some(e.to_string()),
                },
            }
        })
        .collect()
}

fn solve_file(path: &Path, opts: SolveOptions, exact: bool) -> SolverResult<(usize, bool)> {
    let game = Game::load(path)?;
    let support = Support::full(&game);
    if exact {
        let report = solve::<Rat>(&game, &support, opts)?;
        Ok((report.equilibria.len(), report.incomplete))
    } else {
        let report = solve::<f64>(&game, &support, opts)?;
        Ok((report.equilibria.len(), report.incomplete))
    }
}

/// Print the batch summary table and totals.
pub fn print_summary(outcomes: &[BatchOutcome]) {
    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec![
        Cell::new("Game"),
        Cell::new("Equilibria").set_alignment(CellAlignment::Right),
        Cell::new("Time (ms)").set_alignment(CellAlignment::Right),
        Cell::new("Status"),
    ]);

    let mut failures = 0usize;
    let mut total_eq = 0usize;
    for outcome in outcomes {
        let status = match (&outcome.error, outcome.incomplete) {
            (Some(e), _) => {
                failures += 1;
                e.red().to_string()
            }
            (None, true) => "incomplete".yellow().to_string(),
            (None, false) => "ok".green().to_string(),
        };
        total_eq += outcome.equilibria;
        table.add_row(vec![
            Cell::new(outcome.path.display().to_string()),
            Cell::new(outcome.equilibria.to_string()).set_alignment(CellAlignment::Right),
            Cell::new(outcome.millis.to_string()).set_alignment(CellAlignment::Right),
            Cell::new(status),
        ]);
    }

    println!("{}", table);
    println!(
        "  {} games, {} equilibria, {} failures",
        outcomes.len(),
        total_eq,
        failures,
    );
}
