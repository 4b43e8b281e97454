use colored::Colorize;
use comfy_table::{Cell, CellAlignment, ContentArrangement, Table};

use crate::game::{Game, Support};
use crate::lemke::SolveReport;
use crate::numeric::Field;
use crate::profile::BehaviorProfile;

/// Render one equilibrium as a per-action probability table.
pub fn equilibrium_table<T: Field>(
    game: &Game,
    support: &Support,
    profile: &BehaviorProfile<T>,
    decimals: usize,
) -> String {
    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec![
        Cell::new("Player"),
        Cell::new("Infoset"),
        Cell::new("Action"),
        Cell::new("Probability").set_alignment(CellAlignment::Right),
    ]);

    for player in 0..2 {
        for (slot0, &iset) in profile.infoset_ids(player).iter().enumerate() {
            let infoset = game.infoset(player, iset);
            let probs = profile.probs(player, slot0);
            for (k, &action) in support.active_actions(player, iset).iter().enumerate() {
                let rendered = probs[k].render(decimals);
                let cell = if probs[k].near_zero() {
                    Cell::new(rendered.dimmed().to_string())
                } else {
                    Cell::new(rendered.green().to_string())
                };
                table.add_row(vec![
                    Cell::new(format!("{}", player + 1)),
                    Cell::new(&infoset.label),
                    Cell::new(&infoset.actions[action]),
                    cell.set_alignment(CellAlignment::Right),
                ]);
            }
        }
    }

    table.to_string()
}

/// Print a full solve report: header, one table per equilibrium, and the
/// degeneracy warning when the search was incomplete.
pub fn print_report<T: Field>(
    game: &Game,
    support: &Support,
    report: &SolveReport<T>,
    decimals: usize,
) {
    println!();
    println!(
        "  {}  {}  |  {} equilibri{} found",
        "NASH".bold(),
        game.title,
        report.equilibria.len(),
        if report.equilibria.len() == 1 { "um" } else { "a" },
    );

    for (i, profile) in report.equilibria.iter().enumerate() {
        println!();
        println!("  {}", format!("Equilibrium {}", i + 1).cyan().bold());
        println!("{}", equilibrium_table(game, support, profile, decimals));
    }

    if report.incomplete {
        println!();
        println!(
            "{} {}",
            "Warning:".yellow().bold(),
            "search incomplete due to degeneracy; the list may not be exhaustive",
        );
    }
    println!();
}

pub fn print_error(msg: &str) {
    eprintln!("{} {}", "Error:".red().bold(), msg);
}

pub fn print_success(msg: &str) {
    println!("{}", msg.green().bold());
}
