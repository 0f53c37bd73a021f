//! Terminal rendering of proposal views

use lct_governance::{ProposalPhase, ProposalView, Tally, VoteSide};
use owo_colors::OwoColorize;

const SCALE_WIDTH: usize = 40;

pub fn print_proposal(view: &ProposalView) {
    let dot = match view.phase {
        ProposalPhase::Active => "●".green().to_string(),
        ProposalPhase::Closed => "●".bright_black().to_string(),
    };
    println!("{} {} {}", dot, format!("#{}", view.id).bright_black(), view.title.bold());

    println!(
        "  {} {}   {} {}   {} {}",
        "By:".bright_black(),
        view.proposer,
        "Started:".bright_black(),
        view.started.as_deref().unwrap_or("?"),
        "Finishes:".bright_black(),
        view.finishes.as_deref().unwrap_or("?"),
    );
    if view.starts_in_future {
        println!("  {}", "start date is in the future; voting is already open".yellow());
    }
    if !view.description.is_empty() {
        println!("  {}", view.description);
    }

    print_scale(&view.tally);

    if let Some(warning) = &view.warning {
        println!("  {} {}", "⚠".yellow(), warning.yellow());
    }
    if let Some(side) = view.actions.highlighted {
        let label = match side {
            VoteSide::InFavor => "✓ you voted for".green().to_string(),
            VoteSide::Against => "✗ you voted against".red().to_string(),
        };
        let stake = view
            .vote
            .and_then(|v| v.stake())
            .map(lct_governance::to_display_stake)
            .map(|s| format!(" ({} tokens)", s))
            .unwrap_or_default();
        println!("  {}{}", label, stake);
    }

    let mut actions = Vec::new();
    if view.actions.can_cast() {
        actions.push(format!("lct vote {} for|against", view.id));
    }
    if view.can_withdraw == Some(true) {
        actions.push(format!("lct withdraw {}", view.id));
    }
    if !actions.is_empty() {
        println!("  {} {}", "→".cyan(), actions.join("  ").cyan());
    }
    println!();
}

fn print_scale(tally: &Tally) {
    let for_cells = cells(tally.for_percentage);
    let against_cells = cells(tally.against_percentage).min(SCALE_WIDTH - for_cells);
    let gap = SCALE_WIDTH - for_cells - against_cells;

    println!(
        "  {}{}{}",
        "█".repeat(for_cells).green(),
        "░".repeat(gap).bright_black(),
        "█".repeat(against_cells).red()
    );
    println!(
        "  {:<width$}{:>width$}",
        tally.for_total.floor().to_string().green(),
        tally.against_total.floor().to_string().red(),
        width = SCALE_WIDTH / 2
    );
}

/// At least one cell for any non-zero share, so the empty-tally sliver shows.
fn cells(percentage: f64) -> usize {
    if percentage <= 0.0 {
        return 0;
    }
    ((percentage / 100.0 * SCALE_WIDTH as f64).round() as usize).clamp(1, SCALE_WIDTH)
}
