//! Terminal rendering helpers
//!
//! Thin presentation layer for the interactive front end: a banner, the
//! numbered personality listing, and speaker-colored turn bubbles. Kept
//! separate from the controllers, which never print.

use crate::catalog::Personality;
use crate::session::Turn;
use colored::Colorize;

/// Print the application banner
pub fn print_welcome() {
    println!();
    println!("{}", "=== Dual-Agent Discussion Arena ===".blue().bold());
    println!();
}

/// Print the catalog as a numbered list with one-line summaries
pub fn print_personalities(personalities: &[Personality]) {
    println!("{}", "Available personalities:".bold());
    for (i, p) in personalities.iter().enumerate() {
        let summary = p.summary();
        if summary.is_empty() {
            println!("  {}. {}", i + 1, p.name.green());
        } else {
            println!("  {}. {}: {}.", i + 1, p.name.green(), summary);
        }
    }
    println!();
}

/// Print one turn, colored by which side is speaking
///
/// Agent A renders green, everything else magenta, matching the
/// two-party layout of the conversation.
pub fn print_turn(turn: &Turn, is_agent_a: bool) {
    let name = if is_agent_a {
        turn.speaker.green().bold()
    } else {
        turn.speaker.magenta().bold()
    };
    println!("{}:", name);
    println!("  {}", turn.message);
    println!();
}

/// Print a user-visible error message
pub fn print_error(message: &str) {
    eprintln!("{} {}", "error:".red().bold(), message);
}

/// Print a transient status line (upload feedback and the like)
pub fn print_status(message: &str) {
    println!("{}", message.cyan());
}
