// ABOUTME: Command implementations for the slipway CLI.
// ABOUTME: Each submodule owns one subcommand's orchestration.

mod check;
mod run;

pub use check::check;
pub use run::run;
