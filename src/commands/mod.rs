mod inspect;
mod placeholder;
mod render;
mod utils;

use crate::cli::{Cli, Commands, GlobalOptions};
use fitting::FittingResult;

/// The main function to run the command based on CLI input.
pub fn run(cli: Cli) -> FittingResult<()> {
    let Cli { global, command } = cli;
    dispatch(&global, command)
}

/// Dispatch the command to the appropriate handler.
fn dispatch(global: &GlobalOptions, command: Commands) -> FittingResult<()> {
    match command {
        Commands::Render(cmd) => render::run(global, cmd),
        Commands::Inspect(cmd) => inspect::run(global, cmd),
        Commands::Placeholder(cmd) => placeholder::run(global, cmd),
    }
}
