use clap::{Parser, Subcommand};

use self::{inspect_weights::InspectWeightsArg, run::RunArg};

mod inspect_weights;
mod run;

#[derive(Debug, Clone, Parser)]
#[command(author, version, about, long_about = None)]
pub struct CommandArgs {
    /// What mode to run the program in
    #[command(subcommand)]
    mode: Mode,
}

#[derive(Debug, Clone, Subcommand)]
enum Mode {
    /// Play episodes between a slider and the tile placer, training learning sliders
    Run(#[clap(flatten)] RunArg),
    /// Summarize the tables of a weight file
    InspectWeights(#[clap(flatten)] InspectWeightsArg),
}

pub fn run() -> anyhow::Result<()> {
    let args = CommandArgs::parse();
    match args.mode {
        Mode::Run(arg) => run::run(&arg)?,
        Mode::InspectWeights(arg) => inspect_weights::run(&arg)?,
    }
    Ok(())
}
