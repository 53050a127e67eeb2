use std::process::ExitCode;

use clap::Parser;

use editfe::cli::{self, CliArgs};
use editfe::logger;

fn main() -> ExitCode {
    logger::init();
    let args = CliArgs::parse();
    cli::run(args)
}
