use aisort::cli::{Cli, run_cli};
use aisort::output::OutputFormatter;
use clap::Parser;

fn main() {
    let cli = Cli::parse();
    let report = run_cli(cli);

    if report.success {
        OutputFormatter::success(&report.message);
    } else {
        OutputFormatter::error(&report.message);
        std::process::exit(1);
    }
}
