use clap::Parser;
use typecrawler::cli::{Cli, run_cli};
use typecrawler::output::OutputFormatter;

fn main() {
    let cli = Cli::parse();
    typecrawler::init_logging(cli.verbose);

    if let Err(e) = run_cli(cli.command(), cli.config.as_deref()) {
        OutputFormatter::error(&e.to_string());
        std::process::exit(1);
    }
}
