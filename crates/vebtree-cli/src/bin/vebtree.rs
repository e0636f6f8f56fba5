use clap::Parser;
use vebtree_cli::{Cli, run};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    vebtree::telemetry::init_with_default("warn");

    let cli = Cli::parse();
    let stdout = std::io::stdout();
    run(cli, &mut stdout.lock())
}
