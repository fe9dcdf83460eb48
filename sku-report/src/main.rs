//! sku-report command-line front end

use anyhow::Result;
use clap::Parser;

mod cli;

use cli::{Cli, Commands};

fn main() -> Result<()> {
    let args = Cli::parse();

    init_logging(args.verbose, args.quiet);

    if args.no_color {
        colored::control::set_override(false);
    }

    let settings = cli::load_settings(args.config.as_deref())?;

    match args.command {
        Commands::Analyze(cmd) => cli::handle_analyze(cmd, settings),
        Commands::Inspect(cmd) => cli::handle_inspect(cmd, settings),
    }
}

/// Log level from -v / -q; RUST_LOG still wins when set
fn init_logging(verbose: u8, quiet: bool) {
    use env_logger::Builder;
    use log::LevelFilter;
    use std::io::Write;

    let level = if quiet {
        LevelFilter::Error
    } else {
        match verbose {
            0 => LevelFilter::Warn,
            1 => LevelFilter::Info,
            2 => LevelFilter::Debug,
            _ => LevelFilter::Trace,
        }
    };

    Builder::new()
        .filter_level(level)
        .parse_default_env()
        .format(|buf, record| {
            writeln!(
                buf,
                "[{} {}] {}",
                record.level(),
                record.target(),
                record.args()
            )
        })
        .init();
}
