use clap::Parser;
use console::style;
use treesync::config::Cli;
use treesync::Config;

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config = Config::load(&cli.output, cli.config.as_deref())?;

    match treesync::commands::run(cli.command, config) {
        Ok(()) => Ok(()),
        // A mistyped label is reported, not treated as a failure
        Err(e) if e.is_invalid_reference() => {
            eprintln!("{} {}", style("error:").red().bold(), e);
            eprintln!("Run `treesync list` to see the available labels.");
            Ok(())
        }
        Err(e) => Err(e.into()),
    }
}

fn init_logging(verbose: u8) {
    let default_filter = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .format_timestamp(None)
        .init();
}
