use clap::Parser;
use stoltrade::{Args, commands, default_log_dir, init_logging};

fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;

    let args = Args::parse();
    let log_dir = args.log_dir.unwrap_or_else(default_log_dir);

    let _guard = init_logging(&log_dir, &args.log_level)?;

    let output = commands::run(args.command)?;
    print!("{output}");

    tracing::info!("stoltrade finished");
    Ok(())
}
