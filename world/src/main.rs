use clap::Parser;
use world::config::Overrides;

/// Runs a world headless until no active agent remains or the day cap is hit.
#[derive(clap::Parser)]
struct Args {
    #[arg(long, default_value = "batch")]
    world_id: String,
    #[command(flatten)]
    overrides: Overrides,
}

fn main() -> anyhow::Result<()> {
    world::init_tracing("info");
    let args = Args::parse();
    let cfg = args.overrides.resolve()?;
    let history = world::run_batch(args.world_id, cfg)?;
    println!("{} days simulated", history.len());
    Ok(())
}
