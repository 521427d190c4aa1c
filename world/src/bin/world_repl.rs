use clap::Parser;
use world::config::Overrides;

#[derive(clap::Parser)]
struct Args {
    #[arg(long, default_value = "repl")]
    world_id: String,
    #[command(flatten)]
    overrides: Overrides,
}

fn main() -> anyhow::Result<()> {
    world::init_tracing("warn");
    let args = Args::parse();
    let cfg = args.overrides.resolve()?;
    world::run_repl(args.world_id, cfg)?;
    println!("stopped");
    Ok(())
}
