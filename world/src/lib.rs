pub mod config;
pub mod parse;
pub mod spawner;

use std::io::{self, BufRead, Write};

use anyhow::Context;
use nom::Finish;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};
use world_core::{DailyRecord, World};

use config::WorldConfig;
use parse::Command;
use spawner::{Response, ResponseOk};

/// Installs the fmt subscriber; `RUST_LOG` overrides `level`.
pub fn init_tracing(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false))
        .with(filter)
        .try_init()
        .ok();
}

/// Runs a world to its end without interaction and returns the daily history.
pub fn run_batch(id: String, cfg: WorldConfig) -> anyhow::Result<Vec<DailyRecord>> {
    let mut world = World::new(id, cfg.runtime, cfg.world)?;
    let mut seen = 0;
    while !world.is_ended() {
        world.tick();
        for r in &world.history()[seen..] {
            tracing::info!(day = r.day, "{}", r.counts);
        }
        seen = world.history().len();
    }
    tracing::info!(
        day = world.current_day(),
        seed = world.seed(),
        "finished: {}",
        world.counts()
    );
    Ok(world.history().to_vec())
}

fn prompt(line: &mut String) -> io::Result<usize> {
    let mut out = io::stdout().lock();
    write!(out, "> ")?;
    out.flush()?;
    line.clear();
    io::stdin().lock().read_line(line)
}

/// Interactive console driving a world thread.
pub fn run_repl(id: String, cfg: WorldConfig) -> anyhow::Result<()> {
    let (spawner, subscriber) = spawner::channel(id, cfg.runtime, cfg.world)?;
    let handle = spawner.spawn()?;
    let mut status = subscriber.recv_status()?;
    let mut line = String::new();
    loop {
        if prompt(&mut line)? == 0 {
            break;
        }
        let cmd = match parse::command(&line).finish() {
            Ok((_, cmd)) => cmd,
            Err(e) => {
                println!("{e}");
                continue;
            }
        };
        let output = match cmd {
            Command::Quit => break,
            Command::None => continue,
            Command::Info => {
                if let Some(s) = subscriber.seek_status().pop() {
                    status = s;
                }
                Response::Ok(ResponseOk::SuccessWithMessage(status.to_string()))
            }
            Command::Req(req) => subscriber.request(req).context("world thread is gone")?,
        };
        match output.as_result() {
            Ok(ResponseOk::Success) => println!("[info] ok"),
            Ok(ResponseOk::SuccessWithMessage(s)) => println!("[info] {s}"),
            Err(e) => eprintln!("[error] {e}"),
        }
    }
    drop(subscriber);
    handle
        .join()
        .map_err(|_| anyhow::anyhow!("world thread panicked"))
}
