mod config;
mod telemetry;

use std::io::{self, Write};
use std::thread;
use std::time::Duration;

use clap::Parser;
use config::{AppConfig, CliArgs, Command};
use idworker::{Error, IdGenerator, IdWorker, SnowflakeId, WorkerConfig};
use telemetry::init_telemetry;

#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

/// Give up if the clock is still behind after this many waits.
const MAX_REGRESSION_RETRIES: usize = 3;

fn main() -> anyhow::Result<()> {
    // Load from .env
    let _ = dotenvy::dotenv();
    let args = CliArgs::parse();
    let config = AppConfig::try_from(args)?;

    init_telemetry()?;
    log_startup_info(&config);

    let stdout = io::stdout();
    run(&config, &mut stdout.lock())
}

fn log_startup_info(config: &AppConfig) {
    if cfg!(debug_assertions) {
        tracing::debug!("Starting with full config: {:#?}", config);
    }
}

fn run(config: &AppConfig, out: &mut impl Write) -> anyhow::Result<()> {
    match &config.command {
        Command::Generate { count, decode } => {
            let worker = IdWorker::from_config(&config.worker)?;
            generate(&worker, *count, *decode, out)
        }
        Command::Decode { ids } => decode(&config.worker, ids, out),
    }
}

fn generate<G: IdGenerator>(
    worker: &G,
    count: usize,
    with_fields: bool,
    out: &mut impl Write,
) -> anyhow::Result<()> {
    for _ in 0..count {
        let id = next_id_waiting_out_regressions(worker)?;
        if with_fields {
            writeln!(out, "{id}\t{}", worker.decompose(id))?;
        } else {
            writeln!(out, "{id}")?;
        }
    }
    out.flush()?;
    Ok(())
}

/// Sleeps through short clock regressions instead of failing the whole run.
fn next_id_waiting_out_regressions<G: IdGenerator>(worker: &G) -> anyhow::Result<SnowflakeId> {
    let mut retries = 0;
    loop {
        match worker.next_id() {
            Ok(id) => return Ok(id),
            Err(Error::ClockMovedBackwards { behind_ms }) if retries < MAX_REGRESSION_RETRIES => {
                retries += 1;
                tracing::warn!(behind_ms, retries, "clock moved backwards, waiting");
                thread::sleep(Duration::from_millis(behind_ms));
            }
            Err(e) => return Err(e.into()),
        }
    }
}

fn decode(worker: &WorkerConfig, ids: &[i64], out: &mut impl Write) -> anyhow::Result<()> {
    for &raw in ids {
        let parts = SnowflakeId::from_raw(raw).decompose(&worker.layout, worker.epoch_ms);
        writeln!(out, "{raw}\t{parts}")?;
    }
    out.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use idworker::{BitLayout, TWITTER_EPOCH_MS};

    fn app(command: Command) -> AppConfig {
        AppConfig {
            worker: WorkerConfig::new(5, 3),
            command,
        }
    }

    #[test]
    fn generate_prints_one_id_per_line() {
        let mut out = Vec::new();
        run(
            &app(Command::Generate {
                count: 3,
                decode: false,
            }),
            &mut out,
        )
        .unwrap();

        let text = String::from_utf8(out).unwrap();
        let ids: Vec<i64> = text.lines().map(|line| line.parse().unwrap()).collect();
        assert_eq!(ids.len(), 3);
        assert!(ids.windows(2).all(|pair| pair[0] != pair[1]));
    }

    #[test]
    fn generate_with_decode_appends_fields() {
        let mut out = Vec::new();
        run(
            &app(Command::Generate {
                count: 1,
                decode: true,
            }),
            &mut out,
        )
        .unwrap();

        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("datacenter_id=3 worker_id=5"));
    }

    #[test]
    fn decode_prints_fields() {
        let raw = BitLayout::TWITTER.compose(1_000, 3, 5, 9);
        let mut out = Vec::new();
        run(&app(Command::Decode { ids: vec![raw] }), &mut out).unwrap();

        let text = String::from_utf8(out).unwrap();
        assert_eq!(
            text,
            format!(
                "{raw}\ttimestamp_ms={} datacenter_id=3 worker_id=5 sequence=9\n",
                TWITTER_EPOCH_MS + 1_000
            )
        );
    }
}
