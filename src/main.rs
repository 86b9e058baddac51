mod cli;

use clap::Parser;

use crate::cli::Cli;

#[cfg(windows)]
fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);
    commands::run(cli)
}

#[cfg(not(windows))]
fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);
    anyhow::bail!("PDH is only available on Windows")
}

fn init_logging(verbose: bool) {
    let default_filter = if verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .init();
}

#[cfg(windows)]
mod commands {
    use std::time::Duration;

    use anyhow::{Context, Result};
    use pdhquery::{
        ValueKind, localize,
        pdh::{self, PerfQueryHandle},
        perf::{PerfTracker, SampleValue},
    };

    use crate::cli::{Cli, Command};

    pub fn run(cli: Cli) -> Result<()> {
        match cli.command {
            Command::Expand { path } => expand(&path),
            Command::Validate { path } => validate(&path),
            Command::Info { path, explain } => info(&path, explain),
            Command::Read {
                path,
                kind,
                interval,
                samples,
            } => read(&path, kind, Duration::from_millis(interval), samples),
        }
    }

    fn expand(path: &str) -> Result<()> {
        let counters = localize::localize_and_expand_counter(path)
            .with_context(|| format!("Failed to expand '{}'", path))?;
        for counter in &counters {
            println!("{}\t{}", counter.instance, counter.path);
        }
        log::info!("{} instances", counters.len());
        localize::close_query()?;
        Ok(())
    }

    fn validate(path: &str) -> Result<()> {
        pdh::validate_path(path).with_context(|| format!("'{}' is not a valid path", path))?;
        println!("'{}' is valid", path);
        Ok(())
    }

    fn info(path: &str, explain: bool) -> Result<()> {
        let query = PerfQueryHandle::open_query()?;
        let counter = query
            .add_english_counter(path)
            .with_context(|| format!("Failed to add '{}'", path))?;
        let info = pdh::counter_info(counter, explain)?;

        println!("Counter details:");
        println!("  full path: {}", info.full_path);
        if let Some(machine) = &info.machine_name {
            println!("  machine: {}", machine);
        }
        if let Some(object) = &info.object_name {
            println!("  object: {}", object);
        }
        if let Some(instance) = &info.instance_name {
            println!("  instance: {}", instance);
        }
        if let Some(parent) = &info.parent_instance {
            println!("  parent instance: {}", parent);
        }
        if let Some(counter) = &info.counter_name {
            println!("  counter: {}", counter);
        }
        println!("  type: {:#010X}", info.counter_type);
        println!("  scale: {} (default {})", info.scale, info.default_scale);
        println!("  status: {}", info.status);
        if let Some(text) = &info.explain_text {
            println!("  explain: {}", text);
        }
        Ok(())
    }

    fn read(path: &str, kind: ValueKind, interval: Duration, samples: u32) -> Result<()> {
        let tracker =
            PerfTracker::new(path).with_context(|| format!("Failed to track '{}'", path))?;
        if tracker.instance_count() == 0 {
            log::warn!("No instances match '{}'", path);
            return Ok(());
        }

        tracker.start()?;
        for _ in 0..samples {
            std::thread::sleep(interval);
            for sample in tracker.sample(kind)? {
                match sample.value {
                    SampleValue::Double(value) => println!("{}\t{:.3}", sample.instance, value),
                    SampleValue::Large(value) => println!("{}\t{}", sample.instance, value),
                    SampleValue::Long(value) => println!("{}\t{}", sample.instance, value),
                    SampleValue::Invalid(status) => println!("{}\t<{}>", sample.instance, status),
                }
            }
        }
        tracker.close()?;
        Ok(())
    }
}
