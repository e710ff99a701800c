//! Replay a recorded event log into a frames trace
//!
//! Usage: frametrace-replay <output> <event-log> [tracer args] -- <target> [args]

use anyhow::{bail, Context, Result};
use frame_tracer::MachineConfig;
use std::path::PathBuf;
use trace_session::{replay_event_log, SessionConfig};
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let argv: Vec<String> = std::env::args().collect();
    let envp: Vec<String> = std::env::vars().map(|(k, v)| format!("{}={}", k, v)).collect();

    let (output, event_log) = match (argv.get(1), argv.get(2)) {
        (Some(output), Some(log)) if output != "--" && log != "--" => {
            (PathBuf::from(output), PathBuf::from(log))
        }
        _ => bail!(
            "usage: {} <output> <event-log> [tracer args] -- <target> [args]",
            argv.first().map(String::as_str).unwrap_or("frametrace-replay")
        ),
    };

    let config = SessionConfig::new(&output, MachineConfig::native());
    let stats = replay_event_log(&config, &argv, &envp, &event_log)
        .with_context(|| format!("Failed to replay {}", event_log.display()))?;

    tracing::info!(
        "Wrote {} ({} instruction frames, {} module frames, {} syscall frames)",
        output.display(),
        stats.instructions,
        stats.modules,
        stats.syscalls
    );
    Ok(())
}
