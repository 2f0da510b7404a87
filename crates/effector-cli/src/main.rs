//! effector - run an effect script against the in-memory device.

mod script;

use std::collections::{BTreeMap, HashMap};
use std::path::PathBuf;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::time::{Instant, MissedTickBehavior, sleep_until};
use tracing::{info, warn};

use effector_core::app::{AppBuilder, EngineConfig};
use effector_core::domain::{EffectEvent, RequestId};
use effector_core::impls::{InMemoryDevice, TracingEventSink};
use effector_core::pack::EffectKind;
use effector_core::ports::EventSink;

use crate::script::Step;

#[derive(Parser)]
#[command(
    name = "effector",
    about = "Replay timed game effects against an emulated memory",
    version
)]
struct Cli {
    /// Engine config (JSON). Defaults apply when omitted.
    #[arg(long, env = "EFFECTOR_CONFIG")]
    config: Option<PathBuf>,

    /// Script of requests and stops, one JSON object per line.
    #[arg(long)]
    script: PathBuf,

    /// Initial memory contents (JSON array of address/width/value).
    #[arg(long)]
    seed_memory: Option<PathBuf>,
}

/// Logs every event and counts how requests ended.
#[derive(Default)]
struct SummarySink {
    log: TracingEventSink,
    outcomes: Mutex<BTreeMap<String, usize>>,
}

impl SummarySink {
    fn count(&self, key: String) {
        *self
            .outcomes
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(key)
            .or_default() += 1;
    }

    fn outcomes(&self) -> BTreeMap<String, usize> {
        self.outcomes
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl EventSink for SummarySink {
    fn emit(&self, event: EffectEvent) {
        match &event {
            EffectEvent::Rejected { .. } => self.count("rejected".into()),
            EffectEvent::Terminated { termination, .. } => {
                self.count(format!("{termination:?}").to_lowercase())
            }
            _ => {}
        }
        self.log.emit(event);
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .with_target(false)
        .init();

    let config = match &cli.config {
        Some(path) => EngineConfig::load(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => EngineConfig::default(),
    };
    let steps = script::parse_script(
        &std::fs::read_to_string(&cli.script)
            .with_context(|| format!("reading script {}", cli.script.display()))?,
    )?;

    let device = Arc::new(InMemoryDevice::new());
    if let Some(path) = &cli.seed_memory {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading seed memory {}", path.display()))?;
        for (address, width, value) in script::parse_seed(&text)? {
            device.poke(address, width, value);
        }
    }

    let sink = Arc::new(SummarySink::default());
    let frame_interval = config.frame_interval();
    let controller = AppBuilder::new()
        .device(device.clone())
        .events(sink.clone())
        .config(config)
        .expect_kinds(&EffectKind::ALL)
        .build()?;

    let ticker = {
        let device = device.clone();
        tokio::spawn(async move {
            let mut frames = tokio::time::interval(frame_interval);
            frames.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                frames.tick().await;
                device.tick();
            }
        })
    };

    let start = Instant::now();
    let mut submitted: HashMap<usize, RequestId> = HashMap::new();
    for (line, step) in steps.iter().enumerate() {
        sleep_until(start + Duration::from_millis(step.at_ms())).await;
        if let Some(request) = step.request() {
            if let Ok(id) = controller.submit(request) {
                submitted.insert(line, id);
            }
        } else if let Step::Stop { stop, .. } = *step {
            match submitted.get(&stop) {
                Some(&id) => {
                    if !controller.stop(id).await {
                        info!(line, target_line = stop, "request already finished");
                    }
                }
                None => warn!(line, target_line = stop, "stop refers to no submitted request"),
            }
        }
    }

    controller.wait_all().await;
    ticker.abort();

    info!(
        submitted = submitted.len(),
        elapsed_ms = start.elapsed().as_millis() as u64,
        outcomes = ?sink.outcomes(),
        "script finished"
    );
    Ok(())
}
