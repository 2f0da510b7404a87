//! Script and seed-memory file formats.

use anyhow::{Context, Result, bail};
use serde::Deserialize;

use effector_core::app::RequestSpec;
use effector_core::ports::{Address, Width};

/// One line of a `.jsonl` script.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum Step {
    /// Stop the request submitted by script line `stop` (0-based).
    Stop { at_ms: u64, stop: usize },

    Submit {
        at_ms: u64,
        code: String,
        requester: String,
        #[serde(default)]
        group: Option<String>,
        #[serde(default)]
        duration_secs: Option<f64>,
    },
}

impl Step {
    pub fn at_ms(&self) -> u64 {
        match self {
            Step::Stop { at_ms, .. } | Step::Submit { at_ms, .. } => *at_ms,
        }
    }

    pub fn request(&self) -> Option<RequestSpec> {
        match self {
            Step::Stop { .. } => None,
            Step::Submit {
                code,
                requester,
                group,
                duration_secs,
                ..
            } => Some(RequestSpec {
                code: code.clone(),
                requester: requester.clone(),
                group: group.clone(),
                duration_secs: *duration_secs,
            }),
        }
    }
}

/// Parse a script; blank lines and `#` comments are skipped.
pub fn parse_script(text: &str) -> Result<Vec<Step>> {
    text.lines()
        .enumerate()
        .filter(|(_, line)| {
            let line = line.trim();
            !line.is_empty() && !line.starts_with('#')
        })
        .map(|(n, line)| {
            serde_json::from_str(line).with_context(|| format!("script line {}", n + 1))
        })
        .collect()
}

#[derive(Debug, Deserialize)]
struct SeedEntry {
    address: String,
    width: u8,
    value: u32,
}

/// Initial memory: `[{"address": "0x8007ba84", "width": 16, "value": 100}, ...]`.
pub fn parse_seed(text: &str) -> Result<Vec<(Address, Width, u32)>> {
    let entries: Vec<SeedEntry> = serde_json::from_str(text).context("seed memory")?;
    entries
        .into_iter()
        .map(|entry| {
            let digits = entry
                .address
                .strip_prefix("0x")
                .unwrap_or(&entry.address)
                .replace('_', "");
            let address = Address::from_str_radix(&digits, 16)
                .with_context(|| format!("bad address '{}'", entry.address))?;
            let width = match entry.width {
                8 => Width::W8,
                16 => Width::W16,
                32 => Width::W32,
                other => bail!("bad width {other} at {}", entry.address),
            };
            Ok((address, width, entry.value))
        })
        .collect()
}
