use std::fs;
use std::io::{BufRead, BufReader};
use std::path::Path;

use anyhow::Context;
use tracing::{debug, info, warn};

use crate::event::EventRecord;

/// Reads an event snapshot. `.jsonl` files hold one record per line,
/// anything else is a JSON array. A missing file is an empty snapshot.
#[tracing::instrument(skip(path), fields(file = %path.display()))]
pub fn load_snapshot(path: &Path) -> anyhow::Result<Vec<EventRecord>> {
    if !path.exists() {
        warn!(file = %path.display(), "event snapshot not found, showing an empty calendar");
        return Ok(Vec::new());
    }

    let is_jsonl = path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("jsonl"));

    let records = if is_jsonl {
        load_jsonl(path)?
    } else {
        load_json_array(path)?
    };

    info!(file = %path.display(), count = records.len(), "loaded event snapshot");
    Ok(records)
}

#[tracing::instrument(skip(path))]
fn load_jsonl(path: &Path) -> anyhow::Result<Vec<EventRecord>> {
    debug!(file = %path.display(), "loading jsonl");
    let file =
        fs::File::open(path).with_context(|| format!("failed to open {}", path.display()))?;
    let reader = BufReader::new(file);

    let mut out = Vec::new();
    for (idx, line) in reader.lines().enumerate() {
        let line = line.with_context(|| format!("failed reading {}", path.display()))?;
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }

        let record: EventRecord = serde_json::from_str(trimmed)
            .with_context(|| format!("failed parsing {} line {}", path.display(), idx + 1))?;
        out.push(record);
    }

    debug!(count = out.len(), "loaded records from jsonl");
    Ok(out)
}

#[tracing::instrument(skip(path))]
fn load_json_array(path: &Path) -> anyhow::Result<Vec<EventRecord>> {
    debug!(file = %path.display(), "loading json array");
    let raw = fs::read_to_string(path)
        .with_context(|| format!("failed reading {}", path.display()))?;
    if raw.trim().is_empty() {
        return Ok(Vec::new());
    }

    serde_json::from_str(&raw).with_context(|| format!("failed parsing {}", path.display()))
}
