use std::collections::HashSet;

use rand::seq::SliceRandom;
use rand::Rng;
use serde_json::Value;
use tracing::warn;

use crate::error::{CardError, CardResult};
use crate::llm::ModelClient;
use crate::models::{StatEntry, StatsRequest};

pub const FALLBACK_STAT_LABELS: [&str; 14] = [
    "Leadership",
    "Creativity",
    "Execution",
    "Strategy",
    "Impact",
    "Innovation",
    "Teamwork",
    "Vision",
    "Drive",
    "Expertise",
    "Communication",
    "Problem Solving",
    "Adaptability",
    "Focus",
];

const STATS_SYSTEM_PROMPT: &str = "You generate trading card stats. Return exactly 3 stats as JSON array: [{\"label\": \"short label\", \"value\": number}]. Labels should be 1-2 words, values 85-99. Make them relevant to the person's role.";

/// Produce the 3 stat lines for a card. With no client configured the
/// fallback kicks in silently; a failing provider call propagates so the
/// caller can distinguish "no credentials" from a genuine provider error.
pub async fn generate_stats(
    model: Option<&dyn ModelClient>,
    request: &StatsRequest,
) -> CardResult<Vec<StatEntry>> {
    request.validate()?;

    let Some(model) = model else {
        return Ok(fallback_stats());
    };

    let user_content = format!(
        "Generate 3 trading card stats for {}, {}. Their skills include: {}.",
        request.name.trim(),
        request.title.trim(),
        request.skills.join(", ")
    );

    let raw = model
        .complete_json(STATS_SYSTEM_PROMPT, &user_content)
        .await
        .map_err(|err| CardError::generation("generate stats", err))?;

    Ok(top_up(parse_stats(&raw)))
}

/// Three distinct labels drawn from the fixed catalog, values in 90..=99.
pub fn fallback_stats() -> Vec<StatEntry> {
    let mut rng = rand::thread_rng();
    let mut labels = FALLBACK_STAT_LABELS;
    let (picked, _) = labels.partial_shuffle(&mut rng, 3);
    picked
        .iter()
        .map(|label| StatEntry {
            label: (*label).to_string(),
            value: rng.gen_range(90..=99),
        })
        .collect()
}

/// Accept `{"stats": [...]}` or a bare array; anything unparseable yields
/// an empty list for the caller to pad.
fn parse_stats(raw: &str) -> Vec<StatEntry> {
    let value: Value = match serde_json::from_str(raw) {
        Ok(value) => value,
        Err(err) => {
            warn!("Discarding unparseable stats response: {err}");
            return Vec::new();
        }
    };

    let items = value.get("stats").cloned().unwrap_or(value);
    match serde_json::from_value::<Vec<StatEntry>>(items) {
        Ok(stats) => stats,
        Err(err) => {
            warn!("Discarding malformed stats entries: {err}");
            Vec::new()
        }
    }
}

/// Enforce the output contract: exactly 3 entries with distinct labels,
/// topping up any shortfall from the fallback catalog.
fn top_up(mut stats: Vec<StatEntry>) -> Vec<StatEntry> {
    stats.truncate(3);

    let mut seen: HashSet<String> = HashSet::new();
    stats.retain(|entry| {
        !entry.label.trim().is_empty() && seen.insert(entry.label.trim().to_lowercase())
    });

    if stats.len() < 3 {
        let mut rng = rand::thread_rng();
        let mut spare: Vec<&str> = FALLBACK_STAT_LABELS
            .iter()
            .copied()
            .filter(|label| !seen.contains(&label.to_lowercase()))
            .collect();
        spare.shuffle(&mut rng);
        for label in spare {
            if stats.len() == 3 {
                break;
            }
            stats.push(StatEntry {
                label: label.to_string(),
                value: rng.gen_range(90..=99),
            });
        }
    }

    stats
}
