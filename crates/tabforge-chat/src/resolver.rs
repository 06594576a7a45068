//! Rule-based resolver.
//!
//! Applies the extractor matches to the song through the song operations and
//! builds the reply. Used directly when no agent is configured and as the
//! fallback when the agent fails.

use serde::{Deserialize, Serialize};
use tracing::debug;

use tabforge_spec::ops::{add_track, unique_track_id, update_metadata, MetadataPatch};
use tabforge_spec::song::{Song, Track};
use tabforge_spec::validation::common::{TEMPO_MAX, TEMPO_MIN};

use crate::checklist::Checklist;
use crate::extract::{Extraction, Instrument};

/// Outcome of the rule-based path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RuleOutcome {
    pub song: Song,
    pub reply: String,
    pub follow_ups: Vec<String>,
    /// What the extractors found.
    pub extraction: Extraction,
}

/// Returns true if the song already has a track for `instrument`.
pub fn has_instrument(song: &Song, instrument: Instrument) -> bool {
    match instrument {
        Instrument::Guitar => song.tracks.iter().any(|t| !t.is_drums && !t.is_bass()),
        Instrument::Bass => song.has_bass(),
        Instrument::Drums => song.has_drums(),
    }
}

fn new_track(song: &Song, instrument: Instrument) -> Track {
    let id = unique_track_id(song, instrument.track_id());
    match instrument {
        Instrument::Guitar => Track::guitar(id, instrument.label()),
        Instrument::Bass => Track::bass(id, instrument.label()),
        Instrument::Drums => Track::drums(id, instrument.label()),
    }
}

fn join_labels(labels: &[&str]) -> String {
    match labels {
        [] => String::new(),
        [one] => one.to_string(),
        [init @ .., last] => format!("{} and {}", init.join(", "), last),
    }
}

/// Applies the deterministic rules for one instruction.
///
/// `readyForExport` becomes true on an export intent and otherwise keeps its
/// prior value.
pub fn resolve_with_rules(song: Song, instruction: &str) -> RuleOutcome {
    let extraction = Extraction::from_instruction(instruction);
    let mut changes: Vec<String> = Vec::new();
    let mut patch = MetadataPatch::default();

    if let Some(tempo) = extraction.tempo {
        if (TEMPO_MIN..=TEMPO_MAX).contains(&i64::from(tempo)) {
            patch.tempo = Some(tempo as u16);
            changes.push(format!("Set the tempo to {} BPM.", tempo));
        } else {
            changes.push(format!(
                "Kept the tempo at {} BPM because {} BPM is outside {}-{}.",
                song.metadata.tempo, tempo, TEMPO_MIN, TEMPO_MAX
            ));
        }
    }
    if let Some(ref key) = extraction.key {
        patch.key_signature = Some(key.clone());
        changes.push(format!("Set the key to {}.", key));
    }
    if let Some(ref title) = extraction.title {
        patch.title = Some(title.clone());
        changes.push(format!("Titled the song \"{}\".", title));
    }

    let mut song = if patch.is_empty() {
        song
    } else {
        update_metadata(song, patch)
    };

    let mut added = Vec::new();
    for &instrument in &extraction.instruments {
        if !has_instrument(&song, instrument) {
            let track = new_track(&song, instrument);
            song = add_track(song, track);
            added.push(instrument.label());
        }
    }
    if !added.is_empty() {
        let noun = if added.len() == 1 { "track" } else { "tracks" };
        changes.push(format!("Added {} {}.", join_labels(&added), noun));
    }

    if extraction.export && !song.ready_for_export {
        song.ready_for_export = true;
        changes.push("Marked the song ready for export.".to_string());
    } else if extraction.export {
        changes.push("The song is already marked ready for export.".to_string());
    }

    let reply = if changes.is_empty() {
        "I couldn't find a tempo, key, title, instrument or export request in that message."
            .to_string()
    } else {
        changes.join(" ")
    };

    let follow_ups = Checklist::evaluate(&song).follow_ups();
    debug!(
        changes = changes.len(),
        follow_ups = follow_ups.len(),
        "rules applied"
    );

    RuleOutcome {
        song,
        reply,
        follow_ups,
        extraction,
    }
}
