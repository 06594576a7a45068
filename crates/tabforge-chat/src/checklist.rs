//! Song completeness checklist.

use serde::{Deserialize, Serialize};

use tabforge_spec::key::parse_key;
use tabforge_spec::song::Song;
use tabforge_spec::validation::common::{TEMPO_MAX, TEMPO_MIN};

/// Completeness conditions, in follow-up priority order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ChecklistItem {
    Title,
    Tempo,
    Key,
    Track,
    Measure,
    Beat,
}

impl ChecklistItem {
    pub fn all() -> &'static [ChecklistItem] {
        &[
            ChecklistItem::Title,
            ChecklistItem::Tempo,
            ChecklistItem::Key,
            ChecklistItem::Track,
            ChecklistItem::Measure,
            ChecklistItem::Beat,
        ]
    }

    pub fn label(&self) -> &'static str {
        match self {
            ChecklistItem::Title => "title",
            ChecklistItem::Tempo => "tempo",
            ChecklistItem::Key => "key",
            ChecklistItem::Track => "at least one track",
            ChecklistItem::Measure => "at least one measure",
            ChecklistItem::Beat => "at least one beat",
        }
    }

    /// Follow-up question asked while the item is unsatisfied.
    pub fn question(&self) -> &'static str {
        match self {
            ChecklistItem::Title => "What should the song be called?",
            ChecklistItem::Tempo => "What tempo (BPM) should it be?",
            ChecklistItem::Key => "What key is the song in?",
            ChecklistItem::Track => "Which instruments should play (guitar, bass, drums)?",
            ChecklistItem::Measure => "How many measures should the first section have?",
            ChecklistItem::Beat => "What should the first riff or chord pattern be?",
        }
    }

    /// Whether `song` satisfies this item.
    pub fn is_satisfied(&self, song: &Song) -> bool {
        match self {
            ChecklistItem::Title => !song.metadata.title.trim().is_empty(),
            ChecklistItem::Tempo => {
                (TEMPO_MIN..=TEMPO_MAX).contains(&i64::from(song.metadata.tempo))
            }
            ChecklistItem::Key => parse_key(&song.metadata.key_signature).is_some(),
            ChecklistItem::Track => !song.tracks.is_empty(),
            ChecklistItem::Measure => song.max_measure_count() > 0,
            ChecklistItem::Beat => song.beat_count() > 0,
        }
    }
}

/// Checklist state derived from one song snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Checklist {
    pub satisfied: Vec<ChecklistItem>,
    /// Unsatisfied items in priority order.
    pub missing: Vec<ChecklistItem>,
}

impl Checklist {
    /// Evaluates every item against `song`.
    pub fn evaluate(song: &Song) -> Self {
        let (satisfied, missing): (Vec<ChecklistItem>, Vec<ChecklistItem>) = ChecklistItem::all()
            .iter()
            .copied()
            .partition(|item| item.is_satisfied(song));
        Self { satisfied, missing }
    }

    pub fn is_complete(&self) -> bool {
        self.missing.is_empty()
    }

    /// Highest-priority unsatisfied item.
    pub fn first_missing(&self) -> Option<ChecklistItem> {
        self.missing.first().copied()
    }

    /// Follow-up questions for every unsatisfied item, in priority order.
    pub fn follow_ups(&self) -> Vec<String> {
        self.missing.iter().map(|i| i.question().to_string()).collect()
    }
}
