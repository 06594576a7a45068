//! Song model operations.
//!
//! Every operation takes the song by value and returns the next snapshot.
//! Callers validate the result before trusting it downstream.

#[cfg(test)]
mod tests;

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::key::{parse_key, KeySignature, Mode};
use crate::song::{
    Beat, Duration, Measure, Metadata, Note, Section, Song, TimeSignature, Track,
};

/// Root-fret progression used to fill empty tracks.
pub const PROGRESSION_FRETS: [u8; 4] = [0, 3, 5, 8];

/// Number of measures written by [`ensure_musical_completeness`].
pub const PROGRESSION_MEASURES: u32 = 4;

/// General MIDI kick drum.
pub const KICK: u8 = 36;
/// General MIDI acoustic snare.
pub const SNARE: u8 = 38;
/// General MIDI closed hi-hat.
pub const CLOSED_HAT: u8 = 42;

/// Section name used for placeholder chords.
pub const DEFAULT_SECTION: &str = "Verse";

/// Partial metadata update. `None` fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetadataPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub artist: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tempo: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key_signature: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_signature: Option<TimeSignature>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
}

impl MetadataPatch {
    /// Returns true if the patch changes nothing.
    pub fn is_empty(&self) -> bool {
        *self == MetadataPatch::default()
    }
}

/// Creates the minimally valid song: blank title, documented defaults, no
/// tracks.
pub fn empty_song() -> Song {
    Song {
        metadata: Metadata::default(),
        sections: Vec::new(),
        tracks: Vec::new(),
        draft_text: String::new(),
        chords_by_section: None,
        ready_for_export: false,
    }
}

/// Shallow-merges `patch` into the song metadata. Measures are not reflowed.
pub fn update_metadata(mut song: Song, patch: MetadataPatch) -> Song {
    let metadata = &mut song.metadata;
    if let Some(title) = patch.title {
        metadata.title = title;
    }
    if let Some(artist) = patch.artist {
        metadata.artist = artist;
    }
    if let Some(tempo) = patch.tempo {
        metadata.tempo = tempo;
    }
    if let Some(key) = patch.key_signature {
        metadata.key_signature = key;
    }
    if let Some(ts) = patch.time_signature {
        metadata.time_signature = ts;
    }
    if let Some(version) = patch.version {
        metadata.version = version;
    }
    song
}

/// Appends a track and equalizes measure counts.
pub fn add_track(mut song: Song, track: Track) -> Song {
    debug!(track = %track.id, measures = track.measures.len(), "adding track");
    song.tracks.push(track);
    equalize_measure_counts(song)
}

/// Replaces the track with the same id in place, or adds it.
pub fn upsert_track(mut song: Song, track: Track) -> Song {
    match song.tracks.iter().position(|t| t.id == track.id) {
        Some(i) => {
            debug!(track = %track.id, "replacing track");
            song.tracks[i] = track;
            equalize_measure_counts(song)
        }
        None => add_track(song, track),
    }
}

/// Pads every shorter track with empty measures up to the longest track.
///
/// Idempotent; never removes measures.
pub fn equalize_measure_counts(mut song: Song) -> Song {
    let target = song.max_measure_count();
    for track in &mut song.tracks {
        while track.measures.len() < target {
            let index = track.measures.len() as u32;
            track.measures.push(Measure::empty(index));
        }
    }
    song
}

/// Sets the advisory export flag.
pub fn set_ready_for_export(mut song: Song, ready: bool) -> Song {
    song.ready_for_export = ready;
    song
}

/// Returns `base`, or `base-2`, `base-3`... whichever is not yet a track id.
pub fn unique_track_id(song: &Song, base: &str) -> String {
    if song.track(base).is_none() {
        return base.to_string();
    }
    (2..)
        .map(|n| format!("{}-{}", base, n))
        .find(|candidate| song.track(candidate).is_none())
        .unwrap_or_else(|| base.to_string())
}

fn placeholder_note(track: &Track) -> Note {
    if track.is_drums {
        Note::rest(Duration::quarter())
    } else {
        Note::fretted(1, 0, Duration::quarter())
    }
}

/// Guarantees the song is minimally viable for export.
///
/// A song without tracks gets one standard six-string track. Any track with
/// no measures, or no beats, gets one beat holding an open low-string quarter
/// note (a quarter rest on drum tracks). Measure counts are equalized after.
pub fn ensure_minimum_song(mut song: Song) -> Song {
    if song.tracks.is_empty() {
        debug!("song has no tracks, adding default guitar");
        song.tracks.push(Track::guitar("guitar", "Guitar"));
    }

    for track in &mut song.tracks {
        if track.measures.is_empty() {
            track.measures.push(Measure::empty(0));
        }
        if !track.has_beats() {
            let note = placeholder_note(track);
            track.measures[0].beats.push(Beat::new(0, vec![note]));
        }
    }

    equalize_measure_counts(song)
}

fn progression_measures(track: &Track) -> Vec<Measure> {
    (0..PROGRESSION_MEASURES)
        .map(|index| {
            let beats = (0..4u16)
                .map(|start| {
                    let note = if track.is_drums {
                        let pitch = if start % 2 == 0 { KICK } else { SNARE };
                        Note::midi(pitch, Duration::quarter())
                    } else {
                        let fret = PROGRESSION_FRETS[index as usize % PROGRESSION_FRETS.len()];
                        Note::fretted(1, fret, Duration::quarter())
                    };
                    Beat::new(start, vec![note])
                })
                .collect();
            Measure::with_beats(index, beats)
        })
        .collect()
}

fn song_key(song: &Song) -> KeySignature {
    parse_key(&song.metadata.key_signature).unwrap_or(KeySignature {
        tonic: "C".to_string(),
        pitch_class: 0,
        mode: Mode::Major,
    })
}

/// Fills in the parts a song needs to sound like a band.
///
/// Adds a guitar when the song has no tracks, then bass and drums tracks when
/// missing. Tracks without measures get a four-measure root progression
/// (frets 0, 3, 5, 8 on the lowest string) or a kick/snare pattern on drums.
/// Placeholder chords and draft text are supplied when absent. Measure counts
/// are equalized after.
pub fn ensure_musical_completeness(mut song: Song) -> Song {
    if song.tracks.is_empty() {
        song.tracks.push(Track::guitar("guitar", "Guitar"));
    }

    for track in &mut song.tracks {
        if track.measures.is_empty() {
            track.measures = progression_measures(track);
        }
    }

    if !song.has_bass() {
        let mut bass = Track::bass(unique_track_id(&song, "bass"), "Bass");
        bass.measures = progression_measures(&bass);
        song = add_track(song, bass);
    }
    if !song.has_drums() {
        let mut drums = Track::drums(unique_track_id(&song, "drums"), "Drums");
        drums.measures = progression_measures(&drums);
        song = add_track(song, drums);
    }

    let key = song_key(&song);
    if song.chords_by_section.is_none() {
        let section = song
            .sections
            .first()
            .map(|s| s.name.clone())
            .unwrap_or_else(|| DEFAULT_SECTION.to_string());
        let mut chords = BTreeMap::new();
        chords.insert(section.clone(), key.progression_chords());
        song.chords_by_section = Some(chords);
        if song.sections.is_empty() {
            song.sections.push(Section {
                name: section,
                start_measure: Some(0),
                measure_count: Some(PROGRESSION_MEASURES),
            });
        }
    }
    if song.draft_text.trim().is_empty() {
        song.draft_text = format!(
            "{}-measure progression in {} at {} BPM: {}",
            PROGRESSION_MEASURES,
            key,
            song.metadata.tempo,
            key.progression_chords().join(" - ")
        );
    }

    equalize_measure_counts(song)
}
