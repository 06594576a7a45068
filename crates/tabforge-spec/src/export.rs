//! Export preparation.
//!
//! The binary tablature writer receives the validated song JSON; this module
//! makes sure what it receives is minimally viable and resolves the
//! per-measure headers the writer needs.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::SchemaViolation;
use crate::key::{parse_key, KeySignature};
use crate::ops::{ensure_minimum_song, equalize_measure_counts};
use crate::song::{Song, TimeSignature, TripletFeel};
use crate::validation::ensure_valid;

/// Header in effect for one measure index across all tracks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedHeader {
    pub index: u32,
    pub time_signature: TimeSignature,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key_signature: Option<String>,
    pub repeat_start: bool,
    pub repeat_end: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub marker: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub triplet_feel: Option<TripletFeel>,
}

/// A song ready to hand to the writer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportDocument {
    pub song: Song,
    /// One header per measure index.
    pub headers: Vec<ResolvedHeader>,
    /// Parsed song key, if recognized.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<KeySignature>,
}

/// Repairs and validates a song for export.
///
/// Runs Ensure Minimum Song and Equalize Measure Counts so an empty document
/// never reaches the writer, then validates. The `readyForExport` flag is not
/// consulted.
pub fn prepare_for_export(song: Song) -> Result<ExportDocument, SchemaViolation> {
    let song = equalize_measure_counts(ensure_minimum_song(song));
    let song = ensure_valid(song)?;
    let headers = resolve_headers(&song);
    let key = parse_key(&song.metadata.key_signature);
    debug!(
        tracks = song.tracks.len(),
        measures = headers.len(),
        "song prepared for export"
    );
    Ok(ExportDocument { song, headers, key })
}

/// Resolves one header per measure index.
///
/// The first track whose measure at that index carries a header wins; with no
/// header anywhere the song time signature applies.
pub fn resolve_headers(song: &Song) -> Vec<ResolvedHeader> {
    let default_ts = song.metadata.time_signature;
    (0..song.max_measure_count())
        .map(|i| {
            let header = song
                .tracks
                .iter()
                .filter_map(|t| t.measures.get(i))
                .find_map(|m| m.header.as_ref());
            match header {
                Some(h) => ResolvedHeader {
                    index: i as u32,
                    time_signature: h.time_signature.unwrap_or(default_ts),
                    key_signature: h.key_signature.clone(),
                    repeat_start: h.repeat_start,
                    repeat_end: h.repeat_end,
                    marker: h.marker.clone(),
                    triplet_feel: h.triplet_feel,
                },
                None => ResolvedHeader {
                    index: i as u32,
                    time_signature: default_ts,
                    key_signature: None,
                    repeat_start: false,
                    repeat_end: false,
                    marker: None,
                    triplet_feel: None,
                },
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::key::Mode;
    use crate::ops::{add_track, empty_song, set_ready_for_export};
    use crate::song::{Measure, MeasureHeader, Track};

    #[test]
    fn test_empty_song_is_repaired_before_export() {
        let song = set_ready_for_export(empty_song(), true);
        let doc = prepare_for_export(song).unwrap();
        assert_eq!(doc.song.tracks.len(), 1);
        assert!(doc.song.tracks[0].has_beats());
        assert_eq!(doc.headers.len(), 1);
        assert_eq!(doc.headers[0].time_signature, TimeSignature::new(4, 4));
        assert_eq!(doc.key.unwrap().mode, Mode::Major);
    }

    #[test]
    fn test_first_header_wins() {
        let mut a = Track::guitar("a", "A");
        a.measures = vec![Measure::empty(0), Measure::empty(1)];
        let mut b = Track::bass("b", "B");
        b.measures = vec![Measure::empty(0), Measure::empty(1)];
        b.measures[1].header = Some(MeasureHeader {
            time_signature: Some(TimeSignature::new(3, 4)),
            marker: Some("Bridge".to_string()),
            ..MeasureHeader::default()
        });
        a.measures[1].header = Some(MeasureHeader {
            repeat_start: true,
            ..MeasureHeader::default()
        });

        let song = add_track(add_track(empty_song(), a), b);
        let headers = resolve_headers(&song);
        assert_eq!(headers[0].time_signature, TimeSignature::new(4, 4));
        assert!(headers[1].repeat_start);
        assert_eq!(headers[1].time_signature, TimeSignature::new(4, 4));
        assert_eq!(headers[1].marker, None);
    }

    #[test]
    fn test_invalid_song_is_not_exported() {
        let mut song = empty_song();
        song.metadata.tempo = 500;
        let err = prepare_for_export(song).unwrap_err();
        assert_eq!(err.paths(), vec!["metadata.tempo"]);
    }
}
