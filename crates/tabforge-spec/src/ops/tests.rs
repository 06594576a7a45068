use pretty_assertions::assert_eq;

use super::*;
use crate::song::NoteKind;
use crate::validation::validate_song;

fn guitar_with_measures(id: &str, count: u32) -> Track {
    let mut track = Track::guitar(id, id);
    track.measures = (0..count)
        .map(|i| {
            Measure::with_beats(
                i,
                vec![Beat::new(0, vec![Note::fretted(1, 0, Duration::quarter())])],
            )
        })
        .collect();
    track
}

#[test]
fn test_empty_song_is_valid() {
    let song = empty_song();
    assert!(song.tracks.is_empty());
    assert_eq!(song.metadata.tempo, 120);
    assert_eq!(song.metadata.title, "");
    assert!(validate_song(&song).is_ok());
}

#[test]
fn test_update_metadata_is_shallow() {
    let song = update_metadata(
        empty_song(),
        MetadataPatch {
            tempo: Some(140),
            key_signature: Some("D minor".to_string()),
            ..MetadataPatch::default()
        },
    );
    assert_eq!(song.metadata.tempo, 140);
    assert_eq!(song.metadata.key_signature, "D minor");
    assert_eq!(song.metadata.title, "");
    assert_eq!(song.metadata.version, "5.00");

    let unchanged = update_metadata(song.clone(), MetadataPatch::default());
    assert_eq!(unchanged, song);
}

#[test]
fn test_add_track_equalizes() {
    let song = add_track(empty_song(), guitar_with_measures("lead", 3));
    let song = add_track(song, Track::bass("bass", "Bass"));
    assert_eq!(song.measure_counts(), vec![3, 3]);
    assert_eq!(song.tracks[1].measures[2].index, 2);
    assert!(song.tracks[1].measures[2].beats.is_empty());
    assert!(validate_song(&song).is_ok());
}

#[test]
fn test_equalize_is_idempotent() {
    let mut song = empty_song();
    song.tracks.push(guitar_with_measures("a", 1));
    song.tracks.push(guitar_with_measures("b", 4));
    let once = equalize_measure_counts(song);
    let twice = equalize_measure_counts(once.clone());
    assert_eq!(once, twice);
    assert_eq!(once.measure_counts(), vec![4, 4]);
}

#[test]
fn test_upsert_replaces_in_place() {
    let song = add_track(empty_song(), guitar_with_measures("lead", 1));
    let song = add_track(song, Track::drums("drums", "Drums"));

    let mut replacement = guitar_with_measures("lead", 2);
    replacement.name = "Rhythm".to_string();
    let song = upsert_track(song, replacement);

    assert_eq!(song.tracks.len(), 2);
    assert_eq!(song.tracks[0].name, "Rhythm");
    assert_eq!(song.measure_counts(), vec![2, 2]);

    let song = upsert_track(song, Track::bass("bass", "Bass"));
    assert_eq!(song.tracks.len(), 3);
}

#[test]
fn test_unique_track_id() {
    let song = add_track(empty_song(), Track::guitar("bass", "Not a bass"));
    assert_eq!(unique_track_id(&song, "bass"), "bass-2");
    assert_eq!(unique_track_id(&song, "drums"), "drums");
}

#[test]
fn test_ensure_minimum_on_empty_song() {
    let song = ensure_minimum_song(empty_song());
    assert_eq!(song.tracks.len(), 1);
    let track = &song.tracks[0];
    assert_eq!(track.tuning.as_deref(), Some(&[40, 45, 50, 55, 59, 64][..]));
    assert_eq!(track.measures.len(), 1);
    let note = &track.measures[0].beats[0].notes[0];
    assert_eq!(note.string, Some(1));
    assert_eq!(note.fret, Some(0));
    assert_eq!(note.duration, Duration::quarter());
    assert!(validate_song(&song).is_ok());
}

#[test]
fn test_ensure_minimum_fills_beatless_tracks() {
    let mut song = empty_song();
    song.tracks.push(guitar_with_measures("lead", 2));
    song.tracks.push(Track::drums("drums", "Drums"));
    let mut empty_bars = Track::bass("bass", "Bass");
    empty_bars.measures = vec![Measure::empty(0), Measure::empty(1)];
    song.tracks.push(empty_bars);

    let song = ensure_minimum_song(song);
    assert_eq!(song.measure_counts(), vec![2, 2, 2]);

    let drum_note = &song.tracks[1].measures[0].beats[0].notes[0];
    assert_eq!(drum_note.kind, NoteKind::Rest);

    let bass_note = &song.tracks[2].measures[0].beats[0].notes[0];
    assert_eq!(bass_note.fret, Some(0));
    assert!(song.tracks[2].measures[1].beats.is_empty());
}

#[test]
fn test_ensure_minimum_leaves_complete_song_alone() {
    let song = add_track(empty_song(), guitar_with_measures("lead", 2));
    assert_eq!(ensure_minimum_song(song.clone()), song);
}

#[test]
fn test_musical_completeness_adds_band() {
    let song = update_metadata(
        empty_song(),
        MetadataPatch {
            key_signature: Some("D minor".to_string()),
            ..MetadataPatch::default()
        },
    );
    let song = ensure_musical_completeness(song);

    assert_eq!(song.tracks.len(), 3);
    assert!(song.has_bass());
    assert!(song.has_drums());
    assert_eq!(song.measure_counts(), vec![4, 4, 4]);

    let frets: Vec<Option<u8>> = song.tracks[0]
        .measures
        .iter()
        .map(|m| m.beats[0].notes[0].fret)
        .collect();
    assert_eq!(frets, vec![Some(0), Some(3), Some(5), Some(8)]);
    assert_eq!(song.tracks[0].measures[0].beats.len(), 4);

    let drums = song.tracks.iter().find(|t| t.is_drums).unwrap();
    let pitches: Vec<Option<u8>> = drums.measures[0]
        .beats
        .iter()
        .map(|b| b.notes[0].midi)
        .collect();
    assert_eq!(pitches, vec![Some(KICK), Some(SNARE), Some(KICK), Some(SNARE)]);

    let chords = song.chords_by_section.as_ref().unwrap();
    assert_eq!(chords["Verse"], vec!["Dm", "Bb", "F", "C"]);
    assert!(song.draft_text.contains("D minor"));
    assert!(validate_song(&song).is_ok());
}

#[test]
fn test_musical_completeness_keeps_existing_parts() {
    let mut song = add_track(empty_song(), guitar_with_measures("lead", 6));
    song.draft_text = "my notes".to_string();
    let song = ensure_musical_completeness(song);

    assert_eq!(song.tracks[0].measures.len(), 6);
    assert_eq!(song.draft_text, "my notes");
    assert_eq!(song.measure_counts(), vec![6, 6, 6]);
}

#[test]
fn test_set_ready_for_export() {
    let song = set_ready_for_export(empty_song(), true);
    assert!(song.ready_for_export);
}
