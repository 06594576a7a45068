//! Test fixture utilities for songs and song files.

use std::fs;
use std::path::{Path, PathBuf};

use tabforge_spec::ops::empty_song;
use tabforge_spec::song::{Beat, Duration, Measure, Note, Song, Track};
use tempfile::TempDir;

/// A complete writer-style song document.
pub const SAMPLE_SONG_JSON: &str = include_str!("../fixtures/sample_song.json");

/// Parses [`SAMPLE_SONG_JSON`] as a JSON value.
pub fn sample_song_value() -> serde_json::Value {
    serde_json::from_str(SAMPLE_SONG_JSON).expect("sample song fixture is valid JSON")
}

/// A song whose tracks have the given measure counts, one note per measure.
///
/// Measure counts are left unequal on purpose; nothing is equalized.
pub fn song_with_measure_counts(counts: &[usize]) -> Song {
    let mut song = empty_song();
    for (i, &count) in counts.iter().enumerate() {
        let mut track = Track::guitar(format!("track-{}", i), format!("Track {}", i));
        track.measures = (0..count)
            .map(|m| {
                Measure::with_beats(
                    m as u32,
                    vec![Beat::new(0, vec![Note::fretted(1, 0, Duration::quarter())])],
                )
            })
            .collect();
        song.tracks.push(track);
    }
    song
}

/// A temporary directory for song and MIDI files.
pub struct SongDir {
    pub root: TempDir,
}

impl SongDir {
    pub fn new() -> Self {
        Self {
            root: TempDir::new().expect("Failed to create temp dir"),
        }
    }

    pub fn path(&self) -> &Path {
        self.root.path()
    }

    /// Path of `name` inside the directory (not created).
    pub fn file(&self, name: &str) -> PathBuf {
        self.root.path().join(name)
    }

    /// Writes `content` to `name` and returns the path.
    pub fn write(&self, name: &str, content: impl AsRef<[u8]>) -> PathBuf {
        let path = self.file(name);
        fs::write(&path, content).expect("Failed to write fixture file");
        path
    }

    /// Writes `song` as JSON to `name` and returns the path.
    pub fn write_song(&self, name: &str, song: &Song) -> PathBuf {
        self.write(name, song.to_json_pretty().expect("song serializes"))
    }
}

impl Default for SongDir {
    fn default() -> Self {
        Self::new()
    }
}
