//! Loading and writing song files.
//!
//! Every song read from disk goes through the validator; a file that fails
//! validation is reported with all of its offending paths and never used.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tabforge_spec::error::{SchemaViolation, ValidationWarning};
use tabforge_spec::ops::empty_song;
use tabforge_spec::song::Song;
use tabforge_spec::validation::parse_song_json;

/// A song loaded from disk.
#[derive(Debug)]
pub struct LoadResult {
    pub song: Song,
    pub warnings: Vec<ValidationWarning>,
    /// BLAKE3 hash of the file content (hex string).
    pub source_hash: String,
}

/// Errors that can occur while loading a song.
#[derive(Debug)]
pub enum InputError {
    /// File could not be read.
    FileRead {
        path: PathBuf,
        source: std::io::Error,
    },

    /// The file content is not a valid song.
    Invalid { violation: SchemaViolation },
}

impl std::fmt::Display for InputError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            InputError::FileRead { path, source } => {
                write!(f, "failed to read file '{}': {}", path.display(), source)
            }
            InputError::Invalid { violation } => write!(f, "{}", violation),
        }
    }
}

impl std::error::Error for InputError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            InputError::FileRead { source, .. } => Some(source),
            InputError::Invalid { violation } => Some(violation),
        }
    }
}

/// Loads and validates a song file.
///
/// # Example
/// ```no_run
/// use std::path::Path;
/// use tabforge_cli::input::load_song;
///
/// let loaded = load_song(Path::new("song.json")).unwrap();
/// println!("{} track(s)", loaded.song.tracks.len());
/// ```
pub fn load_song(path: &Path) -> Result<LoadResult, InputError> {
    let content = fs::read_to_string(path).map_err(|e| InputError::FileRead {
        path: path.to_path_buf(),
        source: e,
    })?;
    let source_hash = blake3::hash(content.as_bytes()).to_hex().to_string();
    let validated =
        parse_song_json(&content).map_err(|violation| InputError::Invalid { violation })?;
    Ok(LoadResult {
        song: validated.song,
        warnings: validated.warnings,
        source_hash,
    })
}

/// Loads `path` if given, otherwise starts from an empty song.
pub fn load_song_or_empty(path: Option<&Path>) -> Result<Song> {
    match path {
        Some(path) => {
            let loaded = load_song(path)
                .with_context(|| format!("Failed to load song file: {}", path.display()))?;
            Ok(loaded.song)
        }
        None => Ok(empty_song()),
    }
}

/// Writes `song` as pretty JSON, creating parent directories.
pub fn write_song(path: &Path, song: &Song) -> Result<()> {
    let json = song.to_json_pretty().context("Failed to serialize song")?;
    write_bytes(path, format!("{}\n", json).as_bytes())
}

/// Writes raw bytes, creating parent directories.
pub fn write_bytes(path: &Path, bytes: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
    }
    fs::write(path, bytes).with_context(|| format!("Failed to write file: {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_then_load() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("nested/song.json");
        let mut song = empty_song();
        song.metadata.title = "Disk".to_string();
        write_song(&path, &song).unwrap();

        let loaded = load_song(&path).unwrap();
        assert_eq!(loaded.song, song);
        assert_eq!(loaded.source_hash.len(), 64);
    }

    #[test]
    fn test_missing_file() {
        let err = load_song(Path::new("/nonexistent/song.json")).unwrap_err();
        assert!(matches!(err, InputError::FileRead { .. }));
        assert!(err.to_string().contains("/nonexistent/song.json"));
    }

    #[test]
    fn test_invalid_song_reports_paths() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("bad.json");
        fs::write(&path, r#"{"metadata": {"title": "x", "tempo": 301}}"#).unwrap();
        match load_song(&path).unwrap_err() {
            InputError::Invalid { violation } => {
                assert_eq!(violation.paths(), vec!["metadata.tempo"]);
            }
            other => panic!("expected invalid song, got {}", other),
        }
    }

    #[test]
    fn test_load_or_empty() {
        assert_eq!(load_song_or_empty(None).unwrap(), empty_song());
    }
}
