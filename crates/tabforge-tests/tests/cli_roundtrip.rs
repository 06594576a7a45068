//! CLI command round trips through song files on disk.

use std::process::ExitCode;

use pretty_assertions::assert_eq;

use tabforge_backend_midi::generate::GenerateRequest;
use tabforge_cli::commands;
use tabforge_cli::config::ServiceConfig;
use tabforge_cli::input::load_song;
use tabforge_spec::export::ExportDocument;
use tabforge_tests::fixtures::{SongDir, SAMPLE_SONG_JSON};

fn s(path: &std::path::Path) -> &str {
    path.to_str().unwrap()
}

#[test]
fn midi_transcribe_turn_validate_export() {
    let dir = SongDir::new();
    let config = ServiceConfig::default();
    let midi = dir.file("progression.mid");
    let song = dir.file("song.json");
    let prepared = dir.file("out/prepared.json");

    let request = GenerateRequest {
        tempo: 110,
        key: "E minor".to_string(),
        measures: 2,
    };
    assert_eq!(
        commands::midi::run(&request, s(&midi), &config, true).unwrap(),
        ExitCode::SUCCESS
    );

    commands::transcribe::run(s(&midi), None, Some(s(&song)), true).unwrap();
    let transcribed = load_song(&song).unwrap().song;
    assert_eq!(transcribed.metadata.tempo, 110);
    assert_eq!(transcribed.measure_counts(), vec![2, 2, 2]);

    commands::turn::run(
        Some(s(&song)),
        r#"call it "Cold Open" in the key of E minor"#,
        Some(s(&song)),
        &config,
        true,
    )
    .unwrap();
    let turned = load_song(&song).unwrap().song;
    assert_eq!(turned.metadata.title, "Cold Open");
    assert_eq!(turned.metadata.key_signature, "E minor");
    assert_eq!(turned.tracks, transcribed.tracks);

    assert_eq!(
        commands::validate::run(s(&song), true).unwrap(),
        ExitCode::SUCCESS
    );
    assert_eq!(
        commands::checklist::run(s(&song), true).unwrap(),
        ExitCode::SUCCESS
    );

    assert_eq!(
        commands::export::run(s(&song), s(&prepared), true, &config, true).unwrap(),
        ExitCode::SUCCESS
    );
    let document: ExportDocument =
        serde_json::from_slice(&std::fs::read(&prepared).unwrap()).unwrap();
    assert_eq!(document.song, turned);
    assert_eq!(document.headers.len(), 2);
}

#[test]
fn compose_then_validate() {
    let dir = SongDir::new();
    let base = dir.write("base.json", SAMPLE_SONG_JSON);
    let out = dir.file("composed.json");

    commands::compose::run(Some(s(&base)), Some(s(&out)), true).unwrap();
    let song = load_song(&out).unwrap().song;
    // The sample already has guitar and bass; drums are added.
    assert_eq!(song.tracks.len(), 3);
    assert!(song.has_drums());
    assert_eq!(song.draft_text, "Moody intro, then the verse riff.");
    assert_eq!(
        commands::validate::run(s(&out), false).unwrap(),
        ExitCode::SUCCESS
    );
}

#[test]
fn invalid_file_fails_validation_exit_code() {
    let dir = SongDir::new();
    let bad = dir.write(
        "bad.json",
        r#"{"metadata": {"title": "x"}, "tracks": [{"id": "a", "name": "A", "volume": 200}]}"#,
    );
    assert_eq!(
        commands::validate::run(s(&bad), true).unwrap(),
        ExitCode::from(1)
    );
    assert!(commands::turn::run(Some(s(&bad)), "hi", None, &ServiceConfig::default(), true).is_err());
}
