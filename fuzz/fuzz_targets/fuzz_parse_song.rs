#![no_main]

use libfuzzer_sys::fuzz_target;
use tabforge_spec::validation::{parse_song_json, validate_song};

fuzz_target!(|data: &[u8]| {
    let Ok(text) = std::str::from_utf8(data) else {
        return;
    };
    if let Ok(parsed) = parse_song_json(text) {
        // Anything the parser accepts must survive a serialize and re-parse.
        let json = serde_json::to_string(&parsed.song).expect("song serializes");
        let again = parse_song_json(&json).expect("accepted song re-parses");
        assert_eq!(parsed.song, again.song);
        assert!(validate_song(&again.song).is_ok());
    }
});
