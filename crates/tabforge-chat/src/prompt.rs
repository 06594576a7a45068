//! Prompt text sent to the generative agent.

use tabforge_spec::song::Song;

const CONTRACT: &str = "You edit a song document for a guitar tablature tool.\n\
Answer with one JSON object and nothing else, shaped as\n\
{\"reply\": string, \"followUps\": [string], \"song\": <the full updated song>}.\n\
Keep every field of the song you do not change. Field names are camelCase.\n\
Bounds: tempo 30-300, velocity 1-127, fret 0-36, string 1-12, measure index equals its position.\n\
Every track must have the same number of measures.";

fn song_json(song: &Song) -> String {
    // Song serialization only fails on non-string map keys, which the model never has.
    song.to_json_pretty().unwrap_or_else(|_| "{}".to_string())
}

/// Prompt for the first call of a turn.
pub fn build_prompt(song: &Song, instruction: &str) -> String {
    format!(
        "{}\n\nCurrent song:\n{}\n\nInstruction: {}\n",
        CONTRACT,
        song_json(song),
        instruction.trim()
    )
}

/// Prompt for the single repair call, listing what was wrong with the
/// previous answer.
pub fn build_repair_prompt(song: &Song, instruction: &str, violations: &[String]) -> String {
    let mut prompt = build_prompt(song, instruction);
    prompt.push_str("\nYour previous answer was rejected:\n");
    for violation in violations {
        prompt.push_str("- ");
        prompt.push_str(violation);
        prompt.push('\n');
    }
    prompt.push_str("Return a corrected JSON object.\n");
    prompt
}
