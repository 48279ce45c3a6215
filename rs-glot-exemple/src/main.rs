use std::path::Path;

use log::info;
use rs_glot_core::{GenerationInput, LanguageGraph, SeededSource, StopBias};

/// Transition table written when `./data/syllables.csv` does not exist yet.
const SAMPLE_TABLE: &[&str] = &[
    "S ; _ ; N0 | N1",
    "N0 ; ka | ki | ko(2) | ta | to ; N1(2) | N2 | O",
    "N1 ; a | e(3) | i | o ; N0(3) | N2(2)",
    "N2 ; n | r | sh ; N1 | O",
];

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // RUST_LOG=rs_glot_core=trace shows every walk step
    env_logger::init();

    let table = Path::new("./data/syllables.csv");
    if !table.exists() {
        std::fs::create_dir_all("./data")?;
        LanguageGraph::from_transition_table(SAMPLE_TABLE).save(table)?;
        info!("wrote sample language to {}", table.display());
    }

    // Load the table, through ./data/syllables.bin when it is up to date
    let language = LanguageGraph::open(table)?;
    println!("Language '{}' with {} nodes", language.name(), language.len());

    // 20 words between 3 and 8 characters (soft bounds)
    let mut input = GenerationInput::new(20, 3, 8);

    // Number of batches before accepting fewer words than requested
    input.max_tries = 10;

    // Use the visited node's fan-out for the random stop test
    input.stop_bias = StopBias::Current;

    // Fixed seed: same words on every run
    let mut random = SeededSource::from_seed(2024);
    let generation = language.generate_words_with(&input, &mut random)?;
    for (i, word) in generation.words.iter().enumerate() {
        println!("Generated word {}: {}", i + 1, word);
    }
    if !generation.is_complete() {
        println!("Only {} of {} words could be generated", generation.len(), generation.requested);
    }

    // Same request spread over every core
    let parallel = language.generate_words_parallel(&input.with_count(100), 7)?;
    println!("Parallel generation produced {} words", parallel.len());

    for word in ["kaeshka", "toan", "xyz", ""] {
        println!("'{}' valid: {}", word, language.is_valid_word(word)?);
    }

    // Write the table back, normalized (explicit weights, `O` markers)
    language.save(table)?;

    Ok(())
}
