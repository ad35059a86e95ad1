use std::io::{self, Read};

use knobel_engine::{pick_weighted, validate_scoring};
use serde_json::Value;

/// Reads a raw scoring response from stdin, validates it against the ids
/// given as arguments, and prints the drawn id.
///
/// ```text
/// echo '{"scores":[{"id":"YES","score":70},{"id":"NO","score":30}],"reason":"ok"}' \
///   | cargo run --package knobel-engine --example weighted_draw -- YES NO
/// ```
fn main() -> Result<(), Box<dyn std::error::Error>> {
    let ids: Vec<String> = std::env::args().skip(1).collect();
    if ids.len() < 2 {
        eprintln!("usage: weighted_draw <id> <id> [more ids...]  (raw response on stdin)");
        std::process::exit(2);
    }
    let expected: Vec<&str> = ids.iter().map(String::as_str).collect();

    let mut input = String::new();
    io::stdin().read_to_string(&mut input)?;
    let raw: Value = serde_json::from_str(input.trim())?;

    let result = validate_scoring(&raw, &expected)?;
    let mut rng = rand::thread_rng();
    match pick_weighted(&result.scores, &mut rng) {
        Some(id) => println!("{id}  ({})", result.reason),
        None => {
            eprintln!("no usable weighting (all scores zero)");
            std::process::exit(1);
        }
    }
    Ok(())
}
