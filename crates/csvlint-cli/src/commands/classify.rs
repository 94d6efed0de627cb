//! Classify command - show the inferred format of values.

use colored::Colorize;
use csvlint::FormatClassifier;

pub fn run(values: Vec<String>, _verbose: bool) -> Result<(), Box<dyn std::error::Error>> {
    let classifier = FormatClassifier::new();
    let width = values.iter().map(|v| v.chars().count()).max().unwrap_or(0);

    for value in &values {
        let format = classifier.classify(value);
        println!("{:<width$}  {}", value, format.as_str().cyan(), width = width);
    }

    Ok(())
}
