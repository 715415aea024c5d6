use std::path::Path;

use first_match::config::{parse_config, validate_config};
use first_match::error::Severity;

pub fn run(path: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let config = parse_config(path)?;
    let violations = validate_config(&config);

    let errors = violations
        .iter()
        .filter(|v| v.severity == Severity::Error)
        .count();
    let warnings = violations
        .iter()
        .filter(|v| v.severity == Severity::Warning)
        .count();

    for v in &violations {
        println!("{v}");
    }

    println!("\n{errors} error(s), {warnings} warning(s)");

    if errors == 0 {
        println!("Job is valid.");
        Ok(())
    } else {
        Err(format!("Job has {errors} validation error(s)").into())
    }
}
