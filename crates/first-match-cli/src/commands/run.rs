use std::path::Path;

use first_match::config::parse_config;
use first_match::job::{run_job, JobReport};
use first_match::timing::{format_elapsed, StageTimer};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportFormat {
    Text,
    Json,
}

impl std::str::FromStr for ReportFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "text" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            other => Err(format!("unknown report format '{other}' (expected text or json)")),
        }
    }
}

pub fn run(path: &Path, format: ReportFormat) -> Result<(), Box<dyn std::error::Error>> {
    let config = parse_config(path)?;
    let mut timer = StageTimer::new();
    let report = run_job(&config, &mut timer)?;

    match format {
        ReportFormat::Json => println!("{}", serde_json::to_string_pretty(&report)?),
        ReportFormat::Text => print_text(&report),
    }

    match report.failure() {
        Some(err) => Err(err.into()),
        None => Ok(()),
    }
}

fn print_text(report: &JobReport) {
    println!(
        "{} of {} A-events matched against {} B-events ({}, {})",
        report.matched, report.a_rows, report.b_rows, report.kernel, report.ordering
    );
    if let Some(oracle) = &report.oracle {
        println!("  oracle: {oracle}");
    }
    for check in &report.backends {
        println!("  {check}");
    }
    println!("Stages:");
    for stage in &report.stages {
        println!("  {:<10} {}", stage.stage, format_elapsed(stage.elapsed));
    }
    if let Some(out) = &report.output {
        println!("Wrote matches to {}", out.display());
    }
}
