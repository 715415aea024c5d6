use std::collections::HashSet;

use crate::backend::BackendKind;
use crate::config::types::JobConfig;
use crate::error::{Severity, Violation};
use crate::pipeline::OrderingMode;

/// Validate a parsed job for completeness and consistency.
///
/// Returns a list of violations. If any violation has
/// [`Severity::Error`], the job must not run.
pub fn validate_config(config: &JobConfig) -> Vec<Violation> {
    let mut violations = Vec::new();

    validate_inputs(config, &mut violations);
    validate_columns(config, &mut violations);
    validate_kernel(config, &mut violations);
    validate_backends(config, &mut violations);
    validate_verify(config, &mut violations);

    violations
}

/// True if any violation is an error.
pub fn has_errors(violations: &[Violation]) -> bool {
    violations.iter().any(|v| v.severity == Severity::Error)
}

fn push(violations: &mut Vec<Violation>, severity: Severity, rule: &str, message: String, location: &str) {
    violations.push(Violation {
        severity,
        rule: rule.to_string(),
        message,
        location: Some(location.to_string()),
    });
}

fn validate_inputs(config: &JobConfig, violations: &mut Vec<Violation>) {
    if config.inputs.a.as_os_str().is_empty() {
        push(violations, Severity::Error, "CFG-001", "inputs.a must not be empty".to_string(), "inputs.a");
    }
    if config.inputs.b.as_os_str().is_empty() {
        push(violations, Severity::Error, "CFG-002", "inputs.b must not be empty".to_string(), "inputs.b");
    }
    if let Some(out) = &config.output {
        if out == &config.inputs.a || out == &config.inputs.b {
            push(
                violations,
                Severity::Error,
                "CFG-010",
                format!("output {} would overwrite an input", out.display()),
                "output",
            );
        }
    }
}

fn validate_columns(config: &JobConfig, violations: &mut Vec<Violation>) {
    let cols = &config.columns;
    if cols.key.is_empty() || cols.timestamp.is_empty() {
        push(
            violations,
            Severity::Error,
            "CFG-003",
            "columns.key and columns.timestamp must be non-empty".to_string(),
            "columns",
        );
    } else if cols.key == cols.timestamp {
        push(
            violations,
            Severity::Error,
            "CFG-003",
            format!("columns.key and columns.timestamp are both '{}'", cols.key),
            "columns",
        );
    }
}

fn validate_kernel(config: &JobConfig, violations: &mut Vec<Violation>) {
    if config.kernel.ordering == OrderingMode::Trusted {
        push(
            violations,
            Severity::Warning,
            "CFG-007",
            "kernel.ordering is trusted: an unordered B gives wrong matches without any error"
                .to_string(),
            "kernel.ordering",
        );
    }
    if config.limits.max_lookup_entries == 0 {
        push(
            violations,
            Severity::Error,
            "CFG-009",
            "limits.max_lookup_entries must be at least 1".to_string(),
            "limits.max_lookup_entries",
        );
    }
}

fn validate_backends(config: &JobConfig, violations: &mut Vec<Violation>) {
    let mut seen = HashSet::new();
    for (i, kind) in config.backends.iter().enumerate() {
        if !seen.insert(*kind) {
            push(
                violations,
                Severity::Warning,
                "CFG-005",
                format!("backend {kind} listed more than once"),
                &format!("backends[{i}]"),
            );
        }
        if *kind == BackendKind::Asof {
            push(
                violations,
                Severity::Warning,
                "CFG-006",
                "asof returns the nearest preceding match, not the earliest; \
                 its divergences are reported but not fatal"
                    .to_string(),
                &format!("backends[{i}]"),
            );
        }
    }
    if config.backends.contains(&BackendKind::Streaming) && config.streaming.chunk_size == 0 {
        push(
            violations,
            Severity::Error,
            "CFG-004",
            "streaming.chunk_size must be at least 1".to_string(),
            "streaming.chunk_size",
        );
    }
}

fn validate_verify(config: &JobConfig, violations: &mut Vec<Violation>) {
    if config.verify.oracle && config.verify.max_pairs == 0 {
        push(
            violations,
            Severity::Error,
            "CFG-008",
            "verify.max_pairs must be positive when verify.oracle is set".to_string(),
            "verify.max_pairs",
        );
    }
}
