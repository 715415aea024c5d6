//! Lazy relational backend.
//!
//! A query is a [`LogicalPlan`] tree that does nothing until collected.
//! The canonical first-match plan is
//!
//! ```text
//! SORT BY a_idx
//!   GROUP BY a_idx FIRST min(b_idx)
//!     FILTER timestamp_right < timestamp
//!       JOIN ON key
//!         SCAN a
//!         SCAN b
//! ```
//!
//! [`optimize`] fuses the join, filter and grouping into a single
//! [`LogicalPlan::FirstMatchProbe`] that stops at the first survivor per
//! A row, then drops the sort because the probe emits rows in A order.

use std::fmt;

use arrow::array::RecordBatch;

use super::frame::{result_table, stream_frame, A_IDX, B_IDX, KEY};
use super::ops::{filter_before, group_first, join_on_key, probe_first_before, sort_by};
use super::JoinBackend;
use crate::error::{MatchError, Result};
use crate::stream::EventStream;
use crate::table::MatchTable;

/// Input relation of a scan.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Source {
    A,
    B,
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::A => write!(f, "a"),
            Self::B => write!(f, "b"),
        }
    }
}

/// Row predicate over a joined relation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Predicate {
    /// `timestamp_right < timestamp`
    RightBeforeLeft,
}

impl fmt::Display for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::RightBeforeLeft => write!(f, "timestamp_right < timestamp"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogicalPlan {
    Scan {
        source: Source,
    },
    Join {
        left: Box<LogicalPlan>,
        right: Box<LogicalPlan>,
        on: &'static str,
    },
    Filter {
        input: Box<LogicalPlan>,
        predicate: Predicate,
    },
    /// Group by `by`, keeping the minimum of `first_of`.
    GroupFirst {
        input: Box<LogicalPlan>,
        by: &'static str,
        first_of: &'static str,
    },
    Sort {
        input: Box<LogicalPlan>,
        by: &'static str,
    },
    /// Join, filter and first-survivor grouping in one pass.
    FirstMatchProbe {
        left: Box<LogicalPlan>,
        right: Box<LogicalPlan>,
        on: &'static str,
        predicate: Predicate,
    },
}

impl LogicalPlan {
    /// The unoptimized first-match query.
    pub fn first_match() -> Self {
        Self::Sort {
            input: Box::new(Self::GroupFirst {
                input: Box::new(Self::Filter {
                    input: Box::new(Self::Join {
                        left: Box::new(Self::Scan { source: Source::A }),
                        right: Box::new(Self::Scan { source: Source::B }),
                        on: KEY,
                    }),
                    predicate: Predicate::RightBeforeLeft,
                }),
                by: A_IDX,
                first_of: B_IDX,
            }),
            by: A_IDX,
        }
    }

    /// Number of nodes in the tree.
    pub fn node_count(&self) -> usize {
        match self {
            Self::Scan { .. } => 1,
            Self::Filter { input, .. } | Self::GroupFirst { input, .. } | Self::Sort { input, .. } => {
                1 + input.node_count()
            }
            Self::Join { left, right, .. } | Self::FirstMatchProbe { left, right, .. } => {
                1 + left.node_count() + right.node_count()
            }
        }
    }

    fn fmt_indented(&self, f: &mut fmt::Formatter<'_>, depth: usize) -> fmt::Result {
        let pad = "  ".repeat(depth);
        match self {
            Self::Scan { source } => writeln!(f, "{pad}SCAN {source}"),
            Self::Join { left, right, on } => {
                writeln!(f, "{pad}JOIN ON {on}")?;
                left.fmt_indented(f, depth + 1)?;
                right.fmt_indented(f, depth + 1)
            }
            Self::Filter { input, predicate } => {
                writeln!(f, "{pad}FILTER {predicate}")?;
                input.fmt_indented(f, depth + 1)
            }
            Self::GroupFirst { input, by, first_of } => {
                writeln!(f, "{pad}GROUP BY {by} FIRST min({first_of})")?;
                input.fmt_indented(f, depth + 1)
            }
            Self::Sort { input, by } => {
                writeln!(f, "{pad}SORT BY {by}")?;
                input.fmt_indented(f, depth + 1)
            }
            Self::FirstMatchProbe {
                left,
                right,
                on,
                predicate,
            } => {
                writeln!(f, "{pad}FIRST MATCH PROBE ON {on} WHERE {predicate}")?;
                left.fmt_indented(f, depth + 1)?;
                right.fmt_indented(f, depth + 1)
            }
        }
    }

    /// Evaluate the plan against the two input frames.
    pub fn execute(&self, a: &RecordBatch, b: &RecordBatch) -> Result<RecordBatch> {
        match self {
            Self::Scan { source: Source::A } => Ok(a.clone()),
            Self::Scan { source: Source::B } => Ok(b.clone()),
            Self::Join { left, right, on } => {
                require_key(on)?;
                join_on_key(&left.execute(a, b)?, &right.execute(a, b)?)
            }
            Self::Filter {
                input,
                predicate: Predicate::RightBeforeLeft,
            } => filter_before(&input.execute(a, b)?),
            Self::GroupFirst {
                input,
                by,
                first_of,
            } => {
                if *by != A_IDX || *first_of != B_IDX {
                    return Err(MatchError::InvalidConfig(format!(
                        "unsupported grouping {by}/{first_of}"
                    )));
                }
                group_first(&input.execute(a, b)?)
            }
            Self::Sort { input, by } => sort_by(&input.execute(a, b)?, by),
            Self::FirstMatchProbe {
                left,
                right,
                on,
                predicate: Predicate::RightBeforeLeft,
            } => {
                require_key(on)?;
                probe_first_before(&left.execute(a, b)?, &right.execute(a, b)?)
            }
        }
    }
}

impl fmt::Display for LogicalPlan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.fmt_indented(f, 0)
    }
}

fn require_key(on: &str) -> Result<()> {
    if on == KEY {
        Ok(())
    } else {
        Err(MatchError::InvalidConfig(format!("unsupported join column {on}")))
    }
}

/// Rewrite a plan bottom-up.
///
/// - `GroupFirst(a_idx, b_idx) ∘ Filter(<) ∘ Join` becomes
///   `FirstMatchProbe`.
/// - `Sort(a_idx)` over a probe whose left side scans A is removed.
pub fn optimize(plan: LogicalPlan) -> LogicalPlan {
    match plan {
        LogicalPlan::Sort { input, by } => {
            let input = optimize(*input);
            if by == A_IDX && emits_a_order(&input) {
                input
            } else {
                LogicalPlan::Sort {
                    input: Box::new(input),
                    by,
                }
            }
        }
        LogicalPlan::GroupFirst {
            input,
            by,
            first_of,
        } => match optimize(*input) {
            LogicalPlan::Filter { input, predicate }
                if by == A_IDX && first_of == B_IDX =>
            {
                match *input {
                    LogicalPlan::Join { left, right, on } => LogicalPlan::FirstMatchProbe {
                        left,
                        right,
                        on,
                        predicate,
                    },
                    other => LogicalPlan::GroupFirst {
                        input: Box::new(LogicalPlan::Filter {
                            input: Box::new(other),
                            predicate,
                        }),
                        by,
                        first_of,
                    },
                }
            }
            other => LogicalPlan::GroupFirst {
                input: Box::new(other),
                by,
                first_of,
            },
        },
        LogicalPlan::Filter { input, predicate } => LogicalPlan::Filter {
            input: Box::new(optimize(*input)),
            predicate,
        },
        LogicalPlan::Join { left, right, on } => LogicalPlan::Join {
            left: Box::new(optimize(*left)),
            right: Box::new(optimize(*right)),
            on,
        },
        LogicalPlan::FirstMatchProbe {
            left,
            right,
            on,
            predicate,
        } => LogicalPlan::FirstMatchProbe {
            left: Box::new(optimize(*left)),
            right: Box::new(optimize(*right)),
            on,
            predicate,
        },
        scan @ LogicalPlan::Scan { .. } => scan,
    }
}

fn emits_a_order(plan: &LogicalPlan) -> bool {
    matches!(
        plan,
        LogicalPlan::FirstMatchProbe { left, .. }
            if matches!(**left, LogicalPlan::Scan { source: Source::A })
    )
}

/// A deferred first-match query over two streams.
#[derive(Debug, Clone)]
pub struct LazyQuery {
    a: RecordBatch,
    b: RecordBatch,
    plan: LogicalPlan,
}

impl LazyQuery {
    pub fn new(a: &EventStream, b: &EventStream) -> Result<Self> {
        Ok(Self {
            a: stream_frame(a, A_IDX, 0)?,
            b: stream_frame(b, B_IDX, 0)?,
            plan: LogicalPlan::first_match(),
        })
    }

    #[must_use]
    pub fn optimized(mut self) -> Self {
        self.plan = optimize(self.plan);
        self
    }

    pub fn plan(&self) -> &LogicalPlan {
        &self.plan
    }

    /// Plan rendering followed by input sizes.
    pub fn explain(&self) -> String {
        format!(
            "{}-- a: {} rows, b: {} rows\n",
            self.plan,
            self.a.num_rows(),
            self.b.num_rows()
        )
    }

    pub fn collect(&self) -> Result<RecordBatch> {
        self.plan.execute(&self.a, &self.b)
    }
}

/// Lazy backend, with or without the plan optimizer.
#[derive(Debug, Clone, Copy)]
pub struct LazyBackend {
    pub optimize: bool,
}

impl Default for LazyBackend {
    fn default() -> Self {
        Self { optimize: true }
    }
}

impl JoinBackend for LazyBackend {
    fn name(&self) -> &'static str {
        if self.optimize {
            "lazy"
        } else {
            "lazy-unoptimized"
        }
    }

    fn execute(&self, a: &EventStream, b: &EventStream) -> Result<MatchTable> {
        let mut query = LazyQuery::new(a, b)?;
        if self.optimize {
            query = query.optimized();
        }
        tracing::debug!(nodes = query.plan().node_count(), optimized = self.optimize, "lazy plan");
        result_table(a.len(), &query.collect()?)
    }
}
