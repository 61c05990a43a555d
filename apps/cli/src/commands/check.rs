use std::io::Read;
use std::path::Path;

use anyhow::Context;
use serde::Serialize;
use vocab_core::{OrdinalPolicy, RowSource, SkillGrouper};

/// A row whose ordinal column is not an integer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InvalidOrdinal {
    pub line: u64,
    pub skill: String,
    pub value: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CheckReport {
    pub rows: usize,
    pub unreadable: usize,
    pub invalid: Vec<InvalidOrdinal>,
    /// Rows the given ordinal policy would drop.
    pub rejected: usize,
}

/// Report data quality problems in the dataset.
pub fn run(csv: &Path, policy: OrdinalPolicy) -> anyhow::Result<CheckReport> {
    let source = RowSource::open(csv).with_context(|| format!("Failed to read {}", csv.display()))?;
    let report = check_rows(source, policy);

    for invalid in &report.invalid {
        println!(
            "Invalid integer in row {}: {:?} ({})",
            invalid.line, invalid.value, invalid.skill
        );
    }
    println!(
        "{} rows, {} invalid ordinals, {} unreadable, {} rejected under {:?}",
        report.rows,
        report.invalid.len(),
        report.unreadable,
        report.rejected,
        policy
    );
    Ok(report)
}

pub fn check_rows<R: Read>(source: RowSource<R>, policy: OrdinalPolicy) -> CheckReport {
    let mut grouper = SkillGrouper::new(policy);
    let mut report = CheckReport::default();

    for row in source {
        report.rows += 1;
        let row = match row {
            Ok(row) => row,
            Err(e) => {
                tracing::warn!("Unreadable row: {}", e);
                report.unreadable += 1;
                continue;
            }
        };

        if row.ordinal.trim().parse::<i64>().is_err() {
            report.invalid.push(InvalidOrdinal {
                line: row.line,
                skill: row.skill.clone(),
                value: row.ordinal.clone(),
            });
        }
        if grouper.assign(row).is_err() {
            report.rejected += 1;
        }
    }
    report
}
