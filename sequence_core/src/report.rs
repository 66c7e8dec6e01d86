//! QA report generation for planned sessions.
//!
//! The report recomputes every consecutive overlap pair from the plan itself,
//! so it can be checked independently of the builder. The structured record
//! and the markdown export are produced from the same computed data.

use crate::overlap::{self, DEFAULT_OVERLAP_THRESHOLD};
use crate::{
    DataGap, DurationWarning, OverlapPair, Result, Segment, SequencePlan, Violation,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt::Write as _;
use uuid::Uuid;

/// One row of the movement sequence table
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct SequenceRow {
    pub position: usize,
    pub id: String,
    pub name: String,
    pub segment: Segment,
    pub pattern: Option<String>,
    pub duration_seconds: u32,
    pub muscle_groups: String,
}

/// Aggregate overlap statistics
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct QaSummary {
    pub threshold: f64,
    pub total_pairs: usize,
    pub pass_count: usize,
    pub fail_count: usize,
    pub pass_percentage: f64,
    pub fail_percentage: f64,
    pub average_overlap: f64,
    pub maximum_overlap: f64,
}

/// Planned against achieved session length
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct DurationSummary {
    pub target_seconds: u32,
    pub movement_seconds: u32,
    pub overhead_seconds: u32,
    pub total_seconds: u32,
    pub warning: Option<DurationWarning>,
}

/// Audit report for one plan
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct QaReport {
    pub report_id: Uuid,
    pub generated_at: DateTime<Utc>,
    pub movements: Vec<SequenceRow>,
    pub pairs: Vec<OverlapPair>,
    pub summary: QaSummary,
    pub failures: Vec<OverlapPair>,
    pub progression_violations: Vec<Violation>,
    pub duration: DurationSummary,
    pub data_gaps: Vec<DataGap>,
}

/// Generate a report with the default 50% overlap threshold
pub fn generate(plan: &SequencePlan) -> QaReport {
    generate_with_threshold(plan, DEFAULT_OVERLAP_THRESHOLD)
}

/// Generate a report, recomputing every consecutive pair at `threshold`
pub fn generate_with_threshold(plan: &SequencePlan, threshold: f64) -> QaReport {
    let sequence = plan.sequence();
    let pairs = overlap::consecutive_pairs(&sequence, threshold);
    let failures: Vec<OverlapPair> = pairs.iter().filter(|p| !p.passed).cloned().collect();
    let summary = summarize(&pairs, threshold);

    let movements = plan
        .movements
        .iter()
        .map(|p| SequenceRow {
            position: p.position,
            id: p.movement.id.clone(),
            name: p.movement.name.clone(),
            segment: p.segment,
            pattern: p.movement.pattern.map(|pat| pat.to_string()),
            duration_seconds: p.movement.duration_seconds,
            muscle_groups: p
                .movement
                .muscle_groups
                .iter()
                .cloned()
                .collect::<Vec<_>>()
                .join(";"),
        })
        .collect();

    tracing::debug!(
        "QA report: {} pairs, {} failing",
        summary.total_pairs,
        summary.fail_count
    );

    QaReport {
        report_id: Uuid::new_v4(),
        generated_at: Utc::now(),
        movements,
        pairs,
        summary,
        failures,
        progression_violations: plan.violations.clone(),
        duration: DurationSummary {
            target_seconds: plan.target_seconds,
            movement_seconds: plan.movement_seconds,
            overhead_seconds: plan.overhead_seconds,
            total_seconds: plan.total_seconds(),
            warning: plan.duration_warning.clone(),
        },
        data_gaps: plan.data_gaps.clone(),
    }
}

fn summarize(pairs: &[OverlapPair], threshold: f64) -> QaSummary {
    let total_pairs = pairs.len();
    let pass_count = pairs.iter().filter(|p| p.passed).count();
    let fail_count = total_pairs - pass_count;

    let percent = |n: usize| {
        if total_pairs == 0 {
            0.0
        } else {
            n as f64 / total_pairs as f64 * 100.0
        }
    };
    let average_overlap = if total_pairs == 0 {
        0.0
    } else {
        pairs.iter().map(|p| p.overlap_percentage).sum::<f64>() / total_pairs as f64
    };
    let maximum_overlap = pairs
        .iter()
        .map(|p| p.overlap_percentage)
        .fold(0.0, f64::max);

    QaSummary {
        threshold,
        total_pairs,
        pass_count,
        fail_count,
        pass_percentage: percent(pass_count),
        fail_percentage: percent(fail_count),
        average_overlap,
        maximum_overlap,
    }
}

/// Row of the pairwise overlap CSV table
#[derive(Serialize)]
struct PairRow<'a> {
    pair: usize,
    first_id: &'a str,
    first_name: &'a str,
    second_id: &'a str,
    second_name: &'a str,
    shared: String,
    overlap_count: usize,
    overlap_percentage: String,
    result: &'static str,
}

fn pass_label(passed: bool) -> &'static str {
    if passed {
        "PASS"
    } else {
        "FAIL"
    }
}

impl QaReport {
    /// True when no finding of any kind is attached
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
            && self.progression_violations.is_empty()
            && self.duration.warning.is_none()
            && self.data_gaps.is_empty()
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Movement sequence table as CSV
    pub fn sequence_csv(&self) -> Result<String> {
        let mut writer = csv::Writer::from_writer(Vec::new());
        for row in &self.movements {
            writer.serialize(row)?;
        }
        into_string(writer)
    }

    /// Pairwise overlap table as CSV
    pub fn pairs_csv(&self) -> Result<String> {
        let mut writer = csv::Writer::from_writer(Vec::new());
        for (i, pair) in self.pairs.iter().enumerate() {
            writer.serialize(PairRow {
                pair: i + 1,
                first_id: &pair.first_id,
                first_name: &pair.first_name,
                second_id: &pair.second_id,
                second_name: &pair.second_name,
                shared: pair.shared.iter().cloned().collect::<Vec<_>>().join(";"),
                overlap_count: pair.overlap_count,
                overlap_percentage: format!("{:.1}", pair.overlap_percentage),
                result: pass_label(pair.passed),
            })?;
        }
        into_string(writer)
    }

    /// Human-readable export for audit and training use
    pub fn to_markdown(&self) -> Result<String> {
        let sequence_csv = self.sequence_csv()?;
        let pairs_csv = self.pairs_csv()?;
        let s = &self.summary;
        let mut out = String::new();

        writeln!(out, "# Sequence QA Report")?;
        writeln!(out)?;
        writeln!(out, "- Report ID: {}", self.report_id)?;
        writeln!(out, "- Generated: {}", self.generated_at.to_rfc3339())?;
        writeln!(
            out,
            "- Status: {}",
            if self.is_clean() { "CLEAN" } else { "FLAGGED" }
        )?;
        writeln!(out)?;

        writeln!(out, "## Movement Sequence")?;
        writeln!(out)?;
        writeln!(out, "```csv")?;
        out.push_str(&sequence_csv);
        writeln!(out, "```")?;
        writeln!(out)?;

        writeln!(out, "## Pairwise Overlap")?;
        writeln!(out)?;
        writeln!(out, "```csv")?;
        out.push_str(&pairs_csv);
        writeln!(out, "```")?;
        writeln!(out)?;

        writeln!(out, "## Summary Statistics")?;
        writeln!(out)?;
        writeln!(out, "- Overlap threshold: {:.1}%", s.threshold)?;
        writeln!(out, "- Total pairs: {}", s.total_pairs)?;
        writeln!(out, "- Passed: {} ({:.1}%)", s.pass_count, s.pass_percentage)?;
        writeln!(out, "- Failed: {} ({:.1}%)", s.fail_count, s.fail_percentage)?;
        writeln!(out, "- Average overlap: {:.1}%", s.average_overlap)?;
        writeln!(out, "- Maximum overlap: {:.1}%", s.maximum_overlap)?;
        writeln!(out)?;

        writeln!(out, "## Detailed Breakdown")?;
        writeln!(out)?;

        writeln!(out, "### Overlap Failures")?;
        writeln!(out)?;
        if self.failures.is_empty() {
            writeln!(out, "None.")?;
        }
        for pair in &self.failures {
            writeln!(
                out,
                "- {} → {}: {} of {} shared ({:.1}%): {}",
                pair.first_name,
                pair.second_name,
                pair.overlap_count,
                self.muscle_count(&pair.second_id),
                pair.overlap_percentage,
                pair.shared.iter().cloned().collect::<Vec<_>>().join(", ")
            )?;
        }
        writeln!(out)?;

        writeln!(out, "### Progression")?;
        writeln!(out)?;
        if self.progression_violations.is_empty() {
            writeln!(out, "No ordering violations.")?;
        }
        for v in &self.progression_violations {
            writeln!(out, "- Position {} ({}): {}", v.position, v.movement_id, v.reason)?;
        }
        writeln!(out)?;

        let d = &self.duration;
        writeln!(out, "### Duration")?;
        writeln!(out)?;
        writeln!(out, "- Target: {}s", d.target_seconds)?;
        writeln!(
            out,
            "- Achieved: {}s ({}s movements + {}s fixed sections)",
            d.total_seconds, d.movement_seconds, d.overhead_seconds
        )?;
        match &d.warning {
            Some(w) => {
                writeln!(
                    out,
                    "- WARNING: {:+.1}% off target (tolerance ±{:.1}%)",
                    w.deviation_percent, w.tolerance_percent
                )?;
            }
            None => {
                writeln!(out, "- Within tolerance")?;
            }
        }
        writeln!(out)?;

        writeln!(out, "### Data Gaps")?;
        writeln!(out)?;
        if self.data_gaps.is_empty() {
            writeln!(out, "None.")?;
        }
        for gap in &self.data_gaps {
            writeln!(out, "- {}: missing {:?}", gap.movement_id, gap.missing)?;
        }

        Ok(out)
    }

    fn muscle_count(&self, movement_id: &str) -> usize {
        self.movements
            .iter()
            .find(|m| m.id == movement_id)
            .map(|m| m.muscle_groups.split(';').filter(|g| !g.is_empty()).count())
            .unwrap_or(0)
    }
}

fn into_string(writer: csv::Writer<Vec<u8>>) -> Result<String> {
    let bytes = writer
        .into_inner()
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e.to_string()))?;
    String::from_utf8(bytes)
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e).into())
}
