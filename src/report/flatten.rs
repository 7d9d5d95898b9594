//! Flatten an Ace report into table rows

use std::borrow::Cow;

use serde::Serialize;

use super::aria::{suggest_role, MATCHING_ROLE_RULE};
use super::types::{AceReport, DocumentAssertion, Finding, Impact, Outcome};

/// One finding, ready for tabular display
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportRow {
    pub impact: Impact,
    /// Content document path as reported by Ace (percent-decoded)
    pub file: String,
    pub rule: String,
    pub message: String,
    /// First CFI pointer, if Ace gave one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cfi: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub html: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggested_role: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub help_url: Option<String>,
    /// Source line, filled in once the CFI has been located
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line: Option<u32>,
}

/// Number of findings per impact level
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ImpactSummary {
    pub critical: usize,
    pub serious: usize,
    pub moderate: usize,
    pub minor: usize,
}

impl ImpactSummary {
    pub fn from_rows(rows: &[ReportRow]) -> Self {
        rows.iter().fold(Self::default(), |mut summary, row| {
            match row.impact {
                Impact::Critical => summary.critical += 1,
                Impact::Serious => summary.serious += 1,
                Impact::Moderate => summary.moderate += 1,
                Impact::Minor => summary.minor += 1,
            }
            summary
        })
    }

    pub fn total(&self) -> usize {
        self.critical + self.serious + self.moderate + self.minor
    }
}

/// Turn the nested report into one row per finding, in report order.
///
/// A passing report yields no rows.
pub fn flatten(report: &AceReport) -> Vec<ReportRow> {
    if report.outcome() == Outcome::Pass {
        return Vec::new();
    }

    report
        .assertions
        .iter()
        .flat_map(|group| {
            group
                .assertions
                .iter()
                .filter(|finding| finding.result.outcome == Outcome::Fail)
                .map(move |finding| row_for(group, finding))
        })
        .collect()
}

fn row_for(group: &DocumentAssertion, finding: &Finding) -> ReportRow {
    let test = &finding.test;
    let result = &finding.result;

    let impact = test.impact.unwrap_or_else(|| {
        tracing::debug!(rule = %test.rule, "Finding without impact, treating as minor");
        Impact::Minor
    });

    let message = [result.description.as_deref(), test.description.as_deref()]
        .into_iter()
        .flatten()
        .map(str::trim)
        .find(|m| !m.is_empty())
        .unwrap_or(test.rule.as_str())
        .to_string();

    let cfi = result
        .pointer
        .as_ref()
        .and_then(|p| p.cfi.first())
        .cloned();

    let suggested_role = if test.rule == MATCHING_ROLE_RULE {
        result
            .html
            .as_deref()
            .and_then(suggest_role)
            .map(str::to_string)
    } else {
        None
    };

    ReportRow {
        impact,
        file: decode_href(&group.test_subject.url),
        rule: test.rule.clone(),
        message,
        cfi,
        html: result.html.clone(),
        suggested_role,
        help_url: test.help.as_ref().and_then(|h| h.url.clone()),
        line: None,
    }
}

fn decode_href(url: &str) -> String {
    urlencoding::decode(url)
        .map(Cow::into_owned)
        .unwrap_or_else(|_| url.to_string())
}

/// Most severe first; report order is kept within a level.
pub fn sort_by_severity(rows: &mut [ReportRow]) {
    rows.sort_by(|a, b| b.impact.cmp(&a.impact));
}

/// Drop rows below `min`.
pub fn retain_min_impact(rows: &mut Vec<ReportRow>, min: Impact) {
    rows.retain(|row| row.impact >= min);
}
