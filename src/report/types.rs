//! Ace report schema
//!
//! Only the parts of `report.json` that ace-check reads are modelled; unknown
//! fields are ignored so newer Ace versions keep loading.

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Top-level Ace report
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AceReport {
    #[serde(rename = "earl:result", default)]
    pub result: Option<EarlResult>,
    #[serde(rename = "earl:testSubject", default)]
    pub test_subject: Option<PublicationSubject>,
    /// One assertion group per content document
    #[serde(default)]
    pub assertions: Vec<DocumentAssertion>,
}

/// The publication that was checked
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PublicationSubject {
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub metadata: serde_json::Map<String, serde_json::Value>,
}

/// Findings for a single content document
#[derive(Debug, Clone, Deserialize)]
pub struct DocumentAssertion {
    #[serde(rename = "earl:testSubject")]
    pub test_subject: DocumentSubject,
    #[serde(rename = "earl:result", default)]
    pub result: Option<EarlResult>,
    #[serde(default)]
    pub assertions: Vec<Finding>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DocumentSubject {
    pub url: String,
    #[serde(rename = "dct:title", default)]
    pub title: Option<String>,
}

/// A single rule violation
#[derive(Debug, Clone, Deserialize)]
pub struct Finding {
    #[serde(rename = "earl:test")]
    pub test: EarlTest,
    #[serde(rename = "earl:result")]
    pub result: EarlResult,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EarlTest {
    #[serde(rename = "earl:impact", default)]
    pub impact: Option<Impact>,
    /// Rule identifier, e.g. `color-contrast`
    #[serde(rename = "dct:title")]
    pub rule: String,
    #[serde(rename = "dct:description", default)]
    pub description: Option<String>,
    #[serde(default)]
    pub help: Option<Help>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Help {
    #[serde(default)]
    pub url: Option<String>,
    #[serde(rename = "dct:description", default)]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EarlResult {
    #[serde(rename = "earl:outcome")]
    pub outcome: Outcome,
    #[serde(rename = "dct:description", default)]
    pub description: Option<String>,
    #[serde(rename = "earl:pointer", default)]
    pub pointer: Option<Pointer>,
    /// Offending markup
    #[serde(default)]
    pub html: Option<String>,
}

/// Where in the document a finding occurred
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Pointer {
    #[serde(default)]
    pub cfi: Vec<String>,
    #[serde(default)]
    pub css: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Outcome {
    Pass,
    Fail,
    /// `cantTell`, `inapplicable`, `untested` and anything newer
    #[serde(other)]
    Other,
}

/// Severity of a finding. Ordered from least to most severe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Impact {
    Minor,
    Moderate,
    Serious,
    Critical,
}

impl Impact {
    pub const ALL: [Impact; 4] = [
        Impact::Critical,
        Impact::Serious,
        Impact::Moderate,
        Impact::Minor,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Impact::Minor => "minor",
            Impact::Moderate => "moderate",
            Impact::Serious => "serious",
            Impact::Critical => "critical",
        }
    }
}

impl fmt::Display for Impact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Impact {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "minor" => Ok(Impact::Minor),
            "moderate" => Ok(Impact::Moderate),
            "serious" => Ok(Impact::Serious),
            "critical" => Ok(Impact::Critical),
            other => Err(format!(
                "unknown impact '{}', expected critical, serious, moderate or minor",
                other
            )),
        }
    }
}

impl AceReport {
    pub fn parse(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::parse(&text)
    }

    /// Overall outcome. Reports without a top-level result count as failed
    /// when they carry any assertion group.
    pub fn outcome(&self) -> Outcome {
        match self.result {
            Some(ref result) => result.outcome,
            None if self.assertions.is_empty() => Outcome::Pass,
            None => Outcome::Fail,
        }
    }

    /// Publication title from the report metadata
    pub fn title(&self) -> Option<&str> {
        self.test_subject
            .as_ref()?
            .metadata
            .get("dc:title")?
            .as_str()
    }
}
