//! Score and verdict extraction from free-form model output
//!
//! Models are asked for a JSON-ish score block followed by a verdict, but
//! nothing guarantees that shape. Extraction is label based and fails soft:
//! a score that cannot be read is absent, never zero.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt::Write;
use std::sync::LazyLock;

pub const PHQ9_MAX: u8 = 27;
pub const BDI_II_MAX: u8 = 63;
pub const HAMILTON_MAX: u8 = 52;

const NO_VERDICT: &str = "No verdict was provided.";

// Label, up to 40 non-digit characters of filler (quotes, colon, words), then the value
static PHQ9_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\bPHQ[-_ ]?9\b[^0-9\n]{0,40}?(\d{1,3}(?:\.\d+)?)").expect("valid regex")
});
static BDI_II_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\bBDI[-_ ]?II\b[^0-9\n]{0,40}?(\d{1,3}(?:\.\d+)?)").expect("valid regex")
});
static HAMILTON_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(?:Hamilton|HAM[-_ ]?D)\b[^0-9\n]{0,40}?(\d{1,3}(?:\.\d+)?)")
        .expect("valid regex")
});
static VERDICT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)\bverdict\s*[:\-]\s*(.+)").expect("valid regex"));

/// The three clinical-style scores; any may be missing
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssessmentScores {
    #[serde(rename = "PHQ-9", default, skip_serializing_if = "Option::is_none")]
    pub phq9: Option<u8>,
    #[serde(rename = "BDI-II", default, skip_serializing_if = "Option::is_none")]
    pub bdi_ii: Option<u8>,
    #[serde(rename = "Hamilton", default, skip_serializing_if = "Option::is_none")]
    pub hamilton: Option<u8>,
}

impl AssessmentScores {
    pub fn parse(text: &str) -> Self {
        Self {
            phq9: capture_score(&PHQ9_RE, text, PHQ9_MAX),
            bdi_ii: capture_score(&BDI_II_RE, text, BDI_II_MAX),
            hamilton: capture_score(&HAMILTON_RE, text, HAMILTON_MAX),
        }
    }

    pub fn is_complete(&self) -> bool {
        self.phq9.is_some() && self.bdi_ii.is_some() && self.hamilton.is_some()
    }

    pub fn is_empty(&self) -> bool {
        self.phq9.is_none() && self.bdi_ii.is_none() && self.hamilton.is_none()
    }

    /// Fill gaps from another reading, keeping values already present
    #[must_use]
    pub fn or(self, other: Self) -> Self {
        Self {
            phq9: self.phq9.or(other.phq9),
            bdi_ii: self.bdi_ii.or(other.bdi_ii),
            hamilton: self.hamilton.or(other.hamilton),
        }
    }
}

fn capture_score(re: &Regex, text: &str, max: u8) -> Option<u8> {
    let raw = re.captures(text)?.get(1)?.as_str();
    let value: f64 = raw.parse().ok()?;
    let rounded = value.round();
    if !(0.0..=f64::from(max)).contains(&rounded) {
        tracing::debug!(raw, max, "Discarding out-of-range score");
        return None;
    }
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    Some(rounded as u8)
}

/// Severity band, taken from the PHQ-9 score
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Minimal,
    Mild,
    Moderate,
    ModeratelySevere,
    Severe,
}

impl Severity {
    pub fn from_phq9(score: u8) -> Self {
        match score {
            0..=4 => Severity::Minimal,
            5..=9 => Severity::Mild,
            10..=14 => Severity::Moderate,
            15..=19 => Severity::ModeratelySevere,
            _ => Severity::Severe,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Severity::Minimal => "none/minimal",
            Severity::Mild => "mild",
            Severity::Moderate => "moderate",
            Severity::ModeratelySevere => "moderately severe",
            Severity::Severe => "severe",
        }
    }
}

/// Outcome of a finished assessment
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssessmentResult {
    pub scores: AssessmentScores,
    pub verdict: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub severity: Option<Severity>,
}

impl AssessmentResult {
    pub fn new(scores: AssessmentScores, verdict: impl Into<String>) -> Self {
        Self {
            severity: scores.phq9.map(Severity::from_phq9),
            scores,
            verdict: verdict.into(),
        }
    }

    /// Read scores and verdict from a model reply
    pub fn parse(text: &str) -> Self {
        Self::new(AssessmentScores::parse(text), extract_verdict(text))
    }

    /// Message shown to the user when the assessment finishes
    pub fn summary(&self) -> String {
        let mut out = String::from("Assessment complete.\n\n");
        for (label, value, max) in [
            ("PHQ-9", self.scores.phq9, PHQ9_MAX),
            ("BDI-II", self.scores.bdi_ii, BDI_II_MAX),
            ("Hamilton", self.scores.hamilton, HAMILTON_MAX),
        ] {
            match value {
                Some(v) => {
                    let _ = writeln!(out, "{label}: {v} / {max}");
                }
                None => {
                    let _ = writeln!(out, "{label}: not available");
                }
            }
        }
        let _ = write!(out, "\nVerdict: {}", self.verdict);
        out
    }
}

fn extract_verdict(text: &str) -> String {
    if let Some(caps) = VERDICT_RE.captures(text) {
        let verdict = caps[1].trim();
        if !verdict.is_empty() {
            return verdict.to_string();
        }
    }
    if let Some(pos) = text.rfind('}') {
        let tail = text.get(pos + 1..).unwrap_or_default().trim();
        if !tail.is_empty() {
            return tail.to_string();
        }
    }
    let whole = text.trim();
    if whole.is_empty() {
        NO_VERDICT.to_string()
    } else {
        whole.to_string()
    }
}
