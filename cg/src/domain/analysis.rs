//! Analysis response types
//!
//! Field names match the analysis service's JSON contract exactly.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::debug;

/// Document-level risk summary
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentSummary {
    /// Overall score (observed range 0-100)
    pub overall_risk_score: f64,
    pub risk_summary: String,
    pub total_clauses: u32,
    pub risky_clause_count: u32,
}

/// Finding for a single clause
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClauseAnalysis {
    #[serde(rename = "Clause")]
    pub clause: String,
    pub risky: bool,
    pub score: f64,
    pub summary: String,
    pub reason: String,
    #[serde(default = "default_category")]
    pub category: String,
}

fn default_category() -> String {
    ClauseCategory::Uncategorized.as_str().to_string()
}

impl ClauseAnalysis {
    /// Parsed view of the category label
    pub fn category(&self) -> ClauseCategory {
        ClauseCategory::from_label(&self.category)
    }
}

/// Full response from the analysis service
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResponse {
    pub document_summary: DocumentSummary,
    pub clause_by_clause_analysis: Vec<ClauseAnalysis>,
}

impl AnalysisResponse {
    /// Check the summary invariant `total_clauses >= risky_clause_count`
    pub fn validate(&self) -> Result<(), String> {
        let summary = &self.document_summary;
        if summary.risky_clause_count > summary.total_clauses {
            debug!(
                total = summary.total_clauses,
                risky = summary.risky_clause_count,
                "AnalysisResponse::validate: risky count exceeds total"
            );
            return Err(format!(
                "risky_clause_count ({}) exceeds total_clauses ({})",
                summary.risky_clause_count, summary.total_clauses
            ));
        }
        Ok(())
    }

    /// Whether the clause list length matches `total_clauses`
    ///
    /// The service does not guarantee this, so it is reported rather than enforced.
    pub fn is_consistent(&self) -> bool {
        self.clause_by_clause_analysis.len() == self.document_summary.total_clauses as usize
    }

    pub fn risky_clauses(&self) -> impl Iterator<Item = &ClauseAnalysis> {
        self.clause_by_clause_analysis.iter().filter(|c| c.risky)
    }

    /// Clause and risky-clause counts per category, in first-seen order
    pub fn category_breakdown(&self) -> Vec<CategoryCount> {
        let mut counts: Vec<CategoryCount> = Vec::new();
        for clause in &self.clause_by_clause_analysis {
            let category = clause.category();
            let existing = counts.iter().position(|c| c.category == category);
            let entry = match existing {
                Some(idx) => &mut counts[idx],
                None => {
                    counts.push(CategoryCount {
                        category,
                        clauses: 0,
                        risky: 0,
                    });
                    let last = counts.len() - 1;
                    &mut counts[last]
                }
            };
            entry.clauses += 1;
            if clause.risky {
                entry.risky += 1;
            }
        }
        counts
    }

    pub fn risk_band(&self) -> RiskBand {
        RiskBand::from_score(self.document_summary.overall_risk_score)
    }
}

/// Per-category tally
#[derive(Debug, Clone, PartialEq)]
pub struct CategoryCount {
    pub category: ClauseCategory,
    pub clauses: usize,
    pub risky: usize,
}

/// Categories the analysis service assigns, with a fallback for anything else
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ClauseCategory {
    Financial,
    Liability,
    Operational,
    Compliance,
    Termination,
    DataPrivacy,
    IntellectualProperty,
    Uncategorized,
    Other(String),
}

impl ClauseCategory {
    /// Parse a label case-insensitively; unknown labels become `Other`
    pub fn from_label(label: &str) -> Self {
        match label.trim().to_lowercase().as_str() {
            "financial" => ClauseCategory::Financial,
            "liability" => ClauseCategory::Liability,
            "operational" => ClauseCategory::Operational,
            "compliance" => ClauseCategory::Compliance,
            "termination" => ClauseCategory::Termination,
            "data privacy" => ClauseCategory::DataPrivacy,
            "intellectual property" => ClauseCategory::IntellectualProperty,
            "" | "uncategorized" => ClauseCategory::Uncategorized,
            _ => ClauseCategory::Other(label.trim().to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            ClauseCategory::Financial => "Financial",
            ClauseCategory::Liability => "Liability",
            ClauseCategory::Operational => "Operational",
            ClauseCategory::Compliance => "Compliance",
            ClauseCategory::Termination => "Termination",
            ClauseCategory::DataPrivacy => "Data Privacy",
            ClauseCategory::IntellectualProperty => "Intellectual Property",
            ClauseCategory::Uncategorized => "Uncategorized",
            ClauseCategory::Other(label) => label,
        }
    }
}

impl FromStr for ClauseCategory {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::from_label(s))
    }
}

impl fmt::Display for ClauseCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Coarse band for a 0-100 risk score
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RiskBand {
    Low,
    Medium,
    High,
}

impl RiskBand {
    pub fn from_score(score: f64) -> Self {
        if score < 40.0 {
            RiskBand::Low
        } else if score < 70.0 {
            RiskBand::Medium
        } else {
            RiskBand::High
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            RiskBand::Low => "low",
            RiskBand::Medium => "medium",
            RiskBand::High => "high",
        }
    }
}

impl fmt::Display for RiskBand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
