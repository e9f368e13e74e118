//! Terminal presentation
//!
//! Every function here is a pure view over client state and returns the text
//! to print; nothing in this module performs I/O.

use colored::{ColoredString, Colorize};
use tracing::debug;

use crate::domain::{
    AnalysisResponse, ChatMessage, ClauseAnalysis, FileStatus, RiskBand, Sender, Transcript, WorkingSet,
};
use crate::events::{Notification, Severity};
use crate::intake::{Rejection, format_file_size};
use crate::upload::UploadOutcome;

/// Order of the clause list
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ClauseSort {
    /// As returned by the service
    #[default]
    Order,
    /// Highest score first; ties keep service order
    Score,
}

/// Which clauses to show and how
#[derive(Debug, Clone, Copy, Default)]
pub struct ClauseView {
    pub risky_only: bool,
    pub sort: ClauseSort,
}

fn band_label(band: RiskBand) -> ColoredString {
    let label = format!("{} risk", band).to_uppercase();
    match band {
        RiskBand::Low => label.green().bold(),
        RiskBand::Medium => label.yellow().bold(),
        RiskBand::High => label.red().bold(),
    }
}

fn score_label(score: f64) -> ColoredString {
    let text = format!("{:>3}", score.round());
    match RiskBand::from_score(score) {
        RiskBand::Low => text.green(),
        RiskBand::Medium => text.yellow(),
        RiskBand::High => text.red(),
    }
}

/// Summary card: score, band, risky count and the service's summary text
pub fn summary(analysis: &AnalysisResponse) -> String {
    let s = &analysis.document_summary;
    let mut out = String::new();
    out.push_str(&format!("{}\n", "Document Summary".bright_cyan().bold()));
    out.push_str(&format!(
        "  Overall risk score: {} / 100  {}\n",
        s.overall_risk_score.round().to_string().bold(),
        band_label(analysis.risk_band())
    ));
    out.push_str(&format!(
        "  Risky clauses: {} of {}\n",
        s.risky_clause_count.to_string().bold(),
        s.total_clauses
    ));
    if !analysis.is_consistent() {
        out.push_str(&format!(
            "  {}\n",
            format!(
                "({} clauses listed, summary reports {})",
                analysis.clause_by_clause_analysis.len(),
                s.total_clauses
            )
            .dimmed()
        ));
    }
    if !s.risk_summary.trim().is_empty() {
        out.push('\n');
        for line in s.risk_summary.lines() {
            out.push_str(&format!("  {}\n", line));
        }
    }
    out
}

/// Clause list, filtered and ordered per `view`
pub fn clauses(analysis: &AnalysisResponse, view: ClauseView) -> String {
    debug!(risky_only = view.risky_only, sort = ?view.sort, "clauses: called");
    let mut selected: Vec<(usize, &ClauseAnalysis)> = analysis
        .clause_by_clause_analysis
        .iter()
        .enumerate()
        .filter(|(_, c)| !view.risky_only || c.risky)
        .collect();

    if view.sort == ClauseSort::Score {
        selected.sort_by(|a, b| b.1.score.total_cmp(&a.1.score));
    }

    let mut out = String::new();
    out.push_str(&format!("{}\n", "Clause-by-Clause Analysis".bright_cyan().bold()));
    if selected.is_empty() {
        let empty = if view.risky_only {
            "No risky clauses found."
        } else {
            "No clauses returned."
        };
        out.push_str(&format!("  {}\n", empty.dimmed()));
        return out;
    }

    for (idx, clause) in selected {
        let flag = if clause.risky { "RISKY".red().bold() } else { "ok".green() };
        out.push_str(&format!(
            "\n  {:>2}. [{}] score {}  {}\n",
            idx + 1,
            flag,
            score_label(clause.score),
            clause.category.dimmed()
        ));
        out.push_str(&format!("      {}\n", clause.clause.italic()));
        out.push_str(&format!("      {} {}\n", "Summary:".bold(), clause.summary));
        out.push_str(&format!("      {} {}\n", "Reason:".bold(), clause.reason));
    }
    out
}

/// Clause and risky counts per category
pub fn categories(analysis: &AnalysisResponse) -> String {
    let breakdown = analysis.category_breakdown();
    let mut out = String::new();
    out.push_str(&format!("{}\n", "Categories".bright_cyan().bold()));
    for entry in breakdown {
        let risky = if entry.risky > 0 {
            format!("{} risky", entry.risky).red()
        } else {
            "0 risky".dimmed()
        };
        out.push_str(&format!(
            "  {:<24} {:>3} clause(s)  {}\n",
            entry.category.to_string(),
            entry.clauses,
            risky
        ));
    }
    out
}

/// Summary card, category breakdown and clause list
pub fn analysis(analysis: &AnalysisResponse, view: ClauseView) -> String {
    format!(
        "{}\n{}\n{}",
        summary(analysis),
        categories(analysis),
        clauses(analysis, view)
    )
}

/// The raw response as pretty JSON
pub fn analysis_json(analysis: &AnalysisResponse) -> serde_json::Result<String> {
    serde_json::to_string_pretty(analysis)
}

pub fn message(message: &ChatMessage) -> String {
    match message.sender {
        Sender::User => format!("{} {}", "You:".bright_green().bold(), message.text),
        Sender::Assistant => format!("{} {}", "Assistant:".bright_blue().bold(), message.text),
    }
}

pub fn transcript(transcript: &Transcript) -> String {
    transcript
        .messages()
        .iter()
        .map(|m| format!("{}\n", message(m)))
        .collect()
}

fn status_label(status: FileStatus) -> ColoredString {
    match status {
        FileStatus::Ready => "ready".normal(),
        FileStatus::Uploading => "uploading".yellow(),
        FileStatus::Success => "uploaded".green(),
        FileStatus::Error => "failed".red(),
    }
}

/// Staged files with size and status
pub fn files(set: &WorkingSet) -> String {
    let mut out = String::new();
    out.push_str(&format!("{} ({})\n", "Selected Files".bright_cyan().bold(), set.len()));
    for file in set.iter() {
        out.push_str(&format!(
            "  {} {:<32} {:>10}  {}\n",
            file.id().short().dimmed(),
            file.name(),
            format_file_size(file.size()),
            status_label(file.status())
        ));
        if let Some(url) = file.remote_url() {
            out.push_str(&format!("           {}\n", url.dimmed()));
        }
    }
    out
}

pub fn rejections(rejected: &[Rejection]) -> String {
    rejected
        .iter()
        .map(|r| format!("  {} {}\n", "✗".red(), r))
        .collect()
}

/// Per-file upload results and the analysis link
pub fn upload_outcome(outcome: &UploadOutcome) -> String {
    let mut out = String::new();
    for file in &outcome.files {
        match (&file.remote_url, &file.error) {
            (Some(url), _) => out.push_str(&format!("  {} {} -> {}\n", "✓".green(), file.name, url)),
            (None, Some(error)) => out.push_str(&format!("  {} {}: {}\n", "✗".red(), file.name, error)),
            (None, None) => out.push_str(&format!("  {} {} ({})\n", "?".yellow(), file.name, file.status)),
        }
    }
    if let Some(url) = &outcome.redirect {
        out.push_str(&format!("\n{} {}\n", "Analyze:".bold(), url.cyan()));
    }
    out
}

pub fn notification(notification: &Notification) -> String {
    match notification.severity {
        Severity::Info => format!(
            "{} {}: {}",
            "•".bright_blue(),
            notification.title.bold(),
            notification.description
        ),
        Severity::Error => format!(
            "{} {}: {}",
            "!".red().bold(),
            notification.title.red().bold(),
            notification.description
        ),
    }
}

/// One-line progress bar, e.g. `Analyzing [#########-----------]  45%`
pub fn progress_line(progress: f64) -> String {
    const WIDTH: usize = 20;
    let clamped = progress.clamp(0.0, 100.0);
    let filled = ((clamped / 100.0) * WIDTH as f64).round() as usize;
    format!(
        "Analyzing [{}{}] {:>3}%",
        "#".repeat(filled),
        "-".repeat(WIDTH - filled),
        clamped.round()
    )
}
