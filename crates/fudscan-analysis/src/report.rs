//! FUD Report
//!
//! The structured output of a run, and the ad-hoc parser that extracts it
//! from the agent's free-form final answer. The model is asked to emit a
//! fenced JSON block, but smaller models routinely wrap it in prose, skip
//! the fence, or fall back to "fear: 70"-style lines — the parser accepts
//! all three shapes.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Overall verdict derived from the FUD score
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Verdict {
    Low,
    Moderate,
    Elevated,
    Severe,
}

impl Verdict {
    /// Band the 0..=100 FUD score into a verdict
    pub fn from_score(score: u8) -> Self {
        match score {
            0..=24 => Verdict::Low,
            25..=49 => Verdict::Moderate,
            50..=74 => Verdict::Elevated,
            _ => Verdict::Severe,
        }
    }
}

impl std::fmt::Display for Verdict {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Verdict::Low => write!(f, "low"),
            Verdict::Moderate => write!(f, "moderate"),
            Verdict::Elevated => write!(f, "elevated"),
            Verdict::Severe => write!(f, "severe"),
        }
    }
}

/// A structured FUD risk report for one coin
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct FudReport {
    /// Ticker symbol
    pub coin: String,

    /// Overall FUD score, 0 (calm) to 100 (panic)
    pub fud_score: u8,

    /// Fear axis: how scared is the market right now
    pub fear: u8,

    /// Uncertainty axis: how unclear is the near-term picture
    pub uncertainty: u8,

    /// Doubt axis: how shaky is confidence in the asset itself
    pub doubt: u8,

    /// Verdict band derived from the overall score
    pub verdict: Verdict,

    /// Narrative summary from the agent
    pub summary: String,

    /// When the report was generated
    pub generated_at: DateTime<Utc>,
}

/// Parse a report out of the agent's free-form final answer
///
/// Tries, in order: a fenced ```json block, the widest inline `{...}` span,
/// and loose `label: score` lines. Returns `None` only when no score of any
/// kind can be found.
pub fn parse_report(coin: &str, text: &str) -> Option<FudReport> {
    if let Some(json_str) = extract_fenced_json(text) {
        if let Some(report) = from_json(coin, json_str, text) {
            return Some(report);
        }
    }

    if let Some(json_str) = extract_inline_json(text) {
        if let Some(report) = from_json(coin, json_str, text) {
            return Some(report);
        }
    }

    parse_loose(coin, text)
}

/// What the model's JSON block is allowed to look like
#[derive(Debug, Deserialize)]
struct RawReport {
    #[serde(default)]
    coin: Option<String>,
    #[serde(default)]
    fud_score: Option<f64>,
    #[serde(default)]
    fear: Option<f64>,
    #[serde(default)]
    uncertainty: Option<f64>,
    #[serde(default)]
    doubt: Option<f64>,
    #[serde(default)]
    summary: Option<String>,
}

fn extract_fenced_json(text: &str) -> Option<&str> {
    let start = text.find("```json")?;
    let after = &text[start + "```json".len()..];
    let end = after.find("```")?;
    Some(after[..end].trim())
}

fn extract_inline_json(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    if end <= start {
        return None;
    }
    Some(&text[start..=end])
}

fn from_json(coin: &str, json_str: &str, full_text: &str) -> Option<FudReport> {
    let raw: RawReport = serde_json::from_str(json_str).ok()?;

    let axes = [raw.fear, raw.uncertainty, raw.doubt];
    let present: Vec<f64> = axes.iter().flatten().copied().collect();

    if raw.fud_score.is_none() && present.is_empty() {
        return None;
    }

    let fud_score = raw
        .fud_score
        .unwrap_or_else(|| present.iter().sum::<f64>() / present.len() as f64);
    let overall = clamp_score(fud_score);

    let summary = raw
        .summary
        .filter(|s| !s.trim().is_empty())
        .unwrap_or_else(|| prose_around_json(full_text, json_str));

    Some(FudReport {
        coin: raw
            .coin
            .filter(|c| !c.trim().is_empty())
            .map(|c| c.to_uppercase())
            .unwrap_or_else(|| coin.to_uppercase()),
        fud_score: overall,
        fear: raw.fear.map_or(overall, clamp_score),
        uncertainty: raw.uncertainty.map_or(overall, clamp_score),
        doubt: raw.doubt.map_or(overall, clamp_score),
        verdict: Verdict::from_score(overall),
        summary,
        generated_at: Utc::now(),
    })
}

/// Line-oriented fallback: scan for `label: number` lines
fn parse_loose(coin: &str, text: &str) -> Option<FudReport> {
    let mut fear = None;
    let mut uncertainty = None;
    let mut doubt = None;
    let mut overall = None;
    let mut prose = Vec::new();

    for line in text.lines() {
        if let Some(v) = score_after(line, "fud score") {
            overall = Some(v);
        } else if let Some(v) = score_after(line, "fear") {
            fear = Some(v);
        } else if let Some(v) = score_after(line, "uncertainty") {
            uncertainty = Some(v);
        } else if let Some(v) = score_after(line, "doubt") {
            doubt = Some(v);
        } else {
            prose.push(line);
        }
    }

    let present: Vec<f64> = [fear, uncertainty, doubt].iter().flatten().copied().collect();
    if overall.is_none() && present.is_empty() {
        return None;
    }

    let fud_score = overall.unwrap_or_else(|| present.iter().sum::<f64>() / present.len() as f64);
    let score = clamp_score(fud_score);

    Some(FudReport {
        coin: coin.to_uppercase(),
        fud_score: score,
        fear: fear.map_or(score, clamp_score),
        uncertainty: uncertainty.map_or(score, clamp_score),
        doubt: doubt.map_or(score, clamp_score),
        verdict: Verdict::from_score(score),
        summary: prose.join("\n").trim().to_string(),
        generated_at: Utc::now(),
    })
}

/// Parse `<label>[ ... ]: <number>` (case-insensitive), e.g. "Fear: 70/100"
fn score_after(line: &str, label: &str) -> Option<f64> {
    let lower = line.trim().trim_start_matches(['-', '*', ' ']).to_lowercase();
    if !lower.starts_with(label) {
        return None;
    }

    let after_colon = lower.split(':').nth(1)?;
    let token: String = after_colon
        .trim()
        .chars()
        .take_while(|c| c.is_ascii_digit() || *c == '.')
        .collect();

    token.parse().ok()
}

/// Whatever prose surrounds the JSON block, as a fallback summary
fn prose_around_json(full_text: &str, json_str: &str) -> String {
    full_text
        .replace(json_str, "")
        .replace("```json", "")
        .replace("```", "")
        .trim()
        .to_string()
}

fn clamp_score(value: f64) -> u8 {
    value.clamp(0.0, 100.0).round() as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verdict_bands() {
        assert_eq!(Verdict::from_score(0), Verdict::Low);
        assert_eq!(Verdict::from_score(30), Verdict::Moderate);
        assert_eq!(Verdict::from_score(60), Verdict::Elevated);
        assert_eq!(Verdict::from_score(90), Verdict::Severe);
    }

    #[test]
    fn test_parse_fenced_json() {
        let answer = r#"Here is my assessment.
```json
{"coin": "btc", "fud_score": 62, "fear": 70, "uncertainty": 55, "doubt": 60, "summary": "Leverage is stretched."}
```"#;
        let report = parse_report("BTC", answer).unwrap();
        assert_eq!(report.coin, "BTC");
        assert_eq!(report.fud_score, 62);
        assert_eq!(report.fear, 70);
        assert_eq!(report.verdict, Verdict::Elevated);
        assert_eq!(report.summary, "Leverage is stretched.");
    }

    #[test]
    fn test_parse_inline_json_without_fence() {
        let answer = r#"Assessment: {"fud_score": 20, "fear": 15, "uncertainty": 25, "doubt": 20}"#;
        let report = parse_report("ETH", answer).unwrap();
        assert_eq!(report.coin, "ETH");
        assert_eq!(report.verdict, Verdict::Low);
    }

    #[test]
    fn test_missing_overall_derived_from_axes() {
        let answer = r#"```json
{"fear": 90, "uncertainty": 60, "doubt": 30}
```"#;
        let report = parse_report("DOGE", answer).unwrap();
        assert_eq!(report.fud_score, 60);
        assert_eq!(report.verdict, Verdict::Elevated);
    }

    #[test]
    fn test_loose_line_fallback() {
        let answer = "The market looks shaky.\n- Fear: 80/100\n- Uncertainty: 70\n- Doubt: 64.5\nStay careful out there.";
        let report = parse_report("SOL", answer).unwrap();
        assert_eq!(report.fear, 80);
        assert_eq!(report.uncertainty, 70);
        assert_eq!(report.doubt, 65);
        assert!(report.summary.contains("shaky"));
        assert!(report.summary.contains("careful"));
        assert!(!report.summary.to_lowercase().contains("fear:"));
        assert!(!report.summary.to_lowercase().contains("doubt:"));
    }

    #[test]
    fn test_loose_fud_score_line() {
        let answer = "FUD score: 85\nEverything is on fire.";
        let report = parse_report("SHIB", answer).unwrap();
        assert_eq!(report.fud_score, 85);
        assert_eq!(report.verdict, Verdict::Severe);
        assert_eq!(report.summary, "Everything is on fire.");
    }

    #[test]
    fn test_scores_clamped() {
        let answer = r#"```json
{"fud_score": 250, "fear": -10}
```"#;
        let report = parse_report("BTC", answer).unwrap();
        assert_eq!(report.fud_score, 100);
        assert_eq!(report.fear, 0);
    }

    #[test]
    fn test_no_scores_means_no_report() {
        assert!(parse_report("BTC", "I could not gather enough data.").is_none());
        assert!(parse_report("BTC", "").is_none());
    }

    #[test]
    fn test_summary_falls_back_to_surrounding_prose() {
        let answer = "Leverage looks dangerous here.\n```json\n{\"fud_score\": 70}\n```";
        let report = parse_report("BTC", answer).unwrap();
        assert_eq!(report.summary, "Leverage looks dangerous here.");
    }
}
