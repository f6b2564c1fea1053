//! Lexicon Sentiment Scoring
//!
//! Naive word-list scorer applied to headlines and social posts before they
//! reach the LLM. Good enough to rank items and compute aggregates; nuance
//! is left to the model.

/// Words that read bullish in crypto coverage
const POSITIVE: &[&str] = &[
    "surge", "surges", "rally", "rallies", "gain", "gains", "soar", "soars",
    "bullish", "breakout", "adoption", "partnership", "upgrade", "approval",
    "approved", "record", "high", "growth", "institutional", "accumulate",
    "moon", "pump", "win", "wins", "launch", "integration",
];

/// Words that read bearish or fearful
const NEGATIVE: &[&str] = &[
    "crash", "crashes", "plunge", "plunges", "dump", "dumps", "bearish",
    "hack", "hacked", "exploit", "scam", "fraud", "lawsuit", "sec",
    "investigation", "ban", "banned", "delist", "delisted", "liquidation",
    "liquidations", "selloff", "fear", "collapse", "bankruptcy", "insolvent",
    "rug", "warning", "risk", "losses", "sank", "tumble", "tumbles",
];

/// Score a piece of text in -1.0 (bearish) to 1.0 (bullish)
///
/// Zero when no lexicon word matches; otherwise the signed fraction of
/// matched words that are positive.
pub fn score(text: &str) -> f64 {
    let mut positive = 0usize;
    let mut negative = 0usize;

    for word in text
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
    {
        let word = word.to_lowercase();
        if POSITIVE.contains(&word.as_str()) {
            positive += 1;
        } else if NEGATIVE.contains(&word.as_str()) {
            negative += 1;
        }
    }

    let matched = positive + negative;
    if matched == 0 {
        return 0.0;
    }

    (positive as f64 - negative as f64) / matched as f64
}

/// Human label for an aggregate score
pub fn label(score: f64) -> &'static str {
    if score <= -0.6 {
        "very negative"
    } else if score <= -0.2 {
        "negative"
    } else if score < 0.2 {
        "neutral"
    } else if score < 0.6 {
        "positive"
    } else {
        "very positive"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bearish_text_scores_negative() {
        let s = score("Exchange hacked, massive liquidations trigger selloff");
        assert!(s < -0.5, "got {s}");
    }

    #[test]
    fn test_bullish_text_scores_positive() {
        let s = score("ETF approval sparks rally to record high");
        assert!(s > 0.5, "got {s}");
    }

    #[test]
    fn test_neutral_text_scores_zero() {
        assert_eq!(score("Bitcoin network difficulty adjusts on schedule"), 0.0);
    }

    #[test]
    fn test_case_insensitive() {
        assert!(score("CRASH and PLUNGE") < 0.0);
    }

    #[test]
    fn test_labels() {
        assert_eq!(label(-0.9), "very negative");
        assert_eq!(label(0.0), "neutral");
        assert_eq!(label(0.7), "very positive");
    }
}
