//! Tempo extraction from free text.
//!
//! The fallback research path feeds raw search-result text through these
//! patterns to recover a BPM estimate. Extraction is deliberately strict:
//! a number outside plausible musical tempo bounds is discarded, and "no
//! valid number" is a first-class answer; the verifier treats it the same
//! as a missing field.

use lazy_static::lazy_static;
use regex::Regex;

/// Lowest BPM accepted from text extraction.
pub const MIN_VALID_BPM: f64 = 40.0;

/// Highest BPM accepted from text extraction.
pub const MAX_VALID_BPM: f64 = 220.0;

lazy_static! {
    // Checked in order; first pattern with a valid capture wins.
    static ref BPM_PATTERNS: Vec<Regex> = vec![
        Regex::new(r"(?i)\b(\d{2,3})\s*BPM\b").unwrap(),
        Regex::new(r"(?i)\bBPM[:\s]+(\d{2,3})\b").unwrap(),
        Regex::new(r"(?i)\btempo[:\s]+(\d{2,3})\b").unwrap(),
    ];
}

/// Extract a BPM value from text.
///
/// Returns `None` when no pattern matches or every match falls outside
/// the valid range.
pub fn extract_bpm(text: &str) -> Option<f64> {
    for pattern in BPM_PATTERNS.iter() {
        for capture in pattern.captures_iter(text) {
            if let Ok(bpm) = capture[1].parse::<f64>() {
                if (MIN_VALID_BPM..=MAX_VALID_BPM).contains(&bpm) {
                    return Some(bpm);
                }
            }
        }
    }
    None
}
