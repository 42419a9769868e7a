//! Quality and structure metrics for extracted content

use regex::Regex;
use std::sync::LazyLock;

use super::{QualityMetrics, StructureFlags};

const TARGET_WORDS_PER_SENTENCE: f64 = 15.0;
const SHORT_CONTENT_CHARS: usize = 100;

static HEADING: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^(#{1,6}\s+\S|={3,}\s*$)").expect("valid regex"));
static TABLE_ROW: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^\s*\|.*\|\s*$").expect("valid regex"));
static IMAGE_REF: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)!\[[^\]]*\]\([^)]*\)|<img\b").expect("valid regex"));
static EMBED: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)<(iframe|embed|object)\b|\[\[[^\]]+\]\]").expect("valid regex")
});

fn is_noise_control(c: char) -> bool {
    c.is_control() && !matches!(c, '\n' | '\r' | '\t')
}

/// Completeness and accuracy for any content; readability only when
/// `is_text` is set, otherwise 1.0.
pub fn assess_quality(content: &str, is_text: bool) -> QualityMetrics {
    let length = content.chars().count();

    let completeness = match length {
        0 => 0.0,
        n if n < SHORT_CONTENT_CHARS => 0.5,
        _ => 1.0,
    };

    let accuracy = if length == 0 {
        0.0
    } else {
        let control = content.chars().filter(|&c| is_noise_control(c)).count();
        (1.0 - control as f64 / length as f64).max(0.0)
    };

    let readability = if is_text { readability(content) } else { 1.0 };

    QualityMetrics {
        completeness,
        accuracy,
        readability,
    }
}

fn readability(content: &str) -> f64 {
    let sentences = content
        .split(['.', '!', '?'])
        .filter(|s| !s.trim().is_empty())
        .count();
    if sentences == 0 {
        return 0.0;
    }
    let words = content.split_whitespace().count();
    let avg = words as f64 / sentences as f64;
    (1.0 - (avg - TARGET_WORDS_PER_SENTENCE).abs() / TARGET_WORDS_PER_SENTENCE).clamp(0.0, 1.0)
}

pub fn detect_structure(content: &str) -> StructureFlags {
    StructureFlags {
        has_headers: HEADING.is_match(content),
        has_tables: TABLE_ROW.is_match(content),
        has_images: IMAGE_REF.is_match(content),
        has_embedded_content: EMBED.is_match(content),
    }
}
