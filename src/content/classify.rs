//! Chunk content-type classification
//!
//! Classification is a pure function of the chunk text. Precedence, first match
//! wins: binary, structured, image, mixed, text.

use regex::Regex;
use std::sync::LazyLock;

use super::ChunkType;

/// NUL density above which a chunk counts as binary.
const BINARY_NUL_RATIO: f64 = 0.10;

static YAML_LINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z_][\w.-]*\s*:(\s.*)?$").expect("valid regex"));
static PIPE_ROW: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\|.*\|$").expect("valid regex"));
static MARKUP_TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"</?[A-Za-z][\w-]*[^<>]*>").expect("valid regex"));
static ALPHA_RUN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\p{Alphabetic}{3,}").expect("valid regex"));

pub fn classify_chunk(content: &str) -> ChunkType {
    if is_binary(content) {
        ChunkType::Binary
    } else if is_structured(content) {
        ChunkType::Structured
    } else if has_image_signature(content) {
        ChunkType::Image
    } else if is_mixed(content) {
        ChunkType::Mixed
    } else {
        ChunkType::Text
    }
}

fn is_binary(content: &str) -> bool {
    let total = content.chars().count();
    if total == 0 {
        return false;
    }
    let nul = content.chars().filter(|&c| c == '\0').count();
    nul as f64 / total as f64 > BINARY_NUL_RATIO
}

fn content_lines(content: &str) -> Vec<&str> {
    content
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .collect()
}

fn is_structured(content: &str) -> bool {
    let t = content.trim();
    if t.is_empty() {
        return false;
    }

    let json_envelope =
        (t.starts_with('{') && t.ends_with('}')) || (t.starts_with('[') && t.ends_with(']'));
    let markup_envelope = t.starts_with('<') && t.ends_with('>');
    if json_envelope || markup_envelope {
        return true;
    }

    let lines = content_lines(t);
    is_yaml(&lines) || is_csv(&lines) || is_pipe_table(&lines)
}

fn is_yaml(lines: &[&str]) -> bool {
    let mut keyed = 0;
    for line in lines {
        if line.starts_with('#') || line.starts_with("---") || line.starts_with("- ") {
            continue;
        }
        if !YAML_LINE.is_match(line) {
            return false;
        }
        keyed += 1;
    }
    keyed > 0
}

fn is_csv(lines: &[&str]) -> bool {
    if lines.len() < 2 {
        return false;
    }
    let fields = lines[0].split(',').count();
    fields >= 2 && lines.iter().all(|l| l.split(',').count() == fields)
}

fn is_pipe_table(lines: &[&str]) -> bool {
    !lines.is_empty() && lines.iter().all(|l| PIPE_ROW.is_match(l))
}

/// Magic-number prefixes. Binary readers map each byte to the code point of
/// the same value, so the prefixes are written as code points here.
fn has_image_signature(content: &str) -> bool {
    const PREFIXES: [&str; 6] = [
        "\u{89}PNG\r\n\u{1a}\n",
        "\u{ff}\u{d8}\u{ff}",
        "GIF87a",
        "GIF89a",
        "II*\0",
        "MM\0*",
    ];
    if PREFIXES.iter().any(|p| content.starts_with(p)) {
        return true;
    }
    // RIFF container carrying WAVE data
    if content.starts_with("RIFF") {
        return content.chars().skip(8).take(4).eq("WAVE".chars());
    }
    // BMP: "BM", then reserved header bytes 6..10 are zero
    if content.starts_with("BM") {
        let header: Vec<char> = content.chars().take(10).collect();
        return header.len() == 10 && header[6..10].iter().all(|&c| c == '\0');
    }
    false
}

fn has_binary_signal(content: &str) -> bool {
    content
        .chars()
        .any(|c| c == '\0' || (c.is_control() && !matches!(c, '\n' | '\r' | '\t')))
}

fn has_structured_signal(content: &str) -> bool {
    if MARKUP_TAG.is_match(content) {
        return true;
    }
    content_lines(content)
        .iter()
        .any(|l| YAML_LINE.is_match(l) || PIPE_ROW.is_match(l))
}

fn is_mixed(content: &str) -> bool {
    ALPHA_RUN.is_match(content) && (has_binary_signal(content) || has_structured_signal(content))
}
