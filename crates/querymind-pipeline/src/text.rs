//! Text cleanup helpers shared by the pipeline nodes.
//!
//! Model output is treated as hostile input: fenced, emoji-laden, or wrapped
//! in prose. Every helper here is total and never panics.

use std::sync::LazyLock;

use regex::Regex;

static CODE_FENCE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)```[a-zA-Z]*\n?(.*?)```").expect("fence pattern"));

static BLANK_RUNS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\n{3,}").expect("blank-run pattern"));

/// Strips a Markdown code fence, returning the inner text. Input without a
/// fence is returned trimmed but otherwise untouched.
pub fn strip_code_fences(raw: &str) -> String {
    if let Some(caps) = CODE_FENCE.captures(raw) {
        caps[1].trim().to_string()
    } else {
        raw.trim().to_string()
    }
}

/// Removes a single trailing statement terminator, if present.
pub fn strip_trailing_terminator(sql: &str) -> String {
    sql.trim().trim_end_matches(';').trim().to_string()
}

/// Drops emoji and other symbol-plane characters the frontend cannot render
/// inside insight bullets.
pub fn strip_emoji(text: &str) -> String {
    text.chars()
        .filter(|c| {
            let cp = *c as u32;
            !matches!(cp,
                0x1F300..=0x1FAFF   // pictographs, transport, supplemental
                | 0x2600..=0x27BF   // misc symbols and dingbats
                | 0xFE00..=0xFE0F   // variation selectors
                | 0x1F000..=0x1F0FF // mahjong and cards
                | 0x2190..=0x21FF   // arrows
            )
        })
        .collect()
}

/// Collapses runs of three or more newlines down to one blank line.
pub fn collapse_blank_lines(text: &str) -> String {
    BLANK_RUNS.replace_all(text, "\n\n").trim().to_string()
}

/// Ensures every paragraph-initial line reads as a bullet. Continuation
/// lines inside a paragraph are left alone.
pub fn ensure_bullets(text: &str) -> String {
    let mut out = Vec::new();
    let mut at_paragraph_start = true;
    for line in text.lines() {
        let trimmed = line.trim_start();
        if trimmed.is_empty() {
            at_paragraph_start = true;
            out.push(String::new());
            continue;
        }
        if at_paragraph_start && !trimmed.starts_with('•') && !trimmed.starts_with('-') {
            out.push(format!("• {trimmed}"));
        } else {
            out.push(line.to_string());
        }
        at_paragraph_start = false;
    }
    out.join("\n")
}

/// Truncates to at most `max_chars` characters, appending an ellipsis when
/// anything was cut. Splits on a char boundary, never mid-codepoint.
pub fn truncate_chars(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let cut: String = text.chars().take(max_chars).collect();
    format!("{}...", cut.trim_end())
}
