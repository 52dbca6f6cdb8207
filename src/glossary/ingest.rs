//! CSV ingestion and field sanitization.
//! Quoted fields may contain commas; a backslash-escaped quote is literal.
//! Every field is stripped of script blocks, event-handler attributes,
//! data URLs and HTML tags before it reaches the matcher.

use std::sync::LazyLock;

use regex::Regex;
use tracing::{debug, warn};

use super::GlossaryEntry;

static SCRIPT_BLOCK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)<script\b[^>]*>.*?</script\s*>").expect("valid script pattern")
});
static EVENT_HANDLER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)\bon[a-z]+\s*=\s*(?:"[^"]*"|'[^']*')"#).expect("valid handler pattern")
});
static DATA_URL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(?i)\bdata:[^\s"'<>]*"#).expect("valid data url pattern"));
static HTML_TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"</?[a-zA-Z][^>]*>").expect("valid tag pattern"));

/// Strip markup that must never be rendered from a glossary field.
pub fn sanitize_field(value: &str) -> String {
    let cleaned = SCRIPT_BLOCK.replace_all(value, "");
    let cleaned = EVENT_HANDLER.replace_all(&cleaned, "");
    let cleaned = DATA_URL.replace_all(&cleaned, "");
    let cleaned = HTML_TAG.replace_all(&cleaned, "");
    cleaned.trim().to_string()
}

/// Split one CSV line into raw fields. Quote characters and `\"` escapes
/// are kept verbatim; `field_value` resolves them per field.
fn split_line(line: &str) -> Vec<String> {
    let mut values = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut chars = line.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '\\' if chars.peek() == Some(&'"') => {
                chars.next();
                current.push_str("\\\"");
            }
            '"' => {
                in_quotes = !in_quotes;
                current.push('"');
            }
            ',' if !in_quotes => values.push(std::mem::take(&mut current)),
            _ => current.push(c),
        }
    }
    values.push(current);
    values
}

/// Drop one pair of enclosing quotes, then unescape `\"`.
fn field_value(raw: &str) -> String {
    let inner = raw
        .strip_prefix('"')
        .and_then(|v| v.strip_suffix('"'))
        .filter(|v| !v.ends_with('\\'))
        .unwrap_or(raw);
    inner.replace("\\\"", "\"")
}

/// Parse glossary CSV (header row first). Rows with fewer than two
/// fields are dropped; note and category default to empty.
pub fn parse_csv(content: &str) -> Vec<GlossaryEntry> {
    let mut entries = Vec::new();
    let mut skipped = 0usize;

    for line in content.lines().skip(1) {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let fields: Vec<String> = split_line(line)
            .iter()
            .map(|v| sanitize_field(&field_value(v)))
            .collect();
        if fields.len() < 2 {
            skipped += 1;
            continue;
        }

        let mut fields = fields.into_iter();
        entries.push(GlossaryEntry {
            source: fields.next().unwrap_or_default(),
            target: fields.next().unwrap_or_default(),
            note: fields.next().unwrap_or_default(),
            category: fields.next().unwrap_or_default(),
        });
    }

    if skipped > 0 {
        warn!(skipped, "csv rows with fewer than two fields dropped");
    }
    debug!(entries = entries.len(), "csv parsed");
    entries
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_quoted_fields_with_commas() {
        let csv = "Source,Target,Note,Category\n\
                   \"Save, then exit\",\"บันทึก แล้วออก\",menu item,UI\n\
                   Rank,อันดับ\n";
        let entries = parse_csv(csv);
        assert_eq!(
            entries,
            vec![
                GlossaryEntry::new("Save, then exit", "บันทึก แล้วออก", "menu item", "UI"),
                GlossaryEntry::new("Rank", "อันดับ", "", ""),
            ]
        );
    }

    #[test]
    fn escaped_quotes_stay_literal() {
        let csv = "h\n\"Say \\\"hi\\\", friend\",พูด\n";
        let entries = parse_csv(csv);
        assert_eq!(entries[0].source, "Say \"hi\", friend");
    }

    #[test]
    fn unquoted_escaped_quotes_are_kept() {
        let csv = "h\n\\\"Quoted\\\",อ้างอิง\n\"\\\"Both\\\"\",x\n";
        let entries = parse_csv(csv);
        assert_eq!(entries[0].source, "\"Quoted\"");
        assert_eq!(entries[1].source, "\"Both\"");
    }

    #[test]
    fn skips_header_blank_and_short_rows() {
        let csv = "Source,Target\r\n\r\n   \r\nlonely\r\nA,B\r\n";
        let entries = parse_csv(csv);
        assert_eq!(entries, vec![GlossaryEntry::new("A", "B", "", "")]);
        assert!(parse_csv("").is_empty());
    }

    #[test]
    fn sanitizes_markup() {
        assert_eq!(sanitize_field("<b>Bold</b> text"), "Bold text");
        assert_eq!(sanitize_field("x<script>alert(1)</script>y"), "xy");
        assert_eq!(
            sanitize_field(r#"<img src="a.png" onerror="alert(1)">Icon"#),
            "Icon"
        );
        assert_eq!(sanitize_field("link data:text/html;base64,AAAA end"), "link  end");
        assert_eq!(sanitize_field("a < b and c > d"), "a < b and c > d");
        assert_eq!(sanitize_field("Loading..."), "Loading...");
    }
}
