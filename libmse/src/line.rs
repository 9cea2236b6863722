//! Line parser.
//!
//! Splits one decoded line into indentation (a count of leading tabs), a
//! canonicalized key, and a raw value. Blank lines and comments carry no key.
//! Formatting problems are reported back as issues for the reader to turn
//! into warnings; the split itself never fails.

/// One line split into its parts. `key` is empty for blank and comment
/// lines, which the cursor skips without consuming a nesting level.
#[derive(Clone, Debug, Default)]
pub(crate) struct ParsedLine {
    /// Count of leading tabs; the reader stores -1 here past end of stream.
    pub indent: i32,
    pub key: String,
    pub value: String,
}

/// Formatting problem found while splitting a line.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) enum LineIssue {
    /// The key started with spaces; runs of 8 were repaired into indent.
    LeadingSpace { key: String },
    /// No `:` separator on a non-blank line.
    MissingColon,
}

/// Canonical form of a key: trimmed, ASCII-lowercased, underscores read as
/// spaces. Both `mse version` and `MSE_Version` canonicalize to
/// `mse version`, so documents and call sites may use either form.
pub fn canonical_name(name: &str) -> String {
    name.trim()
        .chars()
        .map(|c| if c == '_' { ' ' } else { c.to_ascii_lowercase() })
        .collect()
}

/// Split a decoded line into indent, key, and value.
///
/// `in_text_block` suppresses repair and issues while a multi-line string is
/// being collected; `lenient` suppresses them for damaged documents.
pub(crate) fn parse_line(
    line: &str,
    in_text_block: bool,
    lenient: bool,
) -> (ParsedLine, Vec<LineIssue>) {
    let mut issues = Vec::new();
    let mut indent = line.bytes().take_while(|&b| b == b'\t').count() as i32;

    if line.bytes().all(|b| b == b' ' || b == b'\t')
        || line.as_bytes().get(indent as usize) == Some(&b'#')
    {
        // blank line or comment
        return (
            ParsedLine {
                indent,
                ..ParsedLine::default()
            },
            issues,
        );
    }

    let rest = &line[indent as usize..];
    let colon = rest.find(':');
    let mut raw_key = match colon {
        Some(pos) => &rest[..pos],
        None => rest,
    };

    if !lenient && !in_text_block && raw_key.starts_with(' ') {
        issues.push(LineIssue::LeadingSpace {
            key: raw_key.to_string(),
        });
        // best-effort repair: 8 leading spaces count as one tab
        while let Some(stripped) = raw_key.strip_prefix("        ") {
            raw_key = stripped;
            indent += 1;
        }
    }

    let mut key = canonical_name(raw_key);
    let value = match colon {
        Some(pos) => rest[pos + 1..].trim_start().to_string(),
        None => {
            if !lenient && !in_text_block {
                issues.push(LineIssue::MissingColon);
            }
            String::new()
        }
    };
    if key.is_empty() && colon.is_some() {
        // distinguishes "no colon" from "empty key before a colon"
        key = " ".to_string();
    }

    (ParsedLine { indent, key, value }, issues)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(line: &str) -> (ParsedLine, Vec<LineIssue>) {
        parse_line(line, false, false)
    }

    #[test]
    fn test_indent_and_split() {
        let (p, issues) = parse("\t\tname: Example");
        assert_eq!(p.indent, 2);
        assert_eq!(p.key, "name");
        assert_eq!(p.value, "Example");
        assert!(issues.is_empty());
    }

    #[test]
    fn test_blank_and_comment() {
        assert!(parse("").0.key.is_empty());
        assert!(parse(" \t ").0.key.is_empty());
        assert!(parse("\t# note").0.key.is_empty());
        // '#' not directly after the indent is not a comment
        let (p, _) = parse("\tx#y: 1");
        assert_eq!(p.key, "x#y");
    }

    #[test]
    fn test_embedded_space_in_key() {
        let (p, issues) = parse("foo bar: 1");
        assert_eq!(p.key, "foo bar");
        assert_eq!(p.value, "1");
        assert!(issues.is_empty());
    }

    #[test]
    fn test_eight_space_repair() {
        let (p, issues) = parse("        key: v");
        assert_eq!(p.indent, 1);
        assert_eq!(p.key, "key");
        assert_eq!(
            issues,
            [LineIssue::LeadingSpace {
                key: "        key".to_string()
            }]
        );
    }

    #[test]
    fn test_seven_spaces_not_repaired() {
        let (p, issues) = parse("       key: v");
        assert_eq!(p.indent, 0);
        assert_eq!(p.key, "key");
        assert_eq!(issues.len(), 1);
    }

    #[test]
    fn test_missing_colon() {
        let (p, issues) = parse("\tjust text");
        assert_eq!(p.key, "just text");
        assert_eq!(p.value, "");
        assert_eq!(issues, [LineIssue::MissingColon]);
    }

    #[test]
    fn test_missing_colon_suppressed_in_text_block() {
        let (_, issues) = parse_line("\tjust text", true, false);
        assert!(issues.is_empty());
        let (_, issues) = parse_line("\tjust text", false, true);
        assert!(issues.is_empty());
    }

    #[test]
    fn test_empty_key_with_colon() {
        let (p, _) = parse("\t: positional");
        assert_eq!(p.key, " ");
        assert_eq!(p.value, "positional");
    }

    #[test]
    fn test_canonical_name() {
        assert_eq!(canonical_name("  MSE_Version "), "mse version");
        assert_eq!(canonical_name("foo bar"), "foo bar");
    }
}
