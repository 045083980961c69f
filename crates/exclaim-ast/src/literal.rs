//! Literal text processing used at AST construction time.
//!
//! Number validation and string-literal scanning (embedded JavaScript
//! fragments, escape sequences, multi-line dedent) live here so every
//! producer of AST nodes shares one set of rules.

use std::iter::Peekable;
use std::str::Chars;

use crate::node::TemplateStringFragment;

#[derive(Debug, PartialEq)]
pub struct ParsedNumber {
    pub value: f64,
    /// `false` when the literal misuses separators or places a decimal
    /// point in an exponent; `value` is still the best-effort parse.
    pub valid: bool,
}

/// Parse a numeric literal. Underscore separators must sit between digits;
/// the exponent part takes no decimal point.
pub fn parse_number(text: &str) -> ParsedNumber {
    let valid = validate_number(text);
    let cleaned: String = text.chars().filter(|&c| c != '_').collect();
    let value = cleaned.parse::<f64>().unwrap_or(f64::NAN);
    ParsedNumber { value, valid }
}

fn digit_run(chars: &mut Peekable<Chars<'_>>) -> bool {
    let mut seen_digit = false;
    let mut trailing_separator = false;
    loop {
        match chars.peek() {
            Some(c) if c.is_ascii_digit() => {
                chars.next();
                seen_digit = true;
                trailing_separator = false;
            }
            Some('_') => {
                if !seen_digit || trailing_separator {
                    return false;
                }
                chars.next();
                trailing_separator = true;
            }
            _ => break,
        }
    }
    seen_digit && !trailing_separator
}

fn validate_number(text: &str) -> bool {
    let mut chars = text.chars().peekable();
    if chars.peek() == Some(&'-') {
        chars.next();
    }
    if !digit_run(&mut chars) {
        return false;
    }
    if chars.peek() == Some(&'.') {
        chars.next();
        if !digit_run(&mut chars) {
            return false;
        }
    }
    if matches!(chars.peek(), Some('e' | 'E')) {
        chars.next();
        if matches!(chars.peek(), Some('+' | '-')) {
            chars.next();
        }
        if !digit_run(&mut chars) {
            return false;
        }
    }
    chars.next().is_none()
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum StringError {
    Unterminated,
    UnterminatedEmbedded,
}

#[derive(Debug, PartialEq)]
pub enum StringContents {
    Raw(String),
    Template(Vec<TemplateStringFragment>),
}

#[derive(Debug, PartialEq)]
pub struct ScannedString {
    /// Bytes consumed from `src`, including both quotes.
    pub len: usize,
    pub contents: StringContents,
}

#[derive(Debug)]
enum Piece {
    Text { contents: String, from_escape: bool },
    Javascript(String),
}

/// Scan a double-quoted string literal. `src` starts at the opening quote;
/// `first_char_indent` is the column (0-based) of that quote, used as one of
/// the candidate offsets when dedenting multi-line strings.
pub fn scan_string(src: &str, first_char_indent: u32) -> Result<ScannedString, StringError> {
    debug_assert!(src.starts_with('"'));
    let mut pieces: Vec<Piece> = Vec::new();
    let mut text = String::new();
    let mut iter = src.char_indices();
    iter.next(); // opening quote

    let close;
    loop {
        let Some((i, c)) = iter.next() else {
            return Err(StringError::Unterminated);
        };
        match c {
            '"' => {
                close = i;
                break;
            }
            '\\' => {
                let Some((_, escaped)) = iter.next() else {
                    return Err(StringError::Unterminated);
                };
                if !text.is_empty() {
                    pieces.push(Piece::Text {
                        contents: std::mem::take(&mut text),
                        from_escape: false,
                    });
                }
                let expanded = match escaped {
                    'n' => '\n',
                    't' => '\t',
                    'r' => '\r',
                    other => other,
                };
                pieces.push(Piece::Text {
                    contents: expanded.to_string(),
                    from_escape: true,
                });
            }
            '{' => {
                if !text.is_empty() {
                    pieces.push(Piece::Text {
                        contents: std::mem::take(&mut text),
                        from_escape: false,
                    });
                }
                let rest = &src[i + 1..];
                let (consumed, code) = scan_embedded_js(rest)?;
                pieces.push(Piece::Javascript(code.to_string()));
                // Skip past the embedded fragment and its closing brace.
                for (j, _) in iter.by_ref() {
                    if j + 1 >= i + 1 + consumed {
                        break;
                    }
                }
            }
            other => text.push(other),
        }
    }
    if !text.is_empty() {
        pieces.push(Piece::Text {
            contents: text,
            from_escape: false,
        });
    }

    let offset = dedent_offset(first_char_indent as usize, &src[1..close]);
    let mut fragments: Vec<TemplateStringFragment> = Vec::new();
    let mut is_template = false;
    for piece in pieces {
        match piece {
            Piece::Javascript(code) => {
                is_template = true;
                fragments.push(TemplateStringFragment::Javascript(code));
            }
            Piece::Text {
                contents,
                from_escape,
            } => {
                let contents = if from_escape {
                    contents
                } else {
                    dedent(&contents, offset)
                };
                if contents.is_empty() {
                    continue;
                }
                // Merge adjacent text runs.
                if let Some(TemplateStringFragment::Text(previous)) = fragments.last_mut() {
                    previous.push_str(&contents);
                } else {
                    fragments.push(TemplateStringFragment::Text(contents));
                }
            }
        }
    }

    let len = close + 1;
    if is_template {
        Ok(ScannedString {
            len,
            contents: StringContents::Template(fragments),
        })
    } else {
        let mut value = String::new();
        for fragment in fragments {
            if let TemplateStringFragment::Text(contents) = fragment {
                value.push_str(&contents);
            }
        }
        Ok(ScannedString {
            len,
            contents: StringContents::Raw(value),
        })
    }
}

/// Minimum indentation across the string's lines: the opening quote's own
/// column and each continuation line's leading-space count (an all-space
/// final line counts with its full length).
fn dedent_offset(first_char_indent: usize, body: &str) -> usize {
    let mut lines = body.split('\n');
    let _first = lines.next();
    let rest: Vec<&str> = lines.collect();
    if rest.is_empty() {
        return 0;
    }
    let mut offsets = vec![first_char_indent];
    for line in &rest {
        if let Some(indent) = line.find(|c| c != ' ') {
            offsets.push(indent);
        }
    }
    if let Some(last) = rest.last()
        && last.find(|c: char| c != ' ').is_none()
    {
        offsets.push(last.len());
    }
    offsets.into_iter().min().unwrap_or(0)
}

fn dedent(contents: &str, offset: usize) -> String {
    if offset == 0 || !contents.contains('\n') {
        return contents.to_string();
    }
    contents
        .split('\n')
        .enumerate()
        .map(|(i, line)| {
            if i == 0 {
                line.to_string()
            } else {
                let spaces = line.len() - line.trim_start_matches(' ').len();
                line[offset.min(spaces)..].to_string()
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Scan an embedded JavaScript fragment. `src` starts just after the opening
/// brace; returns (bytes consumed including the closing brace, code text).
/// Balanced braces, string literals, and template literals (with `${}`
/// nesting) inside the fragment are respected.
fn scan_embedded_js(src: &str) -> Result<(usize, &str), StringError> {
    enum Ctx {
        Code { depth: u32 },
        Single,
        Double,
        Template,
    }

    let mut stack = vec![Ctx::Code { depth: 0 }];
    let mut iter = src.char_indices().peekable();
    while let Some((i, c)) = iter.next() {
        match stack.last_mut().expect("context stack never empties early") {
            Ctx::Code { depth } => match c {
                '{' => *depth += 1,
                '}' => {
                    if *depth == 0 {
                        stack.pop();
                        if stack.is_empty() {
                            return Ok((i + 1, &src[..i]));
                        }
                    } else {
                        *depth -= 1;
                    }
                }
                '\'' => stack.push(Ctx::Single),
                '"' => stack.push(Ctx::Double),
                '`' => stack.push(Ctx::Template),
                _ => {}
            },
            Ctx::Single => match c {
                '\\' => {
                    iter.next();
                }
                '\'' => {
                    stack.pop();
                }
                _ => {}
            },
            Ctx::Double => match c {
                '\\' => {
                    iter.next();
                }
                '"' => {
                    stack.pop();
                }
                _ => {}
            },
            Ctx::Template => match c {
                '\\' => {
                    iter.next();
                }
                '`' => {
                    stack.pop();
                }
                '$' => {
                    if matches!(iter.peek(), Some((_, '{'))) {
                        iter.next();
                        stack.push(Ctx::Code { depth: 0 });
                    }
                }
                _ => {}
            },
        }
    }
    Err(StringError::UnterminatedEmbedded)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(src: &str) -> String {
        match scan_string(src, 0).unwrap().contents {
            StringContents::Raw(value) => value,
            other => panic!("expected raw string, got {other:?}"),
        }
    }

    fn template(src: &str) -> Vec<TemplateStringFragment> {
        match scan_string(src, 0).unwrap().contents {
            StringContents::Template(fragments) => fragments,
            other => panic!("expected template string, got {other:?}"),
        }
    }

    fn text(s: &str) -> TemplateStringFragment {
        TemplateStringFragment::Text(s.to_string())
    }

    fn js(s: &str) -> TemplateStringFragment {
        TemplateStringFragment::Javascript(s.to_string())
    }

    #[test]
    fn parses_plain_strings() {
        assert_eq!(raw(r#""Hello, World!""#), "Hello, World!");
    }

    #[test]
    fn parses_simple_templates() {
        assert_eq!(
            template(r#""You got {x} points!""#),
            vec![text("You got "), js("x"), text(" points!")]
        );
    }

    #[test]
    fn parses_deeply_nested_templates() {
        // Embedded fragments may contain template literals with their own
        // interpolations and stray braces.
        assert_eq!(
            template(r#""abc{`{{}{${"def"}`}ghi{"jkl"}""#),
            vec![text("abc"), js(r#"`{{}{${"def"}`"#), text("ghi"), js(r#""jkl""#)]
        );
    }

    #[test]
    fn lone_closing_braces_are_text() {
        assert_eq!(raw(r#""Hello}World}!""#), "Hello}World}!");
    }

    #[test]
    fn escaped_braces_are_text() {
        assert_eq!(raw(r#""\{Foo}""#), "{Foo}");
    }

    #[test]
    fn unbalanced_opening_brace_fails() {
        assert_eq!(
            scan_string(r#""{{foo}""#, 0),
            Err(StringError::UnterminatedEmbedded)
        );
    }

    #[test]
    fn reports_consumed_length() {
        let scanned = scan_string(r#""ab" trailing"#, 0).unwrap();
        assert_eq!(scanned.len, 4);
    }

    #[test]
    fn dedents_multiline_strings() {
        let src = "\"\n            \\{\n                \\\"score\\\": 14\n            \\}\n            \"";
        assert_eq!(
            scan_string(src, 12).unwrap().contents,
            StringContents::Raw("\n{\n    \"score\": 14\n}\n".to_string())
        );
    }

    #[test]
    fn parses_integers_and_separators() {
        assert_eq!(parse_number("1827180"), ParsedNumber { value: 1827180.0, valid: true });
        assert_eq!(parse_number("-00323"), ParsedNumber { value: -323.0, valid: true });
        assert_eq!(parse_number("10_234_567"), ParsedNumber { value: 10_234_567.0, valid: true });
        assert_eq!(parse_number("827.221"), ParsedNumber { value: 827.221, valid: true });
        assert_eq!(parse_number("6.022e23"), ParsedNumber { value: 6.022e23, valid: true });
        assert_eq!(parse_number("1e-4"), ParsedNumber { value: 1e-4, valid: true });
    }

    #[test]
    fn flags_misplaced_separators() {
        assert!(!parse_number("_12").valid);
        assert!(!parse_number("12_").valid);
        assert!(!parse_number("1__2").valid);
        assert!(!parse_number("1_.5").valid);
        // Best-effort recovery still produces the obvious value.
        assert_eq!(parse_number("1__2").value, 12.0);
    }

    #[test]
    fn flags_decimal_point_in_exponent() {
        let parsed = parse_number("1e2.5");
        assert!(!parsed.valid);
        assert!(parsed.value.is_nan());
    }
}
