//! Best-effort recovery of dictionary literals written in a foreign dialect
//! (`True`/`False`/`None`, single-quoted strings, optional wrapping quotes and
//! diagnostic preambles before the first brace).
//!
//! Lossy, and not a parser for that dialect. Any input it
//! cannot rewrite into strict JSON yields `None`.

use serde_json::Value;

/// Try to recover a JSON value from a dialect dictionary literal
pub fn recover(text: &str) -> Option<Value> {
    let unwrapped = strip_wrapping_quotes(text.trim());
    let unescaped = unwrapped.replace("\\\"", "\"").replace("\\'", "'");

    let start = unescaped.find('{')?;
    let rewritten = rewrite_tokens(&unescaped[start..])?;

    serde_json::from_str(&rewritten).ok()
}

fn strip_wrapping_quotes(text: &str) -> &str {
    for quote in ['"', '\''] {
        if text.len() >= 2 && text.starts_with(quote) && text.ends_with(quote) {
            return &text[1..text.len() - 1];
        }
    }
    text
}

/// Rewrite dialect tokens into strict JSON tokens.
///
/// Bare words are only rewritten outside string literals.
fn rewrite_tokens(input: &str) -> Option<String> {
    let mut out = String::with_capacity(input.len() + 8);
    let mut chars = input.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '\'' => {
                out.push('"');
                loop {
                    match chars.next()? {
                        '\\' => match chars.next()? {
                            '\'' => out.push('\''),
                            other => {
                                out.push('\\');
                                out.push(other);
                            }
                        },
                        '\'' => break,
                        '"' => out.push_str("\\\""),
                        ch => out.push(ch),
                    }
                }
                out.push('"');
            }
            '"' => {
                out.push('"');
                loop {
                    match chars.next()? {
                        '\\' => {
                            out.push('\\');
                            out.push(chars.next()?);
                        }
                        '"' => break,
                        ch => out.push(ch),
                    }
                }
                out.push('"');
            }
            c if c.is_ascii_alphabetic() || c == '_' => {
                let mut word = String::from(c);
                while let Some(&next) = chars.peek() {
                    if next.is_ascii_alphanumeric() || next == '_' {
                        word.push(next);
                        chars.next();
                    } else {
                        break;
                    }
                }
                out.push_str(match word.as_str() {
                    "True" => "true",
                    "False" => "false",
                    "None" => "null",
                    other => other,
                });
            }
            other => out.push(other),
        }
    }

    Some(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_recover_simple_dict() {
        let value = recover("{'a': True, 'b': None}").unwrap();
        assert_eq!(value, json!({"a": true, "b": null}));
    }

    #[test]
    fn test_recover_with_preamble() {
        let value = recover("Tool finished: {'ok': False, 'count': 3}").unwrap();
        assert_eq!(value, json!({"ok": false, "count": 3}));
    }

    #[test]
    fn test_recover_wrapped_and_escaped() {
        let value = recover(r#"'{\'name\': \'report.pdf\', \'pages\': 2}'"#).unwrap();
        assert_eq!(value, json!({"name": "report.pdf", "pages": 2}));
    }

    #[test]
    fn test_keywords_inside_strings_are_preserved() {
        let value = recover("{'status': 'None of the above', 'ok': True}").unwrap();
        assert_eq!(value, json!({"status": "None of the above", "ok": true}));
    }

    #[test]
    fn test_double_quotes_inside_single_quoted_string() {
        let value = recover(r#"{'quote': 'she said "hi"'}"#).unwrap();
        assert_eq!(value, json!({"quote": "she said \"hi\""}));
    }

    #[test]
    fn test_no_brace_fails() {
        assert!(recover("just some words").is_none());
    }

    #[test]
    fn test_unterminated_string_fails() {
        assert!(recover("{'a': 'oops}").is_none());
    }

    #[test]
    fn test_non_dialect_braces_fail() {
        assert!(recover("Use {placeholder} here").is_none());
    }
}
