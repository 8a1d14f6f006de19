//! Line tokenizer for RAW records.
//!
//! Fields are separated by commas or whitespace. Single or double quotes
//! delimit strings that may hold either separator, a doubled quote inside a
//! string is a literal quote, and `/` outside a string starts a comment. Two
//! commas with nothing in between mark a field left at its default.

use psse2grg_core::{GrgError, GrgResult};

/// One tokenized RAW line.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Line {
    /// Fields in order; `None` is an explicitly empty field.
    pub fields: Vec<Option<String>>,
    pub comment: Option<String>,
}

impl Line {
    pub fn is_blank(&self) -> bool {
        self.fields.is_empty()
    }

    fn first(&self) -> Option<&str> {
        self.fields.first().and_then(|f| f.as_deref()).map(str::trim)
    }

    /// `0` closes the current section.
    pub fn is_section_end(&self) -> bool {
        self.first() == Some("0")
    }

    /// `Q` closes the whole file.
    pub fn is_quit(&self) -> bool {
        matches!(self.first(), Some("Q") | Some("q"))
    }
}

pub fn tokenize(text: &str) -> Line {
    let mut line = Line::default();
    let mut current = String::new();
    let mut in_token = false;
    let mut expect_field = true;
    let mut chars = text.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '\'' | '"' if !in_token => {
                in_token = true;
                while let Some(q) = chars.next() {
                    if q == c {
                        if chars.peek() == Some(&c) {
                            chars.next();
                            current.push(c);
                        } else {
                            break;
                        }
                    } else {
                        current.push(q);
                    }
                }
            }
            '/' => {
                let rest: String = chars.collect();
                line.comment = Some(rest.trim().to_string());
                break;
            }
            ',' => {
                if in_token {
                    line.fields.push(Some(std::mem::take(&mut current)));
                    in_token = false;
                } else if expect_field {
                    line.fields.push(None);
                }
                expect_field = true;
            }
            c if c.is_whitespace() => {
                if in_token {
                    line.fields.push(Some(std::mem::take(&mut current)));
                    in_token = false;
                    expect_field = false;
                }
            }
            c => {
                in_token = true;
                current.push(c);
            }
        }
    }

    if in_token {
        line.fields.push(Some(current));
    }

    line
}

/// Typed access to the fields of one record, with PSS/E defaults for
/// missing or empty fields.
#[derive(Debug, Clone)]
pub struct Fields<'a> {
    line: &'a Line,
    number: usize,
}

impl<'a> Fields<'a> {
    /// `number` is the 1-based line number used in error messages.
    pub fn new(line: &'a Line, number: usize) -> Self {
        Self { line, number }
    }

    pub fn line_number(&self) -> usize {
        self.number
    }

    pub fn len(&self) -> usize {
        self.line.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.line.fields.is_empty()
    }

    fn raw(&self, idx: usize) -> Option<&'a str> {
        self.line
            .fields
            .get(idx)
            .and_then(|f| f.as_deref())
    }

    fn numeric(&self, idx: usize) -> Option<&'a str> {
        self.raw(idx).map(str::trim).filter(|s| !s.is_empty())
    }

    pub fn has(&self, idx: usize) -> bool {
        self.numeric(idx).is_some()
    }

    pub fn float(&self, idx: usize, default: f64) -> GrgResult<f64> {
        match self.numeric(idx) {
            None => Ok(default),
            Some(text) => text.parse::<f64>().map_err(|_| {
                GrgError::parse_at(self.number, format!("field {} is not a number: '{text}'", idx + 1))
            }),
        }
    }

    /// Integers written as `1.0` are accepted.
    pub fn int(&self, idx: usize, default: i64) -> GrgResult<i64> {
        match self.numeric(idx) {
            None => Ok(default),
            Some(text) => text
                .parse::<i64>()
                .or_else(|_| match text.parse::<f64>() {
                    Ok(v) if v.fract() == 0.0 => Ok(v as i64),
                    _ => Err(()),
                })
                .map_err(|_| {
                    GrgError::parse_at(
                        self.number,
                        format!("field {} is not an integer: '{text}'", idx + 1),
                    )
                }),
        }
    }

    pub fn required_int(&self, idx: usize, name: &str) -> GrgResult<i64> {
        if !self.has(idx) {
            return Err(GrgError::parse_at(self.number, format!("missing {name}")));
        }
        self.int(idx, 0)
    }

    pub fn string(&self, idx: usize, default: &str) -> String {
        self.raw(idx).unwrap_or(default).to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fields(text: &str) -> Vec<Option<String>> {
        tokenize(text).fields
    }

    fn s(v: &str) -> Option<String> {
        Some(v.to_string())
    }

    #[test]
    fn test_comma_and_whitespace_separators() {
        assert_eq!(fields("1, 2 ,3  4"), vec![s("1"), s("2"), s("3"), s("4")]);
    }

    #[test]
    fn test_quoted_strings_keep_separators() {
        assert_eq!(
            fields("101,'NUC-A  1',21.6"),
            vec![s("101"), s("NUC-A  1"), s("21.6")]
        );
        assert_eq!(fields(r#"1,"a, b""#), vec![s("1"), s("a, b")]);
        assert_eq!(fields("1,'it''s'"), vec![s("1"), s("it's")]);
        assert_eq!(fields("1,''"), vec![s("1"), s("")]);
    }

    #[test]
    fn test_comment_outside_quotes() {
        let line = tokenize("0 / END OF BUS DATA, BEGIN LOAD DATA");
        assert_eq!(line.fields, vec![s("0")]);
        assert_eq!(line.comment.as_deref(), Some("END OF BUS DATA, BEGIN LOAD DATA"));
        assert!(line.is_section_end());

        let quoted = tokenize("1,'A/B'");
        assert_eq!(quoted.fields, vec![s("1"), s("A/B")]);
        assert!(quoted.comment.is_none());
    }

    #[test]
    fn test_empty_fields() {
        assert_eq!(fields("1,,3"), vec![s("1"), None, s("3")]);
        assert_eq!(fields(",2"), vec![None, s("2")]);
        assert_eq!(fields("1 , , 3"), vec![s("1"), None, s("3")]);
    }

    #[test]
    fn test_terminators() {
        assert!(tokenize("Q").is_quit());
        assert!(tokenize(" 0").is_section_end());
        assert!(!tokenize("10, 'X'").is_section_end());
        assert!(tokenize("   ").is_blank());
    }

    #[test]
    fn test_typed_fields_with_defaults() {
        let line = tokenize("3, 2.0, , abc");
        let f = Fields::new(&line, 7);
        assert_eq!(f.int(0, 0).unwrap(), 3);
        assert_eq!(f.int(1, 0).unwrap(), 2);
        assert_eq!(f.float(2, 9.5).unwrap(), 9.5);
        assert_eq!(f.float(10, 1.1).unwrap(), 1.1);
        let err = f.float(3, 0.0).unwrap_err();
        assert!(err.to_string().contains("line 7"));
        assert!(f.required_int(5, "bus number").is_err());
    }
}
