//! Character scanner finding where one JSON value ends.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Kind {
    String,
    Container,
    Scalar,
}

/// Outcome of pushing one character
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Scan {
    /// The value continues
    Continue,

    /// The value ends with this character
    Complete,

    /// The value ended just before this character
    CompleteBefore,
}

/// Tracks nesting and string state of one value spread across chunks
#[derive(Debug, Default)]
pub(crate) struct ValueScanner {
    kind: Option<Kind>,
    depth: usize,
    in_string: bool,
    escaped: bool,
}

impl ValueScanner {
    pub(crate) fn push(&mut self, c: char) -> Scan {
        let Some(kind) = self.kind else {
            self.kind = Some(match c {
                '"' => {
                    self.in_string = true;
                    Kind::String
                }
                '{' | '[' => {
                    self.depth = 1;
                    Kind::Container
                }
                _ => Kind::Scalar,
            });
            return Scan::Continue;
        };

        match kind {
            Kind::Scalar => {
                if matches!(c, ',' | '}' | ']') || c.is_whitespace() {
                    Scan::CompleteBefore
                } else {
                    Scan::Continue
                }
            }
            Kind::String => {
                if self.string_char(c) {
                    Scan::Continue
                } else {
                    Scan::Complete
                }
            }
            Kind::Container => {
                if self.in_string {
                    self.in_string = self.string_char(c);
                    return Scan::Continue;
                }
                match c {
                    '"' => self.in_string = true,
                    '{' | '[' => self.depth += 1,
                    '}' | ']' => {
                        self.depth -= 1;
                        if self.depth == 0 {
                            return Scan::Complete;
                        }
                    }
                    _ => {}
                }
                Scan::Continue
            }
        }
    }

    /// Consumes a character inside a string; false once the closing quote is seen
    fn string_char(&mut self, c: char) -> bool {
        if self.escaped {
            self.escaped = false;
        } else if c == '\\' {
            self.escaped = true;
        } else if c == '"' {
            return false;
        }
        true
    }

    /// Whether the value may end at end of input
    pub(crate) fn can_end(&self) -> bool {
        self.kind == Some(Kind::Scalar)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scan(text: &str) -> Vec<Scan> {
        let mut scanner = ValueScanner::default();
        text.chars().map(|c| scanner.push(c)).collect()
    }

    #[test]
    fn test_string_with_escapes() {
        let results = scan(r#""a\"b""#);
        assert_eq!(results.last(), Some(&Scan::Complete));
        assert!(results[..results.len() - 1]
            .iter()
            .all(|r| *r == Scan::Continue));
    }

    #[test]
    fn test_container_ignores_brackets_in_strings() {
        let results = scan(r#"{"a":"}]","b":[1,{}]}"#);
        assert_eq!(results.iter().filter(|r| **r == Scan::Complete).count(), 1);
        assert_eq!(results.last(), Some(&Scan::Complete));
    }

    #[test]
    fn test_scalar_ends_before_delimiter() {
        assert_eq!(scan("12,"), vec![Scan::Continue, Scan::Continue, Scan::CompleteBefore]);
        let mut scanner = ValueScanner::default();
        scanner.push('t');
        assert!(scanner.can_end());
    }
}
