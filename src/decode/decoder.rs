//! # Incremental Decoder
//!
//! Decodes a response body that arrives in arbitrary text chunks. A
//! collection body reports `@odata.count` and each element of the top-level
//! `value` array as soon as they are complete; a single-entity body reports
//! the whole value once it is complete.

use serde_json::Value;
use tracing::trace;

use super::scanner::{Scan, ValueScanner};
use crate::errors::{ClientError, ClientResult};

const COUNT_MEMBER: &str = "@odata.count";
const VALUE_MEMBER: &str = "value";

/// Something the decoder recognised
#[derive(Debug, Clone, PartialEq)]
pub enum DecodeEvent {
    /// Total count reported by the service
    Count(u64),

    /// One element of the top-level `value` array
    Item(Value),

    /// The complete single-entity body
    Single(Value),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    Collection,
    Single,
}

/// Where a scanned value goes once complete
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Target {
    Key,
    Count,
    Item,
    Skip,
    Whole,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Expect {
    Start,
    KeyOrEnd,
    Key,
    Colon,
    MemberValue,
    Value(Target),
    CommaOrEnd,
    ElementOrEnd,
    Element,
    ElementCommaOrEnd,
    Done,
}

/// Chunk-fed JSON decoder
#[derive(Debug)]
pub struct IncrementalDecoder {
    mode: Mode,
    expect: Expect,
    scanner: ValueScanner,
    token: String,
    member: String,
}

impl IncrementalDecoder {
    /// Decoder for `{ "@odata.count"?: n, "value": [...] }`
    pub fn collection() -> Self {
        Self::new(Mode::Collection)
    }

    /// Decoder for one bare value
    pub fn single() -> Self {
        Self::new(Mode::Single)
    }

    fn new(mode: Mode) -> Self {
        Self {
            mode,
            expect: Expect::Start,
            scanner: ValueScanner::default(),
            token: String::new(),
            member: String::new(),
        }
    }

    /// Consumes one chunk, returning what completed inside it
    pub fn feed(&mut self, chunk: &str) -> ClientResult<Vec<DecodeEvent>> {
        let mut events = Vec::new();
        for c in chunk.chars() {
            self.step(c, &mut events)?;
        }
        Ok(events)
    }

    /// Signals end of input
    pub fn finish(&mut self) -> ClientResult<Vec<DecodeEvent>> {
        let mut events = Vec::new();
        if matches!(self.expect, Expect::Value(_)) && self.scanner.can_end() {
            self.complete_value(&mut events)?;
        }
        if self.expect != Expect::Done {
            return Err(ClientError::Decode("unexpected end of body".to_string()));
        }
        Ok(events)
    }

    fn step(&mut self, c: char, events: &mut Vec<DecodeEvent>) -> ClientResult<()> {
        if let Expect::Value(_) = self.expect {
            return match self.scanner.push(c) {
                Scan::Continue => {
                    self.token.push(c);
                    Ok(())
                }
                Scan::Complete => {
                    self.token.push(c);
                    self.complete_value(events)
                }
                Scan::CompleteBefore => {
                    self.complete_value(events)?;
                    self.step(c, events)
                }
            };
        }

        if c.is_whitespace() {
            return Ok(());
        }

        match (self.expect, c) {
            (Expect::Start, _) if self.mode == Mode::Single => self.begin(c, Target::Whole),
            (Expect::Start, '{') => self.expect = Expect::KeyOrEnd,
            (Expect::KeyOrEnd, '}') => self.expect = Expect::Done,
            (Expect::KeyOrEnd | Expect::Key, '"') => self.begin(c, Target::Key),
            (Expect::Colon, ':') => self.expect = Expect::MemberValue,
            (Expect::MemberValue, _) => {
                let target = match self.member.as_str() {
                    VALUE_MEMBER => None,
                    COUNT_MEMBER => Some(Target::Count),
                    _ => Some(Target::Skip),
                };
                match target {
                    Some(target) => self.begin(c, target),
                    None if c == '[' => self.expect = Expect::ElementOrEnd,
                    None => return Err(self.unexpected(c)),
                }
            }
            (Expect::CommaOrEnd, ',') => self.expect = Expect::Key,
            (Expect::CommaOrEnd, '}') => self.expect = Expect::Done,
            (Expect::ElementOrEnd, ']') => self.expect = Expect::CommaOrEnd,
            (Expect::ElementOrEnd | Expect::Element, _) => self.begin(c, Target::Item),
            (Expect::ElementCommaOrEnd, ',') => self.expect = Expect::Element,
            (Expect::ElementCommaOrEnd, ']') => self.expect = Expect::CommaOrEnd,
            _ => return Err(self.unexpected(c)),
        }
        Ok(())
    }

    fn begin(&mut self, c: char, target: Target) {
        self.scanner = ValueScanner::default();
        self.scanner.push(c);
        self.token.clear();
        self.token.push(c);
        self.expect = Expect::Value(target);
    }

    fn complete_value(&mut self, events: &mut Vec<DecodeEvent>) -> ClientResult<()> {
        let Expect::Value(target) = self.expect else {
            return Ok(());
        };
        let value: Value = serde_json::from_str(&self.token)?;
        self.token.clear();

        match target {
            Target::Key => {
                self.member = match value {
                    Value::String(name) => name,
                    _ => return Err(ClientError::Decode("member name is not a string".into())),
                };
                self.expect = Expect::Colon;
            }
            Target::Count => {
                let count = parse_count(&value)?;
                trace!(count, "decoded count");
                events.push(DecodeEvent::Count(count));
                self.expect = Expect::CommaOrEnd;
            }
            Target::Item => {
                trace!("decoded item");
                events.push(DecodeEvent::Item(value));
                self.expect = Expect::ElementCommaOrEnd;
            }
            Target::Skip => self.expect = Expect::CommaOrEnd,
            Target::Whole => {
                events.push(DecodeEvent::Single(value));
                self.expect = Expect::Done;
            }
        }
        Ok(())
    }

    fn unexpected(&self, c: char) -> ClientError {
        ClientError::Decode(format!("unexpected '{}' while expecting {:?}", c, self.expect))
    }
}

/// Counts arrive as numbers or, from some services, numeric strings
pub(crate) fn parse_count(value: &Value) -> ClientResult<u64> {
    match value {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => s.parse().ok(),
        _ => None,
    }
    .ok_or_else(|| ClientError::Decode(format!("invalid count: {}", value)))
}
