//! Human-readable block text.
//!
//! `269, 0, 1, 33| 2, 1949|| {1} {7} {243:104} {5:[34 181 2]} "text"|`
//!
//! `|` is Sep1 and `,` is Sep2. Bare numbers become VarInt or VarBit blocks,
//! whichever is smaller. Braces hold parts and double quotes hold strings,
//! with `\` escaping the next character.

use std::fmt;
use std::iter::Peekable;
use std::str::{CharIndices, FromStr};

use super::block::{Block, BlockSequence};
use super::part::{Part, PartPayload};
use super::SerialError;

impl fmt::Display for Part {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.payload {
            PartPayload::None => write!(f, "{{{}}}", self.index),
            PartPayload::Int(value) => write!(f, "{{{}:{}}}", self.index, value),
            PartPayload::List(values) => {
                write!(f, "{{{}:[", self.index)?;
                for (i, value) in values.iter().enumerate() {
                    if i > 0 {
                        f.write_str(" ")?;
                    }
                    write!(f, "{}", value)?;
                }
                f.write_str("]}")
            }
        }
    }
}

impl fmt::Display for Block {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Block::Sep1 => f.write_str("|"),
            Block::Sep2 => f.write_str(","),
            Block::VarInt(v) | Block::VarBit(v) => write!(f, "{}", v),
            Block::Part(part) => write!(f, "{}", part),
            Block::String(s) => {
                f.write_str("\"")?;
                for ch in s.chars() {
                    if ch == '"' || ch == '\\' {
                        f.write_str("\\")?;
                    }
                    write!(f, "{}", ch)?;
                }
                f.write_str("\"")
            }
        }
    }
}

impl fmt::Display for BlockSequence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let blocks = self.as_slice();
        for (i, block) in blocks.iter().enumerate() {
            write!(f, "{}", block)?;

            let Some(next) = blocks.get(i + 1) else {
                break;
            };
            let space = match block {
                Block::Sep2 => true,
                Block::Sep1 => *next != Block::Sep1,
                _ => !next.is_separator(),
            };
            if space {
                f.write_str(" ")?;
            }
        }
        Ok(())
    }
}

impl FromStr for Part {
    type Err = SerialError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let inner = s
            .trim()
            .strip_prefix('{')
            .and_then(|rest| rest.strip_suffix('}'))
            .ok_or_else(|| SerialError::InvalidPart(s.to_string()))?;
        parse_part_body(inner)
    }
}

impl FromStr for BlockSequence {
    type Err = SerialError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut chars = s.char_indices().peekable();
        let mut blocks = BlockSequence::new();

        while let Some(&(position, ch)) = chars.peek() {
            match ch {
                c if c.is_whitespace() => {
                    chars.next();
                }
                '|' => {
                    chars.next();
                    blocks.push(Block::Sep1);
                }
                ',' => {
                    chars.next();
                    blocks.push(Block::Sep2);
                }
                '0'..='9' => {
                    let digits = take_while(&mut chars, |c| c.is_ascii_digit());
                    let value = digits
                        .parse::<u32>()
                        .map_err(|_| SerialError::InvalidNumber(digits.clone()))?;
                    blocks.push(Block::int(value));
                }
                '{' => {
                    chars.next();
                    let body = take_while(&mut chars, |c| c != '}');
                    if chars.next().is_none() {
                        return Err(SerialError::UnmatchedDelimiter {
                            delimiter: '{',
                            position,
                        });
                    }
                    blocks.push(Block::Part(parse_part_body(&body)?));
                }
                '"' => {
                    chars.next();
                    blocks.push(Block::String(read_quoted(&mut chars, position)?));
                }
                other => {
                    return Err(SerialError::InvalidCharacter {
                        ch: other,
                        position,
                    })
                }
            }
        }

        Ok(blocks)
    }
}

fn take_while(chars: &mut Peekable<CharIndices<'_>>, pred: impl Fn(char) -> bool) -> String {
    let mut out = String::new();
    while let Some(&(_, ch)) = chars.peek() {
        if !pred(ch) {
            break;
        }
        out.push(ch);
        chars.next();
    }
    out
}

/// Body of a quoted string; the opening quote is already consumed
fn read_quoted(
    chars: &mut Peekable<CharIndices<'_>>,
    open: usize,
) -> Result<String, SerialError> {
    let unmatched = SerialError::UnmatchedDelimiter {
        delimiter: '"',
        position: open,
    };

    let mut out = String::new();
    loop {
        match chars.next() {
            Some((_, '"')) => return Ok(out),
            Some((_, '\\')) => match chars.next() {
                Some((_, escaped)) => out.push(escaped),
                None => return Err(unmatched),
            },
            Some((_, ch)) => out.push(ch),
            None => return Err(unmatched),
        }
    }
}

/// `n`, `n:v` or `n:[v1 v2 ...]`
fn parse_part_body(body: &str) -> Result<Part, SerialError> {
    let invalid = || SerialError::InvalidPart(format!("{{{}}}", body));
    let number = |text: &str| text.trim().parse::<u32>().map_err(|_| invalid());

    let Some((index, value)) = body.split_once(':') else {
        return Ok(Part::none(number(body)?));
    };
    let index = number(index)?;
    let value = value.trim();

    match value.strip_prefix('[') {
        Some(list) => {
            let list = list.strip_suffix(']').ok_or_else(invalid)?;
            let values = list
                .split(|c: char| c.is_whitespace() || c == ',')
                .filter(|item| !item.is_empty())
                .map(number)
                .collect::<Result<Vec<_>, _>>()?;
            Ok(Part::list(index, values))
        }
        None => Ok(Part::int(index, number(value)?)),
    }
}
