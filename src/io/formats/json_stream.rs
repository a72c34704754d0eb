//! Incremental JSON scanner.
//!
//! `serde_json` parses complete values; GraphSON documents hold every element
//! in two large arrays. The scanner walks the enclosing object and arrays
//! byte by byte and hands each array element to `serde_json` on its own, so
//! memory stays bounded by the largest single element.

use crate::{Error, Result};
use serde_json::Value;
use std::io::BufRead;

pub(super) struct JsonStream<R: BufRead> {
    reader: R,
    offset: u64,
}

impl<R: BufRead> JsonStream<R> {
    pub(super) const fn new(reader: R) -> Self {
        Self { reader, offset: 0 }
    }

    pub(super) fn error(&self, message: impl Into<String>) -> Error {
        Error::parse_at(self.offset, message)
    }

    fn peek(&mut self) -> Result<Option<u8>> {
        let buf = self
            .reader
            .fill_buf()
            .map_err(|e| Error::Read(e.to_string()))?;
        Ok(buf.first().copied())
    }

    fn next_byte(&mut self) -> Result<Option<u8>> {
        let byte = self.peek()?;
        if byte.is_some() {
            self.reader.consume(1);
            self.offset += 1;
        }
        Ok(byte)
    }

    fn require_byte(&mut self) -> Result<u8> {
        self.next_byte()?
            .ok_or_else(|| self.error("unexpected end of document"))
    }

    /// Skips whitespace and returns the next byte without consuming it.
    pub(super) fn skip_ws(&mut self) -> Result<Option<u8>> {
        loop {
            match self.peek()? {
                Some(b' ' | b'\t' | b'\n' | b'\r') => {
                    self.next_byte()?;
                },
                other => return Ok(other),
            }
        }
    }

    pub(super) fn expect(&mut self, expected: u8) -> Result<()> {
        self.skip_ws()?;
        match self.next_byte()? {
            Some(b) if b == expected => Ok(()),
            Some(b) => Err(self.error(format!(
                "expected '{}', found '{}'",
                char::from(expected),
                char::from(b)
            ))),
            None => Err(self.error(format!(
                "expected '{}', found end of document",
                char::from(expected)
            ))),
        }
    }

    /// Advances inside an object: returns the next member key, or `None` at `}`.
    pub(super) fn next_key(&mut self, first: &mut bool) -> Result<Option<String>> {
        if self.skip_ws()? == Some(b'}') {
            self.next_byte()?;
            return Ok(None);
        }
        if !*first {
            self.expect(b',')?;
        }
        *first = false;

        self.skip_ws()?;
        let mut raw = Vec::new();
        self.capture_string(&mut raw)?;
        let key: String = serde_json::from_slice(&raw)
            .map_err(|e| self.error(format!("invalid member name: {e}")))?;
        self.expect(b':')?;
        Ok(Some(key))
    }

    /// Advances inside an array: returns whether another item follows.
    pub(super) fn next_item(&mut self, first: &mut bool) -> Result<bool> {
        if self.skip_ws()? == Some(b']') {
            self.next_byte()?;
            return Ok(false);
        }
        if !*first {
            self.expect(b',')?;
        }
        *first = false;
        Ok(true)
    }

    /// Reads one complete value.
    pub(super) fn parse_value(&mut self) -> Result<Value> {
        let raw = self.capture_value()?;
        serde_json::from_slice(&raw).map_err(|e| self.error(format!("invalid JSON value: {e}")))
    }

    pub(super) fn skip_value(&mut self) -> Result<()> {
        self.capture_value().map(|_| ())
    }

    fn capture_value(&mut self) -> Result<Vec<u8>> {
        let mut raw = Vec::new();
        match self.skip_ws()? {
            Some(b'"') => self.capture_string(&mut raw)?,
            Some(b'{' | b'[') => self.capture_container(&mut raw)?,
            Some(_) => loop {
                match self.peek()? {
                    Some(b',' | b']' | b'}' | b' ' | b'\t' | b'\n' | b'\r') | None => break,
                    Some(b) => {
                        raw.push(b);
                        self.next_byte()?;
                    },
                }
            },
            None => return Err(self.error("unexpected end of document")),
        }
        Ok(raw)
    }

    fn capture_string(&mut self, raw: &mut Vec<u8>) -> Result<()> {
        match self.next_byte()? {
            Some(b'"') => raw.push(b'"'),
            _ => return Err(self.error("expected string")),
        }
        loop {
            let b = self.require_byte()?;
            raw.push(b);
            match b {
                b'\\' => raw.push(self.require_byte()?),
                b'"' => return Ok(()),
                _ => {},
            }
        }
    }

    fn capture_container(&mut self, raw: &mut Vec<u8>) -> Result<()> {
        let mut depth = 0usize;
        loop {
            match self.peek()? {
                Some(b'"') => {
                    self.capture_string(raw)?;
                    continue;
                },
                Some(b @ (b'{' | b'[')) => {
                    depth += 1;
                    raw.push(b);
                },
                Some(b @ (b'}' | b']')) => {
                    depth = depth.saturating_sub(1);
                    raw.push(b);
                },
                Some(b) => raw.push(b),
                None => return Err(self.error("unexpected end of document")),
            }
            self.next_byte()?;
            if depth == 0 {
                return Ok(());
            }
        }
    }
}
