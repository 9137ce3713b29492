//! Incremental tokenizer for the CX document envelope
//!
//! Only the outer structure is tokenized here: the fragment array, the
//! fragment objects and the element arrays inside them. Each element is
//! copied out as raw JSON text and parsed by serde_json, so at most one
//! element is held in memory at a time.

use super::reader::{CxError, CxResult};
use std::io::{self, BufRead};

pub(crate) struct Scanner<R> {
    input: R,
    offset: u64,
}

fn is_whitespace(byte: u8) -> bool {
    matches!(byte, b' ' | b'\t' | b'\n' | b'\r')
}

fn is_scalar_start(byte: u8) -> bool {
    matches!(byte, b'-' | b'0'..=b'9' | b't' | b'f' | b'n')
}

impl<R: BufRead> Scanner<R> {
    pub fn new(input: R) -> Self {
        Self { input, offset: 0 }
    }

    fn peek(&mut self) -> CxResult<Option<u8>> {
        loop {
            match self.input.fill_buf() {
                Ok(buf) => return Ok(buf.first().copied()),
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e.into()),
            }
        }
    }

    fn bump(&mut self) {
        self.input.consume(1);
        self.offset += 1;
    }

    fn skip_whitespace(&mut self) -> CxResult<Option<u8>> {
        while let Some(byte) = self.peek()? {
            if !is_whitespace(byte) {
                return Ok(Some(byte));
            }
            self.bump();
        }
        Ok(None)
    }

    fn syntax(&self, message: impl Into<String>) -> CxError {
        CxError::Syntax {
            offset: self.offset,
            message: message.into(),
        }
    }

    fn unexpected(&self, found: Option<u8>, expected: &str) -> CxError {
        match found {
            Some(byte) => self.syntax(format!(
                "expected {} but found '{}'",
                expected,
                byte.escape_ascii()
            )),
            None => self.syntax(format!("expected {} but the input ended", expected)),
        }
    }

    /// Consume `byte` if it is the next significant byte
    pub fn eat(&mut self, byte: u8) -> CxResult<bool> {
        if self.skip_whitespace()? == Some(byte) {
            self.bump();
            Ok(true)
        } else {
            Ok(false)
        }
    }

    pub fn expect(&mut self, byte: u8) -> CxResult<()> {
        match self.skip_whitespace()? {
            Some(found) if found == byte => {
                self.bump();
                Ok(())
            }
            found => Err(self.unexpected(found, &format!("'{}'", byte as char))),
        }
    }

    /// Only whitespace may follow the document
    pub fn expect_end(&mut self) -> CxResult<()> {
        match self.skip_whitespace()? {
            None => Ok(()),
            found => Err(self.unexpected(found, "end of input")),
        }
    }

    /// Read a string token, unescaped
    pub fn read_string(&mut self) -> CxResult<String> {
        match self.skip_whitespace()? {
            Some(b'"') => {}
            found => return Err(self.unexpected(found, "a string")),
        }
        let mut raw = Vec::new();
        self.copy_string(&mut raw)?;
        serde_json::from_slice(&raw).map_err(|e| self.syntax(e.to_string()))
    }

    /// Copy the next complete JSON value into `out`, replacing its contents.
    ///
    /// Brackets and string quoting are tracked; everything else is left for
    /// serde_json to validate when `out` is parsed.
    pub fn capture_value(&mut self, out: &mut Vec<u8>) -> CxResult<()> {
        out.clear();
        match self.skip_whitespace()? {
            Some(b'"') => self.copy_string(out),
            Some(b'{') | Some(b'[') => self.copy_container(out),
            Some(byte) if is_scalar_start(byte) => {
                self.copy_scalar(out);
                Ok(())
            }
            found => Err(self.unexpected(found, "a JSON value")),
        }
    }

    fn take(&mut self, out: &mut Vec<u8>) -> CxResult<u8> {
        match self.peek()? {
            Some(byte) => {
                self.bump();
                out.push(byte);
                Ok(byte)
            }
            None => Err(self.syntax("unexpected end of input")),
        }
    }

    fn copy_string(&mut self, out: &mut Vec<u8>) -> CxResult<()> {
        self.take(out)?;
        loop {
            match self.take(out)? {
                b'"' => return Ok(()),
                b'\\' => {
                    self.take(out)?;
                }
                _ => {}
            }
        }
    }

    fn copy_container(&mut self, out: &mut Vec<u8>) -> CxResult<()> {
        let mut depth = 0usize;
        loop {
            if self.peek()? == Some(b'"') {
                self.copy_string(out)?;
                continue;
            }
            match self.take(out)? {
                b'{' | b'[' => depth += 1,
                b'}' | b']' => {
                    depth -= 1;
                    if depth == 0 {
                        return Ok(());
                    }
                }
                _ => {}
            }
        }
    }

    fn copy_scalar(&mut self, out: &mut Vec<u8>) {
        // A read error here resurfaces on the next peek
        while let Ok(Some(byte)) = self.peek() {
            if is_whitespace(byte) || matches!(byte, b',' | b']' | b'}') {
                break;
            }
            self.bump();
            out.push(byte);
        }
    }
}
