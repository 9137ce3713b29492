//! CX stream reader
//!
//! A CX document is a JSON array of single-key fragments, each mapping an
//! aspect name to an array of elements:
//!
//! ```text
//! [ {"numberVerification": [...]},
//!   {"metaData": [...]},          <- pre-metadata
//!   {"nodes": [...]}, {"edges": [...]}, ...
//!   {"metaData": [...]},          <- post-metadata
//!   {"status": [...]} ]
//! ```
//!
//! The document is consumed incrementally: fragments are tokenized as the
//! loader pulls elements, and only the element being decoded is buffered.
//! A syntax error late in the document therefore surfaces only when the
//! loader reaches it.

use super::element::{aspect, AspectElement};
use super::metadata::MetadataCollection;
use super::scanner::Scanner;
use serde::de::IgnoredAny;
use std::collections::VecDeque;
use std::io::{BufRead, BufReader, Read};
use thiserror::Error;

/// Errors raised while reading a CX stream
#[derive(Debug, Error)]
pub enum CxError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed CX document at byte {offset}: {message}")]
    Syntax { offset: u64, message: String },

    #[error("fragment for aspect '{0}' is not an element array")]
    NotAnArray(String),

    #[error("malformed fragment for aspect '{aspect}': {source}")]
    MalformedFragment {
        aspect: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("malformed element in aspect '{aspect}': {source}")]
    MalformedElement {
        aspect: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Result type for stream reading
pub type CxResult<T> = Result<T, CxError>;

/// The input side of an ingestion pass.
///
/// Yields metadata declared before the elements, a single-pass sequence of
/// elements, then metadata declared after them.
pub trait AspectSource {
    fn pre_metadata(&mut self) -> CxResult<Option<MetadataCollection>>;

    /// Next element, or `None` once the stream is exhausted
    fn next_element(&mut self) -> CxResult<Option<AspectElement>>;

    fn post_metadata(&mut self) -> CxResult<Option<MetadataCollection>>;
}

/// Pull reader over a CX JSON document
pub struct CxReader<R> {
    scanner: Scanner<R>,
    opened: bool,
    finished: bool,
    in_fragment: bool,
    first_entry: bool,
    /// Aspect whose element array is being read
    aspect: Option<String>,
    first_element: bool,
    elements_started: bool,
    pre_metadata: Option<MetadataCollection>,
    post_metadata: Option<MetadataCollection>,
    buffer: Vec<u8>,
}

impl<R: Read> CxReader<BufReader<R>> {
    pub fn from_reader(reader: R) -> Self {
        Self::new(BufReader::new(reader))
    }
}

impl<'a> CxReader<&'a [u8]> {
    pub fn from_slice(bytes: &'a [u8]) -> Self {
        Self::new(bytes)
    }
}

impl<R: BufRead> CxReader<R> {
    pub fn new(input: R) -> Self {
        Self {
            scanner: Scanner::new(input),
            opened: false,
            finished: false,
            in_fragment: false,
            first_entry: false,
            aspect: None,
            first_element: false,
            elements_started: false,
            pre_metadata: None,
            post_metadata: None,
            buffer: Vec::new(),
        }
    }

    /// Advance to the value of the next fragment entry and return its name
    fn next_entry(&mut self) -> CxResult<Option<String>> {
        loop {
            if self.finished {
                return Ok(None);
            }
            if !self.in_fragment {
                if !self.opened {
                    self.scanner.expect(b'[')?;
                    self.opened = true;
                    if self.scanner.eat(b']')? {
                        return self.finish();
                    }
                } else if self.scanner.eat(b']')? {
                    return self.finish();
                } else {
                    self.scanner.expect(b',')?;
                }
                self.scanner.expect(b'{')?;
                self.in_fragment = true;
                self.first_entry = true;
            }

            if self.scanner.eat(b'}')? {
                self.in_fragment = false;
                continue;
            }
            if !self.first_entry {
                self.scanner.expect(b',')?;
            }
            self.first_entry = false;

            let name = self.scanner.read_string()?;
            self.scanner.expect(b':')?;
            return Ok(Some(name));
        }
    }

    fn finish(&mut self) -> CxResult<Option<String>> {
        self.finished = true;
        self.scanner.expect_end()?;
        Ok(None)
    }

    /// Consume fragments up to the start of the next element array.
    ///
    /// Returns `false` once the document is exhausted.
    fn open_next_aspect(&mut self) -> CxResult<bool> {
        while let Some(name) = self.next_entry()? {
            match name.as_str() {
                aspect::METADATA => self.read_metadata()?,
                aspect::NUMBER_VERIFICATION | aspect::STATUS => {
                    self.scanner.capture_value(&mut self.buffer)?;
                    serde_json::from_slice::<IgnoredAny>(&self.buffer)
                        .map_err(|source| CxError::MalformedFragment { aspect: name, source })?;
                }
                _ => {
                    if !self.scanner.eat(b'[')? {
                        return Err(CxError::NotAnArray(name));
                    }
                    self.elements_started = true;
                    self.first_element = true;
                    self.aspect = Some(name);
                    return Ok(true);
                }
            }
        }
        Ok(false)
    }

    fn read_metadata(&mut self) -> CxResult<()> {
        self.scanner.capture_value(&mut self.buffer)?;
        let collection: MetadataCollection =
            serde_json::from_slice(&self.buffer).map_err(|source| CxError::MalformedFragment {
                aspect: aspect::METADATA.to_string(),
                source,
            })?;
        let slot = if self.elements_started {
            &mut self.post_metadata
        } else {
            &mut self.pre_metadata
        };
        slot.get_or_insert_with(MetadataCollection::new)
            .merge_from(collection);
        Ok(())
    }
}

impl<R: BufRead> AspectSource for CxReader<R> {
    /// Reads up to the first element array, so every metadata fragment that
    /// precedes the elements is included.
    fn pre_metadata(&mut self) -> CxResult<Option<MetadataCollection>> {
        if !self.elements_started {
            self.open_next_aspect()?;
        }
        Ok(self.pre_metadata.take())
    }

    fn next_element(&mut self) -> CxResult<Option<AspectElement>> {
        loop {
            if let Some(name) = &self.aspect {
                if self.scanner.eat(b']')? {
                    self.aspect = None;
                    continue;
                }
                if !self.first_element {
                    self.scanner.expect(b',')?;
                }
                self.first_element = false;
                self.scanner.capture_value(&mut self.buffer)?;
                return AspectElement::decode(name, &self.buffer).map(Some);
            }
            if !self.open_next_aspect()? {
                return Ok(None);
            }
        }
    }

    /// Metadata fragments seen after the first element array. Complete once
    /// `next_element` has returned `None`.
    fn post_metadata(&mut self) -> CxResult<Option<MetadataCollection>> {
        Ok(self.post_metadata.take())
    }
}

/// In-memory source for programmatically built streams
#[derive(Debug, Default)]
pub struct MemorySource {
    pre_metadata: Option<MetadataCollection>,
    elements: VecDeque<AspectElement>,
    post_metadata: Option<MetadataCollection>,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_pre_metadata(mut self, metadata: MetadataCollection) -> Self {
        self.pre_metadata = Some(metadata);
        self
    }

    pub fn with_post_metadata(mut self, metadata: MetadataCollection) -> Self {
        self.post_metadata = Some(metadata);
        self
    }

    pub fn with_element(mut self, element: AspectElement) -> Self {
        self.elements.push_back(element);
        self
    }

    pub fn with_elements(mut self, elements: impl IntoIterator<Item = AspectElement>) -> Self {
        self.elements.extend(elements);
        self
    }

    /// Elements not yet pulled by the loader
    pub fn remaining(&self) -> usize {
        self.elements.len()
    }
}

impl AspectSource for MemorySource {
    fn pre_metadata(&mut self) -> CxResult<Option<MetadataCollection>> {
        Ok(self.pre_metadata.take())
    }

    fn next_element(&mut self) -> CxResult<Option<AspectElement>> {
        Ok(self.elements.pop_front())
    }

    fn post_metadata(&mut self) -> CxResult<Option<MetadataCollection>> {
        Ok(self.post_metadata.take())
    }
}

impl<S: AspectSource + ?Sized> AspectSource for &mut S {
    fn pre_metadata(&mut self) -> CxResult<Option<MetadataCollection>> {
        (**self).pre_metadata()
    }

    fn next_element(&mut self) -> CxResult<Option<AspectElement>> {
        (**self).next_element()
    }

    fn post_metadata(&mut self) -> CxResult<Option<MetadataCollection>> {
        (**self).post_metadata()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn drain<R: BufRead>(reader: &mut CxReader<R>) -> Vec<AspectElement> {
        let mut out = Vec::new();
        while let Some(element) = reader.next_element().unwrap() {
            out.push(element);
        }
        out
    }

    fn drain_until_error<R: BufRead>(reader: &mut CxReader<R>) -> usize {
        let mut count = 0;
        loop {
            match reader.next_element() {
                Ok(Some(_)) => count += 1,
                Ok(None) => panic!("stream ended without an error"),
                Err(CxError::Syntax { .. }) => return count,
                Err(other) => panic!("unexpected error {:?}", other),
            }
        }
    }

    #[test]
    fn splits_pre_and_post_metadata() {
        let doc = json!([
            {"numberVerification": [{"longNumber": 281474976710655i64}]},
            {"metaData": [{"name": "nodes", "elementCount": 1, "consistencyGroup": 1}]},
            {"nodes": [{"@id": 1}]},
            {"metaData": [{"name": "nodes", "idCounter": 1}]},
            {"status": [{"error": "", "success": true}]}
        ])
        .to_string();
        let mut reader = CxReader::from_slice(doc.as_bytes());

        let pre = reader.pre_metadata().unwrap().unwrap();
        assert_eq!(pre.get("nodes").unwrap().element_count, Some(1));
        assert_eq!(pre.get("nodes").unwrap().id_counter, None);

        assert_eq!(drain(&mut reader).len(), 1);

        let post = reader.post_metadata().unwrap().unwrap();
        assert_eq!(post.get("nodes").unwrap().id_counter, Some(1));
    }

    #[test]
    fn yields_elements_in_stream_order() {
        let doc = json!([
            {"nodes": [{"@id": 1}, {"@id": 2}]},
            {"edges": [{"@id": 1, "s": 1, "t": 2}], "nodes": []},
            {},
            {"nodes": [{"@id": 3}]}
        ])
        .to_string();
        let mut reader = CxReader::from_slice(doc.as_bytes());
        assert!(reader.pre_metadata().unwrap().is_none());
        let names: Vec<String> = drain(&mut reader)
            .iter()
            .map(|e| e.aspect_name().to_string())
            .collect();
        assert_eq!(names, vec!["nodes", "nodes", "edges", "nodes"]);
        assert!(reader.post_metadata().unwrap().is_none());
    }

    #[test]
    fn tolerates_whitespace_between_tokens() {
        let doc = "[\n  { \"metaData\" : [ ] } ,\n  { \"nodes\" : [ { \"@id\" : 1 } ,\t{ \"@id\" : 2 } ] }\n]\n";
        let mut reader = CxReader::from_slice(doc.as_bytes());
        assert!(reader.pre_metadata().unwrap().unwrap().is_empty());
        assert_eq!(drain(&mut reader).len(), 2);
    }

    #[test]
    fn empty_document_has_no_elements() {
        let mut reader = CxReader::from_slice(b" [ ] ");
        assert!(reader.pre_metadata().unwrap().is_none());
        assert!(reader.next_element().unwrap().is_none());
    }

    #[test]
    fn rejects_non_array_document() {
        let mut reader = CxReader::from_slice(br#"{"nodes": []}"#);
        assert!(matches!(reader.pre_metadata().unwrap_err(), CxError::Syntax { offset: 0, .. }));
    }

    #[test]
    fn rejects_trailing_content() {
        let mut reader = CxReader::from_slice(br#"[{"nodes": [{"@id": 1}]}] x"#);
        assert!(reader.next_element().unwrap().is_some());
        assert!(matches!(reader.next_element().unwrap_err(), CxError::Syntax { .. }));
    }

    #[test]
    fn non_array_fragment_surfaces_on_pull() {
        let doc = json!([{"nodes": {"@id": 1}}]).to_string();
        let mut reader = CxReader::from_slice(doc.as_bytes());
        let err = reader.next_element().unwrap_err();
        assert!(matches!(err, CxError::NotAnArray(ref aspect) if aspect == "nodes"));
    }

    #[test]
    fn elements_before_a_truncation_are_delivered() {
        let mut reader =
            CxReader::from_slice(br#"[{"nodes": [{"@id": 1}, {"@id": 2}]}, {"edges": [{"@id": 1, "s""#);
        assert_eq!(drain_until_error(&mut reader), 2);
    }

    #[test]
    fn elements_arrive_before_the_rest_of_the_input_is_read() {
        struct Unreachable;

        impl Read for Unreachable {
            fn read(&mut self, _buf: &mut [u8]) -> std::io::Result<usize> {
                Err(std::io::Error::new(std::io::ErrorKind::Other, "connection reset"))
            }
        }

        let head = &br#"[{"metaData": []}, {"nodes": [{"@id": 1},"#[..];
        let mut reader = CxReader::from_reader(head.chain(Unreachable));

        assert!(reader.pre_metadata().unwrap().is_some());
        assert!(matches!(reader.next_element().unwrap(), Some(AspectElement::Node(_))));
        assert!(matches!(reader.next_element().unwrap_err(), CxError::Io(_)));
    }

    #[test]
    fn memory_source_drains_in_order() {
        let mut source = MemorySource::new()
            .with_element(AspectElement::Node(crate::cx::NodeElement::new(1)))
            .with_element(AspectElement::Node(crate::cx::NodeElement::new(2)));
        assert_eq!(source.remaining(), 2);
        assert!(source.next_element().unwrap().is_some());
        assert_eq!(source.remaining(), 1);
    }
}
