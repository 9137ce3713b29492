//! CX wire model: aspect elements, stream metadata and the stream reader

mod element;
mod metadata;
mod reader;
mod scanner;

pub use element::{
    aspect, reserved, AspectElement, CitationLinks, EdgeElement, ElementAttribute, ElementId,
    FunctionTerm, IdentifiedElement, NetworkAttribute, NodeElement, SupportLinks,
};
pub use metadata::{MetadataCollection, MetadataElement};
pub use reader::{AspectSource, CxError, CxReader, CxResult, MemorySource};
