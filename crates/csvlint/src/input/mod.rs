//! Sources, transport metadata and fetching.

mod source;
mod transport;

pub(crate) use source::content_type_param;
pub use source::{OpenedSource, Source, SourceMetadata};
pub use transport::{DefaultTransport, Fetched, MockTransport, Transport};
