//! Search module: TF-IDF indexing and ranked retrieval
//!
//! # Components
//!
//! - `TextPipeline`: deterministic normalization shared by corpus and queries
//! - `SearchIndex`: vocabulary plus L2-normalized document vectors built from one snapshot
//! - `SearchIndex::search`: cosine ranking with claps and extraction order as tie-breaks
//! - `IndexHandle`: the active index, replaced by atomic swap on rebuild

mod handle;
mod index;
mod query;
mod text;

pub use handle::IndexHandle;
pub use index::{IndexBuildError, IndexStats, IndexedDocument, SearchIndex, TermStats};
pub use query::{QueryError, SearchHit};
pub use text::{StandardPipeline, TextPipeline};
pub(crate) use text::STOPWORDS;
