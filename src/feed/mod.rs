//! Dataset feed: pagination state, sources, and invalidation.
//!
//! - [`controller`] - epoch-tagged page state machine and selection map
//! - [`source`] - the [`FeedSource`] boundary trait
//! - [`http`] - JSON-over-HTTP source backed by `reqwest`
//! - [`memory`] - in-memory source for `--demo` and tests
//! - [`watch`] - background poller that turns dataset changes into invalidations
//!
//! # Example
//!
//! ```ignore
//! use sample_grid::feed::{FeedController, MemoryFeedSource};
//!
//! let source = MemoryFeedSource::demo(45, 20);
//! let mut feed = FeedController::new(20);
//! feed.set_dataset(source.current_dataset());
//! feed.load_more(&source).await?;
//! ```

pub mod controller;
pub mod http;
pub mod memory;
pub mod source;
mod types;
pub mod watch;

pub use controller::{
    chunk_rows, row_count, FeedController, FeedError, FeedState, FeedView, LoadOutcome,
    PageRequest, SelectionChange, SelectionMap, DEFAULT_PAGE_SIZE,
};
pub use http::HttpFeedSource;
pub use memory::MemoryFeedSource;
pub use source::FeedSource;
pub use types::{DatasetInfo, Detection, FetchError, Item, ItemId, Label, Page, SelectionAck};
pub use watch::watch_dataset;
