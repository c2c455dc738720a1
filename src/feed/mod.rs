//! Live outcomes feed
//!
//! [`FeedList`] keeps the ordered, capped slots; [`FeedEngine`] drives the
//! rows in them and swaps completed rows for fresh ones.

mod engine;
mod list;

pub use engine::{FeedEngine, FeedEvent, FeedItemView, FeedSnapshot};
pub use list::{FeedItem, FeedList, PlaceholderId};
