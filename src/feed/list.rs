//! Fixed-capacity, newest-first list of feed items

use crate::simulator::RowId;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier of a transient placeholder shown while a replacement row warms up
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PlaceholderId(pub u64);

impl fmt::Display for PlaceholderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "placeholder-{}", self.0)
    }
}

/// One slot of the feed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum FeedItem {
    Row(RowId),
    Placeholder(PlaceholderId),
}

/// Ordered feed slots; index 0 is the newest item
///
/// Length never exceeds capacity: every insertion truncates from the tail.
#[derive(Debug, Clone)]
pub struct FeedList {
    items: Vec<FeedItem>,
    capacity: usize,
}

impl FeedList {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            items: Vec::with_capacity(capacity + 1),
            capacity,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.items.len() >= self.capacity
    }

    pub fn items(&self) -> &[FeedItem] {
        &self.items
    }

    pub fn contains(&self, item: FeedItem) -> bool {
        self.items.contains(&item)
    }

    /// Append at the tail during initial fill; refused once full
    pub fn push_back(&mut self, item: FeedItem) -> bool {
        if self.is_full() {
            return false;
        }
        self.items.push(item);
        true
    }

    /// Insert at the head and return whatever fell off the tail
    pub fn prepend(&mut self, item: FeedItem) -> Vec<FeedItem> {
        self.items.insert(0, item);
        self.truncate()
    }

    /// Swap a placeholder for `item` in place
    ///
    /// Returns false when the placeholder is no longer in the list.
    pub fn replace_placeholder(&mut self, placeholder: PlaceholderId, item: FeedItem) -> bool {
        let target = FeedItem::Placeholder(placeholder);
        match self.items.iter().position(|it| *it == target) {
            Some(idx) => {
                self.items[idx] = item;
                true
            }
            None => false,
        }
    }

    fn truncate(&mut self) -> Vec<FeedItem> {
        if self.items.len() > self.capacity {
            self.items.split_off(self.capacity)
        } else {
            Vec::new()
        }
    }
}
