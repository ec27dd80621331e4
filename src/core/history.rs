//! Bounded, deduplicated input history
//!
//! Each input box (send text, filter text, UDP endpoints) keeps its
//! recently used values. Lists are loaded from the config file at startup
//! and written back at shutdown.

use serde::{Deserialize, Serialize};

/// Default maximum entries per history list.
pub const DEFAULT_CAPACITY: usize = 20;

/// History categories, one per persisted input box.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HistoryKind {
    /// Send text box
    SendText,
    /// Filter spec box
    FilterText,
    /// UDP destination IP
    DestIp,
    /// UDP destination port
    DestPort,
    /// UDP receive (bind) IP
    RecvIp,
    /// UDP receive (bind) port
    RecvPort,
}

/// Ordered list of unique strings with bounded length.
///
/// Insertion appends; overflow evicts the oldest entry. Re-adding an
/// existing value is a no-op and does not reorder the list.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryList {
    items: Vec<String>,
    capacity: usize,
}

impl Default for HistoryList {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

impl HistoryList {
    /// Create an empty list with the given capacity.
    pub fn new(capacity: usize) -> Self {
        Self {
            items: Vec::new(),
            capacity: capacity.max(1),
        }
    }

    /// Create a list pre-filled with saved values, trimming to capacity.
    pub fn from_items(items: Vec<String>, capacity: usize) -> Self {
        let mut list = Self::new(capacity);
        for item in items {
            list.add(&item);
        }
        list
    }

    /// Add a value; returns true when it was inserted.
    pub fn add(&mut self, value: &str) -> bool {
        if value.is_empty() || self.items.iter().any(|v| v == value) {
            return false;
        }
        self.items.push(value.to_string());
        if self.items.len() > self.capacity {
            self.items.remove(0);
        }
        true
    }

    /// Drop all entries.
    pub fn clear(&mut self) {
        self.items.clear();
    }

    /// Entries in insertion order, most recent last.
    pub fn items(&self) -> &[String] {
        &self.items
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// True when the list has no entries.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Change the capacity, evicting oldest entries if needed.
    pub fn set_capacity(&mut self, capacity: usize) {
        self.capacity = capacity.max(1);
        while self.items.len() > self.capacity {
            self.items.remove(0);
        }
    }
}

/// All history lists, one per [`HistoryKind`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HistorySet {
    /// Send text history
    pub send_text: HistoryList,
    /// Filter spec history
    pub filter_text: HistoryList,
    /// UDP destination IP history
    pub dest_ip: HistoryList,
    /// UDP destination port history
    pub dest_port: HistoryList,
    /// UDP bind IP history
    pub recv_ip: HistoryList,
    /// UDP bind port history
    pub recv_port: HistoryList,
}

impl HistorySet {
    /// The list for a category.
    pub fn list(&self, kind: HistoryKind) -> &HistoryList {
        match kind {
            HistoryKind::SendText => &self.send_text,
            HistoryKind::FilterText => &self.filter_text,
            HistoryKind::DestIp => &self.dest_ip,
            HistoryKind::DestPort => &self.dest_port,
            HistoryKind::RecvIp => &self.recv_ip,
            HistoryKind::RecvPort => &self.recv_port,
        }
    }

    fn list_mut(&mut self, kind: HistoryKind) -> &mut HistoryList {
        match kind {
            HistoryKind::SendText => &mut self.send_text,
            HistoryKind::FilterText => &mut self.filter_text,
            HistoryKind::DestIp => &mut self.dest_ip,
            HistoryKind::DestPort => &mut self.dest_port,
            HistoryKind::RecvIp => &mut self.recv_ip,
            HistoryKind::RecvPort => &mut self.recv_port,
        }
    }

    /// Add a value to one category.
    pub fn add(&mut self, kind: HistoryKind, value: &str) -> bool {
        self.list_mut(kind).add(value)
    }

    /// Clear one category.
    pub fn clear(&mut self, kind: HistoryKind) {
        self.list_mut(kind).clear();
    }

    /// Apply a capacity to every list.
    pub fn set_capacity(&mut self, capacity: usize) {
        for kind in [
            HistoryKind::SendText,
            HistoryKind::FilterText,
            HistoryKind::DestIp,
            HistoryKind::DestPort,
            HistoryKind::RecvIp,
            HistoryKind::RecvPort,
        ] {
            self.list_mut(kind).set_capacity(capacity);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_appends() {
        let mut list = HistoryList::new(3);
        assert!(list.add("a"));
        assert!(list.add("b"));
        assert_eq!(list.items(), &["a", "b"]);
    }

    #[test]
    fn test_duplicate_is_noop() {
        let mut list = HistoryList::new(3);
        list.add("a");
        list.add("b");
        assert!(!list.add("a"));
        assert_eq!(list.items(), &["a", "b"]);
    }

    #[test]
    fn test_overflow_evicts_oldest() {
        let mut list = HistoryList::new(3);
        for v in ["a", "b", "c", "d"] {
            list.add(v);
        }
        assert_eq!(list.items(), &["b", "c", "d"]);
    }

    #[test]
    fn test_blank_ignored() {
        let mut list = HistoryList::new(3);
        assert!(!list.add(""));
        assert!(list.is_empty());
    }

    #[test]
    fn test_set_capacity_trims() {
        let mut list = HistoryList::from_items(
            vec!["a".into(), "b".into(), "c".into()],
            10,
        );
        list.set_capacity(2);
        assert_eq!(list.items(), &["b", "c"]);
    }

    #[test]
    fn test_set_add_and_clear() {
        let mut set = HistorySet::default();
        set.add(HistoryKind::SendText, "AT");
        set.add(HistoryKind::DestIp, "127.0.0.1");
        assert_eq!(set.list(HistoryKind::SendText).items(), &["AT"]);
        set.clear(HistoryKind::SendText);
        assert!(set.list(HistoryKind::SendText).is_empty());
        assert_eq!(set.list(HistoryKind::DestIp).len(), 1);
    }
}
