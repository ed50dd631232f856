//! Registry of open dropdown menus.
//!
//! Owned by the top-level UI shell and passed to whatever opens menus, so
//! "close every other menu" needs no global state. Menus register on mount
//! and unregister on unmount.

use std::collections::BTreeSet;
use tracing::trace;

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct MenuRegistry {
    open: BTreeSet<String>,
}

impl MenuRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Open `id`, closing every other menu; returns the ids that were closed
    pub fn open(&mut self, id: impl Into<String>) -> Vec<String> {
        let id = id.into();
        let closed: Vec<String> = self.open.iter().filter(|open| **open != id).cloned().collect();
        self.open.clear();
        trace!(menu = %id, closed = closed.len(), "Opening menu");
        self.open.insert(id);
        closed
    }

    /// Returns whether `id` was open
    pub fn close(&mut self, id: &str) -> bool {
        self.open.remove(id)
    }

    /// Close everything, e.g. on a click outside any menu
    pub fn close_all(&mut self) -> Vec<String> {
        std::mem::take(&mut self.open).into_iter().collect()
    }

    pub fn is_open(&self, id: &str) -> bool {
        self.open.contains(id)
    }

    pub fn open_menus(&self) -> impl Iterator<Item = &str> {
        self.open.iter().map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_opening_a_menu_closes_the_others() {
        let mut menus = MenuRegistry::new();
        menus.open("insert");

        let closed = menus.open("format");

        assert_eq!(closed, vec!["insert".to_string()]);
        assert!(menus.is_open("format"));
        assert!(!menus.is_open("insert"));
    }

    #[test]
    fn test_reopening_same_menu_closes_nothing() {
        let mut menus = MenuRegistry::new();
        menus.open("table");

        assert!(menus.open("table").is_empty());
        assert_eq!(menus.open_menus().collect::<Vec<_>>(), vec!["table"]);
    }

    #[test]
    fn test_close_and_close_all() {
        let mut menus = MenuRegistry::new();
        menus.open("insert");

        assert!(menus.close("insert"));
        assert!(!menus.close("insert"));

        menus.open("format");
        assert_eq!(menus.close_all(), vec!["format".to_string()]);
        assert_eq!(menus.open_menus().count(), 0);
    }
}
