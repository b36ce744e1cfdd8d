//! Path index for listener lookup.
//!
//! Listeners of one kind are stored in a trie whose levels are the components
//! of their path. A level holds pinned ids and one wildcard branch, so finding
//! the listeners for a concrete path visits at most two branches per level
//! instead of scanning every listener.

use crate::listener::ListenerId;
use alloc::boxed::Box;
use alloc::vec::Vec;
use hashbrown::HashMap;
use tabula_core::Id;

/// One level of the trie.
#[derive(Debug, Default)]
pub struct PathIndex {
    /// Listeners whose path ends here.
    listeners: Vec<ListenerId>,
    /// Children for pinned ids.
    pinned: HashMap<Id, PathIndex>,
    /// Child for the wildcard.
    wildcard: Option<Box<PathIndex>>,
}

impl PathIndex {
    /// Creates an empty index.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a listener under `path`.
    pub fn insert(&mut self, path: &[Option<Id>], id: ListenerId) {
        match path.split_first() {
            None => self.listeners.push(id),
            Some((Some(pinned), rest)) => self
                .pinned
                .entry(pinned.clone())
                .or_default()
                .insert(rest, id),
            Some((None, rest)) => self
                .wildcard
                .get_or_insert_with(Default::default)
                .insert(rest, id),
        }
    }

    /// Removes a listener from under `path`, pruning empty branches.
    ///
    /// Returns true if the listener was found.
    pub fn remove(&mut self, path: &[Option<Id>], id: ListenerId) -> bool {
        match path.split_first() {
            None => {
                let before = self.listeners.len();
                self.listeners.retain(|l| *l != id);
                before != self.listeners.len()
            }
            Some((Some(pinned), rest)) => {
                let Some(child) = self.pinned.get_mut(pinned) else {
                    return false;
                };
                let removed = child.remove(rest, id);
                if child.is_empty() {
                    self.pinned.remove(pinned);
                }
                removed
            }
            Some((None, rest)) => {
                let Some(child) = self.wildcard.as_mut() else {
                    return false;
                };
                let removed = child.remove(rest, id);
                if child.is_empty() {
                    self.wildcard = None;
                }
                removed
            }
        }
    }

    /// Appends the listeners matching a concrete path to `out`.
    ///
    /// A `Some` component matches its pinned id and the wildcard; a `None`
    /// component only matches the wildcard.
    pub fn collect(&self, path: &[Option<&str>], out: &mut Vec<ListenerId>) {
        match path.split_first() {
            None => out.extend_from_slice(&self.listeners),
            Some((component, rest)) => {
                if let Some(id) = component {
                    if let Some(child) = self.pinned.get(*id) {
                        child.collect(rest, out);
                    }
                }
                if let Some(child) = &self.wildcard {
                    child.collect(rest, out);
                }
            }
        }
    }

    /// Returns every listener in the index.
    pub fn all(&self, out: &mut Vec<ListenerId>) {
        out.extend_from_slice(&self.listeners);
        for child in self.pinned.values() {
            child.all(out);
        }
        if let Some(child) = &self.wildcard {
            child.all(out);
        }
    }

    /// Returns true if no listener is stored.
    pub fn is_empty(&self) -> bool {
        self.listeners.is_empty() && self.pinned.is_empty() && self.wildcard.is_none()
    }
}
