//! Bucket: the ordered chain of entry handles behind one hash slot.
//!
//! A bucket only stores handles; the entries themselves live in the table's
//! arena. Lookups scan from the front until the predicate matches or the
//! chain ends.

use crate::error::TableError;

#[derive(Debug, Clone)]
pub(crate) struct Bucket<T> {
    chain: Vec<T>,
}

impl<T: Copy + PartialEq> Bucket<T> {
    pub(crate) fn new() -> Self {
        Self { chain: Vec::new() }
    }

    pub(crate) fn len(&self) -> usize {
        self.chain.len()
    }

    /// Make room for `additional` more elements so the next appends cannot
    /// allocate.
    pub(crate) fn try_reserve(&mut self, additional: usize) -> Result<(), TableError> {
        self.chain
            .try_reserve(additional)
            .map_err(|_| TableError::AllocFailed)
    }

    pub(crate) fn append(&mut self, element: T) {
        self.chain.push(element);
    }

    /// Remove `element`, keeping the order of the rest. Returns false if it
    /// was not in the chain.
    pub(crate) fn remove_element(&mut self, element: T) -> bool {
        match self.chain.iter().position(|&e| e == element) {
            Some(pos) => {
                self.chain.remove(pos);
                true
            }
            None => false,
        }
    }

    pub(crate) fn find<F>(&self, mut matches: F) -> Option<T>
    where
        F: FnMut(T) -> bool,
    {
        self.iter().find(|&e| matches(e))
    }

    pub(crate) fn iter(&self) -> impl Iterator<Item = T> + '_ {
        self.chain.iter().copied()
    }

    /// Empty the chain, keeping the bucket itself.
    pub(crate) fn drain(&mut self) -> impl Iterator<Item = T> + '_ {
        self.chain.drain(..)
    }

    /// Hand every element to `destructor` in chain order, then release the
    /// chain.
    pub(crate) fn destroy<F>(self, destructor: F)
    where
        F: FnMut(T),
    {
        self.chain.into_iter().for_each(destructor);
    }
}
