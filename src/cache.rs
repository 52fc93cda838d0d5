//! Bounded recency cache for rendered-on-demand recipes.
//!
//! Chat frontends keep extracted recipes around so a "show as markdown"
//! or "save" action can re-render without re-extracting. The cache is
//! capacity-bounded; the least recently touched entry is evicted first.

use std::collections::{HashMap, VecDeque};

use crate::model::Recipe;

const DEFAULT_CAPACITY: usize = 500;

/// Fixed-capacity least-recently-used map from caller-chosen keys
/// (e.g. "chat_message" ids) to recipes.
///
/// Entries live in a map; recency is a separate ordered index of keys,
/// oldest at the front. Both `get` and `put` count as a touch.
#[derive(Debug)]
pub struct RecipeCache {
    capacity: usize,
    entries: HashMap<String, Recipe>,
    order: VecDeque<String>,
}

impl Default for RecipeCache {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

impl RecipeCache {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            entries: HashMap::new(),
            order: VecDeque::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Look up a recipe and mark it as most recently used.
    pub fn get(&mut self, key: &str) -> Option<&Recipe> {
        if self.entries.contains_key(key) {
            self.touch(key);
        }
        self.entries.get(key)
    }

    /// Insert or replace a recipe, evicting the least recently used entry
    /// when over capacity.
    pub fn put(&mut self, key: impl Into<String>, recipe: Recipe) {
        let key = key.into();
        if self.entries.insert(key.clone(), recipe).is_some() {
            self.touch(&key);
        } else {
            self.order.push_back(key);
        }

        while self.entries.len() > self.capacity {
            if let Some(oldest) = self.order.pop_front() {
                self.entries.remove(&oldest);
            }
        }
    }

    fn touch(&mut self, key: &str) {
        if let Some(pos) = self.order.iter().position(|k| k == key) {
            if let Some(key) = self.order.remove(pos) {
                self.order.push_back(key);
            }
        }
    }
}
