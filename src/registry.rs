//! Code registry: memoized store of generated GLSL definitions
//!
//! Every struct and helper function is keyed by `(category, name)` and
//! emitted at most once per compilation session. Names are deterministic
//! functions of the type and operation they implement, so independent
//! generators can refer to each other's artifacts by name.
//!
//! Author: Moroya Sakamoto

use crate::error::{Error, Result};
use std::collections::HashMap;

/// Section a definition belongs to. Structs are rendered before functions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Category {
    /// `struct` definitions
    Structs,
    /// Function definitions
    Functions,
}

/// Outcome of a registry request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Emission {
    /// The definition was generated by this request
    Generated,
    /// The definition already existed; nothing was generated
    AlreadyPresent,
}

/// A stored definition
#[derive(Debug, Clone)]
pub struct Entry {
    /// Section of the definition
    pub category: Category,
    /// Artifact name
    pub name: String,
    /// GLSL source
    pub body: String,
}

/// Memoizing store of generated definitions, in first-insertion order
#[derive(Debug, Default, Clone)]
pub struct CodeRegistry {
    entries: Vec<Entry>,
    index: HashMap<(Category, String), usize>,
}

impl CodeRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether `(category, name)` is already defined
    #[inline]
    pub fn contains(&self, category: Category, name: &str) -> bool {
        self.index.contains_key(&(category, name.to_string()))
    }

    /// Generated body for `(category, name)`, if any
    pub fn get(&self, category: Category, name: &str) -> Option<&str> {
        self.index
            .get(&(category, name.to_string()))
            .map(|&i| self.entries[i].body.as_str())
    }

    /// Define `(category, name)` with the output of `factory`, unless it
    /// already exists. `factory` runs at most once per key.
    pub fn add<F>(&mut self, category: Category, name: &str, factory: F) -> Emission
    where
        F: FnOnce() -> String,
    {
        if self.contains(category, name) {
            log::trace!("registry hit: {:?} {}", category, name);
            return Emission::AlreadyPresent;
        }
        self.push(category, name, factory());
        Emission::Generated
    }

    /// Define `(category, name)` with an already generated body.
    ///
    /// Inserting the same body twice is a no-op. A different body for an
    /// existing key means two generators disagree on what a name stands for.
    pub fn insert(&mut self, category: Category, name: &str, body: String) -> Result<Emission> {
        match self.get(category, name) {
            Some(existing) if existing == body => Ok(Emission::AlreadyPresent),
            Some(_) => Err(Error::InvariantViolation(format!(
                "conflicting definitions for {:?} '{}'",
                category, name
            ))),
            None => {
                self.push(category, name, body);
                Ok(Emission::Generated)
            }
        }
    }

    fn push(&mut self, category: Category, name: &str, body: String) {
        log::debug!("generated {:?} {}", category, name);
        self.index
            .insert((category, name.to_string()), self.entries.len());
        self.entries.push(Entry {
            category,
            name: name.to_string(),
            body,
        });
    }

    /// All definitions: structs first, then functions, each in
    /// first-insertion order, one per line.
    pub fn render_header(&self) -> String {
        let mut out = String::new();
        for category in [Category::Structs, Category::Functions] {
            for entry in self.entries.iter().filter(|e| e.category == category) {
                out.push_str(&entry.body);
                out.push('\n');
            }
        }
        out
    }

    /// Iterate over all stored definitions in insertion order
    pub fn entries(&self) -> impl Iterator<Item = &Entry> {
        self.entries.iter()
    }

    /// Number of stored definitions
    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether nothing has been generated yet
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
