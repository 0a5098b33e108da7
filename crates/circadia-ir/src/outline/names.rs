//! Globally unique procedure names.

use indexmap::IndexMap;

/// Issues unique procedure names.
///
/// The first caller for a base name gets it verbatim; later callers get
/// `base_1`, `base_2`, ... in registration order. Names are never reissued
/// and there is no removal.
#[derive(Debug, Default)]
pub struct NameRegistry {
    /// Issued name -> next disambiguation counter for that base.
    issued: IndexMap<String, u32>,
}

impl NameRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark a name as taken without issuing it, e.g. for procedures that
    /// already exist in the module before the pass runs.
    pub fn reserve(&mut self, name: &str) {
        self.issued.entry(name.to_string()).or_insert(0);
    }

    /// Whether a name has been issued or reserved.
    pub fn is_taken(&self, name: &str) -> bool {
        self.issued.contains_key(name)
    }

    /// Register a desired name, returning the unique name actually issued.
    pub fn register(&mut self, desired: &str) -> String {
        if !self.issued.contains_key(desired) {
            self.issued.insert(desired.to_string(), 0);
            return desired.to_string();
        }
        let mut counter = self.issued[desired];
        let unique = loop {
            counter += 1;
            let candidate = format!("{}_{}", desired, counter);
            if !self.issued.contains_key(&candidate) {
                break candidate;
            }
        };
        self.issued[desired] = counter;
        self.issued.insert(unique.clone(), 0);
        unique
    }
}
