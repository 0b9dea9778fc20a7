//! Delegate module
//!
//! A delegate is the data-access handle for one model: it knows how to fetch
//! the records matching a filter/order/limit specification, and nothing else.
//!
//! # Overview
//!
//! - `Delegate` - the fetch capability every model implements
//! - `DelegateRegistry` - explicit `{name -> delegate}` table built at setup time
//! - `MemoryDelegate` - in-memory implementation with the same contract as a database table

mod memory;

pub use memory::{compare_values, MemoryDelegate};
pub(crate) use memory::{is_operator_object, project};

use crate::error::Result;
use crate::pagination::FindManyArgs;
use crate::types::Record;
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

/// Fetch capability for a single model
///
/// Implementations must return records in the order given by
/// `args.order_by`. When `args.cursor` is set, the result starts `args.skip`
/// records after the record whose cursor field equals the cursor value
/// (an unknown cursor yields an empty result).
#[async_trait]
pub trait Delegate: Send + Sync {
    /// Model this delegate serves
    fn model(&self) -> &str;

    /// Fetch records matching the arguments
    async fn find_many(&self, args: FindManyArgs) -> Result<Vec<Record>>;
}

/// Named set of delegates, one per model
#[derive(Clone, Default)]
pub struct DelegateRegistry {
    delegates: BTreeMap<String, Arc<dyn Delegate>>,
}

impl DelegateRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a delegate under `name`, replacing any previous one
    pub fn register(&mut self, name: impl Into<String>, delegate: Arc<dyn Delegate>) -> &mut Self {
        self.delegates.insert(name.into(), delegate);
        self
    }

    /// Builder-style [`DelegateRegistry::register`]
    #[must_use]
    pub fn with(mut self, name: impl Into<String>, delegate: Arc<dyn Delegate>) -> Self {
        self.register(name, delegate);
        self
    }

    /// Look up a delegate by name
    pub fn get(&self, name: &str) -> Option<Arc<dyn Delegate>> {
        self.delegates.get(name).cloned()
    }

    /// Registered names, sorted
    pub fn names(&self) -> Vec<&str> {
        self.delegates.keys().map(String::as_str).collect()
    }

    pub fn len(&self) -> usize {
        self.delegates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.delegates.is_empty()
    }
}

impl fmt::Debug for DelegateRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DelegateRegistry")
            .field("delegates", &self.names())
            .finish()
    }
}
