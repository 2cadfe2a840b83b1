//! Persisted type graphs.

use std::sync::Arc;

use indexmap::IndexMap;
use parking_lot::RwLock;
use plcall_core::{CanonicalName, TypeDef};
use serde::{Deserialize, Serialize};

use super::{Cache, Entry, GraphConfig, TypeGraph, TypeNode};
use crate::catalog::Catalog;
use crate::{Error, Result};

/// Every resolved type of a graph, in resolution order.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    pub types: IndexMap<CanonicalName, TypeDef>,
}

impl Snapshot {
    pub fn from_json(text: &str) -> Result<Self> {
        serde_json::from_str(text).map_err(|e| Error::Snapshot(e.to_string()))
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).map_err(|e| Error::Snapshot(e.to_string()))
    }

    pub fn from_binary(bytes: &[u8]) -> Result<Self> {
        postcard::from_bytes(bytes).map_err(|e| Error::Snapshot(e.to_string()))
    }

    pub fn to_binary(&self) -> Vec<u8> {
        postcard::to_allocvec(self).expect("serialization should not fail")
    }
}

impl<C: Catalog> TypeGraph<C> {
    /// Graph preloaded from a snapshot; misses still go to `catalog`.
    pub fn with_snapshot(catalog: C, config: GraphConfig, snapshot: Snapshot) -> Self {
        let mut cache = Cache::default();
        for (name, def) in snapshot.types {
            let node = Arc::new(TypeNode {
                name: name.clone(),
                def,
            });
            cache.entries.insert(name, Entry::Resolved(node));
        }
        Self {
            catalog,
            config,
            cache: RwLock::new(cache),
        }
    }

    pub fn snapshot(&self) -> Snapshot {
        let cache = self.cache.read();
        let types = cache
            .entries
            .iter()
            .filter_map(|(name, entry)| match entry {
                Entry::Resolved(node) => Some((name.clone(), node.def.clone())),
                _ => None,
            })
            .collect();
        Snapshot { types }
    }
}
