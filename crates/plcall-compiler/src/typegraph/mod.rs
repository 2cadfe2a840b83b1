//! Cached, cycle-safe resolution of named catalog types.
//!
//! References are parsed into every shape they admit and resolved against
//! the [`Catalog`]. Each canonical key moves through three states:
//! `Pending` (seen by a scan), `Resolving` (being built) and `Resolved`.
//! A key is marked `Resolving` before its children are visited, so a type
//! that refers back to itself finds the in-progress entry and stops there.
//! Children are stored as [`TypeRef::Named`] keys, never as nested nodes.
//!
//! Locking: [`TypeGraph::get`] holds the writer lock for its whole call.
//! Discovery ([`TypeGraph::names`]) probes with the reader lock, fetches the
//! top-level definition unlocked on a worker pool, then takes the writer lock
//! to install it.

mod expand;
mod snapshot;


pub use snapshot::Snapshot;

use std::collections::{BTreeSet, HashMap, HashSet};
use std::sync::Arc;

use indexmap::IndexMap;
use parking_lot::RwLock;
use plcall_core::{
    CancelToken, CanonicalName, Field, IndexBy, QualifiedName, Scalar, TypeDef, TypeName, TypeRef,
};
use rayon::prelude::*;
use tracing::{debug, info, warn};

use crate::catalog::{AttrRow, AttrType, Catalog, TypeClass};
use crate::{Error, Result};

/// A resolved named type. Immutable once built.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TypeNode {
    pub name: CanonicalName,
    pub def: TypeDef,
}

/// Type graph settings.
#[derive(Clone, Debug)]
pub struct GraphConfig {
    /// Worker threads used by discovery.
    pub(crate) concurrency: usize,
}

impl Default for GraphConfig {
    fn default() -> Self {
        Self { concurrency: 4 }
    }
}

impl GraphConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the discovery pool size (at least one worker).
    pub fn concurrency(mut self, value: usize) -> Self {
        self.concurrency = value.max(1);
        self
    }
}

#[derive(Clone, Debug)]
enum Entry {
    Pending,
    Resolving,
    Resolved(Arc<TypeNode>),
}

#[derive(Debug, Default)]
struct Cache {
    entries: IndexMap<CanonicalName, Entry>,
    /// Reference text as requested -> key it resolved to.
    aliases: HashMap<String, CanonicalName>,
}

impl Cache {
    fn resolved(&self, key: &CanonicalName) -> Option<&Arc<TypeNode>> {
        match self.entries.get(key) {
            Some(Entry::Resolved(node)) => Some(node),
            _ => None,
        }
    }

    fn is_open_or_done(&self, key: &CanonicalName) -> bool {
        matches!(
            self.entries.get(key),
            Some(Entry::Resolving | Entry::Resolved(_))
        )
    }
}

/// Definition as fetched from the catalog, children not yet resolved.
enum RawDef {
    Scalar(Scalar),
    Record(Vec<AttrRow>),
    Collection {
        elem: AttrRow,
        index_by: Option<IndexBy>,
    },
}

#[derive(Clone, Copy)]
enum Source {
    Attributes,
    Element,
    Columns,
}

/// Resolver and cache of named types for one catalog.
pub struct TypeGraph<C> {
    catalog: C,
    config: GraphConfig,
    cache: RwLock<Cache>,
}

impl<C: Catalog> TypeGraph<C> {
    pub fn new(catalog: C) -> Self {
        Self::with_config(catalog, GraphConfig::default())
    }

    pub fn with_config(catalog: C, config: GraphConfig) -> Self {
        Self {
            catalog,
            config,
            cache: RwLock::new(Cache::default()),
        }
    }

    pub fn catalog(&self) -> &C {
        &self.catalog
    }

    /// Resolve a possibly partial reference.
    ///
    /// Fails with [`Error::UnknownType`] when no shape of the reference names
    /// a catalog object, and with [`Error::NotSupported`] for objects that
    /// cannot be represented.
    pub fn get(&self, reference: &str) -> Result<Arc<TypeNode>> {
        let name = TypeName::parse(reference).map_err(|e| Error::UnknownType(e.to_string()))?;
        let alias = name.to_string();
        let mut cache = self.cache.write();

        if let Some(node) = cache.aliases.get(&alias).and_then(|k| cache.resolved(k)) {
            return Ok(node.clone());
        }

        for candidate in name.candidates(self.catalog.default_owner()) {
            let key = candidate.canonical();
            if let Some(node) = cache.resolved(&key).cloned() {
                cache.aliases.insert(alias, key);
                return Ok(node);
            }
            let Some(class) = self.catalog.classify(&candidate)? else {
                continue;
            };
            let node = self.install(&mut cache, &candidate, &class)?;
            cache.aliases.insert(alias, key);
            return Ok(node);
        }

        Err(Error::UnknownType(reference.to_string()))
    }

    /// Scan the catalog for type names and resolve the ones not cached yet.
    ///
    /// `only` restricts the scan to the given keys. Types that turn out to be
    /// unsupported are logged and left out of the result.
    pub fn names(&self, only: Option<&BTreeSet<CanonicalName>>) -> Result<BTreeSet<CanonicalName>> {
        self.names_cancellable(only, &CancelToken::new())
    }

    /// Like [`TypeGraph::names`], but stops dispatching once `cancel` fires.
    /// Undispatched names stay `Pending` and are left out of the result.
    pub fn names_cancellable(
        &self,
        only: Option<&BTreeSet<CanonicalName>>,
        cancel: &CancelToken,
    ) -> Result<BTreeSet<CanonicalName>> {
        let mut names = BTreeSet::new();
        let mut fresh = Vec::new();
        for name in self.catalog.type_names()? {
            let key = name.canonical();
            if only.is_some_and(|only| !only.contains(&key)) {
                continue;
            }
            if self.cache.read().resolved(&key).is_none() {
                fresh.push(name);
            }
            names.insert(key);
        }

        {
            let mut cache = self.cache.write();
            for name in &fresh {
                cache
                    .entries
                    .entry(name.canonical())
                    .or_insert(Entry::Pending);
            }
        }

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.config.concurrency)
            .build()
            .map_err(std::io::Error::other)?;
        let outcomes: Vec<(CanonicalName, Option<Result<()>>)> = pool.install(|| {
            fresh
                .par_iter()
                .map(|name| {
                    if cancel.is_cancelled() {
                        return (name.canonical(), None);
                    }
                    (name.canonical(), Some(self.discover(name)))
                })
                .collect()
        });

        let mut skipped = 0;
        let mut pending = 0;
        for (key, outcome) in outcomes {
            match outcome {
                Some(Ok(())) => {}
                None => {
                    pending += 1;
                    names.remove(&key);
                }
                Some(Err(err @ Error::NotSupported { .. })) => {
                    warn!(type_name = %key, error = %err, "skipping unsupported type");
                    let mut cache = self.cache.write();
                    if matches!(cache.entries.get(&key), Some(Entry::Pending)) {
                        cache.entries.shift_remove(&key);
                    }
                    names.remove(&key);
                    skipped += 1;
                }
                Some(Err(err)) => return Err(err),
            }
        }

        if pending > 0 {
            info!(pending, "type discovery cancelled");
        }
        info!(types = names.len(), skipped, "type discovery finished");
        Ok(names)
    }

    /// Keys discovered by a scan but not resolved yet.
    pub fn pending(&self) -> Vec<CanonicalName> {
        self.cache
            .read()
            .entries
            .iter()
            .filter(|(_, e)| matches!(e, Entry::Pending))
            .map(|(k, _)| k.clone())
            .collect()
    }

    /// Cached node for a canonical key, without touching the catalog.
    pub fn resolved(&self, key: &CanonicalName) -> Option<Arc<TypeNode>> {
        self.cache.read().resolved(key).cloned()
    }

    /// Whether two references resolve to the same structure, ignoring the
    /// names of the types involved.
    pub fn structurally_equal(&self, a: &str, b: &str) -> Result<bool> {
        let a = self.get(a)?;
        let b = self.get(b)?;
        let cache = self.cache.read();
        Ok(same_named(&cache, &a.name, &b.name, &mut HashSet::new()))
    }

    fn discover(&self, name: &QualifiedName) -> Result<()> {
        let key = name.canonical();
        if self.cache.read().resolved(&key).is_some() {
            return Ok(());
        }
        let class = self
            .catalog
            .classify(name)?
            .ok_or_else(|| Error::UnknownType(key.to_string()))?;
        let raw = self.fetch(name, &class)?;

        let mut cache = self.cache.write();
        if cache.resolved(&key).is_some() {
            return Ok(());
        }
        self.install_raw(&mut cache, name, raw).map(|_| ())
    }

    fn install(
        &self,
        cache: &mut Cache,
        name: &QualifiedName,
        class: &TypeClass,
    ) -> Result<Arc<TypeNode>> {
        let raw = self.fetch(name, class)?;
        self.install_raw(cache, name, raw)
    }

    fn install_raw(
        &self,
        cache: &mut Cache,
        name: &QualifiedName,
        raw: RawDef,
    ) -> Result<Arc<TypeNode>> {
        let key = name.canonical();
        cache.entries.insert(key.clone(), Entry::Resolving);
        match self.build(cache, raw) {
            Ok(def) => {
                debug!(type_name = %key, kind = def.kind_name(), "resolved type");
                let node = Arc::new(TypeNode {
                    name: key.clone(),
                    def,
                });
                cache.entries.insert(key, Entry::Resolved(node.clone()));
                Ok(node)
            }
            Err(err) => {
                cache.entries.shift_remove(&key);
                Err(err)
            }
        }
    }

    fn build(&self, cache: &mut Cache, raw: RawDef) -> Result<TypeDef> {
        Ok(match raw {
            RawDef::Scalar(scalar) => TypeDef::Scalar(scalar),
            RawDef::Record(attrs) => {
                let mut fields = Vec::with_capacity(attrs.len());
                for attr in attrs {
                    fields.push(Field {
                        name: attr.name,
                        ty: self.child(cache, attr.ty)?,
                    });
                }
                TypeDef::Record(fields)
            }
            RawDef::Collection { elem, index_by } => TypeDef::Collection {
                elem: self.child(cache, elem.ty)?,
                index_by,
            },
        })
    }

    fn child(&self, cache: &mut Cache, ty: AttrType) -> Result<TypeRef> {
        let name = match ty {
            AttrType::Scalar(scalar) => return Ok(TypeRef::Scalar(scalar)),
            AttrType::Named(name) => name,
        };
        let key = name.canonical();
        if !cache.is_open_or_done(&key) {
            let class = self
                .catalog
                .classify(&name)?
                .ok_or_else(|| Error::UnknownType(key.to_string()))?;
            self.install(cache, &name, &class)?;
        }
        Ok(TypeRef::Named(key))
    }

    /// Query the catalog for a definition: the sources the class allows, in
    /// fixed priority; the first one with rows wins.
    fn fetch(&self, name: &QualifiedName, class: &TypeClass) -> Result<RawDef> {
        let key = name.canonical();
        let sources: &[Source] = match class {
            TypeClass::Opaque => {
                return Ok(RawDef::Scalar(
                    Scalar::new("OPAQUE").with_type_name(key.to_string()),
                ));
            }
            TypeClass::Record => &[Source::Attributes],
            TypeClass::Collection { .. } => &[Source::Element],
            TypeClass::Table => &[Source::Columns],
            TypeClass::Object => &[Source::Attributes, Source::Element, Source::Columns],
        };
        let index_by = match class {
            TypeClass::Collection { index_by } => index_key(&key, index_by.as_deref())?,
            _ => None,
        };

        for source in sources {
            match source {
                Source::Attributes => {
                    let attrs = self.catalog.record_attributes(name)?;
                    if !attrs.is_empty() {
                        return Ok(RawDef::Record(dedup_fields(attrs)));
                    }
                }
                Source::Element => {
                    if let Some(elem) = self.catalog.collection_element(name)? {
                        return Ok(RawDef::Collection { elem, index_by });
                    }
                }
                Source::Columns => {
                    let columns = self.catalog.rowtype_columns(name)?;
                    if !columns.is_empty() {
                        return Ok(RawDef::Record(dedup_fields(columns)));
                    }
                }
            }
        }
        Err(Error::not_supported(
            key.to_string(),
            "catalog lists no attributes, element or columns",
        ))
    }
}

impl<C> TypeGraph<C> {
    /// Number of resolved types.
    pub fn len(&self) -> usize {
        self.cache
            .read()
            .entries
            .values()
            .filter(|e| matches!(e, Entry::Resolved(_)))
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn index_key(key: &CanonicalName, index_by: Option<&str>) -> Result<Option<IndexBy>> {
    let Some(index_by) = index_by.map(str::trim) else {
        return Ok(None);
    };
    match index_by.to_ascii_uppercase().as_str() {
        "" | "PLS_INTEGER" | "BINARY_INTEGER" | "SIMPLE_INTEGER" => Ok(Some(IndexBy::Integer)),
        other => Err(Error::not_supported(
            key.to_string(),
            format!("collection indexed by {other}"),
        )),
    }
}

/// Some catalog views repeat an attribute on consecutive rows.
fn dedup_fields(mut attrs: Vec<AttrRow>) -> Vec<AttrRow> {
    attrs.dedup_by(|next, prev| next.name == prev.name);
    attrs
}

fn same_ref(
    cache: &Cache,
    a: &TypeRef,
    b: &TypeRef,
    seen: &mut HashSet<(CanonicalName, CanonicalName)>,
) -> bool {
    match (a, b) {
        (TypeRef::Scalar(a), TypeRef::Scalar(b)) => a == b,
        (TypeRef::Named(a), TypeRef::Named(b)) => same_named(cache, a, b, seen),
        _ => false,
    }
}

fn same_named(
    cache: &Cache,
    a: &CanonicalName,
    b: &CanonicalName,
    seen: &mut HashSet<(CanonicalName, CanonicalName)>,
) -> bool {
    // A pair already under comparison is assumed equal; cycles close here.
    if a == b || !seen.insert((a.clone(), b.clone())) {
        return true;
    }
    let (Some(a), Some(b)) = (cache.resolved(a), cache.resolved(b)) else {
        return false;
    };
    match (&a.def, &b.def) {
        (TypeDef::Scalar(a), TypeDef::Scalar(b)) => a == b,
        (TypeDef::Record(a), TypeDef::Record(b)) => {
            a.len() == b.len()
                && a
                    .iter()
                    .zip(b)
                    .all(|(a, b)| a.name == b.name && same_ref(cache, &a.ty, &b.ty, seen))
        }
        (
            TypeDef::Collection {
                elem: a,
                index_by: ia,
            },
            TypeDef::Collection {
                elem: b,
                index_by: ib,
            },
        ) => ia == ib && same_ref(cache, a, b, seen),
        _ => false,
    }
}
