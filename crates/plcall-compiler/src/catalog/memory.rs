use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

use plcall_core::QualifiedName;
use tracing::debug;

use super::{ArgRow, AttrRow, Catalog, TypeClass, TypeRow};
use crate::{Error, Result};

#[derive(Clone, Debug)]
enum Entry {
    Record(Vec<AttrRow>),
    Collection {
        elem: AttrRow,
        index_by: Option<String>,
    },
    Object(Vec<AttrRow>),
    Opaque,
}

/// Catalog held entirely in memory.
///
/// Types are registered under their canonical key (`OWNER.PKG.NAME`), tables
/// under `OWNER.TABLE`. Every structural query is counted so callers can
/// check memoization.
#[derive(Debug, Default)]
pub struct MemoryCatalog {
    owner: String,
    arguments: Vec<ArgRow>,
    types: HashMap<String, Entry>,
    order: Vec<QualifiedName>,
    tables: HashMap<String, Vec<AttrRow>>,
    queries: AtomicUsize,
}

impl MemoryCatalog {
    pub fn new(owner: &str) -> Self {
        Self {
            owner: owner.to_ascii_uppercase(),
            ..Self::default()
        }
    }

    pub fn with_arguments(mut self, rows: Vec<ArgRow>) -> Self {
        self.arguments = rows;
        self
    }

    /// Register every type described by definition rows, attributes ordered
    /// by position.
    pub fn with_type_rows(mut self, rows: Vec<TypeRow>) -> Result<Self> {
        let mut groups: Vec<(QualifiedName, Vec<TypeRow>)> = Vec::new();
        let mut index: HashMap<String, usize> = HashMap::new();
        for row in rows {
            let name = row.qualified_name(&self.owner);
            let key = name.canonical().to_string();
            match index.get(&key) {
                Some(&i) => groups[i].1.push(row),
                None => {
                    index.insert(key, groups.len());
                    groups.push((name, vec![row]));
                }
            }
        }

        let count = groups.len();
        for (name, mut rows) in groups {
            rows.sort_by_key(|row| row.position);
            let attrs: Vec<AttrRow> = rows
                .iter()
                .filter(|row| row.has_attribute())
                .map(|row| row.attribute(&self.owner))
                .collect();
            let header = &rows[0];
            self = match header.typecode.to_ascii_uppercase().as_str() {
                "RECORD" => self.record(name, attrs),
                "OBJECT" => self.object(name, attrs),
                "OPAQUE" => self.opaque(name),
                "TABLE" => {
                    let (owner, table) = (name.owner.clone(), name.name.clone());
                    self.table(&owner, &table, attrs)
                }
                "COLLECTION" => {
                    let index_by = Some(header.index_by.as_str()).filter(|i| !i.is_empty());
                    let [elem]: [AttrRow; 1] = attrs.try_into().map_err(|attrs: Vec<AttrRow>| {
                        Error::InternalConsistency(format!(
                            "collection {name} has {} element rows",
                            attrs.len()
                        ))
                    })?;
                    self.collection(name, elem, index_by)
                }
                other => {
                    return Err(Error::InternalConsistency(format!(
                        "type {name}: unknown typecode {other:?}"
                    )));
                }
            };
        }
        debug!(types = count, "registered type rows");
        Ok(self)
    }

    pub fn record(self, name: QualifiedName, attrs: Vec<AttrRow>) -> Self {
        self.insert(name, Entry::Record(attrs))
    }

    pub fn collection(self, name: QualifiedName, elem: AttrRow, index_by: Option<&str>) -> Self {
        self.insert(
            name,
            Entry::Collection {
                elem,
                index_by: index_by.map(str::to_string),
            },
        )
    }

    /// Schema-level type whose attributes are found without a prior class.
    pub fn object(self, name: QualifiedName, attrs: Vec<AttrRow>) -> Self {
        self.insert(name, Entry::Object(attrs))
    }

    pub fn opaque(self, name: QualifiedName) -> Self {
        self.insert(name, Entry::Opaque)
    }

    pub fn table(mut self, owner: &str, table: &str, columns: Vec<AttrRow>) -> Self {
        let key = QualifiedName::new(owner, None, table).canonical().to_string();
        self.tables.insert(key, columns);
        self
    }

    /// Number of structural queries answered so far.
    pub fn query_count(&self) -> usize {
        self.queries.load(Ordering::SeqCst)
    }

    fn insert(mut self, name: QualifiedName, entry: Entry) -> Self {
        let key = name.canonical().to_string();
        if self.types.insert(key, entry).is_none() {
            self.order.push(name);
        }
        self
    }

    fn count(&self) {
        self.queries.fetch_add(1, Ordering::SeqCst);
    }

    fn entry(&self, name: &QualifiedName) -> Option<&Entry> {
        if name.rowtype {
            return None;
        }
        self.types.get(name.canonical().as_str())
    }

    fn table_key(name: &QualifiedName) -> String {
        QualifiedName::new(&name.owner, None, &name.name)
            .canonical()
            .to_string()
    }
}

impl Catalog for MemoryCatalog {
    fn default_owner(&self) -> &str {
        &self.owner
    }

    fn arguments(&self, packages: &[String]) -> Result<Vec<ArgRow>> {
        Ok(self
            .arguments
            .iter()
            .filter(|row| {
                packages.is_empty()
                    || packages
                        .iter()
                        .any(|p| p.eq_ignore_ascii_case(&row.package_name))
            })
            .cloned()
            .collect())
    }

    fn type_names(&self) -> Result<Vec<QualifiedName>> {
        Ok(self.order.clone())
    }

    fn classify(&self, name: &QualifiedName) -> Result<Option<TypeClass>> {
        self.count();
        if name.rowtype {
            return Ok(self
                .tables
                .contains_key(&Self::table_key(name))
                .then_some(TypeClass::Table));
        }
        Ok(self.entry(name).map(|entry| match entry {
            Entry::Record(_) => TypeClass::Record,
            Entry::Collection { index_by, .. } => TypeClass::Collection {
                index_by: index_by.clone(),
            },
            Entry::Object(_) => TypeClass::Object,
            Entry::Opaque => TypeClass::Opaque,
        }))
    }

    fn record_attributes(&self, name: &QualifiedName) -> Result<Vec<AttrRow>> {
        self.count();
        Ok(match self.entry(name) {
            Some(Entry::Record(attrs) | Entry::Object(attrs)) => attrs.clone(),
            _ => Vec::new(),
        })
    }

    fn collection_element(&self, name: &QualifiedName) -> Result<Option<AttrRow>> {
        self.count();
        Ok(match self.entry(name) {
            Some(Entry::Collection { elem, .. }) => Some(elem.clone()),
            _ => None,
        })
    }

    fn rowtype_columns(&self, name: &QualifiedName) -> Result<Vec<AttrRow>> {
        self.count();
        Ok(self
            .tables
            .get(&Self::table_key(name))
            .cloned()
            .unwrap_or_default())
    }
}
