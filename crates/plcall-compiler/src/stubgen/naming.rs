//! Short, stable PL/SQL identifiers for generated locals.

use std::collections::{BTreeSet, HashMap};

use plcall_core::utils::MAX_SQL_IDENT;

#[derive(Debug, Default)]
struct Scope {
    short: HashMap<String, String>,
    used: BTreeSet<String>,
}

/// Per-run identifier cache, one scope per package.
///
/// The same long name always maps to the same identifier within a package;
/// different long names never collide, even after truncation.
#[derive(Debug, Default)]
pub struct Naming {
    scopes: HashMap<String, Scope>,
}

impl Naming {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn ident(&mut self, package: &str, long: &str) -> String {
        let scope = self
            .scopes
            .entry(package.to_ascii_uppercase())
            .or_default();
        if let Some(short) = scope.short.get(long) {
            return short.clone();
        }

        let base = sanitize(long);
        let short = if base.len() <= MAX_SQL_IDENT && scope.used.insert(base.clone()) {
            base
        } else {
            let mut counter = 2;
            loop {
                let suffix = format!("_{counter}");
                let keep = base.len().min(MAX_SQL_IDENT - suffix.len());
                let name = format!("{}{suffix}", &base[..keep]);
                if scope.used.insert(name.clone()) {
                    break name;
                }
                counter += 1;
            }
        };
        scope.short.insert(long.to_string(), short.clone());
        short
    }
}

/// Lowercase ASCII identifier; anything else becomes `_`.
fn sanitize(s: &str) -> String {
    let mut out: String = s
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '_' {
                c.to_ascii_lowercase()
            } else {
                '_'
            }
        })
        .collect();
    if !out.starts_with(|c: char| c.is_ascii_alphabetic()) {
        out.insert(0, 'x');
    }
    out
}
