//! Turning resolved types into argument subtrees.

use plcall_core::{ArgType, Argument, CanonicalName, Direction, IndexBy, TypeDef, TypeRef};

use super::{Cache, TypeGraph};
use crate::argtree::TypeLookup;
use crate::catalog::Catalog;
use crate::{Error, Result};

impl<C: Catalog> TypeGraph<C> {
    /// Resolve `reference` and unfold it into an [`ArgType`] whose every
    /// node carries `direction`. Self-referencing types cannot be unfolded.
    pub fn expand(&self, reference: &str, direction: Direction) -> Result<ArgType> {
        let node = self.get(reference)?;
        let cache = self.cache.read();
        let mut stack = Vec::new();
        expand_def(&cache, &node.name, &node.def, direction, &mut stack)
    }
}

impl<C: Catalog> TypeLookup for TypeGraph<C> {
    fn lookup(&self, reference: &str, direction: Direction) -> Result<ArgType> {
        self.expand(reference, direction)
    }
}

fn expand_def(
    cache: &Cache,
    name: &CanonicalName,
    def: &TypeDef,
    direction: Direction,
    stack: &mut Vec<CanonicalName>,
) -> Result<ArgType> {
    if stack.contains(name) {
        return Err(Error::not_supported(
            name.to_string(),
            "recursive type cannot be passed as an argument",
        ));
    }
    stack.push(name.clone());

    let ty = match def {
        TypeDef::Scalar(scalar) => ArgType::Simple(scalar.clone()),
        TypeDef::Record(fields) => {
            let mut args = Vec::with_capacity(fields.len());
            for (i, field) in fields.iter().enumerate() {
                let ty = expand_ref(cache, &field.ty, direction, stack)?;
                args.push(Argument::new(&field.name, direction, ty).at(i as u32 + 1));
            }
            ArgType::Record {
                type_name: Some(name.to_string()),
                fields: args,
            }
        }
        TypeDef::Collection { elem, index_by } => {
            let ty = expand_ref(cache, elem, direction, stack)?;
            ArgType::Table {
                type_name: Some(name.to_string()),
                elem: Some(Box::new(Argument::new("", direction, ty).at(1))),
                nested: !matches!(index_by, Some(IndexBy::Integer)),
                cursor: false,
            }
        }
    };

    stack.pop();
    Ok(ty)
}

fn expand_ref(
    cache: &Cache,
    ty: &TypeRef,
    direction: Direction,
    stack: &mut Vec<CanonicalName>,
) -> Result<ArgType> {
    match ty {
        TypeRef::Scalar(scalar) => Ok(ArgType::Simple(scalar.clone())),
        TypeRef::Named(key) => {
            let node = cache
                .resolved(key)
                .ok_or_else(|| Error::UnknownType(key.to_string()))?;
            expand_def(cache, &node.name, &node.def, direction, stack)
        }
    }
}
