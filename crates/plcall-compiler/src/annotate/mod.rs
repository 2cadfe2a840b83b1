//! Directive overlay.
//!
//! A directive file holds one directive per line, `name target[=>other]`,
//! with `#` starting a comment line:
//!
//! ```text
//! rename       PKG.GET_EMPLOYEE_DETAILS=>employee
//! private      PKG.INTERNAL_HELPER
//! replace      PKG.BULK_LOAD=>PKG.BULK_LOAD_XML
//! replace_json PKG.SEARCH=>PKG.SEARCH_JSON
//! handle       NO_DATA_FOUND
//! handle       PKG=>PKG.E_LOCKED
//! max-table-size PKG.BULK_LOAD=>1000
//! tag          PKG.SEARCH=>readonly
//! ```
//!
//! Targets are `NAME` or `PACKAGE.NAME`, case-insensitive; every overload
//! matches. `handle EXC` applies to all functions, `handle PKG=>EXC` to the
//! functions of one package.

#[cfg(test)]
mod annotate_tests;

use plcall_core::{BlobFormat, Function, Replacement};
use tracing::{debug, warn};

use crate::{Error, Result};

/// One parsed directive and the line it came from.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Directive {
    pub line: usize,
    pub action: Action,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Action {
    Rename {
        target: String,
        to: String,
    },
    /// Call `with` instead, passing the whole request as one blob.
    Replace {
        target: String,
        with: String,
        format: BlobFormat,
    },
    /// Drop from every generated output.
    Private {
        target: String,
    },
    /// Swallow `exception` around the call.
    Handle {
        package: Option<String>,
        exception: String,
    },
    MaxTableSize {
        target: String,
        size: usize,
    },
    Tag {
        target: String,
        tag: String,
    },
}

pub fn parse_directives(text: &str) -> Result<Vec<Directive>> {
    let mut directives = Vec::new();
    for (i, line) in text.lines().enumerate() {
        let line_no = i + 1;
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let err = |message: String| Error::Directive {
            line: line_no,
            message,
        };

        let (name, rest) = line
            .split_once(char::is_whitespace)
            .ok_or_else(|| err(format!("{line:?} has no target")))?;
        let rest = rest.trim();
        let (target, other) = match rest.split_once("=>") {
            Some((target, other)) => (target.trim(), Some(other.trim())),
            None => (rest, None),
        };
        if target.is_empty() || other.is_some_and(str::is_empty) {
            return Err(err(format!("{line:?} has an empty operand")));
        }
        let upper = target.to_ascii_uppercase();
        let need = |what: &str| other.ok_or_else(|| err(format!("{name} needs `=>{what}`")));

        let action = match name.to_ascii_lowercase().as_str() {
            "rename" => Action::Rename {
                target: upper,
                to: need("new-name")?.to_string(),
            },
            "replace" | "replace_json" => Action::Replace {
                target: upper,
                with: need("replacement")?.to_ascii_uppercase(),
                format: if name.eq_ignore_ascii_case("replace_json") {
                    BlobFormat::Json
                } else {
                    BlobFormat::Xml
                },
            },
            "private" if other.is_none() => Action::Private { target: upper },
            "private" => return Err(err("private takes no `=>` operand".to_string())),
            "handle" => match other {
                Some(exception) => Action::Handle {
                    package: Some(upper),
                    exception: exception.to_ascii_uppercase(),
                },
                None => Action::Handle {
                    package: None,
                    exception: upper,
                },
            },
            "max-table-size" | "max_table_size" => {
                let raw = need("size")?;
                let size = raw
                    .parse::<usize>()
                    .ok()
                    .filter(|n| *n > 0)
                    .ok_or_else(|| err(format!("invalid table size {raw:?}")))?;
                Action::MaxTableSize {
                    target: upper,
                    size,
                }
            }
            "tag" => Action::Tag {
                target: upper,
                tag: need("tag")?.to_string(),
            },
            other => return Err(err(format!("unknown directive {other:?}"))),
        };
        directives.push(Directive {
            line: line_no,
            action,
        });
    }
    debug!(directives = directives.len(), "parsed directives");
    Ok(directives)
}

fn matches(target: &str, function: &Function) -> bool {
    target == function.name || target == function.qualified_name()
}

/// Apply directives in file order. Private functions are removed last, so
/// they can still serve as replacement targets.
pub fn apply_directives(
    mut functions: Vec<Function>,
    directives: &[Directive],
) -> Result<Vec<Function>> {
    let mut private = Vec::new();

    for directive in directives {
        let hits = match &directive.action {
            Action::Rename { target, to } => {
                update(&mut functions, target, |f| f.alias = Some(to.clone()))
            }
            Action::Tag { target, tag } => update(&mut functions, target, |f| {
                if !f.tags.contains(tag) {
                    f.tags.push(tag.clone());
                }
            }),
            Action::MaxTableSize { target, size } => {
                update(&mut functions, target, |f| f.max_table_size = Some(*size))
            }
            Action::Handle { package, exception } => {
                let mut hits = 0;
                for function in functions
                    .iter_mut()
                    .filter(|f| package.as_ref().is_none_or(|p| f.package == *p))
                {
                    if !function.handles.contains(exception) {
                        function.handles.push(exception.clone());
                    }
                    hits += 1;
                }
                hits
            }
            Action::Replace {
                target,
                with,
                format,
            } => {
                let replacement = functions
                    .iter()
                    .find(|f| matches(with, f))
                    .cloned()
                    .ok_or_else(|| Error::Directive {
                        line: directive.line,
                        message: format!("replacement {with} not found"),
                    })?;
                update(&mut functions, target, |f| {
                    f.replacement = Some(Replacement {
                        function: Box::new(replacement.clone()),
                        format: *format,
                    })
                })
            }
            Action::Private { target } => {
                private.push(target.clone());
                functions.iter().filter(|f| matches(target, f)).count()
            }
        };

        if hits == 0 {
            warn!(line = directive.line, action = ?directive.action, "directive matched no function");
        }
    }

    functions.retain(|f| !private.iter().any(|target| matches(target, f)));
    Ok(functions)
}

fn update(functions: &mut [Function], target: &str, mut apply: impl FnMut(&mut Function)) -> usize {
    let mut hits = 0;
    for function in functions.iter_mut().filter(|f| matches(target, f)) {
        apply(function);
        hits += 1;
    }
    hits
}
