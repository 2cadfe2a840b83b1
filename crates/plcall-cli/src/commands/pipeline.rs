//! Shared front half of every command: rows, type graph, directives.

use std::collections::BTreeMap;
use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};

use plcall_compiler::{
    FunctionFilter, GraphConfig, MemoryCatalog, Result, Snapshot, TypeGraph, apply_directives,
    build_functions, parse_directives, read_arg_rows, read_type_rows,
};
use plcall_core::Function;
use tracing::{debug, info};

pub struct Inputs {
    pub rows_path: PathBuf,
    pub directives: Option<PathBuf>,
    pub types: Option<PathBuf>,
    pub snapshot: Option<PathBuf>,
    pub owner: String,
    pub only: Vec<String>,
    pub skip: Vec<String>,
}

/// Annotated functions and the type graph that resolved them.
pub struct Loaded {
    pub functions: Vec<Function>,
    pub graph: TypeGraph<MemoryCatalog>,
}

impl Loaded {
    /// Functions grouped per package, packages in name order.
    pub fn by_package(&self) -> BTreeMap<String, Vec<Function>> {
        let mut packages: BTreeMap<String, Vec<Function>> = BTreeMap::new();
        for function in &self.functions {
            packages
                .entry(function.package.clone())
                .or_default()
                .push(function.clone());
        }
        packages
    }
}

pub fn load(inputs: &Inputs) -> Result<Loaded> {
    let rows = read_arg_rows(open(&inputs.rows_path)?)?;

    let mut catalog = MemoryCatalog::new(&inputs.owner);
    if let Some(path) = &inputs.types {
        catalog = catalog.with_type_rows(read_type_rows(open(path)?)?)?;
    }
    let graph = match &inputs.snapshot {
        Some(path) => {
            let snapshot = read_snapshot(path)?;
            debug!(types = snapshot.types.len(), path = %path.display(), "loaded snapshot");
            TypeGraph::with_snapshot(catalog, GraphConfig::new(), snapshot)
        }
        None => TypeGraph::new(catalog),
    };
    let types = graph.names(None)?;
    debug!(types = types.len(), "resolved catalog types");

    let mut filter = FunctionFilter::all();
    for name in &inputs.only {
        filter = filter.only(name);
    }
    for name in &inputs.skip {
        filter = filter.skip(name);
    }

    let mut functions = build_functions(rows, &filter, Some(&graph))?;
    if let Some(path) = &inputs.directives {
        let directives = parse_directives(&fs::read_to_string(path)?)?;
        functions = apply_directives(functions, &directives)?;
    }

    info!(functions = functions.len(), "loaded functions");
    Ok(Loaded { functions, graph })
}

pub fn read_snapshot(path: &Path) -> Result<Snapshot> {
    if is_json(path) {
        Snapshot::from_json(&fs::read_to_string(path)?)
    } else {
        Snapshot::from_binary(&fs::read(path)?)
    }
}

pub fn write_snapshot(path: &Path, snapshot: &Snapshot) -> Result<()> {
    if is_json(path) {
        fs::write(path, snapshot.to_json()?)?;
    } else {
        fs::write(path, snapshot.to_binary())?;
    }
    info!(types = snapshot.types.len(), path = %path.display(), "wrote snapshot");
    Ok(())
}

/// Write `contents` to `dir/file_name`, or to stdout without a directory.
pub fn emit(dir: Option<&Path>, file_name: &str, contents: &str) -> Result<()> {
    match dir {
        Some(dir) => {
            fs::create_dir_all(dir)?;
            let path = dir.join(file_name);
            fs::write(&path, contents)?;
            debug!(path = %path.display(), bytes = contents.len(), "wrote");
        }
        None => print!("{contents}"),
    }
    Ok(())
}

/// Output file stem for a package.
pub fn file_stem(package: &str) -> String {
    if package.is_empty() {
        "standalone".to_string()
    } else {
        package.to_ascii_lowercase()
    }
}

fn open(path: &Path) -> Result<Box<dyn Read>> {
    if path.as_os_str() == "-" {
        let mut buf = Vec::new();
        io::stdin().read_to_end(&mut buf)?;
        return Ok(Box::new(io::Cursor::new(buf)));
    }
    Ok(Box::new(fs::File::open(path)?))
}

fn is_json(path: &Path) -> bool {
    path.extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"))
}
