//! The compile pipeline: lex, parse, merge imports, resolve, fold.
//!
//! The pipeline itself performs no I/O. Imported files are fetched
//! through a caller-supplied [`SourceLoader`]; the default [`FsLoader`]
//! reads from disk, tests substitute an in-memory map. A failed load
//! degrades to a diagnostic on the import statement and compilation of
//! the importing file continues.

use crate::ast::{CompilationUnit, Declaration};
use crate::error::{CompileError, ErrorKind, Severity};
use crate::foundation::SourceMap;
use crate::{lexer, parser, resolve};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Error produced when an imported source cannot be fetched.
#[derive(Debug, Error)]
pub enum LoadError {
    /// Underlying read failure
    #[error("failed to read '{path}': {source}")]
    Io {
        /// Path that failed to load
        path: PathBuf,
        /// Underlying I/O error
        source: std::io::Error,
    },
    /// Loader has no entry for the path (in-memory loaders)
    #[error("no source registered for '{path}'")]
    NotFound {
        /// Path that was requested
        path: PathBuf,
    },
}

/// Source of imported files.
pub trait SourceLoader {
    /// Fetch the source text for `path`.
    fn load(&self, path: &Path) -> Result<String, LoadError>;
}

/// Loader reading from the file system.
pub struct FsLoader;

impl SourceLoader for FsLoader {
    fn load(&self, path: &Path) -> Result<String, LoadError> {
        std::fs::read_to_string(path).map_err(|source| LoadError::Io {
            path: path.to_path_buf(),
            source,
        })
    }
}

/// In-memory loader keyed by exact path, for tests and embedding.
#[derive(Default)]
pub struct MemoryLoader {
    files: indexmap::IndexMap<PathBuf, String>,
}

impl MemoryLoader {
    /// Create an empty loader.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a source file.
    pub fn insert(&mut self, path: impl Into<PathBuf>, source: impl Into<String>) {
        self.files.insert(path.into(), source.into());
    }
}

impl SourceLoader for MemoryLoader {
    fn load(&self, path: &Path) -> Result<String, LoadError> {
        self.files
            .get(path)
            .cloned()
            .ok_or_else(|| LoadError::NotFound {
                path: path.to_path_buf(),
            })
    }
}

/// Everything the pipeline produces for one root file.
pub struct CompileOutput {
    /// Root declarations plus imported helper blocks
    pub unit: CompilationUnit,
    /// All files that took part, for span resolution
    pub sources: SourceMap,
    /// Diagnostics from every stage, in stage order
    pub diagnostics: Vec<CompileError>,
}

impl CompileOutput {
    /// True if any diagnostic has Error severity. Warnings and notes
    /// never fail a compile.
    pub fn has_errors(&self) -> bool {
        self.diagnostics
            .iter()
            .any(|d| d.severity == Severity::Error)
    }

    /// Pretty JSON rendering of the IR, for inspection tooling.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(&self.unit)
    }
}

/// Compile one source file, loading imports from the file system.
pub fn compile(path: impl Into<PathBuf>, source: String) -> CompileOutput {
    compile_with_loader(path, source, &FsLoader)
}

/// Compile one source file with a custom import loader.
pub fn compile_with_loader(
    path: impl Into<PathBuf>,
    source: String,
    loader: &dyn SourceLoader,
) -> CompileOutput {
    let path = path.into();
    let mut sources = SourceMap::new();
    let mut diagnostics = Vec::new();

    let mut unit = parse_file(path.clone(), source, &mut sources, &mut diagnostics);

    merge_imports(&mut unit, &path, loader, &mut sources, &mut diagnostics);

    let name_diags = resolve::resolve(&unit);
    tracing::debug!(count = name_diags.len(), "name resolution finished");
    diagnostics.extend(name_diags);

    let fold_diags = resolve::fold_units(&mut unit);
    tracing::debug!(count = fold_diags.len(), "unit folding finished");
    diagnostics.extend(fold_diags);

    CompileOutput {
        unit,
        sources,
        diagnostics,
    }
}

/// Lex and parse one file into a compilation unit.
fn parse_file(
    path: PathBuf,
    source: String,
    sources: &mut SourceMap,
    diagnostics: &mut Vec<CompileError>,
) -> CompilationUnit {
    tracing::debug!(path = %path.display(), bytes = source.len(), "compiling");
    let file_id = sources.file_count() as u16;

    let lexed = lexer::tokenize(&source, file_id);
    tracing::debug!(tokens = lexed.tokens.len(), "lexed");
    diagnostics.extend(lexed.diagnostics);

    let (unit, parse_errors) = parser::parse_unit(&lexed.tokens, &lexed.spans, file_id);
    tracing::debug!(
        decls = unit.decls.len(),
        errors = parse_errors.len(),
        "parsed"
    );
    diagnostics.extend(parse_errors.into_iter().map(|e| e.into_diagnostic()));

    sources.add_file(path, source);
    unit
}

/// Load each import transitively and append its helper blocks to the
/// root unit. Paths resolve relative to the importing file's directory;
/// a path is loaded at most once.
fn merge_imports(
    unit: &mut CompilationUnit,
    root_path: &Path,
    loader: &dyn SourceLoader,
    sources: &mut SourceMap,
    diagnostics: &mut Vec<CompileError>,
) {
    let mut visited: HashSet<PathBuf> = HashSet::new();
    visited.insert(root_path.to_path_buf());

    // (importing file's directory, import decl)
    let mut worklist: Vec<(PathBuf, crate::ast::ImportDecl)> = unit
        .imports()
        .map(|i| (parent_dir(root_path), i.clone()))
        .collect();

    while let Some((base_dir, import)) = worklist.pop() {
        let target = base_dir.join(&import.path);
        if !visited.insert(target.clone()) {
            continue;
        }

        let source = match loader.load(&target) {
            Ok(source) => source,
            Err(err) => {
                tracing::debug!(path = %target.display(), %err, "import load failed");
                diagnostics.push(CompileError::new(
                    ErrorKind::Load,
                    import.span,
                    format!("cannot load import '{}': {}", import.alias, err),
                ));
                continue;
            }
        };

        let imported = parse_file(target.clone(), source, sources, diagnostics);
        let imported_dir = parent_dir(&target);
        for decl in imported.decls {
            match decl {
                Declaration::Helpers(block) => {
                    unit.decls.push(Declaration::Helpers(block));
                }
                Declaration::Import(nested) => {
                    worklist.push((imported_dir.clone(), nested));
                }
                // only helper blocks cross file boundaries
                _ => {}
            }
        }
    }
}

fn parent_dir(path: &Path) -> PathBuf {
    path.parent().map(Path::to_path_buf).unwrap_or_default()
}
