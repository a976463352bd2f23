//! Binding selection.
//!
//! Decides which provider a check binds to: the grammar linked into this
//! crate, or a compiled grammar library on disk.

use std::ffi::OsString;
use std::path::{Path, PathBuf};

use tracing::debug;
use tree_sitter::Language;

use crate::check::{CheckRun, Reporter};
use crate::error::ProviderError;
use crate::provider::{GrammarProvider, LibraryGrammar, LinkedGrammar, LANGUAGE_NAME};

/// Path of a grammar library to load instead of the linked grammar.
pub const LIBRARY_ENV: &str = "TREE_SITTER_GLOSS_LIBRARY";

/// Runtime directory searched first for `grammars/`.
pub const RUNTIME_ENV: &str = "TREE_SITTER_GLOSS_RUNTIME";

/// Which provider to bind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GrammarBinding {
    Linked,
    Library(PathBuf),
}

impl GrammarBinding {
    /// Resolves the binding from the process environment.
    ///
    /// Fails with [`ProviderError::NotFound`] when the grammar is not linked
    /// and no library exists in the search paths.
    pub fn from_env() -> Result<Self, ProviderError> {
        Self::from_lookup(|key| std::env::var_os(key), LinkedGrammar::is_available())
    }

    fn from_lookup(
        lookup: impl Fn(&str) -> Option<OsString>,
        linked: bool,
    ) -> Result<Self, ProviderError> {
        if let Some(path) = lookup(LIBRARY_ENV).filter(|p| !p.is_empty()) {
            return Ok(Self::Library(PathBuf::from(path)));
        }
        if linked {
            return Ok(Self::Linked);
        }
        find_library(&search_paths_with(&lookup)).map(Self::Library)
    }

    /// Builds the provider for this binding.
    pub fn provider(&self) -> Result<BoundGrammar, ProviderError> {
        debug!(binding = ?self, "binding gloss grammar");
        match self {
            Self::Linked => Ok(BoundGrammar::Linked(LinkedGrammar)),
            Self::Library(path) => LibraryGrammar::open(path).map(BoundGrammar::Library),
        }
    }

    pub fn name(&self) -> String {
        match self {
            Self::Linked => "linked".to_string(),
            Self::Library(path) => format!("library:{}", path.display()),
        }
    }
}

/// A provider chosen at runtime.
#[derive(Debug)]
pub enum BoundGrammar {
    Linked(LinkedGrammar),
    Library(LibraryGrammar),
}

impl GrammarProvider for BoundGrammar {
    type Handle = Option<Language>;

    fn binding(&self) -> &str {
        match self {
            Self::Linked(linked) => linked.binding(),
            Self::Library(library) => library.binding(),
        }
    }

    fn language(&self) -> Result<Self::Handle, ProviderError> {
        match self {
            Self::Linked(linked) => linked.language(),
            Self::Library(library) => library.language(),
        }
    }
}

/// Returns directories searched for compiled grammar libraries.
///
/// Order: `$TREE_SITTER_GLOSS_RUNTIME/grammars`, the tree-sitter CLI cache,
/// the user config dir, then `grammars/` next to the executable.
pub fn grammar_search_paths() -> Vec<PathBuf> {
    search_paths_with(|key| std::env::var_os(key))
}

fn search_paths_with(lookup: impl Fn(&str) -> Option<OsString>) -> Vec<PathBuf> {
    let mut paths = Vec::new();

    if let Some(runtime) = lookup(RUNTIME_ENV).filter(|p| !p.is_empty()) {
        paths.push(PathBuf::from(runtime).join("grammars"));
    }

    // `tree-sitter build` and the CLI loader cache compiled grammars here.
    if let Some(cache) = dirs::cache_dir() {
        paths.push(cache.join("tree-sitter").join("lib"));
    }

    if let Some(config) = dirs::config_dir() {
        paths.push(config.join("tree-sitter-gloss").join("grammars"));
    }

    if let Ok(exe) = std::env::current_exe() {
        if let Some(dir) = exe.parent() {
            paths.push(dir.join("grammars"));
        }
    }

    paths
}

/// File names a compiled gloss grammar may have inside `dir`.
pub fn library_candidates(dir: &Path) -> Vec<PathBuf> {
    vec![
        dir.join(format!("{LANGUAGE_NAME}.{}", std::env::consts::DLL_EXTENSION)),
        dir.join(libloading::library_filename("tree-sitter-gloss")),
    ]
}

/// Returns the first existing grammar library in `dirs`.
pub fn find_library(dirs: &[PathBuf]) -> Result<PathBuf, ProviderError> {
    let mut searched = Vec::new();
    for dir in dirs {
        for candidate in library_candidates(dir) {
            if candidate.is_file() {
                return Ok(candidate);
            }
            searched.push(candidate);
        }
    }
    Err(ProviderError::NotFound { searched })
}

/// Binds the grammar from the environment and runs the load check once.
pub fn run_configured_check<R: Reporter>(reporter: R) -> CheckRun<R> {
    let mut run = CheckRun::new(reporter);
    let binding = match GrammarBinding::from_env() {
        Ok(binding) => binding,
        Err(err) => {
            run.record_provider_error("unbound", &err);
            return run;
        }
    };
    match binding.provider() {
        Ok(provider) => {
            run.run(&provider);
        }
        Err(err) => {
            run.record_provider_error(&binding.name(), &err);
        }
    }
    run
}
