//! Grammar providers.
//!
//! A provider is anything that can hand out the Gloss [`Language`]: the
//! grammar linked into this crate, a compiled shared library opened at
//! runtime, or a closure standing in for either.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use libloading::Library;
use parking_lot::Mutex;
use tracing::debug;
use tree_sitter::ffi::TSLanguage;
use tree_sitter::{Language, Parser, LANGUAGE_VERSION, MIN_COMPATIBLE_LANGUAGE_VERSION};

use crate::error::{IncompatibleLanguage, ProviderError};

/// The name of the grammar, as given in `grammar.js`.
pub const LANGUAGE_NAME: &str = "gloss";

/// The C symbol exported by the generated parser.
pub const SYMBOL: &str = "tree_sitter_gloss";

const SYMBOL_NUL: &[u8] = b"tree_sitter_gloss\0";

type LanguageFn = unsafe extern "C" fn() -> *const TSLanguage;

#[cfg(gloss_parser)]
extern "C" {
    fn tree_sitter_gloss() -> *const TSLanguage;
}

/// An opaque handle to a loaded grammar.
///
/// The only thing a check needs from a handle is whether it is empty, and
/// whether a parser will accept it.
pub trait LanguageHandle {
    fn is_empty(&self) -> bool;

    /// Hands the language to a fresh parser.
    fn attach(&self) -> Result<(), IncompatibleLanguage> {
        Ok(())
    }
}

impl LanguageHandle for Option<Language> {
    fn is_empty(&self) -> bool {
        self.is_none()
    }

    fn attach(&self) -> Result<(), IncompatibleLanguage> {
        let Some(language) = self else {
            return Ok(());
        };
        Parser::new()
            .set_language(language)
            .map_err(|_| IncompatibleLanguage {
                version: language.version(),
                min: MIN_COMPATIBLE_LANGUAGE_VERSION,
                max: LANGUAGE_VERSION,
            })
    }
}

impl<T> LanguageHandle for *const T {
    fn is_empty(&self) -> bool {
        self.is_null()
    }
}

/// A source of the Gloss language.
pub trait GrammarProvider {
    type Handle: LanguageHandle;

    /// Short name of the binding, used in reports and logs.
    fn binding(&self) -> &str;

    /// Requests a language handle. Called once per check.
    fn language(&self) -> Result<Self::Handle, ProviderError>;
}

impl<P: GrammarProvider + ?Sized> GrammarProvider for &P {
    type Handle = P::Handle;

    fn binding(&self) -> &str {
        (**self).binding()
    }

    fn language(&self) -> Result<Self::Handle, ProviderError> {
        (**self).language()
    }
}

fn into_language(raw: *const TSLanguage) -> Option<Language> {
    if raw.is_null() {
        None
    } else {
        // SAFETY: non-null pointers returned by a tree-sitter language
        // function point at a static `TSLanguage`.
        Some(unsafe { Language::from_raw(raw) })
    }
}

/// Returns the tree-sitter [`Language`] for this grammar.
#[cfg(gloss_parser)]
pub fn language() -> Language {
    unsafe { Language::from_raw(tree_sitter_gloss()) }
}

/// The grammar compiled into this crate by `build.rs`.
#[derive(Debug, Clone, Copy, Default)]
pub struct LinkedGrammar;

impl LinkedGrammar {
    /// Whether `src/parser.c` was compiled into this build.
    pub const fn is_available() -> bool {
        cfg!(gloss_parser)
    }
}

impl GrammarProvider for LinkedGrammar {
    type Handle = Option<Language>;

    fn binding(&self) -> &str {
        "linked"
    }

    #[cfg(gloss_parser)]
    fn language(&self) -> Result<Self::Handle, ProviderError> {
        Ok(into_language(unsafe { tree_sitter_gloss() }))
    }

    #[cfg(not(gloss_parser))]
    fn language(&self) -> Result<Self::Handle, ProviderError> {
        Err(ProviderError::NotLinked)
    }
}

/// Grammar libraries opened by this process, keyed by canonical path.
///
/// Libraries are never unloaded: every `Language` handed out points into one
/// of them and may live for the rest of the process.
static LOADED: OnceLock<Mutex<HashMap<PathBuf, &'static Library>>> = OnceLock::new();

fn load_library(path: &Path) -> Result<&'static Library, ProviderError> {
    let key = path.canonicalize().unwrap_or_else(|_| path.to_path_buf());
    let mut loaded = LOADED.get_or_init(|| Mutex::new(HashMap::new())).lock();
    if let Some(&library) = loaded.get(&key) {
        return Ok(library);
    }

    // SAFETY: loading a grammar library runs no initialisers beyond those
    // of the generated C parser.
    let library = unsafe { Library::new(path) }.map_err(|source| ProviderError::Load {
        path: path.to_path_buf(),
        source,
    })?;
    let library: &'static Library = Box::leak(Box::new(library));
    loaded.insert(key, library);
    Ok(library)
}

/// The grammar loaded from a compiled shared library.
///
/// The library stays mapped until the process exits, so languages returned
/// by [`GrammarProvider::language`] may outlive this value.
#[derive(Debug)]
pub struct LibraryGrammar {
    binding: String,
    language_fn: LanguageFn,
}

impl LibraryGrammar {
    /// Opens the library at `path` and resolves the language symbol.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, ProviderError> {
        let path = path.into();
        if !path.is_file() {
            return Err(ProviderError::NotFound {
                searched: vec![path],
            });
        }

        let library = load_library(&path)?;
        let symbol = unsafe { library.get::<LanguageFn>(SYMBOL_NUL) }.map_err(|source| {
            ProviderError::MissingSymbol {
                path: path.clone(),
                symbol: SYMBOL,
                source,
            }
        })?;
        let language_fn = *symbol;

        debug!(path = %path.display(), symbol = SYMBOL, "loaded grammar library");
        Ok(Self {
            binding: format!("library:{}", path.display()),
            language_fn,
        })
    }
}

impl GrammarProvider for LibraryGrammar {
    type Handle = Option<Language>;

    fn binding(&self) -> &str {
        &self.binding
    }

    fn language(&self) -> Result<Self::Handle, ProviderError> {
        Ok(into_language(unsafe { (self.language_fn)() }))
    }
}

/// A provider backed by a closure.
pub struct FnGrammar<F> {
    binding: String,
    f: F,
}

impl<F, H> FnGrammar<F>
where
    F: Fn() -> Result<H, ProviderError>,
    H: LanguageHandle,
{
    pub fn new(binding: impl Into<String>, f: F) -> Self {
        Self {
            binding: binding.into(),
            f,
        }
    }
}

impl<F, H> GrammarProvider for FnGrammar<F>
where
    F: Fn() -> Result<H, ProviderError>,
    H: LanguageHandle,
{
    type Handle = H;

    fn binding(&self) -> &str {
        &self.binding
    }

    fn language(&self) -> Result<H, ProviderError> {
        (self.f)()
    }
}
