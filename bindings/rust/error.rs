use std::path::PathBuf;

use thiserror::Error;

/// Errors raised by a grammar provider before it can hand out a language.
///
/// These are distinct from a check failure: a provider that returns a null
/// language is reported by the check, while a provider that cannot run at all
/// surfaces one of these.
#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("gloss grammar is not linked into this build (src/parser.c was not compiled)")]
    NotLinked,

    #[error("gloss grammar library not found (searched: {})", display_paths(.searched))]
    NotFound { searched: Vec<PathBuf> },

    #[error("failed to load grammar library {}: {source}", .path.display())]
    Load {
        path: PathBuf,
        #[source]
        source: libloading::Error,
    },

    #[error("grammar library {} is missing symbol `{symbol}`: {source}", .path.display())]
    MissingSymbol {
        path: PathBuf,
        symbol: &'static str,
        #[source]
        source: libloading::Error,
    },
}

/// A language whose ABI version the linked tree-sitter runtime cannot use.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("incompatible language ABI version {version} (supported {min}..={max})")]
pub struct IncompatibleLanguage {
    pub version: usize,
    pub min: usize,
    pub max: usize,
}

fn display_paths(paths: &[PathBuf]) -> String {
    if paths.is_empty() {
        return "<none>".to_string();
    }
    paths
        .iter()
        .map(|p| p.display().to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_lists_searched_paths() {
        let err = ProviderError::NotFound {
            searched: vec![PathBuf::from("/a/gloss.so"), PathBuf::from("/b/gloss.so")],
        };
        assert_eq!(
            err.to_string(),
            "gloss grammar library not found (searched: /a/gloss.so, /b/gloss.so)"
        );
    }

    #[test]
    fn not_found_with_no_paths() {
        let err = ProviderError::NotFound { searched: vec![] };
        assert!(err.to_string().ends_with("(searched: <none>)"));
    }
}
