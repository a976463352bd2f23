//! Rust bindings for the `tree-sitter-gloss` grammar.
//!
//! This follows the standard layout used by Tree-sitter grammars so that
//! consumers can link the generated parser and obtain a `tree_sitter::Language`
//! handle. When `src/parser.c` is not part of the build, the grammar can still
//! be bound from a compiled shared library at runtime.
//!
//! The [`check`] module provides the `CanLoadGrammar` check, which verifies
//! that whichever binding is in use actually yields a usable language:
//!
//! ```no_run
//! use tree_sitter_gloss::{check_can_load_grammar, GrammarBinding};
//!
//! let provider = GrammarBinding::from_env()?.provider()?;
//! let report = check_can_load_grammar(&provider)?;
//! assert!(report.passed());
//! # Ok::<(), tree_sitter_gloss::ProviderError>(())
//! ```

pub mod check;
pub mod config;
pub mod error;
pub mod provider;

#[cfg(all(test, unix))]
mod test_fixtures;

pub use check::{
    assert_can_load_grammar, check_can_load_grammar, CheckFailure, CheckReport, CheckRun,
    CheckState, CollectingReporter, FailureKind, Reporter, TracingReporter, CHECK_NAME,
    FAILURE_MESSAGE,
};
pub use config::{
    find_library, grammar_search_paths, library_candidates, run_configured_check, BoundGrammar,
    GrammarBinding,
};
pub use error::{IncompatibleLanguage, ProviderError};
#[cfg(gloss_parser)]
pub use provider::language;
pub use provider::{
    FnGrammar, GrammarProvider, LanguageHandle, LibraryGrammar, LinkedGrammar, LANGUAGE_NAME,
    SYMBOL,
};

#[cfg(test)]
mod tests {
    use super::*;

    fn init_tracing() {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    }

    #[cfg(gloss_parser)]
    #[test]
    fn test_can_load_grammar() {
        init_tracing();
        assert_can_load_grammar(&LinkedGrammar);
    }

    // Only meaningful when a compiled grammar library is supplied.
    #[test]
    fn test_can_load_grammar_library() {
        init_tracing();
        let Some(path) = std::env::var_os(config::LIBRARY_ENV) else {
            return;
        };
        let provider = LibraryGrammar::open(path).expect(FAILURE_MESSAGE);
        assert_can_load_grammar(&provider);
    }

    #[test]
    fn configured_run_matches_availability() {
        init_tracing();
        if std::env::var_os(config::LIBRARY_ENV).is_some() {
            return;
        }
        let run = run_configured_check(TracingReporter);
        assert_eq!(run.reports().len(), 1);
        if LinkedGrammar::is_available() {
            assert!(run.passed());
        }
    }
}
