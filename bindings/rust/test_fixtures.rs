//! Tiny grammar libraries compiled on the fly for library-loading tests.
//!
//! The fixtures export a `TSLanguage`-shaped blob whose only non-zero field is
//! the ABI version, which is all a parser reads before accepting a language.

use std::path::{Path, PathBuf};

use tree_sitter::LANGUAGE_VERSION;

#[derive(Debug, Clone, Copy)]
pub(crate) enum Fixture {
    /// Returns a language with the runtime's own ABI version.
    Compatible,
    /// Returns a language with the given ABI version.
    AbiVersion(usize),
    /// `tree_sitter_gloss` returns null.
    Null,
    /// Exports no `tree_sitter_gloss` symbol at all.
    NoSymbol,
}

impl Fixture {
    fn source(self) -> String {
        let language = |version: usize| {
            format!(
                "static const struct {{ unsigned int version; unsigned char rest[1024]; }} \
                 language = {{ {version} }};\n\
                 const void *tree_sitter_gloss(void) {{ return &language; }}\n"
            )
        };
        match self {
            Self::Compatible => language(LANGUAGE_VERSION),
            Self::AbiVersion(version) => language(version),
            Self::Null => "const void *tree_sitter_gloss(void) { return 0; }\n".to_string(),
            Self::NoSymbol => "int tree_sitter_other(void) { return 0; }\n".to_string(),
        }
    }
}

/// Compiles `fixture` into a shared library inside `dir` and returns its path.
pub(crate) fn grammar_library(dir: &Path, fixture: Fixture) -> PathBuf {
    let src = dir.join("fixture.c");
    let out = dir.join(format!("gloss.{}", std::env::consts::DLL_EXTENSION));
    std::fs::write(&src, fixture.source()).unwrap();

    let compiler = cc::Build::new()
        .target(env!("GLOSS_BUILD_TARGET"))
        .host(env!("GLOSS_BUILD_HOST"))
        .opt_level(0)
        .debug(false)
        .cargo_metadata(false)
        .warnings(false)
        .get_compiler();

    let output = compiler
        .to_command()
        .arg("-shared")
        .arg("-fPIC")
        .arg("-o")
        .arg(&out)
        .arg(&src)
        .output()
        .unwrap();
    assert!(
        output.status.success(),
        "failed to compile {fixture:?} fixture: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    out
}
