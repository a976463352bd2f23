use std::path::PathBuf;

fn main() {
    let src_dir = PathBuf::from("src");
    let parser_path = src_dir.join("parser.c");
    let scanner_path = src_dir.join("scanner.c");

    println!("cargo:rustc-check-cfg=cfg(gloss_parser)");

    // Test fixtures compile small grammar libraries for the same target.
    let target = std::env::var("TARGET").unwrap_or_default();
    let host = std::env::var("HOST").unwrap_or_default();
    println!("cargo:rustc-env=GLOSS_BUILD_TARGET={target}");
    println!("cargo:rustc-env=GLOSS_BUILD_HOST={host}");
    println!("cargo:rerun-if-changed={}", parser_path.display());
    println!("cargo:rerun-if-changed={}", scanner_path.display());

    // The generated parser is produced by `tree-sitter generate` from grammar.js.
    // Without it the crate still builds and the grammar must come from a
    // compiled shared library at runtime.
    if !parser_path.exists() {
        println!(
            "cargo:warning=tree-sitter-gloss: {} not found, linked grammar disabled",
            parser_path.display()
        );
        return;
    }

    let mut c_config = cc::Build::new();
    c_config
        .std("c11")
        .include(&src_dir)
        .warnings(false)
        .flag_if_supported("-Wno-unused-parameter")
        .flag_if_supported("-Wno-unused-but-set-variable")
        .flag_if_supported("-Wno-trigraphs");

    c_config.file(&parser_path);
    if scanner_path.exists() {
        c_config.file(&scanner_path);
    }

    c_config.compile("tree-sitter-gloss");

    println!("cargo:rustc-cfg=gloss_parser");
}
