//! Layering guardrails for the vocabulary crate.
//!
//! `dbsetup_core` is shared by the runtime engine and the proc-macro crate, so it must stay dependency-free.
//! This test scans `crates/dbsetup_core/Cargo.toml` and fails if anything appears in `[dependencies]`.

fn dependency_lines(manifest: &str) -> Vec<String> {
    let mut in_dependencies = false;
    let mut lines = Vec::new();

    for raw_line in manifest.lines() {
        let line = raw_line.trim();
        if line.starts_with('[') {
            in_dependencies = line == "[dependencies]";
            continue;
        }
        if !in_dependencies || line.is_empty() || line.starts_with('#') {
            continue;
        }
        lines.push(line.to_string());
    }
    lines
}

#[test]
fn vocabulary_crate_has_no_dependencies() {
    let manifest = include_str!("../crates/dbsetup_core/Cargo.toml");
    let deps = dependency_lines(manifest);
    assert!(deps.is_empty(), "`dbsetup_core` must not depend on other crates; found {deps:?}");
}

#[test]
fn derive_crate_does_not_depend_on_runtime() {
    let manifest = include_str!("../crates/dbsetup_derive/Cargo.toml");
    for line in dependency_lines(manifest) {
        let name = line.split(['=', ' ']).next().unwrap_or("");
        assert_ne!(name, "dbsetup", "the derive crate must not depend on the runtime crate");
    }
}
