//! Generate Markdown reference docs from `dbsetup_core::lang` registries.
//!
//! This binary renders the marker and error-kind registries into `docs/reference/markers.md`.
//!
//! ## Notes
//! - The generated file is a derived artifact. Do not edit it by hand; update the registries instead.
//!
//! ## Examples
//! Run from the workspace root:
//! ```bash
//! cargo run -p dbsetup_core --bin generate_marker_reference
//! ```
//!
//! ## Panics
//! - If the workspace root cannot be resolved.
//! - If the output file cannot be written.

use std::fs;
use std::path::{Path, PathBuf};

use dbsetup_core::lang::errors::{self, ErrorClass};
use dbsetup_core::lang::markers;

fn main() {
    let root = workspace_root();

    let out_dir = root.join("docs/reference");
    fs::create_dir_all(&out_dir).expect("create docs/reference/");

    write_marker_reference(&out_dir.join("markers.md"));
}

/// Write `docs/reference/markers.md`.
fn write_marker_reference(path: &Path) {
    let mut out = String::new();
    out.push_str("# dbsetup marker reference\n\n");
    out.push_str("> Generated file. Regenerate it from the registries instead of editing it.\n\n");

    out.push_str("## Markers\n\n");
    out.push_str(&format!(
        "All markers are written as `#[{}(...)]` on a test-class member.\n\n",
        markers::ATTRIBUTE
    ));
    out.push_str("| Marker | Aliases | Target | Arguments | Description |\n");
    out.push_str("|---|---|---|---|---|\n");
    for m in markers::MARKERS {
        out.push_str(&format!(
            "| `{}` | {} | {} | {} | {} |\n",
            m.item.canonical,
            code_list(m.item.aliases),
            m.target.as_str(),
            code_list(m.args),
            m.item.description
        ));
    }

    for m in markers::MARKERS.iter().filter(|m| !m.item.examples.is_empty()) {
        out.push_str(&format!("\n### `{}`\n", m.item.canonical));
        for ex in m.item.examples {
            out.push_str("\n```rust\n");
            out.push_str(ex.code);
            out.push_str("\n```\n");
            if let Some(note) = ex.note {
                out.push_str(&format!("\n{note}\n"));
            }
        }
    }

    out.push_str("\n## Error kinds\n\n");
    out.push_str("| Code | Detected | Description |\n");
    out.push_str("|---|---|---|\n");
    for e in errors::ERROR_KINDS {
        let detected = match e.class {
            ErrorClass::Validation => "post-process",
            ErrorClass::Runtime => "invocation",
        };
        out.push_str(&format!(
            "| `dbsetup::{}` | {} | {} |\n",
            e.item.canonical, detected, e.item.description
        ));
    }

    fs::write(path, out).expect("write markers.md");
}

fn code_list(items: &[&str]) -> String {
    if items.is_empty() {
        return "-".to_string();
    }
    items.iter().map(|s| format!("`{s}`")).collect::<Vec<_>>().join(", ")
}

fn workspace_root() -> PathBuf {
    let manifest_dir = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    manifest_dir
        .parent()
        .and_then(Path::parent)
        .map(Path::to_path_buf)
        .expect("resolve workspace root from crates/dbsetup_core")
}
