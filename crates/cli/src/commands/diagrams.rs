use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use flowdoc_core::diagram::to_bundle;
use flowdoc_core::model::DiagramBundle;

use crate::commands::{load_document, print_json, write_json};
use crate::diagram_file_name;

/// Write `diagrams.json` plus one `.mmd` file per diagram into `out_dir`.
///
/// Returns the `.mmd` paths in bundle order.
pub fn write_bundle(bundle: &DiagramBundle, out_dir: &Path) -> Result<Vec<PathBuf>> {
    fs::create_dir_all(out_dir)
        .with_context(|| format!("Failed to create diagrams dir: {}", out_dir.display()))?;
    write_json(&out_dir.join("diagrams.json"), bundle)?;

    let mut written = Vec::with_capacity(bundle.diagrams.len());
    for (idx, diagram) in bundle.diagrams.iter().enumerate() {
        let path = out_dir.join(diagram_file_name(idx, &diagram.unit_id));
        fs::write(&path, &diagram.code)
            .with_context(|| format!("Failed to write diagram: {}", path.display()))?;
        written.push(path);
    }
    Ok(written)
}

/// Build diagrams for every unit of an analysis document.
pub fn diagrams_command(input: &str, out_dir: Option<&str>, json: bool) -> Result<()> {
    let doc = load_document(Path::new(input))?;
    let bundle = to_bundle(&doc);

    if let Some(dir) = out_dir {
        let written = write_bundle(&bundle, Path::new(dir))?;
        if json {
            return print_json(&bundle);
        }
        println!("Diagrams written to {} ({} file(s))", dir, written.len());
        for path in written {
            println!("- {}", path.display());
        }
        return Ok(());
    }

    if json {
        return print_json(&bundle);
    }

    if bundle.diagrams.is_empty() {
        println!("Diagrams: (none)");
        return Ok(());
    }
    for diagram in &bundle.diagrams {
        let ty = diagram.diagram_type.as_str();
        println!("%% {} ({}) [{}]", diagram.unit_name, diagram.unit_id, ty);
        println!("{}", diagram.code);
        println!();
    }
    Ok(())
}
