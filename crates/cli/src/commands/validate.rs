use std::path::Path;

use anyhow::{bail, Result};

use flowdoc_core::schema::{validate_document, SchemaValidator};

use crate::commands::load_document;

/// Validate an analysis document file; errors list every violation.
pub fn validate_command(input: &str) -> Result<()> {
    let doc = load_document(Path::new(input))?;
    match validate_document(&doc, &SchemaValidator) {
        Ok(()) => {
            println!("Valid: {} ({} unit(s))", input, doc.units.len());
            Ok(())
        }
        Err(violations) => {
            let lines: Vec<String> = violations.iter().map(|v| format!("  - {v}")).collect();
            bail!("Analysis document {} is invalid:\n{}", input, lines.join("\n"))
        }
    }
}
