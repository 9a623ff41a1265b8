use std::fs;
use std::path::Path;

use anyhow::Result;
use tracing::debug;

use flowdoc_core::detect::detect;

use crate::commands::print_json;

/// Detect the language of `path`.
///
/// The file content is consulted when the path is readable as UTF-8; otherwise
/// only the extension is used.
pub fn detect_command(path: &str, json: bool) -> Result<()> {
    let content = match fs::read_to_string(Path::new(path)) {
        Ok(body) => Some(body),
        Err(err) => {
            debug!(path, error = %err, "content unavailable; detecting by path only");
            None
        }
    };
    let detection = detect(path, content.as_deref());

    if json {
        return print_json(&detection);
    }

    println!("Path: {}", path);
    println!("Language: {}", detection.language);
    println!("Method: {}", detection.method.as_str());
    println!("Confidence: {:.2}", detection.confidence);
    Ok(())
}
