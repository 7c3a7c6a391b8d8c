//! JSON export of decoded classes

use std::fs;
use std::path::Path;

use tracing::info;

use crate::error::Result;
use crate::registry::ClassMap;

/// Pretty-printed JSON object keyed by class name
pub fn to_json(classes: &ClassMap) -> Result<String> {
    Ok(serde_json::to_string_pretty(classes)?)
}

/// Write the class map to `path`
pub fn save_json<P: AsRef<Path>>(path: P, classes: &ClassMap) -> Result<()> {
    let content = to_json(classes)?;
    fs::write(&path, content)?;
    info!(
        "Saved {} classes to {}",
        classes.len(),
        path.as_ref().display()
    );
    Ok(())
}

/// Read a class map previously written by [`save_json`]
pub fn load_json<P: AsRef<Path>>(path: P) -> Result<ClassMap> {
    let content = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&content)?)
}
