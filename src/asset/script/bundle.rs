//! Concatenation and the index source map.
//!
//! The bundle map is a Source Map v3 *index map*: one section per unit,
//! each offset to the line the unit starts on and embedding that unit's own
//! map. Units are joined with `;\n`, so every unit starts at column 0.

use serde_json::{Value, json};

use super::CompiledUnit;

/// Separator between units; the `;` guards against missing semicolons.
const SEPARATOR: &str = ";\n";

/// Concatenated code and its index map (JSON).
#[derive(Debug)]
pub struct Bundle {
    pub code: String,
    pub map: Option<String>,
}

/// Join `units` in order. Empty units are dropped.
///
/// With `map_url`, an index map is produced and referenced from a trailing
/// `sourceMappingURL` comment.
pub fn concat(units: &[CompiledUnit], file: &str, map_url: Option<&str>) -> Bundle {
    let mut code = String::new();
    let mut sections = Vec::new();
    let mut line = 0usize;

    for unit in units.iter().filter(|u| !u.code.is_empty()) {
        if !code.is_empty() {
            code.push_str(SEPARATOR);
            line += 1;
        }
        if let Some(map) = &unit.map {
            sections.push(json!({
                "offset": { "line": line, "column": 0 },
                "map": map,
            }));
        }
        line += unit.code.matches('\n').count();
        code.push_str(&unit.code);
    }

    let map = map_url.map(|url| {
        code.push_str(&format!("\n//# sourceMappingURL={url}"));
        index_map(file, sections)
    });

    Bundle { code, map }
}

fn index_map(file: &str, sections: Vec<Value>) -> String {
    json!({
        "version": 3,
        "file": file,
        "sections": sections,
    })
    .to_string()
}
