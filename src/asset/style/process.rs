//! Prefixing, minification and source maps with lightningcss.

use std::path::Path;

use lightningcss::stylesheet::{MinifyOptions, ParserOptions, PrinterOptions, StyleSheet};
use lightningcss::targets::Targets;
use parcel_sourcemap::SourceMap;

use crate::task::TaskError;

/// Final stylesheet and its optional source map (JSON).
#[derive(Debug)]
pub struct Processed {
    pub code: String,
    pub map: Option<String>,
}

/// Prefix and minify `css` for `targets`.
///
/// `source_name` names the input inside the map; `map_url` is written into
/// the trailing `sourceMappingURL` comment. Errors are reported against
/// `entry`.
pub fn process(
    css: &str,
    entry: &Path,
    source_name: &str,
    targets: Targets,
    map_url: Option<&str>,
) -> Result<Processed, TaskError> {
    let fail = |message: String| TaskError::compile(entry, message);

    let mut sheet = StyleSheet::parse(
        css,
        ParserOptions {
            filename: source_name.to_string(),
            ..ParserOptions::default()
        },
    )
    .map_err(|e| fail(e.to_string()))?;

    sheet
        .minify(MinifyOptions {
            targets,
            ..MinifyOptions::default()
        })
        .map_err(|e| fail(e.to_string()))?;

    let mut source_map = match map_url {
        Some(_) => {
            let mut map = SourceMap::new("/");
            let index = map.add_source(source_name);
            map.set_source_content(index as usize, css)
                .map_err(|e| fail(e.to_string()))?;
            Some(map)
        }
        None => None,
    };

    let result = sheet
        .to_css(PrinterOptions {
            minify: true,
            source_map: source_map.as_mut(),
            targets,
            ..PrinterOptions::default()
        })
        .map_err(|e| fail(e.to_string()))?;

    let mut code = result.code;
    let map = match (source_map, map_url) {
        (Some(mut map), Some(url)) => {
            let json = map.to_json(None).map_err(|e| fail(e.to_string()))?;
            code.push_str(&format!("\n/*# sourceMappingURL={url} */"));
            Some(json)
        }
        _ => None,
    };

    Ok(Processed { code, map })
}
