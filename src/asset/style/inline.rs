//! Inline small assets as base64 data URIs.
//!
//! Every `url(...)` reference in the compiled CSS is checked against the
//! configured [`InlineRule`]s in order. The first rule that accepts the
//! reference replaces it with `data:<mime>;base64,<payload>`; references no
//! rule accepts are kept byte for byte.

use std::borrow::Cow;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use percent_encoding::percent_decode_str;
use regex::{Captures, Regex};

use crate::config::InlineRule;
use crate::debug;
use crate::utils::mime;

/// `url(x)`, `url('x')` or `url("x")`. Groups: 1 = double, 2 = single, 3 = bare.
static URL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"url\([ \t\r\n]*(?:"([^"]*)"|'([^']*)'|([^'"() \t\r\n]*))[ \t\r\n]*\)"#)
        .expect("url pattern is valid")
});

/// Where references resolve from.
#[derive(Debug, Clone, Copy)]
pub struct InlineContext<'a> {
    /// Directory of the entry stylesheet, base of relative references.
    pub base_dir: &'a Path,
    /// Project root, base of `/absolute` references.
    pub root: &'a Path,
    pub rules: &'a [InlineRule],
}

/// Replace every qualifying `url()` reference in `css`.
pub fn inline_assets<'c>(css: &'c str, ctx: &InlineContext<'_>) -> Cow<'c, str> {
    if ctx.rules.is_empty() {
        return Cow::Borrowed(css);
    }
    URL.replace_all(css, |caps: &Captures<'_>| {
        let reference = caps
            .get(1)
            .or_else(|| caps.get(2))
            .or_else(|| caps.get(3))
            .map_or("", |m| m.as_str());

        match data_uri(reference, ctx) {
            Some(uri) => format!("url({uri})"),
            None => caps[0].to_string(),
        }
    })
}

/// Data URI for `reference`, if some rule accepts it.
fn data_uri(reference: &str, ctx: &InlineContext<'_>) -> Option<String> {
    if is_external(reference) {
        return None;
    }

    let path = strip_suffix(reference);
    let extension = Path::new(path)
        .extension()
        .and_then(|e| e.to_str())?
        .to_ascii_lowercase();
    let file = resolve(path, ctx);

    for rule in ctx.rules {
        if !accepts_extension(rule, &extension)
            || rule.exclude.iter().any(|ex| reference.contains(ex.as_str()))
        {
            continue;
        }

        let size = match fs::metadata(&file) {
            Ok(meta) if meta.is_file() => meta.len(),
            _ => {
                debug!("styles"; "not inlining {reference}: {} not found", file.display());
                return None;
            }
        };
        if size > rule.max_size {
            continue;
        }

        let bytes = fs::read(&file).ok()?;
        let mime = mime::essence(mime::from_extension(Some(extension.as_str())));
        debug!("styles"; "inlined {reference} ({size} bytes)");
        return Some(format!("data:{mime};base64,{}", STANDARD.encode(bytes)));
    }
    None
}

/// Data, remote and protocol-relative URLs are never inlined.
fn is_external(reference: &str) -> bool {
    let lower = reference.trim().to_ascii_lowercase();
    lower.is_empty()
        || lower.starts_with("data:")
        || lower.starts_with("http://")
        || lower.starts_with("https://")
        || lower.starts_with("//")
}

/// Drop `?query` and `#fragment` (`font.woff2?v=3#iefix` → `font.woff2`).
fn strip_suffix(reference: &str) -> &str {
    reference
        .split(['?', '#'])
        .next()
        .unwrap_or(reference)
}

fn accepts_extension(rule: &InlineRule, extension: &str) -> bool {
    rule.extensions
        .iter()
        .any(|allowed| allowed.trim_start_matches('.').eq_ignore_ascii_case(extension))
}

/// Relative references resolve against the entry directory, `/...` against the root.
fn resolve(path: &str, ctx: &InlineContext<'_>) -> PathBuf {
    let decoded = percent_decode_str(path).decode_utf8_lossy();
    match decoded.strip_prefix('/') {
        Some(rooted) => ctx.root.join(rooted),
        None => ctx.base_dir.join(decoded.as_ref()),
    }
}
