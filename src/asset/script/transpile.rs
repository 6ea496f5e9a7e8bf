//! Per-file lowering and minification with oxc.

use std::fmt::Display;
use std::path::Path;

use oxc::allocator::Allocator;
use oxc::codegen::{Codegen, CodegenOptions, CommentOptions};
use oxc::mangler::MangleOptions;
use oxc::minifier::{CompressOptions, CompressOptionsUnused, Minifier, MinifierOptions};
use oxc::parser::Parser;
use oxc::semantic::SemanticBuilder;
use oxc::span::SourceType;
use oxc::transformer::Transformer;
use serde_json::Value;

use super::{engine_targets, transform_options};
use crate::task::TaskError;

/// One source file after lowering and minification.
#[derive(Debug, Clone)]
pub struct CompiledUnit {
    /// Minified code without trailing whitespace.
    pub code: String,
    /// Source map of `code`, pointing back at the input file.
    pub map: Option<Value>,
}

/// Lower `source` (a classic script) to `target` and minify it.
///
/// `map_source` is the name the source map records for the input; no map is
/// produced without it.
pub fn transpile(
    path: &Path,
    source: &str,
    target: &str,
    map_source: Option<&Path>,
) -> Result<CompiledUnit, TaskError> {
    let allocator = Allocator::default();
    // Classic script: top-level bindings are globals shared across files.
    let source_type = SourceType::script();

    let parsed = Parser::new(&allocator, source, source_type).parse();
    check(path, &parsed.errors)?;
    let mut program = parsed.program;

    let scoping = SemanticBuilder::new().build(&program).semantic.into_scoping();
    let options = transform_options(target).map_err(TaskError::Configuration)?;
    let transformed =
        Transformer::new(&allocator, path, &options).build_with_scoping(scoping, &mut program);
    check(path, &transformed.errors)?;

    // The compressor re-sugars syntax up to its target, keep it at ours.
    // Top-level declarations may be used by a later file of the bundle.
    let compress = CompressOptions {
        target: engine_targets(target).map_err(TaskError::Configuration)?,
        unused: CompressOptionsUnused::Keep,
        ..CompressOptions::smallest()
    };
    let mangle = MangleOptions {
        top_level: Some(false),
        ..MangleOptions::default()
    };
    let minified = Minifier::new(MinifierOptions {
        mangle: Some(mangle),
        compress: Some(compress),
    })
    .minify(&allocator, &mut program);

    let output = Codegen::new()
        .with_options(CodegenOptions {
            minify: true,
            comments: CommentOptions::disabled(),
            source_map_path: map_source.map(Path::to_path_buf),
            ..CodegenOptions::default()
        })
        .with_scoping(minified.scoping)
        .build(&program);

    let map = output
        .map
        .map(|map| serde_json::from_str(&map.to_json_string()))
        .transpose()
        .map_err(|e| TaskError::compile(path, format!("invalid source map: {e}")))?;

    Ok(CompiledUnit {
        code: output.code.trim_end().to_string(),
        map,
    })
}

fn check<E: Display>(path: &Path, errors: &[E]) -> Result<(), TaskError> {
    if errors.is_empty() {
        return Ok(());
    }
    let message = errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("\n");
    Err(TaskError::compile(path, message))
}
