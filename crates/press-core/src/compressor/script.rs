use oxc_allocator::Allocator;
use oxc_codegen::{Codegen, CodegenOptions, CommentOptions};
use oxc_minifier::{CompressOptions, Minifier, MinifierOptions};
use oxc_parser::Parser;
use oxc_span::SourceType;

use super::{AssetCompressor, MinifyError};
use crate::types::AssetKind;

#[derive(Debug, Clone, Copy, Default)]
pub struct ScriptCompressor;

impl AssetCompressor for ScriptCompressor {
    fn kind(&self) -> AssetKind {
        AssetKind::Script
    }

    fn minify(&self, source: &str) -> Result<String, MinifyError> {
        minify_script(source)
    }
}

/// Minify one classic (non-module) script.
///
/// Names are never mangled, since concatenated files share one global
/// scope, and `console`/`debugger` statements stay. Leading `/*! ... */`
/// license blocks are kept verbatim.
pub fn minify_script(source: &str) -> Result<String, MinifyError> {
    let (license, body) = split_license(source);

    let allocator = Allocator::default();
    let source_type = SourceType::default().with_module(false);
    let parsed = Parser::new(&allocator, body, source_type).parse();

    if let Some(first) = parsed.errors.first() {
        return Err(MinifyError::Parse {
            message: first.to_string(),
        });
    }
    if parsed.panicked {
        return Err(MinifyError::Parse {
            message: "parser gave up".to_string(),
        });
    }

    let mut program = parsed.program;
    let mut compress = CompressOptions::smallest();
    compress.drop_console = false;
    compress.drop_debugger = false;
    let options = MinifierOptions {
        mangle: None,
        compress: Some(compress),
    };
    let minified = Minifier::new(options).minify(&allocator, &mut program);

    let code = Codegen::new()
        .with_options(CodegenOptions {
            minify: true,
            comments: CommentOptions::disabled(),
            ..CodegenOptions::default()
        })
        .with_scoping(minified.scoping)
        .build(&program)
        .code;

    let mut out = String::with_capacity(license.len() + code.len() + 1);
    out.push_str(license);
    out.push_str(code.trim_end());
    if !out.is_empty() && !out.ends_with('\n') {
        out.push('\n');
    }
    Ok(out)
}

/// Split leading `/*!` blocks (and the whitespace after each) from the rest.
fn split_license(source: &str) -> (&str, &str) {
    let mut end = 0;
    loop {
        let rest = &source[end..];
        let trimmed = rest.trim_start();
        if !trimmed.starts_with("/*!") {
            break;
        }
        let Some(close) = trimmed.find("*/") else {
            break;
        };
        let block_end = end + (rest.len() - trimmed.len()) + close + 2;
        let after = &source[block_end..];
        end = block_end + (after.len() - after.trim_start().len());
    }
    let license = source[..end].trim_start();
    (license, &source[end..])
}
