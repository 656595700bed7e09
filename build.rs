//! Build script for minifying embedded client scripts.

use oxc::allocator::Allocator;
use oxc::codegen::{Codegen, CodegenOptions, CommentOptions};
use oxc::mangler::MangleOptions;
use oxc::minifier::{CompressOptions, Minifier, MinifierOptions};
use oxc::parser::Parser;
use oxc::span::SourceType;
use std::fs;
use std::path::Path;

const CLIENT_SCRIPTS: &[&str] = &["lazyload", "delay", "console"];

fn main() {
    let out_dir = std::env::var("OUT_DIR").unwrap();
    let out_path = Path::new(&out_dir);

    for name in CLIENT_SCRIPTS {
        let input = format!("src/embed/client/{name}.js");
        minify_js_file(&input, &out_path.join(format!("{name}.min.js")));
        println!("cargo:rerun-if-changed={input}");
    }
}

fn minify_js(source: &str) -> String {
    let allocator = Allocator::default();
    // Emitted as classic inline scripts
    let source_type = SourceType::mjs().with_module(false);

    let ret = Parser::new(&allocator, source, source_type).parse();
    assert!(ret.errors.is_empty(), "Parse errors: {:?}", ret.errors);

    let mut program = ret.program;
    let options = MinifierOptions {
        mangle: Some(MangleOptions::default()),
        compress: Some(CompressOptions::smallest()),
    };
    let ret = Minifier::new(options).minify(&allocator, &mut program);

    Codegen::new()
        .with_options(CodegenOptions {
            minify: true,
            comments: CommentOptions::disabled(),
            ..CodegenOptions::default()
        })
        .with_scoping(ret.scoping)
        .build(&program)
        .code
}

fn minify_js_file(input: &str, output: &Path) {
    let source = fs::read_to_string(input).expect("Failed to read JS file");
    let code = minify_js(&source);
    fs::write(output, code.trim_end()).expect("Failed to write minified JS");
}
