// src/exec/builtin/html.rs

//! HTML assembly: `<include src="..."></include>` resolution.
//!
//! `src` is resolved against the project root. Included files may include
//! further files, up to [`MAX_INCLUDE_DEPTH`] levels.

use std::path::Path;

use regex::Regex;
use tracing::{debug, info};

use super::{regex, BuiltinError, BuiltinResult};
use crate::config::model::ProjectLayout;
use crate::dag::FileSelection;
use crate::fs::FileSystem;
use crate::watch::{collect_matching_files, FileMatcher};

pub const MAX_INCLUDE_DEPTH: usize = 16;

pub fn run(fs: &dyn FileSystem, layout: &ProjectLayout, files: &FileSelection) -> BuiltinResult<()> {
    let matcher = FileMatcher::from_selection(files)?;
    let pages = collect_matching_files(fs, &layout.source_dir, &matcher)?;
    let resolver = IncludeResolver {
        fs,
        root: &layout.root,
        include: regex(r#"(?s)<include\s+src\s*=\s*"([^"]+)"\s*(?:/>|>.*?</include>)"#)?,
    };

    for page in pages.iter() {
        let Ok(rel) = page.strip_prefix(&layout.source_dir) else {
            continue;
        };
        let text = fs.read_to_string(page)?;
        let html = resolver.resolve(&text, 0)?;

        let out = layout.build_dir.join(rel);
        debug!(from = %page.display(), to = %out.display(), "assembled page");
        fs.write(&out, html.as_bytes())?;
    }

    info!(count = pages.len(), "html pages assembled");
    Ok(())
}

struct IncludeResolver<'a> {
    fs: &'a dyn FileSystem,
    root: &'a Path,
    include: Regex,
}

impl IncludeResolver<'_> {
    fn resolve(&self, text: &str, depth: usize) -> BuiltinResult<String> {
        if !self.include.is_match(text) {
            return Ok(text.to_string());
        }
        if depth >= MAX_INCLUDE_DEPTH {
            return Err(BuiltinError::Transform(format!(
                "includes nested deeper than {MAX_INCLUDE_DEPTH} levels"
            )));
        }

        let mut out = String::with_capacity(text.len());
        let mut last = 0;
        for caps in self.include.captures_iter(text) {
            let (Some(whole), Some(src)) = (caps.get(0), caps.get(1)) else {
                continue;
            };
            out.push_str(&text[last..whole.start()]);
            out.push_str(&self.load(src.as_str(), depth)?);
            last = whole.end();
        }
        out.push_str(&text[last..]);
        Ok(out)
    }

    fn load(&self, src: &str, depth: usize) -> BuiltinResult<String> {
        let path = self.root.join(src);
        if !self.fs.is_file(&path) {
            return Err(BuiltinError::MissingFile(path));
        }
        let text = self.fs.read_to_string(&path)?;
        self.resolve(&text, depth + 1)
    }
}
