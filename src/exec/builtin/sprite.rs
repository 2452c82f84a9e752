// src/exec/builtin/sprite.rs

//! SVG sprite aggregation.
//!
//! Every selected SVG becomes one `<symbol>` of the output sprite, keyed by
//! the file stem and carrying the source `viewBox`. Inputs are processed in
//! path order so repeated builds produce identical bytes.

use std::path::Path;

use regex::Regex;
use tracing::info;

use super::{regex, BuiltinError, BuiltinResult};
use crate::config::model::ProjectLayout;
use crate::dag::FileSelection;
use crate::fs::FileSystem;
use crate::watch::{collect_matching_files, FileMatcher};

const SVG_NS: &str = "http://www.w3.org/2000/svg";

pub fn run(
    fs: &dyn FileSystem,
    layout: &ProjectLayout,
    files: &FileSelection,
    dest: &str,
) -> BuiltinResult<()> {
    let matcher = FileMatcher::from_selection(files)?;
    let inputs = collect_matching_files(fs, &layout.source_dir, &matcher)?;

    if inputs.is_empty() {
        info!("no sprite inputs; nothing written");
        return Ok(());
    }

    let parser = SvgParser::new()?;
    let mut symbols = Vec::with_capacity(inputs.len());
    for path in inputs.iter() {
        let text = fs.read_to_string(path)?;
        symbols.push(parser.symbol(path, &text)?);
    }

    let mut sprite = format!("<svg xmlns=\"{SVG_NS}\">\n");
    for symbol in symbols {
        sprite.push_str(&symbol);
        sprite.push('\n');
    }
    sprite.push_str("</svg>\n");

    let out = layout.build_dir.join(dest);
    fs.write(&out, sprite.as_bytes())?;
    info!(count = inputs.len(), path = %out.display(), "sprite written");
    Ok(())
}

struct SvgParser {
    noise: Regex,
    root: Regex,
    view_box: Regex,
}

impl SvgParser {
    fn new() -> BuiltinResult<Self> {
        Ok(Self {
            noise: regex(r"(?s)<!--.*?-->|<\?xml.*?\?>|(?i:<!DOCTYPE[^>]*>)")?,
            root: regex(r"(?s)^\s*<svg\b([^>]*?)(/?)>")?,
            view_box: regex(r#"\bviewBox\s*=\s*"([^"]*)""#)?,
        })
    }

    /// Render one file as a `<symbol>` element.
    fn symbol(&self, path: &Path, text: &str) -> BuiltinResult<String> {
        let cleaned = self.noise.replace_all(text, "");

        let Some(caps) = self.root.captures(&cleaned) else {
            return Err(BuiltinError::Transform(format!(
                "{} has no <svg> root element",
                path.display()
            )));
        };

        let attrs = caps.get(1).map_or("", |m| m.as_str());
        let self_closing = caps.get(2).is_some_and(|m| !m.as_str().is_empty());
        let open_end = caps.get(0).map_or(0, |m| m.end());

        let inner = if self_closing {
            ""
        } else {
            let rest = &cleaned[open_end..];
            let Some(close) = rest.rfind("</svg>") else {
                return Err(BuiltinError::Transform(format!(
                    "{} has an unterminated <svg> element",
                    path.display()
                )));
            };
            rest[..close].trim()
        };

        let id = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();

        let view_box = self
            .view_box
            .captures(attrs)
            .and_then(|c| c.get(1))
            .map(|m| format!(" viewBox=\"{}\"", m.as_str()))
            .unwrap_or_default();

        Ok(format!("<symbol id=\"{id}\"{view_box}>{inner}</symbol>"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::model::ProjectSection;
    use crate::fs::MockFileSystem;

    fn selection() -> FileSelection {
        FileSelection {
            include: vec!["img/sprite/*.svg".to_string()],
            exclude: Vec::new(),
        }
    }

    fn layout() -> ProjectLayout {
        ProjectLayout::new(".", &ProjectSection::default())
    }

    #[test]
    fn aggregates_symbols_sorted_by_path() {
        let fs = MockFileSystem::new();
        fs.add_file(
            "./source/img/sprite/vk.svg",
            "<?xml version=\"1.0\"?>\n<svg viewBox=\"0 0 20 12\"><path d=\"M1\"/></svg>",
        );
        fs.add_file(
            "./source/img/sprite/fb.svg",
            "<!-- icon --><svg xmlns=\"http://www.w3.org/2000/svg\" viewBox=\"0 0 9 16\"><path d=\"M2\"/></svg>",
        );

        run(&fs, &layout(), &selection(), "img/sprite.svg").unwrap();

        let sprite = fs.contents("./build/img/sprite.svg").unwrap();
        assert_eq!(
            sprite,
            "<svg xmlns=\"http://www.w3.org/2000/svg\">\n\
             <symbol id=\"fb\" viewBox=\"0 0 9 16\"><path d=\"M2\"/></symbol>\n\
             <symbol id=\"vk\" viewBox=\"0 0 20 12\"><path d=\"M1\"/></symbol>\n\
             </svg>\n"
        );
    }

    #[test]
    fn zero_inputs_write_nothing() {
        let fs = MockFileSystem::new();
        fs.add_file("./source/index.html", "<html></html>");

        run(&fs, &layout(), &selection(), "img/sprite.svg").unwrap();
        assert!(!fs.exists(Path::new("./build/img/sprite.svg")));
    }

    #[test]
    fn non_svg_input_is_a_transform_failure() {
        let fs = MockFileSystem::new();
        fs.add_file("./source/img/sprite/broken.svg", "<html>nope</html>");

        let err = run(&fs, &layout(), &selection(), "img/sprite.svg").unwrap_err();
        assert!(matches!(err, BuiltinError::Transform(ref m) if m.contains("broken.svg")));
    }
}
