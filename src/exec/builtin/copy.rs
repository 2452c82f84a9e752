// src/exec/builtin/copy.rs

use std::path::PathBuf;

use tracing::{debug, info};

use super::{BuiltinError, BuiltinResult};
use crate::config::model::ProjectLayout;
use crate::dag::FileSelection;
use crate::fs::FileSystem;
use crate::watch::{collect_matching_files, FileMatcher};

/// Copy selected files from `source_dir` into `build_dir` (or
/// `build_dir/<dest>`), keeping their paths relative to `source_dir`.
pub fn run(
    fs: &dyn FileSystem,
    layout: &ProjectLayout,
    files: &FileSelection,
    dest: Option<&str>,
) -> BuiltinResult<()> {
    if !fs.is_dir(&layout.source_dir) {
        return Err(BuiltinError::MissingFile(layout.source_dir.clone()));
    }

    let matcher = FileMatcher::from_selection(files)?;
    let sources = collect_matching_files(fs, &layout.source_dir, &matcher)?;

    let target_root: PathBuf = match dest {
        Some(d) => layout.build_dir.join(d),
        None => layout.build_dir.clone(),
    };

    for src in sources.iter() {
        let Ok(rel) = src.strip_prefix(&layout.source_dir) else {
            continue;
        };
        let target = target_root.join(rel);
        debug!(from = %src.display(), to = %target.display(), "copying");
        fs.copy_file(src, &target)?;
    }

    info!(count = sources.len(), "files copied");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::model::ProjectSection;
    use crate::fs::MockFileSystem;
    use std::path::Path;

    fn selection(include: &[&str], exclude: &[&str]) -> FileSelection {
        FileSelection {
            include: include.iter().map(|s| s.to_string()).collect(),
            exclude: exclude.iter().map(|s| s.to_string()).collect(),
        }
    }

    #[test]
    fn preserves_paths_relative_to_source() {
        let fs = MockFileSystem::new();
        fs.add_file("./source/fonts/pt.woff2", "font");
        fs.add_file("./source/img/logo.png", "png");
        fs.add_file("./source/img/sprite/icon.svg", "<svg/>");
        let layout = ProjectLayout::new(".", &ProjectSection::default());

        run(
            &fs,
            &layout,
            &selection(&["fonts/**/*.{woff,woff2}", "img/**"], &["img/sprite/**"]),
            None,
        )
        .unwrap();

        assert_eq!(fs.contents("./build/fonts/pt.woff2").as_deref(), Some("font"));
        assert_eq!(fs.contents("./build/img/logo.png").as_deref(), Some("png"));
        assert!(!fs.exists(Path::new("./build/img/sprite/icon.svg")));
    }

    #[test]
    fn missing_source_dir_is_a_missing_file() {
        let fs = MockFileSystem::new();
        let layout = ProjectLayout::new(".", &ProjectSection::default());

        let err = run(&fs, &layout, &selection(&["**"], &[]), None).unwrap_err();
        assert!(matches!(err, BuiltinError::MissingFile(p) if p == Path::new("./source")));
    }
}
