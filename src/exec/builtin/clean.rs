// src/exec/builtin/clean.rs

use tracing::info;

use super::BuiltinResult;
use crate::config::model::ProjectLayout;
use crate::fs::FileSystem;

/// Remove the build directory. Absent directories are fine.
pub fn run(fs: &dyn FileSystem, layout: &ProjectLayout) -> BuiltinResult<()> {
    fs.remove_dir_all(&layout.build_dir)?;
    info!(path = %layout.build_dir.display(), "build directory removed");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::model::ProjectSection;
    use crate::fs::MockFileSystem;
    use std::path::Path;

    #[test]
    fn removes_build_and_tolerates_absence() {
        let fs = MockFileSystem::new();
        fs.add_file("./build/css/style.min.css", "a{}");
        let layout = ProjectLayout::new(".", &ProjectSection::default());

        run(&fs, &layout).unwrap();
        assert!(!fs.exists(Path::new("./build")));

        run(&fs, &layout).unwrap();
    }
}
