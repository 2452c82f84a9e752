// src/exec/builtin/rev.rs

//! Asset revisioning.
//!
//! Selected build files get a content-hashed sibling `<stem>-<hash8>.<ext>`,
//! a `rev-manifest.json` maps original to hashed paths, and HTML pages in the
//! build directory are rewritten to reference the hashed names.

use std::collections::BTreeMap;
use std::path::Path;

use anyhow::Context;
use tracing::{debug, info};

use super::{regex, BuiltinResult};
use crate::config::model::ProjectLayout;
use crate::dag::FileSelection;
use crate::fs::FileSystem;
use crate::watch::hash::hash_bytes;
use crate::watch::path_utils::{relative_str, to_slash};
use crate::watch::{collect_matching_files, FileMatcher};

pub const MANIFEST_NAME: &str = "rev-manifest.json";

const HASH_LEN: usize = 8;

pub fn run(fs: &dyn FileSystem, layout: &ProjectLayout, files: &FileSelection) -> BuiltinResult<()> {
    let matcher = FileMatcher::from_selection(files)?;
    let already_revved = regex(&format!(r"-[0-9a-f]{{{HASH_LEN}}}$"))?;

    let mut manifest: BTreeMap<String, String> = BTreeMap::new();
    for path in collect_matching_files(fs, &layout.build_dir, &matcher)? {
        let Some(rel) = relative_str(&layout.build_dir, &path) else {
            continue;
        };
        let stem = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        if rel == MANIFEST_NAME || already_revved.is_match(&stem) {
            continue;
        }

        let bytes = fs.read(&path)?;
        let hash = hash_bytes(&bytes);
        let short = &hash[..HASH_LEN];

        let hashed_name = match path.extension() {
            Some(ext) => format!("{stem}-{short}.{}", ext.to_string_lossy()),
            None => format!("{stem}-{short}"),
        };
        let hashed_path = path.with_file_name(&hashed_name);
        fs.write(&hashed_path, &bytes)?;

        let hashed_rel = match Path::new(&rel).parent() {
            Some(parent) if !parent.as_os_str().is_empty() => {
                format!("{}/{hashed_name}", to_slash(parent))
            }
            _ => hashed_name.clone(),
        };
        debug!(from = %rel, to = %hashed_rel, "revisioned");
        manifest.insert(rel, hashed_rel);
    }

    let json = serde_json::to_string_pretty(&manifest).context("serialising rev manifest")?;
    fs.write(&layout.build_dir.join(MANIFEST_NAME), json.as_bytes())?;

    rewrite_references(fs, &layout.build_dir, &manifest)?;

    info!(count = manifest.len(), "assets revisioned");
    Ok(())
}

/// Replace original asset paths with hashed ones in every build HTML page.
/// Longer paths are replaced first so `css/a.css` never clobbers
/// `css/a.css.map`.
fn rewrite_references(
    fs: &dyn FileSystem,
    build_dir: &Path,
    manifest: &BTreeMap<String, String>,
) -> BuiltinResult<()> {
    if manifest.is_empty() {
        return Ok(());
    }

    let mut pairs: Vec<(&String, &String)> = manifest.iter().collect();
    pairs.sort_by(|a, b| b.0.len().cmp(&a.0.len()).then_with(|| a.0.cmp(b.0)));

    let pages = fs
        .walk_files(build_dir)?
        .into_iter()
        .filter(|p| p.extension().is_some_and(|e| e == "html"));

    for page in pages {
        let original = fs.read_to_string(&page)?;
        let mut text = original.clone();
        for (from, to) in pairs.iter() {
            text = text.replace(from.as_str(), to.as_str());
        }
        if text != original {
            fs.write(&page, text.as_bytes())?;
            debug!(page = %page.display(), "rewrote asset references");
        }
    }
    Ok(())
}
