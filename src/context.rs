// src/context.rs

use std::path::Path;

use crate::config::model::ProjectLayout;
use crate::server::ReloadHub;

/// Process-scoped state shared by the dev runtime and the dev server.
///
/// Created once when serve mode starts and passed around behind an `Arc`.
#[derive(Debug)]
pub struct DevContext {
    layout: ProjectLayout,
    reload: ReloadHub,
}

impl DevContext {
    pub fn new(layout: ProjectLayout) -> Self {
        Self {
            layout,
            reload: ReloadHub::new(),
        }
    }

    pub fn layout(&self) -> &ProjectLayout {
        &self.layout
    }

    pub fn build_dir(&self) -> &Path {
        &self.layout.build_dir
    }

    pub fn reload(&self) -> &ReloadHub {
        &self.reload
    }
}
