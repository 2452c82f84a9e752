// src/watch/dispatcher.rs

//! Maps changed paths to the tasks that must re-run.
//!
//! Rules are checked in registration order and every matching rule
//! contributes: the resulting task list is the union of all matched lists,
//! keeping the first occurrence of each task. The refresh kind is the
//! strongest one among matched rules.

use anyhow::{Context, Result};
use globset::GlobMatcher;

use crate::config::model::ConfigFile;
use crate::engine::TaskName;
use crate::types::RefreshKind;
use crate::watch::patterns::compile_glob;

/// One compiled `[[watch]]` entry.
#[derive(Debug, Clone)]
pub struct WatchRule {
    glob: String,
    matcher: GlobMatcher,
    tasks: Vec<TaskName>,
    refresh: RefreshKind,
}

impl WatchRule {
    pub fn new(glob: &str, tasks: Vec<TaskName>, refresh: RefreshKind) -> Result<Self> {
        let matcher = compile_glob(glob)
            .with_context(|| format!("invalid watch glob: {glob}"))?
            .compile_matcher();
        Ok(Self {
            glob: glob.to_string(),
            matcher,
            tasks,
            refresh,
        })
    }

    pub fn glob(&self) -> &str {
        &self.glob
    }

    pub fn tasks(&self) -> &[TaskName] {
        &self.tasks
    }

    pub fn refresh(&self) -> RefreshKind {
        self.refresh
    }

    pub fn matches(&self, rel_path: &str) -> bool {
        self.matcher.is_match(rel_path)
    }
}

/// Tasks to run for a set of changes, plus what to tell browsers afterwards.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Dispatch {
    pub tasks: Vec<TaskName>,
    pub refresh: RefreshKind,
}

impl Dispatch {
    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Append `other`'s tasks not already present and keep the stronger
    /// refresh. An empty dispatch never changes the refresh kind.
    pub fn merge(&mut self, other: Dispatch) {
        if other.is_empty() {
            return;
        }
        if self.is_empty() {
            *self = other;
            return;
        }
        for task in other.tasks {
            if !self.tasks.contains(&task) {
                self.tasks.push(task);
            }
        }
        self.refresh = self.refresh.merge(other.refresh);
    }
}

#[derive(Debug, Clone, Default)]
pub struct WatchDispatcher {
    rules: Vec<WatchRule>,
}

impl WatchDispatcher {
    pub fn new(rules: Vec<WatchRule>) -> Self {
        Self { rules }
    }

    pub fn from_config(cfg: &ConfigFile) -> Result<Self> {
        let rules = cfg
            .watch_rules()
            .iter()
            .map(|r| WatchRule::new(&r.glob, r.tasks.clone(), r.refresh))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self::new(rules))
    }

    pub fn rules(&self) -> &[WatchRule] {
        &self.rules
    }

    /// Dispatch for a single path relative to the project root.
    pub fn on_change(&self, rel_path: &str) -> Dispatch {
        let mut dispatch = Dispatch::default();
        for rule in self.rules.iter().filter(|r| r.matches(rel_path)) {
            dispatch.merge(Dispatch {
                tasks: rule.tasks.clone(),
                refresh: rule.refresh,
            });
        }
        dispatch
    }

    /// Fold several paths into one dispatch, in path order.
    pub fn on_changes<'a>(&self, rel_paths: impl IntoIterator<Item = &'a str>) -> Dispatch {
        let mut dispatch = Dispatch::default();
        for path in rel_paths {
            dispatch.merge(self.on_change(path));
        }
        dispatch
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rule(glob: &str, tasks: &[&str], refresh: RefreshKind) -> WatchRule {
        WatchRule::new(glob, tasks.iter().map(|s| s.to_string()).collect(), refresh).unwrap()
    }

    fn dispatcher() -> WatchDispatcher {
        WatchDispatcher::new(vec![
            rule("source/sass/**/*.{scss,sass}", &["css"], RefreshKind::Inject),
            rule("source/img/sprite/*.svg", &["sprite", "html"], RefreshKind::Reload),
            rule("source/*.html", &["html"], RefreshKind::Reload),
            rule("source/**/*.svg", &["copy"], RefreshKind::Reload),
        ])
    }

    #[test]
    fn every_matching_rule_contributes_in_rule_order() {
        let d = dispatcher().on_change("source/img/sprite/icon.svg");
        assert_eq!(d.tasks, vec!["sprite", "html", "copy"]);
        assert_eq!(d.refresh, RefreshKind::Reload);
    }

    #[test]
    fn unmatched_path_dispatches_nothing() {
        let d = dispatcher().on_change("README.md");
        assert!(d.is_empty());
    }

    #[test]
    fn batch_suppresses_duplicates_and_takes_max_refresh() {
        let d = dispatcher().on_changes(["source/sass/blocks/_header.scss", "source/index.html"]);
        assert_eq!(d.tasks, vec!["css", "html"]);
        assert_eq!(d.refresh, RefreshKind::Reload);

        let d = dispatcher().on_changes(["source/sass/a.scss", "source/sass/b.sass"]);
        assert_eq!(d.tasks, vec!["css"]);
        assert_eq!(d.refresh, RefreshKind::Inject);
    }
}
