// src/lib.rs

pub mod cli;
pub mod config;
pub mod context;
pub mod dag;
pub mod engine;
pub mod errors;
pub mod exec;
pub mod fs;
pub mod logging;
pub mod server;
pub mod types;
pub mod watch;

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info, warn};

use crate::cli::CliArgs;
use crate::config::loader::{load_and_validate, project_root_for};
use crate::config::model::{ConfigFile, ProjectLayout};
use crate::context::DevContext;
use crate::dag::{resolve_targets, ResolvedPlan, TaskGraph};
use crate::engine::{DevCore, DevRuntime, PlanRunner, RunReport, RuntimeEvent};
use crate::errors::SitepipeError;
use crate::exec::{ExecutorBackend, RealExecutorBackend};
use crate::watch::{spawn_watcher, WatchDispatcher, WatcherOptions};

/// A validated config bound to a project root.
#[derive(Debug, Clone)]
pub struct Project {
    cfg: ConfigFile,
    layout: ProjectLayout,
    graph: Arc<TaskGraph>,
}

impl Project {
    pub fn new(cfg: ConfigFile, root: impl Into<PathBuf>) -> Self {
        let layout = ProjectLayout::new(root, cfg.project());
        let graph = Arc::new(TaskGraph::from_config(&cfg));
        Self { cfg, layout, graph }
    }

    /// Load `config_path`; its directory becomes the project root.
    pub fn load(config_path: &Path) -> errors::Result<Self> {
        let cfg = load_and_validate(config_path)?;
        Ok(Self::new(cfg, project_root_for(config_path)))
    }

    pub fn config(&self) -> &ConfigFile {
        &self.cfg
    }

    pub fn config_mut(&mut self) -> &mut ConfigFile {
        &mut self.cfg
    }

    pub fn layout(&self) -> &ProjectLayout {
        &self.layout
    }

    pub fn graph(&self) -> &Arc<TaskGraph> {
        &self.graph
    }

    pub fn resolve(&self, targets: &[String]) -> errors::Result<ResolvedPlan> {
        resolve_targets(&self.cfg, &self.graph, targets)
    }

    pub fn runner(&self, executor: Arc<dyn ExecutorBackend>) -> PlanRunner {
        PlanRunner::new(Arc::clone(&self.graph), executor)
    }

    /// Run `targets` once with the real executor. A trailing serve step is
    /// not entered.
    pub async fn build(&self, targets: &[String]) -> errors::Result<RunReport> {
        let resolved = self.resolve(targets)?;
        let runner = self.runner(Arc::new(RealExecutorBackend::new(self.layout.clone())));
        Ok(runner.run(&resolved.plan).await?)
    }
}

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - config loading and validation
/// - target resolution into a run plan
/// - the plan runner with the real executor
/// - dev server, file watcher and Ctrl-C handling when the plan ends in a
///   serve task
pub async fn run(args: CliArgs) -> Result<()> {
    let config_path = PathBuf::from(&args.config);
    let mut project = Project::load(&config_path)?;
    if let Some(port) = args.port {
        project.config_mut().set_server_port(port);
    }

    if args.list {
        print_listing(project.config());
        return Ok(());
    }

    let targets = args.effective_targets();
    let resolved = project.resolve(&targets)?;

    if args.dry_run {
        print_dry_run(&targets, &resolved);
        return Ok(());
    }

    let executor = Arc::new(RealExecutorBackend::new(project.layout().clone()));
    let runner = Arc::new(project.runner(executor));

    let report = runner
        .run(&resolved.plan)
        .await
        .map_err(SitepipeError::from)?;
    info!(
        tasks = report.tasks.len(),
        elapsed_ms = report.elapsed.as_millis() as u64,
        "plan completed"
    );

    if let Some(serve_task) = resolved.serve {
        run_dev_mode(&project, runner, &serve_task).await?;
    }

    Ok(())
}

/// Serve the build directory and re-run watched tasks until Ctrl-C.
async fn run_dev_mode(project: &Project, runner: Arc<PlanRunner>, serve_task: &str) -> Result<()> {
    info!(task = %serve_task, "entering dev mode");

    let ctx = Arc::new(DevContext::new(project.layout().clone()));
    let settings = project.config().config_section();
    let (rt_tx, rt_rx) = mpsc::channel::<RuntimeEvent>(64);

    let _watcher = spawn_watcher(
        project.layout(),
        WatcherOptions {
            debounce: Duration::from_millis(settings.debounce_ms),
            use_hash: settings.use_hash,
        },
        rt_tx.clone(),
    )?;

    let server_cfg = project.config().server();
    let addr = tokio::net::lookup_host((server_cfg.host.as_str(), server_cfg.port))
        .await
        .with_context(|| format!("resolving {}:{}", server_cfg.host, server_cfg.port))?
        .next()
        .ok_or_else(|| anyhow!("no address for {}:{}", server_cfg.host, server_cfg.port))?;
    let listener = server::bind(addr).await?;

    let (stop_tx, stop_rx) = oneshot::channel::<()>();
    let server_task = tokio::spawn(server::serve(listener, Arc::clone(&ctx), async move {
        let _ = stop_rx.await;
    }));

    // Ctrl-C → graceful shutdown.
    {
        let tx = rt_tx.clone();
        tokio::spawn(async move {
            if let Err(e) = tokio::signal::ctrl_c().await {
                warn!(error = %e, "failed to listen for Ctrl+C");
                return;
            }
            let _ = tx.send(RuntimeEvent::ShutdownRequested).await;
        });
    }

    let core = DevCore::new(
        WatchDispatcher::from_config(project.config())?,
        settings.triggered_while_running_behaviour,
        settings.queue_length,
    );
    DevRuntime::new(core, rt_rx, rt_tx, runner, ctx).run().await?;

    let _ = stop_tx.send(());
    server_task.await.context("dev server task panicked")??;
    Ok(())
}

/// `--list`: tasks, pipelines and watch rules.
fn print_listing(cfg: &ConfigFile) {
    println!("tasks ({}):", cfg.tasks().len());
    for (name, task) in cfg.tasks().iter() {
        let action = crate::dag::TaskAction::from_config(task);
        match &task.description {
            Some(desc) => println!("  - {name}: {desc}"),
            None => println!("  - {name}"),
        }
        println!("      {action}");
        if !task.after.is_empty() {
            println!("      after: {:?}", task.after);
        }
    }

    if !cfg.pipelines().is_empty() {
        println!();
        println!("pipelines ({}):", cfg.pipelines().len());
        for (name, pipeline) in cfg.pipelines().iter() {
            let steps: Vec<crate::dag::Step> = pipeline.steps.iter().map(Into::into).collect();
            let plan = crate::dag::RunPlan::new(steps);
            match &pipeline.description {
                Some(desc) => println!("  - {name}: {desc}"),
                None => println!("  - {name}"),
            }
            println!("      {plan}");
        }
    }

    if !cfg.watch_rules().is_empty() {
        println!();
        println!("watch rules ({}):", cfg.watch_rules().len());
        for rule in cfg.watch_rules() {
            println!("  - {} -> {:?} ({:?})", rule.glob, rule.tasks, rule.refresh);
        }
    }
}

/// `--dry-run`: the resolved plan, nothing executed.
fn print_dry_run(targets: &[String], resolved: &ResolvedPlan) {
    println!("sitepipe dry-run");
    println!("  targets: {}", targets.join(" "));
    println!("  plan: {}", resolved.plan);
    for (idx, step) in resolved.plan.steps().iter().enumerate() {
        println!("    {}. {step}", idx + 1);
    }
    if let Some(serve) = &resolved.serve {
        println!("  then serve: {serve}");
    }

    debug!("dry-run complete (no execution)");
}
