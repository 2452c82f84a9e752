// tests/plan_resolution.rs

use sitepipe::config::{BuiltinKind, ConfigFile};
use sitepipe::dag::{resolve_targets, Step, TaskGraph};
use sitepipe::errors::SitepipeError;
use sitepipe_test_utils::builders::{parallel, single, ConfigFileBuilder, TaskConfigBuilder};

fn site_config() -> ConfigFile {
    ConfigFileBuilder::new()
        .with_task("clean", TaskConfigBuilder::builtin(BuiltinKind::Clean).build())
        .with_task(
            "copy",
            TaskConfigBuilder::builtin(BuiltinKind::Copy)
                .include("img/*")
                .build(),
        )
        .with_task("css", TaskConfigBuilder::cmd("echo css").build())
        .with_task("js", TaskConfigBuilder::cmd("echo js").after("css").build())
        .with_task(
            "html",
            TaskConfigBuilder::builtin(BuiltinKind::Html)
                .include("*.html")
                .after("css")
                .after("copy")
                .build(),
        )
        .with_task("server", TaskConfigBuilder::builtin(BuiltinKind::Serve).build())
        .with_pipeline(
            "build",
            vec![single("clean"), parallel(&["copy", "css"]), single("html")],
        )
        .with_pipeline(
            "start",
            vec![
                single("clean"),
                parallel(&["copy", "css"]),
                single("html"),
                single("server"),
            ],
        )
        .build()
}

fn targets(names: &[&str]) -> Vec<String> {
    names.iter().map(|s| s.to_string()).collect()
}

#[test]
fn pipeline_steps_are_taken_verbatim() {
    let cfg = site_config();
    let graph = TaskGraph::from_config(&cfg);

    let resolved = resolve_targets(&cfg, &graph, &targets(&["build"])).unwrap();

    assert_eq!(
        resolved.plan.steps(),
        &[
            Step::Single("clean".into()),
            Step::Parallel(vec!["copy".into(), "css".into()]),
            Step::Single("html".into()),
        ]
    );
    assert_eq!(resolved.serve, None);
    assert_eq!(resolved.plan.to_string(), "clean -> [copy | css] -> html");
}

#[test]
fn task_target_runs_its_dependency_layers() {
    let cfg = site_config();
    let graph = TaskGraph::from_config(&cfg);

    let resolved = resolve_targets(&cfg, &graph, &targets(&["html"])).unwrap();

    assert_eq!(
        resolved.plan.steps(),
        &[
            Step::Parallel(vec!["copy".into(), "css".into()]),
            Step::Single("html".into()),
        ]
    );
}

#[test]
fn multiple_targets_are_concatenated_in_order() {
    let cfg = site_config();
    let graph = TaskGraph::from_config(&cfg);

    let resolved = resolve_targets(&cfg, &graph, &targets(&["clean", "js"])).unwrap();

    let names: Vec<&str> = resolved.plan.task_names().collect();
    assert_eq!(names, vec!["clean", "css", "js"]);
}

#[test]
fn trailing_serve_step_is_split_off() {
    let cfg = site_config();
    let graph = TaskGraph::from_config(&cfg);

    let resolved = resolve_targets(&cfg, &graph, &targets(&["start"])).unwrap();

    assert_eq!(resolved.serve.as_deref(), Some("server"));
    assert_eq!(resolved.plan.steps().len(), 3);
    assert!(resolved.plan.task_names().all(|n| n != "server"));
}

#[test]
fn serve_task_target_followed_by_build_is_rejected() {
    let cfg = site_config();
    let graph = TaskGraph::from_config(&cfg);

    let err = resolve_targets(&cfg, &graph, &targets(&["server", "build"])).unwrap_err();

    assert!(
        matches!(err, SitepipeError::ConfigError(ref msg) if msg.contains("server")),
        "unexpected error: {err}"
    );
}

#[test]
fn serve_task_alone_yields_empty_plan() {
    let cfg = site_config();
    let graph = TaskGraph::from_config(&cfg);

    let resolved = resolve_targets(&cfg, &graph, &targets(&["server"])).unwrap();

    assert!(resolved.plan.is_empty());
    assert_eq!(resolved.serve.as_deref(), Some("server"));
    assert_eq!(resolved.plan.to_string(), "(empty)");
}

#[test]
fn unknown_target_is_reported() {
    let cfg = site_config();
    let graph = TaskGraph::from_config(&cfg);

    let err = resolve_targets(&cfg, &graph, &targets(&["deploy"])).unwrap_err();

    assert!(matches!(err, SitepipeError::TaskNotFound(ref name) if name == "deploy"));
}

#[test]
fn graph_reports_direct_dependencies() {
    let cfg = site_config();
    let graph = TaskGraph::from_config(&cfg);

    let mut deps = graph.dependencies_of("html").to_vec();
    deps.sort();
    assert_eq!(deps, vec!["copy".to_string(), "css".to_string()]);

    assert!(graph.dependencies_of("copy").is_empty());
    assert!(graph.dependencies_of("nope").is_empty());

    assert!(graph.dependency_layers("nope").is_none());
}
