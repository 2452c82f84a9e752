// tests/build_end_to_end.rs
//
// Full builds against a temp project: real filesystem, real `sh` commands.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use tempfile::TempDir;

use sitepipe::config::parse_and_validate;
use sitepipe::engine::TaskFailure;
use sitepipe::errors::SitepipeError;
use sitepipe::Project;
use sitepipe_test_utils::{init_tracing, with_timeout};

const SITE_TOML: &str = r#"
[task.clean]
builtin = "clean"

[task.copy]
builtin = "copy"
include = ["fonts/**/*.{woff,woff2}", "img/*"]
exclude = ["img/sprite/**"]

[task.css]
cmd = "test -f source/sass/_vars.scss && mkdir -p build/css && cat source/sass/_vars.scss source/sass/style.scss > build/css/style.min.css"

[task.sprite]
builtin = "sprite"
include = ["img/sprite/*.svg"]
dest = "img/sprite.svg"

[task.html]
builtin = "html"
include = ["*.html"]

[task.server]
builtin = "serve"

[pipeline.build]
steps = ["clean", ["copy", "css"], "sprite", "html"]

[pipeline.start]
steps = ["clean", ["copy", "css"], "sprite", "html", "server"]
"#;

fn write(root: &Path, rel: &str, contents: &str) {
    let path = root.join(rel);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, contents).unwrap();
}

fn scaffold() -> TempDir {
    let dir = TempDir::new().unwrap();
    let root = dir.path();
    write(root, "source/fonts/roboto.woff2", "font-bytes");
    write(root, "source/img/logo.png", "png-bytes");
    write(
        root,
        "source/img/sprite/icon-cart.svg",
        r#"<svg viewBox="0 0 24 24"><path d="M1 1"/></svg>"#,
    );
    write(root, "source/sass/_vars.scss", "$red: #f00;\n");
    write(root, "source/sass/style.scss", "body { color: $red; }\n");
    write(
        root,
        "source/index.html",
        r#"<html><body><include src="source/partials/header.html"></include></body></html>"#,
    );
    write(root, "source/partials/header.html", "<header>shop</header>");
    dir
}

fn project(dir: &TempDir) -> Project {
    Project::new(parse_and_validate(SITE_TOML).unwrap(), dir.path())
}

fn snapshot(root: &Path) -> BTreeMap<String, Vec<u8>> {
    let mut out = BTreeMap::new();
    let mut stack = vec![root.to_path_buf()];
    while let Some(dir) = stack.pop() {
        for entry in fs::read_dir(&dir).unwrap() {
            let path = entry.unwrap().path();
            if path.is_dir() {
                stack.push(path);
            } else {
                let rel = path.strip_prefix(root).unwrap().to_string_lossy().into_owned();
                out.insert(rel, fs::read(&path).unwrap());
            }
        }
    }
    out
}

fn targets(names: &[&str]) -> Vec<String> {
    names.iter().map(|s| s.to_string()).collect()
}

#[tokio::test]
async fn build_produces_the_expected_tree() {
    init_tracing();
    let dir = scaffold();
    let project = project(&dir);

    let report = with_timeout(project.build(&targets(&["build"]))).await.unwrap();
    assert_eq!(report.tasks.len(), 5);

    let build = snapshot(&dir.path().join("build"));
    let names: Vec<&str> = build.keys().map(|k| k.as_str()).collect();
    assert_eq!(
        names,
        vec![
            "css/style.min.css",
            "fonts/roboto.woff2",
            "img/logo.png",
            "img/sprite.svg",
            "index.html",
        ]
    );
    assert_eq!(
        build["index.html"],
        b"<html><body><header>shop</header></body></html>".to_vec()
    );
    assert_eq!(
        build["css/style.min.css"],
        b"$red: #f00;\nbody { color: $red; }\n".to_vec()
    );
}

#[tokio::test]
async fn rebuilding_is_byte_identical() {
    init_tracing();
    let dir = scaffold();
    let project = project(&dir);

    with_timeout(project.build(&targets(&["build"]))).await.unwrap();
    let first = snapshot(&dir.path().join("build"));

    // Stale output from a previous run must not survive `clean`.
    write(dir.path(), "build/stale.txt", "old");

    with_timeout(project.build(&targets(&["build"]))).await.unwrap();
    let second = snapshot(&dir.path().join("build"));

    assert_eq!(first, second);
}

#[tokio::test]
async fn failing_transform_aborts_the_build() {
    init_tracing();
    let dir = scaffold();
    fs::remove_file(dir.path().join("source/sass/_vars.scss")).unwrap();
    let project = project(&dir);

    let err = with_timeout(project.build(&targets(&["build"]))).await.unwrap_err();

    match err {
        SitepipeError::TaskFailed { task, failure } => {
            assert_eq!(task, "css");
            assert!(matches!(failure, TaskFailure::Exit(code) if code != 0));
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert!(!dir.path().join("build/css").exists());
    // Later groups never ran.
    assert!(!dir.path().join("build/img/sprite.svg").exists());
    assert!(!dir.path().join("build/index.html").exists());
}

#[tokio::test]
async fn build_without_sprite_inputs_succeeds() {
    init_tracing();
    let dir = scaffold();
    fs::remove_dir_all(dir.path().join("source/img/sprite")).unwrap();
    let project = project(&dir);

    with_timeout(project.build(&targets(&["build"]))).await.unwrap();

    assert!(!dir.path().join("build/img/sprite.svg").exists());
    assert!(dir.path().join("build/index.html").is_file());
}

#[tokio::test]
async fn start_pipeline_builds_and_defers_serve() {
    init_tracing();
    let dir = scaffold();
    let project = project(&dir);

    let resolved = project.resolve(&targets(&["start"])).unwrap();
    assert_eq!(resolved.serve.as_deref(), Some("server"));

    // `build` never enters the serve step.
    let report = with_timeout(project.build(&targets(&["start"]))).await.unwrap();
    assert!(report.task_names().iter().all(|n| *n != "server"));
    assert!(dir.path().join("build/index.html").is_file());
}

#[tokio::test]
async fn single_task_target_runs_alone() {
    init_tracing();
    let dir = scaffold();
    let project = project(&dir);

    let report = with_timeout(project.build(&targets(&["css"]))).await.unwrap();

    assert_eq!(report.task_names(), vec!["css"]);
    assert!(dir.path().join("build/css/style.min.css").is_file());
    assert!(!dir.path().join("build/index.html").exists());
}
