// tests/config_errors.rs

use std::io::Write;

use tempfile::NamedTempFile;

use sitepipe::config::{load_and_validate, parse_and_validate};
use sitepipe::errors::SitepipeError;
use sitepipe::types::{RefreshKind, TriggerWhileRunningBehaviour};

fn config_error(toml: &str) -> String {
    match parse_and_validate(toml) {
        Err(SitepipeError::ConfigError(msg)) => msg,
        Err(other) => panic!("expected ConfigError, got {other:?}"),
        Ok(_) => panic!("expected ConfigError, config was accepted"),
    }
}

#[test]
fn dag_cycle_returns_structured_error() {
    let mut file = NamedTempFile::new().unwrap();
    write!(
        file,
        r#"
[task.css]
cmd = "echo css"
after = ["html"]

[task.html]
cmd = "echo html"
after = ["css"]
"#
    )
    .unwrap();

    let err = load_and_validate(file.path()).unwrap_err();
    assert!(matches!(err, SitepipeError::DagCycle(_)), "got {err:?}");
}

#[test]
fn missing_file_is_an_io_error() {
    let err = load_and_validate("/definitely/not/here/Sitepipe.toml").unwrap_err();
    assert!(matches!(err, SitepipeError::IoError(_)));
}

#[test]
fn invalid_toml_is_a_toml_error() {
    let err = parse_and_validate("[task.css\ncmd = ").unwrap_err();
    assert!(matches!(err, SitepipeError::TomlError(_)));
}

#[test]
fn unknown_field_is_rejected() {
    let err = parse_and_validate(
        r#"
[task.css]
command = "echo css"
"#,
    )
    .unwrap_err();
    assert!(matches!(err, SitepipeError::TomlError(_)));
}

#[test]
fn unknown_dependency_is_named() {
    let msg = config_error(
        r#"
[task.html]
cmd = "echo html"
after = ["partials"]
"#,
    );
    assert!(msg.contains("partials"), "{msg}");
}

#[test]
fn cmd_and_builtin_are_exclusive() {
    let msg = config_error(
        r#"
[task.clean]
cmd = "rm -rf build"
builtin = "clean"
"#,
    );
    assert!(msg.contains("clean"), "{msg}");
}

#[test]
fn sprite_requires_include_globs() {
    let msg = config_error(
        r#"
[task.sprite]
builtin = "sprite"
"#,
    );
    assert!(msg.contains("include"), "{msg}");
}

#[test]
fn serve_must_be_the_last_pipeline_step() {
    let msg = config_error(
        r#"
[task.server]
builtin = "serve"

[task.css]
cmd = "echo css"

[pipeline.start]
steps = ["server", "css"]
"#,
    );
    assert!(msg.contains("server"), "{msg}");
}

#[test]
fn serve_cannot_sit_in_a_parallel_group() {
    let msg = config_error(
        r#"
[task.server]
builtin = "serve"

[task.css]
cmd = "echo css"

[pipeline.start]
steps = [["css", "server"]]
"#,
    );
    assert!(msg.contains("server"), "{msg}");
}

#[test]
fn pipeline_must_respect_dependencies() {
    let msg = config_error(
        r#"
[task.css]
cmd = "echo css"

[task.html]
cmd = "echo html"
after = ["css"]

[pipeline.build]
steps = [["css", "html"]]
"#,
    );
    assert!(msg.contains("html"), "{msg}");
}

#[test]
fn watch_rule_cannot_trigger_serve() {
    let msg = config_error(
        r#"
[task.server]
builtin = "serve"

[[watch]]
glob = "source/**/*.html"
tasks = ["server"]
"#,
    );
    assert!(msg.contains("server"), "{msg}");
}

#[test]
fn watch_rule_with_bad_glob_is_rejected() {
    let msg = config_error(
        r#"
[task.css]
cmd = "echo css"

[[watch]]
glob = "source/sass/[.scss"
tasks = ["css"]
"#,
    );
    assert!(msg.contains("glob"), "{msg}");
}

#[test]
fn zero_queue_length_is_rejected() {
    let msg = config_error(
        r#"
[config]
queue_length = 0

[task.css]
cmd = "echo css"
"#,
    );
    assert!(msg.contains("queue_length"), "{msg}");
}

#[test]
fn defaults_are_applied() {
    let cfg = parse_and_validate(
        r#"
[task.css]
cmd = "echo css"

[[watch]]
glob = "source/sass/*.scss"
tasks = ["css"]
"#,
    )
    .unwrap();

    assert_eq!(cfg.project().source_dir.to_str(), Some("source"));
    assert_eq!(cfg.project().build_dir.to_str(), Some("build"));
    assert_eq!(cfg.server().port, 3000);
    assert_eq!(
        cfg.config_section().triggered_while_running_behaviour,
        TriggerWhileRunningBehaviour::Queue
    );
    assert_eq!(cfg.watch_rules()[0].refresh, RefreshKind::Reload);
}
