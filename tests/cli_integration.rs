use assert_cmd::Command;
use predicates::prelude::*;
use std::path::Path;

fn mdplay(home: &Path) -> Command {
    let mut cmd = Command::cargo_bin("mdplay").unwrap();
    cmd.env("MDPLAY_HOME", home)
        .env("MDPLAY_COLOR_SCHEME", "dark")
        .env("NO_COLOR", "1")
        .env_remove("RUST_LOG")
        .current_dir(home);
    cmd
}

#[test]
fn test_render_from_stdin() {
    let temp_dir = tempfile::tempdir().unwrap();

    mdplay(temp_dir.path())
        .arg("render")
        .write_stdin("# Hi\n\n<script>alert(1)</script>\n\n*there*")
        .assert()
        .success()
        .stdout(predicate::str::contains("<h1>Hi</h1>"))
        .stdout(predicate::str::contains("<em>there</em>"))
        .stdout(predicate::str::contains("script").not());
}

#[test]
fn test_render_file_strips_javascript_links() {
    let temp_dir = tempfile::tempdir().unwrap();
    let input = temp_dir.path().join("in.md");
    std::fs::write(&input, "[click](javascript:alert(1)) and [ok](https://example.com)").unwrap();

    mdplay(temp_dir.path())
        .arg("render")
        .arg(&input)
        .assert()
        .success()
        .stdout(predicate::str::contains("javascript").not())
        .stdout(predicate::str::contains("href=\"https://example.com\""));
}

#[test]
fn test_show_bootstraps_intro_then_save_replaces_it() {
    let temp_dir = tempfile::tempdir().unwrap();

    mdplay(temp_dir.path())
        .arg("show")
        .assert()
        .success()
        .stdout(predicate::str::starts_with(
            "# Welcome to the Markdown Playground",
        ));
    assert!(temp_dir
        .path()
        .join("db/documents/lastEdited.json")
        .is_file());

    mdplay(temp_dir.path())
        .arg("save")
        .write_stdin("# Mine\n\nSaved text.")
        .assert()
        .success();

    // A new process sees the saved document.
    mdplay(temp_dir.path())
        .args(["show", "--html"])
        .assert()
        .success()
        .stdout(predicate::str::contains("<h1>Mine</h1>"))
        .stdout(predicate::str::contains("<p>Saved text.</p>"));
}

#[test]
fn test_sample_commands() {
    let temp_dir = tempfile::tempdir().unwrap();

    mdplay(temp_dir.path())
        .arg("samples")
        .assert()
        .success()
        .stdout(predicate::str::contains("features.md"))
        .stdout(predicate::str::contains("intro.md"))
        .stdout(predicate::str::contains("usage.md"));

    mdplay(temp_dir.path())
        .args(["sample", "usage.md"])
        .assert()
        .success();

    mdplay(temp_dir.path())
        .arg("show")
        .assert()
        .success()
        .stdout(predicate::str::starts_with("# Usage"));

    mdplay(temp_dir.path())
        .args(["sample", "../config.json"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Resource not found: ../config.json"));
}

#[test]
fn test_theme_defaults_to_ambient_and_persists() {
    let temp_dir = tempfile::tempdir().unwrap();

    mdplay(temp_dir.path())
        .arg("theme")
        .assert()
        .success()
        .stdout("dark\n");

    // The stored value wins over a changed ambient scheme.
    mdplay(temp_dir.path())
        .env("MDPLAY_COLOR_SCHEME", "light")
        .arg("theme")
        .assert()
        .success()
        .stdout("dark\n");

    mdplay(temp_dir.path())
        .args(["theme", "toggle"])
        .assert()
        .success()
        .stdout("light\n");

    mdplay(temp_dir.path())
        .args(["theme", "purple"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Unknown theme"));
}

#[test]
fn test_export_writes_standalone_document() {
    let temp_dir = tempfile::tempdir().unwrap();

    mdplay(temp_dir.path())
        .arg("save")
        .write_stdin("# Exported")
        .assert()
        .success();

    let out = temp_dir.path().join("notes.html");
    mdplay(temp_dir.path())
        .args(["export", "--title", "My <Notes>", "--output"])
        .arg(&out)
        .assert()
        .success()
        .stdout(predicate::str::contains("Exported to"));

    let html = std::fs::read_to_string(&out).unwrap();
    assert!(html.starts_with("<!DOCTYPE html>"));
    assert!(html.contains("<title>My &lt;Notes&gt;</title>"));
    assert!(html.contains("<h1>Exported</h1>"));
    assert!(html.contains("data-theme=\"dark\""));

    mdplay(temp_dir.path()).arg("export").assert().success();
    assert!(temp_dir.path().join("markdown-content.html").is_file());
}

#[test]
fn test_config_set_and_get() {
    let temp_dir = tempfile::tempdir().unwrap();

    mdplay(temp_dir.path())
        .args(["config", "export-title", "Journal"])
        .assert()
        .success()
        .stdout(predicate::str::contains("export-title set to Journal"));

    mdplay(temp_dir.path())
        .args(["config", "export-title"])
        .assert()
        .success()
        .stdout("Journal\n");

    mdplay(temp_dir.path())
        .arg("config")
        .assert()
        .success()
        .stdout(
            predicate::str::contains("export-file-name")
                .and(predicate::str::contains("markdown-content.html")),
        );

    mdplay(temp_dir.path())
        .args(["config", "tables", "maybe"])
        .assert()
        .success()
        .stdout(predicate::str::contains("expects true or false"));
}

#[test]
fn test_config_extensions_change_rendering() {
    let temp_dir = tempfile::tempdir().unwrap();

    mdplay(temp_dir.path())
        .arg("render")
        .write_stdin("~~kept~~")
        .assert()
        .success()
        .stdout("<p>~~kept~~</p>\n");

    mdplay(temp_dir.path())
        .args(["config", "strikethrough", "on"])
        .assert()
        .success();

    mdplay(temp_dir.path())
        .arg("render")
        .write_stdin("~~kept~~")
        .assert()
        .success()
        .stdout("<p><del>kept</del></p>\n");
}
