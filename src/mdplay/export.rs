//! Standalone HTML export of a rendered document.

use crate::config::{DEFAULT_EXPORT_FILE_NAME, DEFAULT_EXPORT_TITLE};
use crate::error::{PlaygroundError, Result};
use crate::model::Theme;
use minijinja::{context, Environment};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;
use uuid::Uuid;

/// The `.html` name turns on minijinja's HTML auto-escaping.
const TEMPLATE_NAME: &str = "export.html";
const EXPORT_TEMPLATE: &str = include_str!("templates/export.html");

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportOptions {
    pub title: String,
    pub theme: Theme,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            title: DEFAULT_EXPORT_TITLE.to_string(),
            theme: Theme::Light,
        }
    }
}

/// Wrap sanitized `body` markup in a complete HTML document.
///
/// The title is escaped; `body` is inserted as is and must already be
/// pipeline output.
pub fn standalone_document(body: &str, options: &ExportOptions) -> Result<String> {
    let mut env = Environment::new();
    env.add_template(TEMPLATE_NAME, EXPORT_TEMPLATE)?;
    let tmpl = env.get_template(TEMPLATE_NAME)?;
    let title = if options.title.trim().is_empty() {
        DEFAULT_EXPORT_TITLE
    } else {
        options.title.as_str()
    };
    let html = tmpl.render(context! {
        title => title,
        theme => options.theme.as_str(),
        body => body,
    })?;
    Ok(html)
}

/// Where an export to `target` lands: inside it when it is a directory.
pub fn resolve_target(target: &Path, file_name: &str) -> PathBuf {
    if target.is_dir() {
        let name = if file_name.trim().is_empty() {
            DEFAULT_EXPORT_FILE_NAME
        } else {
            file_name
        };
        target.join(name)
    } else {
        target.to_path_buf()
    }
}

/// Write `html` to `target` (a file, or a directory to place `file_name` in).
pub fn write_document(target: &Path, file_name: &str, html: &str) -> Result<PathBuf> {
    let path = resolve_target(target, file_name);
    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
        _ => PathBuf::from("."),
    };
    if !parent.exists() {
        fs::create_dir_all(&parent).map_err(PlaygroundError::Io)?;
    }

    let tmp_path = parent.join(format!(".mdplay-export-{}.tmp", Uuid::new_v4()));
    fs::write(&tmp_path, html).map_err(PlaygroundError::Io)?;
    if let Err(e) = fs::rename(&tmp_path, &path) {
        let _ = fs::remove_file(&tmp_path);
        return Err(PlaygroundError::Io(e));
    }
    debug!(path = %path.display(), bytes = html.len(), "exported document");
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_document_wraps_body() {
        let html = standalone_document("<p>Hi</p>", &ExportOptions::default()).unwrap();
        assert!(html.starts_with("<!DOCTYPE html>"));
        assert!(html.contains("<title>Markdown Content</title>"));
        assert!(html.contains("<body>\n<p>Hi</p>\n</body>"));
        assert!(html.contains("data-theme=\"light\""));
        assert!(html.contains("max-width: 800px"));
    }

    #[test]
    fn test_title_is_escaped() {
        let options = ExportOptions {
            title: "</title><script>x()</script>".to_string(),
            theme: Theme::Dark,
        };
        let html = standalone_document("", &options).unwrap();
        assert!(!html.contains("<script>"));
        assert!(!html.contains("</title><script>"));
        assert!(html.contains("&lt;script&gt;"));
        assert!(html.contains("data-theme=\"dark\""));
    }

    #[test]
    fn test_blank_title_uses_default() {
        let options = ExportOptions {
            title: "  ".to_string(),
            ..ExportOptions::default()
        };
        let html = standalone_document("", &options).unwrap();
        assert!(html.contains("<title>Markdown Content</title>"));
    }

    #[test]
    fn test_write_into_directory_and_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_document(dir.path(), DEFAULT_EXPORT_FILE_NAME, "<html></html>").unwrap();
        assert_eq!(path, dir.path().join("markdown-content.html"));
        assert_eq!(fs::read_to_string(&path).unwrap(), "<html></html>");

        let explicit = dir.path().join("out/notes.html");
        let path = write_document(&explicit, DEFAULT_EXPORT_FILE_NAME, "x").unwrap();
        assert_eq!(path, explicit);
        assert_eq!(fs::read_to_string(&explicit).unwrap(), "x");

        let leftovers = fs::read_dir(dir.path().join("out"))
            .unwrap()
            .filter(|e| {
                e.as_ref()
                    .unwrap()
                    .file_name()
                    .to_string_lossy()
                    .ends_with(".tmp")
            })
            .count();
        assert_eq!(leftovers, 0);
    }
}
