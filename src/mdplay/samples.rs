//! Named canned documents.
//!
//! Samples are looked up in the configured samples directory first. The
//! documents shipped with mdplay are compiled in and answer for any name the
//! directory does not have.

use crate::error::{PlaygroundError, Result};
use std::collections::BTreeSet;
use std::fs;
use std::io;
use std::path::PathBuf;
use tracing::debug;

pub const INTRO_SAMPLE: &str = "intro.md";

const BUILTIN: &[(&str, &str)] = &[
    ("features.md", include_str!("../../samples/features.md")),
    (INTRO_SAMPLE, include_str!("../../samples/intro.md")),
    ("usage.md", include_str!("../../samples/usage.md")),
];

pub trait SampleSource {
    fn fetch(&self, name: &str) -> Result<String>;

    fn list(&self) -> Result<Vec<String>>;
}

/// Samples from a directory, backed by the built-in set.
#[derive(Debug, Clone)]
pub struct DirSamples {
    dir: PathBuf,
    builtin: bool,
}

impl DirSamples {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            builtin: true,
        }
    }

    /// Only serve what is on disk.
    pub fn without_builtin(mut self) -> Self {
        self.builtin = false;
        self
    }

    fn builtin(&self, name: &str) -> Option<&'static str> {
        if !self.builtin {
            return None;
        }
        BUILTIN
            .iter()
            .find(|(builtin, _)| *builtin == name)
            .map(|(_, content)| *content)
    }
}

/// A sample name is a single plain file name.
fn valid_name(name: &str) -> bool {
    !name.is_empty()
        && name != "."
        && name != ".."
        && !name.contains(&['/', '\\'][..])
        && !name.contains("..")
        && !name.contains('\0')
}

impl SampleSource for DirSamples {
    fn fetch(&self, name: &str) -> Result<String> {
        if !valid_name(name) {
            return Err(PlaygroundError::ResourceNotFound(name.to_string()));
        }

        let path = self.dir.join(name);
        match fs::read_to_string(&path) {
            Ok(content) => {
                debug!(path = %path.display(), "loaded sample");
                return Ok(content);
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => {
                debug!(path = %path.display(), error = %e, "sample unreadable");
                return Err(PlaygroundError::ResourceNotFound(name.to_string()));
            }
        }

        self.builtin(name)
            .map(str::to_string)
            .ok_or_else(|| PlaygroundError::ResourceNotFound(name.to_string()))
    }

    fn list(&self) -> Result<Vec<String>> {
        let mut names = BTreeSet::new();
        if self.builtin {
            names.extend(BUILTIN.iter().map(|(name, _)| name.to_string()));
        }

        let entries = match fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Ok(names.into_iter().collect());
            }
            Err(e) => return Err(PlaygroundError::Io(e)),
        };
        for entry in entries {
            let entry = entry?;
            if !entry.file_type()?.is_file() {
                continue;
            }
            if let Some(name) = entry.file_name().to_str() {
                if valid_name(name) && !name.starts_with('.') {
                    names.insert(name.to_string());
                }
            }
        }
        Ok(names.into_iter().collect())
    }
}
