//! Resource lookup with fallback to the `default` resource set.

use std::path::{Path, PathBuf};

use docsite_shared::{DocsiteError, Result};

/// Name of the resource set every lookup falls back to.
pub const DEFAULT_RESOURCE_DIR: &str = "default";

pub const TEMPLATE_DIR: &str = "templates";
pub const JSON_DIR: &str = "json";
pub const STATIC_DIR: &str = "static";

/// Finds resource files in `<root>/<selected>/` first, then `<root>/default/`.
#[derive(Debug, Clone)]
pub struct ResourceResolver {
    dirs: Vec<PathBuf>,
}

impl ResourceResolver {
    pub fn new(root: &Path, selected: &str) -> Self {
        let mut dirs = vec![root.join(selected)];
        if selected != DEFAULT_RESOURCE_DIR {
            dirs.push(root.join(DEFAULT_RESOURCE_DIR));
        }
        Self { dirs }
    }

    /// The fallback directory.
    pub fn default_dir(&self) -> &Path {
        self.dirs.last().map(PathBuf::as_path).unwrap_or(Path::new(""))
    }

    /// First existing `<dir>/<rel>` among the candidate directories.
    pub fn resolve(&self, rel: impl AsRef<Path>) -> Result<PathBuf> {
        let rel = rel.as_ref();
        self.dirs
            .iter()
            .map(|dir| dir.join(rel))
            .find(|candidate| candidate.exists())
            .ok_or_else(|| {
                let dirs: Vec<String> = self.dirs.iter().map(|d| d.display().to_string()).collect();
                DocsiteError::Template(format!(
                    "could not find {} in any of these dirs: [{}]",
                    rel.display(),
                    dirs.join(", ")
                ))
            })
    }

    pub fn read_to_string(&self, rel: impl AsRef<Path>) -> Result<String> {
        let path = self.resolve(rel)?;
        std::fs::read_to_string(&path).map_err(|e| DocsiteError::io(&path, e))
    }

    pub fn template(&self, name: &str) -> Result<String> {
        self.read_to_string(Path::new(TEMPLATE_DIR).join(name))
    }

    /// Parse `json/<name>`.
    pub fn json<T: serde::de::DeserializeOwned>(&self, name: &str) -> Result<T> {
        let rel = Path::new(JSON_DIR).join(name);
        let content = self.read_to_string(&rel)?;
        serde_json::from_str(&content)
            .map_err(|e| DocsiteError::parse(format!("{}: {e}", rel.display())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn selected_dir_overrides_default() {
        let root = std::env::temp_dir().join(format!("docsite-res-{}", uuid::Uuid::now_v7()));
        std::fs::create_dir_all(root.join("default/templates")).unwrap();
        std::fs::create_dir_all(root.join("custom/templates")).unwrap();
        std::fs::write(root.join("default/templates/part.html"), "default part").unwrap();
        std::fs::write(root.join("default/templates/header.html"), "default header").unwrap();
        std::fs::write(root.join("custom/templates/part.html"), "custom part").unwrap();

        let resolver = ResourceResolver::new(&root, "custom");
        assert_eq!(resolver.template("part.html").unwrap(), "custom part");
        assert_eq!(resolver.template("header.html").unwrap(), "default header");
        assert_eq!(resolver.default_dir(), root.join("default"));

        let err = resolver.template("missing.html").unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("missing.html"));
        assert!(msg.contains("custom"));
        assert!(msg.contains("default"));

        let _ = std::fs::remove_dir_all(&root);
    }
}
