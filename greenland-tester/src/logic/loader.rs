use greenland_game::{CatalogError, CatalogLoader, ContentCatalog, GameConfig};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LoaderError {
    #[error("failed to read {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid content in {path}")]
    Content {
        path: PathBuf,
        #[source]
        source: CatalogError,
    },
    #[error(transparent)]
    Embedded(#[from] CatalogError),
}

/// Catalog and tuning read from disk, falling back to the embedded defaults.
#[derive(Debug, Clone, Default)]
pub struct FileCatalog {
    pub catalog: Option<PathBuf>,
    pub config: Option<PathBuf>,
}

fn read(path: &Path) -> Result<String, LoaderError> {
    std::fs::read_to_string(path).map_err(|source| LoaderError::Io {
        path: path.to_path_buf(),
        source,
    })
}

impl CatalogLoader for FileCatalog {
    type Error = LoaderError;

    fn load_catalog(&self) -> Result<ContentCatalog, Self::Error> {
        match &self.catalog {
            Some(path) => ContentCatalog::from_json(&read(path)?).map_err(|source| {
                LoaderError::Content {
                    path: path.clone(),
                    source,
                }
            }),
            None => Ok(ContentCatalog::load_default()?),
        }
    }

    fn load_config(&self) -> Result<GameConfig, Self::Error> {
        match &self.config {
            Some(path) => GameConfig::from_json(&read(path)?).map_err(|source| {
                LoaderError::Content {
                    path: path.clone(),
                    source,
                }
            }),
            None => Ok(GameConfig::default()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use greenland_game::SessionRegistry;

    fn temp_file(label: &str, contents: &str) -> PathBuf {
        let path = std::env::temp_dir().join(format!(
            "greenland-loader-{label}-{}.json",
            std::process::id()
        ));
        std::fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn defaults_without_paths() {
        let registry = SessionRegistry::from_loader(&FileCatalog::default()).unwrap();
        assert_eq!(registry.config(), &GameConfig::default());
    }

    #[test]
    fn config_file_overrides_tuning() {
        let path = temp_file("config", r#"{"strategy": {"horizon": 3}}"#);
        let loader = FileCatalog {
            catalog: None,
            config: Some(path),
        };
        let registry = SessionRegistry::from_loader(&loader).unwrap();
        assert_eq!(registry.config().strategy.horizon, 3);
    }

    #[test]
    fn missing_and_malformed_files_are_reported() {
        let missing = FileCatalog {
            catalog: Some(PathBuf::from("/nonexistent/greenland/catalog.json")),
            config: None,
        };
        assert!(matches!(missing.load_catalog(), Err(LoaderError::Io { .. })));

        let path = temp_file("broken", "{ not json");
        let broken = FileCatalog {
            catalog: None,
            config: Some(path.clone()),
        };
        let err = broken.load_config().unwrap_err();
        assert!(err.to_string().contains(&path.display().to_string()));
    }
}
