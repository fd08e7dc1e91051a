//! Data source for themes and boards. Fetches never fail loudly: any error is
//! logged and surfaces as `None` (or an empty list), and the game degrades to
//! default colours or an unplayable empty screen.

use crate::board::Board;
use crate::generator::{BoardGenerator, GenerateError};
use crate::theme::Theme;
use std::future::Future;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, warn};

/// Read-only, asynchronous provider of themes and boards.
pub trait TileSource {
    fn fetch_theme(&self, name: &str) -> impl Future<Output = Option<Theme>> + Send;

    fn fetch_board(
        &self,
        name: &str,
        rows: usize,
        columns: usize,
    ) -> impl Future<Output = Option<Board>> + Send;

    fn fetch_theme_names(&self) -> impl Future<Output = Vec<String>> + Send;
}

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("io error reading {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("invalid json in {path}: {source}")]
    Json {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("theme '{0}' not found")]
    UnknownTheme(String),
    #[error(transparent)]
    Generate(#[from] GenerateError),
}

/// Read and parse a JSON document.
async fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T, SourceError> {
    let bytes = tokio::fs::read(path).await.map_err(|source| SourceError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_slice(&bytes).map_err(|source| SourceError::Json {
        path: path.to_path_buf(),
        source,
    })
}

pub async fn read_theme_file(path: &Path) -> Result<Theme, SourceError> {
    read_json(path).await
}

pub async fn read_board_file(path: &Path) -> Result<Board, SourceError> {
    read_json(path).await
}

/// Themes from `<themes_dir>/<name>.json`; boards generated from the theme, or read
/// from a fixed board document when one is configured.
#[derive(Debug, Clone)]
pub struct LocalSource {
    themes_dir: PathBuf,
    board_file: Option<PathBuf>,
    seed: Option<u64>,
}

impl LocalSource {
    pub fn new(themes_dir: impl Into<PathBuf>) -> Self {
        Self {
            themes_dir: themes_dir.into(),
            board_file: None,
            seed: None,
        }
    }

    /// Serve this board for every request instead of generating one.
    pub fn with_board_file(mut self, board_file: Option<PathBuf>) -> Self {
        self.board_file = board_file;
        self
    }

    pub fn with_seed(mut self, seed: Option<u64>) -> Self {
        self.seed = seed;
        self
    }

    /// Path of a theme document. Names that could escape the themes directory are rejected.
    pub fn theme_path(&self, name: &str) -> Result<PathBuf, SourceError> {
        let valid = !name.is_empty()
            && name
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
        if !valid {
            return Err(SourceError::UnknownTheme(name.to_string()));
        }
        Ok(self.themes_dir.join(format!("{name}.json")))
    }

    async fn load_theme(&self, name: &str) -> Result<Theme, SourceError> {
        let path = self.theme_path(name)?;
        match read_theme_file(&path).await {
            Err(SourceError::Io { source, .. })
                if source.kind() == std::io::ErrorKind::NotFound =>
            {
                Err(SourceError::UnknownTheme(name.to_string()))
            }
            other => other,
        }
    }

    async fn load_board(&self, name: &str, rows: usize, columns: usize) -> Result<Board, SourceError> {
        if let Some(path) = &self.board_file {
            debug!(path = %path.display(), "serving fixed board");
            return read_board_file(path).await;
        }
        let mut generator = BoardGenerator::new(rows, columns, self.seed)?;
        let theme = self.load_theme(name).await?;
        Ok(generator.generate(&theme)?)
    }

    async fn list_theme_names(&self) -> Result<Vec<String>, SourceError> {
        let io_err = |source| SourceError::Io {
            path: self.themes_dir.clone(),
            source,
        };
        let mut entries = tokio::fs::read_dir(&self.themes_dir).await.map_err(io_err)?;
        let mut names = Vec::new();
        while let Some(entry) = entries.next_entry().await.map_err(io_err)? {
            let path = entry.path();
            if path.extension().is_some_and(|ext| ext == "json") {
                if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                    names.push(stem.to_string());
                }
            }
        }
        names.sort();
        Ok(names)
    }
}

impl TileSource for LocalSource {
    async fn fetch_theme(&self, name: &str) -> Option<Theme> {
        self.load_theme(name)
            .await
            .inspect_err(|err| warn!(theme = name, %err, "theme unavailable"))
            .ok()
    }

    async fn fetch_board(&self, name: &str, rows: usize, columns: usize) -> Option<Board> {
        self.load_board(name, rows, columns)
            .await
            .inspect_err(|err| warn!(theme = name, rows, columns, %err, "board unavailable"))
            .ok()
    }

    async fn fetch_theme_names(&self) -> Vec<String> {
        self.list_theme_names()
            .await
            .inspect_err(|err| warn!(%err, "theme list unavailable"))
            .unwrap_or_default()
    }
}
