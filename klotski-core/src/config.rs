//! Solver configuration, loadable from TOML.
//!
//! ```toml
//! seed = 7
//!
//! [goal]
//! piece = "b"
//! x = 1
//! y = 3
//!
//! [[layout]]
//! label = "b"
//! width = 2
//! height = 2
//! x = 1
//! y = 0
//! ```

use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::layout::{classic_layout, Layout, LayoutError, PieceSpec};
use crate::search::Board;
use crate::Cell;

pub const DEFAULT_SEED: u64 = 0x6b6c_6f74;

/// Target piece and the anchor cell it has to reach.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Goal {
    pub piece: char,
    pub x: i8,
    pub y: i8,
}

impl Goal {
    #[inline]
    pub fn anchor(&self) -> Cell {
        Cell::new(self.x, self.y)
    }
}

impl Default for Goal {
    fn default() -> Self {
        Goal {
            piece: 'b',
            x: 1,
            y: 3,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SolverConfig {
    /// Seed for the Zobrist key stream.
    pub seed: u64,
    pub goal: Goal,
    /// Starting pieces; the classic layout when absent.
    pub layout: Option<Vec<PieceSpec>>,
}

impl Default for SolverConfig {
    fn default() -> Self {
        SolverConfig {
            seed: DEFAULT_SEED,
            goal: Goal::default(),
            layout: None,
        }
    }
}

impl SolverConfig {
    pub fn from_toml_str(content: &str) -> Result<SolverConfig, toml::de::Error> {
        toml::from_str(content)
    }

    pub fn layout(&self) -> Layout {
        match &self.layout {
            Some(pieces) => Layout::new(pieces.clone()),
            None => classic_layout(),
        }
    }

    /// Construct the search board for this configuration.
    pub fn board(&self) -> Result<Board, LayoutError> {
        Board::new(self.layout(), self)
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

/// Load a configuration file.
pub fn load_config(path: &Path) -> Result<SolverConfig, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    SolverConfig::from_toml_str(&content).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

/// Try well-known paths, falling back to built-in defaults.
pub fn load_default_config() -> SolverConfig {
    let candidates = ["klotski.toml", "../klotski.toml"];
    for path in &candidates {
        let p = Path::new(path);
        if p.exists() {
            match load_config(p) {
                Ok(config) => {
                    tracing::info!(path = %p.display(), seed = config.seed, "loaded solver config");
                    return config;
                }
                Err(e) => {
                    tracing::warn!(path = %p.display(), error = %e, "failed to load solver config");
                }
            }
        }
    }
    tracing::debug!("no klotski.toml found, using built-in defaults");
    SolverConfig::default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_toml_is_default() {
        let config = SolverConfig::from_toml_str("").unwrap();
        assert_eq!(config, SolverConfig::default());
        assert_eq!(config.layout(), classic_layout());
    }

    #[test]
    fn test_toml_overrides() {
        let config = SolverConfig::from_toml_str(
            r#"
            seed = 99

            [goal]
            piece = "a"
            x = 0
            y = 3

            [[layout]]
            label = "a"
            width = 1
            height = 2
            x = 0
            y = 0
            "#,
        )
        .unwrap();

        assert_eq!(config.seed, 99);
        assert_eq!(config.goal, Goal { piece: 'a', x: 0, y: 3 });
        assert_eq!(config.layout().pieces, vec![PieceSpec::new('a', 1, 2, 0, 0)]);
    }

    #[test]
    fn test_rejects_multi_char_label() {
        let result = SolverConfig::from_toml_str(
            r#"
            [goal]
            piece = "bb"
            x = 1
            y = 3
            "#,
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_board_rejects_anchor_at_i8_limit() {
        let config = SolverConfig::from_toml_str(
            r#"
            [[layout]]
            label = "b"
            width = 2
            height = 2
            x = 127
            y = 0
            "#,
        )
        .unwrap();
        assert_eq!(
            config.board().err(),
            Some(LayoutError::OutOfBounds { label: 'b', x: 127, y: 0 })
        );
    }

    #[test]
    fn test_load_missing_file() {
        let err = load_config(Path::new("does/not/exist.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }
}
