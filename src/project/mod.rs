pub mod renderer;

use std::path::Path;

use anyhow::{anyhow, bail, Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::config::SequencerConfig;
use crate::sequencer::Grid;
use crate::share;

const SESSION_VERSION: u32 = 1;
const CELL_ON: char = 'x';
const CELL_OFF: char = '.';

/// Serializable session: configuration plus the grid
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SessionData {
    pub version: u32,
    pub config: SequencerConfig,
    /// One string per row, row 0 (lowest pitch) first, 'x' = on
    #[serde(default)]
    pub cells: Vec<String>,
    /// Share token, written for grids small enough to share
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub share_token: Option<String>,
}

impl SessionData {
    /// Snapshot a grid together with the config it plays under
    pub fn from_grid(config: &SequencerConfig, grid: &Grid) -> Self {
        let mut config = config.clone();
        config.rows = grid.rows();
        config.cols = grid.cols();
        let cells = (0..grid.rows())
            .map(|row| {
                grid.row(row)
                    .iter()
                    .map(|&on| if on { CELL_ON } else { CELL_OFF })
                    .collect()
            })
            .collect();
        Self {
            version: SESSION_VERSION,
            config,
            cells,
            share_token: share::encode(grid).ok(),
        }
    }

    /// Rebuild the grid. Cell rows win over the share token when both exist.
    pub fn grid(&self) -> Result<Grid> {
        let (rows, cols) = (self.config.rows, self.config.cols);
        if self.cells.is_empty() {
            return Ok(match &self.share_token {
                Some(token) => share::decode_for(token, rows, cols),
                None => Grid::new(rows, cols),
            });
        }

        let parsed = self
            .cells
            .iter()
            .enumerate()
            .map(|(row, line)| {
                line.chars()
                    .map(|c| match c {
                        CELL_ON => Ok(true),
                        CELL_OFF => Ok(false),
                        other => Err(anyhow!("Unexpected cell '{}' in row {}", other, row)),
                    })
                    .collect::<Result<Vec<bool>>>()
            })
            .collect::<Result<Vec<_>>>()?;

        let grid = Grid::from_rows(&parsed).context("Session rows differ in length")?;
        if grid.dimensions() != (rows, cols) {
            bail!(
                "Session cells are {}x{}, config says {}x{}",
                grid.rows(),
                grid.cols(),
                rows,
                cols
            );
        }
        Ok(grid)
    }
}

/// Save a session to a JSON file
pub fn save_session(config: &SequencerConfig, grid: &Grid, path: &Path) -> Result<()> {
    let session = SessionData::from_grid(config, grid);
    let json = serde_json::to_string_pretty(&session).context("Failed to serialize session")?;
    std::fs::write(path, json).with_context(|| format!("Failed to write {}", path.display()))?;
    log::info!("Saved session to {}", path.display());
    Ok(())
}

/// Load a session from a JSON file
pub fn load_session(path: &Path) -> Result<SessionData> {
    let json = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;

    // Peek at version before committing to a format
    let raw: Value = serde_json::from_str(&json)
        .with_context(|| format!("Failed to parse {}", path.display()))?;
    let version = raw.get("version").and_then(|v| v.as_u64()).unwrap_or(0) as u32;
    if version == 0 || version > SESSION_VERSION {
        bail!(
            "Session version {} is not supported (expected 1..={})",
            version,
            SESSION_VERSION
        );
    }

    let session: SessionData = serde_json::from_value(raw)
        .with_context(|| format!("Failed to parse session {}", path.display()))?;
    session.config.validate()?;
    Ok(session)
}
