// Grupoj – A word grouping game
// Copyright (C) 2024  Neil Roberts
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License
// along with this program.  If not, see <http://www.gnu.org/licenses/>.

use serde::Deserialize;

pub const DEFAULT_STORAGE_KEY: &str = "grupoj-game-state";
pub const DEFAULT_SHEET_URL: &str =
    "https://opensheet.elk.sh/\
     1KWCELv96If20u8H5_3b4pR0fo4Z8Dd61uxFTCuVas48/solutions-tab";

/// Delays in milliseconds of the timed reactions, each one relative to
/// the event that scheduled it.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Timings {
    /// Gap between each tile of an attempt lighting up
    pub stagger_ms: u32,
    /// When the tiles of an attempt show whether it was right
    pub reveal_ms: u32,
    /// When the selection is cleared after a correct attempt
    pub clear_selection_ms: u32,
    pub auto_solve_step_ms: u32,
    pub auto_solve_trailing_ms: u32,
}

impl Default for Timings {
    fn default() -> Timings {
        Timings {
            stagger_ms: 100,
            reveal_ms: 1_000,
            clear_selection_ms: 2_000,
            auto_solve_step_ms: 2_500,
            auto_solve_trailing_ms: 3_000,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Config {
    pub shuffle_initial: bool,
    pub storage_key: String,
    pub sheet_url: String,
    pub timings: Timings,
}

impl Default for Config {
    fn default() -> Config {
        Config {
            shuffle_initial: true,
            storage_key: DEFAULT_STORAGE_KEY.to_string(),
            sheet_url: DEFAULT_SHEET_URL.to_string(),
            timings: Timings::default(),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("{0}")]
    Io(#[from] std::io::Error),
    #[error("{0}")]
    Json(#[from] serde_json::Error),
}

impl Config {
    pub fn from_json(s: &str) -> Result<Config, Error> {
        Ok(serde_json::from_str(s)?)
    }

    #[cfg(not(target_arch = "wasm32"))]
    pub fn load<P: AsRef<std::path::Path>>(path: P) -> Result<Config, Error> {
        Config::from_json(&std::fs::read_to_string(path)?)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn defaults() {
        let config = Config::from_json("{}").unwrap();

        assert_eq!(config, Config::default());
        assert!(config.shuffle_initial);
        assert_eq!(&config.storage_key, DEFAULT_STORAGE_KEY);
        assert_eq!(config.timings.stagger_ms, 100);
        assert_eq!(config.timings.auto_solve_trailing_ms, 3_000);
    }

    #[test]
    fn partial() {
        let config = Config::from_json(
            "{\"shuffle_initial\": false, \
              \"timings\": {\"reveal_ms\": 10}}"
        ).unwrap();

        assert!(!config.shuffle_initial);
        assert_eq!(config.timings.reveal_ms, 10);
        assert_eq!(config.timings.clear_selection_ms, 2_000);
        assert_eq!(&config.sheet_url, DEFAULT_SHEET_URL);
    }

    #[test]
    fn invalid() {
        assert!(matches!(
            Config::from_json("{\"timings\": 3}").unwrap_err(),
            Error::Json(_),
        ));
        assert!(matches!(
            Config::load("/nonexistent/grupoj.json").unwrap_err(),
            Error::Io(_),
        ));
    }
}
