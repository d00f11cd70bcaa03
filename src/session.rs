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

use super::grouping::GROUP_SIZE;
use super::positions::{self, Position, N_TILES};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TileStatus {
    #[default]
    #[serde(rename = "none")]
    Idle,
    Attempt,
    Wrong,
    Solved,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tile {
    pub word: String,
    #[serde(default)]
    pub status: TileStatus,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SubmittedBy {
    User,
    Auto,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Attempt {
    pub words: [String; GROUP_SIZE],
    pub correct: bool,
    pub submitted_by: SubmittedBy,
}

/// Everything needed to resume the game of a day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub date_key: String,
    pub tiles: Vec<Tile>,
    pub selected_words: Vec<String>,
    pub attempts: Vec<Attempt>,
    pub positions: Vec<Position>,
    pub ended: bool,
    pub won: bool,
    pub auto_solve_finished: bool,
}

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("{0}")]
    Json(#[from] serde_json::Error),
    #[error("missing date")]
    MissingDate,
    #[error("expected {expected} tiles but found {0}", expected = N_TILES)]
    WrongTileCount(usize),
    #[error("duplicate tile")]
    DuplicateTile,
    #[error("invalid positions")]
    InvalidPositions,
    #[error("too many selected words")]
    TooManySelected,
    #[error("unknown word “{0}”")]
    UnknownWord(String),
}

impl Session {
    /// Checks the invariants that the game relies on so that a
    /// damaged save is never partially applied.
    pub fn validate(&self) -> Result<(), Error> {
        if self.date_key.trim().is_empty() {
            return Err(Error::MissingDate);
        }

        if self.tiles.len() != N_TILES {
            return Err(Error::WrongTileCount(self.tiles.len()));
        }

        let mut words = HashSet::new();

        for tile in self.tiles.iter() {
            if !words.insert(tile.word.as_str()) {
                return Err(Error::DuplicateTile);
            }
        }

        if !positions::is_bijection(&self.positions) {
            return Err(Error::InvalidPositions);
        }

        if self.selected_words.len() > GROUP_SIZE {
            return Err(Error::TooManySelected);
        }

        let attempt_words = self.attempts.iter()
            .flat_map(|attempt| attempt.words.iter());

        for word in self.selected_words.iter().chain(attempt_words) {
            if !words.contains(word.as_str()) {
                return Err(Error::UnknownWord(word.clone()));
            }
        }

        Ok(())
    }

    pub fn to_json(&self) -> Result<String, Error> {
        Ok(serde_json::to_string(self)?)
    }
}

impl FromStr for Session {
    type Err = Error;

    fn from_str(s: &str) -> Result<Session, Error> {
        let session = serde_json::from_str::<Session>(s)?;
        session.validate()?;
        Ok(session)
    }
}

#[cfg(test)]
pub fn test_session(date_key: &str) -> Session {
    use super::grouping;

    let words = grouping::test_groupings().words()
        .map(str::to_string)
        .collect::<Vec<_>>();

    Session {
        date_key: date_key.to_string(),
        tiles: words.iter().map(|word| Tile {
            word: word.clone(),
            status: TileStatus::Idle,
        }).collect(),
        selected_words: Vec::new(),
        attempts: Vec::new(),
        positions: positions::ORDERED_POSITIONS.to_vec(),
        ended: false,
        won: false,
        auto_solve_finished: false,
    }
}
