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

use super::game_date::GameDate;
use super::grouping::{self, Grouping, Groupings, N_GROUPS};
use serde::Deserialize;

/// The day that fallback puzzles are counted from
const FALLBACK_EPOCH: (i32, u32, u32) = (2022, 2, 14);

/// One row of the puzzle spreadsheet. Every puzzle is four rows
/// sharing a date. Empty cells are left out of the JSON so only the
/// date is required.
#[derive(Debug, Clone, Deserialize)]
pub struct SheetRow {
    pub date: String,
    #[serde(default)]
    pub difficulty: String,
    #[serde(default)]
    pub group: String,
    #[serde(default)]
    pub word1: String,
    #[serde(default)]
    pub word2: String,
    #[serde(default)]
    pub word3: String,
    #[serde(default)]
    pub word4: String,
}

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("{0}")]
    Json(#[from] serde_json::Error),
    #[error("no complete puzzles in the sheet")]
    NoPuzzles,
    #[error("invalid difficulty “{0}”")]
    InvalidDifficulty(String),
    #[error("{0}")]
    Grouping(#[from] grouping::Error),
}

pub fn parse_rows(json: &str) -> Result<Vec<SheetRow>, Error> {
    Ok(serde_json::from_str(json)?)
}

impl SheetRow {
    fn to_grouping(&self) -> Result<Grouping, Error> {
        let Ok(difficulty) = self.difficulty.trim().parse::<u8>()
        else {
            return Err(Error::InvalidDifficulty(self.difficulty.clone()));
        };

        Ok(Grouping {
            group: self.group.clone(),
            difficulty,
            words: [&self.word1, &self.word2, &self.word3, &self.word4]
                .map(|word| word.clone()),
        })
    }
}

/// Groups the rows by their trimmed date, keeping the order in which
/// each date first appears.
fn rows_by_date(rows: &[SheetRow]) -> Vec<(&str, Vec<&SheetRow>)> {
    let mut dates: Vec<(&str, Vec<&SheetRow>)> = Vec::new();

    for row in rows.iter() {
        let date = row.date.trim();

        match dates.iter_mut().find(|(d, _)| *d == date) {
            Some((_, date_rows)) => date_rows.push(row),
            None => dates.push((date, vec![row])),
        }
    }

    dates
}

/// Picks the puzzle for `date`. If the sheet has no complete puzzle for
/// that day then one of the complete puzzles is chosen based on the
/// number of days since a fixed epoch so that every player gets the
/// same one.
pub fn groupings_for_date(
    rows: &[SheetRow],
    date: GameDate,
) -> Result<Groupings, Error> {
    let key = date.key();
    let dates = rows_by_date(rows);

    let chosen = match dates.iter().find(|(d, _)| *d == key) {
        Some((_, rows)) if rows.len() == N_GROUPS => rows,
        _ => {
            let complete = dates.iter()
                .filter(|(_, rows)| rows.len() == N_GROUPS)
                .collect::<Vec<_>>();

            if complete.is_empty() {
                return Err(Error::NoPuzzles);
            }

            let (year, month, day) = FALLBACK_EPOCH;
            let epoch = GameDate::from_ymd(year, month, day)
                .ok_or(Error::NoPuzzles)?;
            let index = date.days_since(epoch)
                .rem_euclid(complete.len() as i64) as usize;

            &complete[index].1
        },
    };

    let groupings = chosen.iter()
        .map(|row| row.to_grouping())
        .collect::<Result<Vec<_>, _>>()?;

    Ok(Groupings::new(groupings)?)
}
