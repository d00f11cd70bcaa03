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

use chrono::NaiveDate;
use std::fmt;
use std::str::FromStr;

const KEY_FORMAT: &str = "%Y-%m-%d";

/// The calendar day that a puzzle and its saved session belong to.
/// Days are counted in UTC.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct GameDate(NaiveDate);

#[derive(Debug, PartialEq, Eq, thiserror::Error)]
#[error("invalid date “{0}”")]
pub struct Error(String);

impl GameDate {
    pub fn from_ymd(year: i32, month: u32, day: u32) -> Option<GameDate> {
        NaiveDate::from_ymd_opt(year, month, day).map(GameDate)
    }

    #[cfg(not(target_arch = "wasm32"))]
    pub fn today() -> GameDate {
        GameDate(chrono::Utc::now().date_naive())
    }

    pub fn key(&self) -> String {
        self.to_string()
    }

    /// Number of days from `earlier` to this date. Negative if
    /// `earlier` is actually later.
    pub fn days_since(&self, earlier: GameDate) -> i64 {
        self.0.signed_duration_since(earlier.0).num_days()
    }
}

impl fmt::Display for GameDate {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0.format(KEY_FORMAT))
    }
}

impl FromStr for GameDate {
    type Err = Error;

    fn from_str(s: &str) -> Result<GameDate, Error> {
        NaiveDate::parse_from_str(s.trim(), KEY_FORMAT)
            .map(GameDate)
            .map_err(|_| Error(s.to_string()))
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn key() {
        let date = GameDate::from_ymd(2024, 3, 7).unwrap();
        assert_eq!(&date.key(), "2024-03-07");
        assert_eq!(" 2024-03-07 ".parse::<GameDate>().unwrap(), date);
        assert!(GameDate::from_ymd(2024, 2, 30).is_none());
    }

    #[test]
    fn parse_error() {
        assert_eq!(
            &"07/03/2024".parse::<GameDate>().unwrap_err().to_string(),
            "invalid date “07/03/2024”",
        );
        assert!("".parse::<GameDate>().is_err());
        assert!("2024-13-01".parse::<GameDate>().is_err());
    }

    #[test]
    fn days_since() {
        let epoch = GameDate::from_ymd(2022, 2, 14).unwrap();

        assert_eq!(epoch.days_since(epoch), 0);
        assert_eq!(
            GameDate::from_ymd(2022, 3, 14).unwrap().days_since(epoch),
            28,
        );
        assert_eq!(
            GameDate::from_ymd(2022, 2, 13).unwrap().days_since(epoch),
            -1,
        );
    }
}
