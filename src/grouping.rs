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

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

pub const N_GROUPS: usize = 4;
pub const GROUP_SIZE: usize = 4;
pub const N_WORDS: usize = N_GROUPS * GROUP_SIZE;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Grouping {
    pub group: String,
    pub difficulty: u8,
    pub words: [String; GROUP_SIZE],
}

impl Grouping {
    pub fn contains(&self, word: &str) -> bool {
        self.words.iter().any(|w| w == word)
    }
}

#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    #[error("expected 4 groupings but found {0}")]
    WrongGroupCount(usize),
    #[error("grouping with an empty label")]
    EmptyLabel,
    #[error("empty word")]
    EmptyWord,
    #[error("invalid difficulty {0}")]
    InvalidDifficulty(u8),
    #[error("difficulty {0} is used twice")]
    DuplicateDifficulty(u8),
    #[error("“{0}” appears more than once")]
    DuplicateWord(String),
}

/// The four groupings of a puzzle, validated to partition sixteen
/// distinct words and sorted by ascending difficulty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Groupings {
    groupings: Vec<Grouping>,
}

impl Groupings {
    pub fn new(mut groupings: Vec<Grouping>) -> Result<Groupings, Error> {
        if groupings.len() != N_GROUPS {
            return Err(Error::WrongGroupCount(groupings.len()));
        }

        let mut difficulties = [false; N_GROUPS];
        let mut words = HashSet::new();

        for grouping in groupings.iter() {
            if grouping.group.trim().is_empty() {
                return Err(Error::EmptyLabel);
            }

            let index = (grouping.difficulty as usize).wrapping_sub(1);

            let Some(seen) = difficulties.get_mut(index)
            else {
                return Err(Error::InvalidDifficulty(grouping.difficulty));
            };

            if std::mem::replace(seen, true) {
                return Err(Error::DuplicateDifficulty(grouping.difficulty));
            }

            for word in grouping.words.iter() {
                if word.is_empty() {
                    return Err(Error::EmptyWord);
                }

                if !words.insert(word.as_str()) {
                    return Err(Error::DuplicateWord(word.clone()));
                }
            }
        }

        groupings.sort_by_key(|grouping| grouping.difficulty);

        Ok(Groupings { groupings })
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Grouping> {
        self.groupings.iter()
    }

    pub fn words(&self) -> impl Iterator<Item = &str> {
        self.groupings.iter()
            .flat_map(|grouping| grouping.words.iter().map(String::as_str))
    }

    pub fn grouping_for_word(&self, word: &str) -> Option<&Grouping> {
        self.groupings.iter().find(|grouping| grouping.contains(word))
    }

    pub fn grouping_for_label(&self, label: &str) -> Option<&Grouping> {
        self.groupings.iter().find(|grouping| grouping.group == label)
    }
}

/// Where the groupings of the day are in their loading process.
#[derive(Debug, Clone, Default)]
pub enum Catalog {
    #[default]
    Loading,
    Loaded(Groupings),
    Failed,
}

impl Catalog {
    pub fn groupings(&self) -> Option<&Groupings> {
        match self {
            Catalog::Loaded(groupings) => Some(groupings),
            Catalog::Loading | Catalog::Failed => None,
        }
    }

    pub fn is_resolved(&self) -> bool {
        !matches!(self, Catalog::Loading)
    }

    /// The label of the grouping containing `word`, or an empty
    /// string if the word is unknown or nothing is loaded.
    pub fn group_of(&self, word: &str) -> &str {
        self.groupings()
            .and_then(|groupings| groupings.grouping_for_word(word))
            .map(|grouping| grouping.group.as_str())
            .unwrap_or("")
    }

    pub fn difficulty_of(&self, word: &str) -> u8 {
        self.groupings()
            .and_then(|groupings| groupings.grouping_for_word(word))
            .map(|grouping| grouping.difficulty)
            .unwrap_or(1)
    }

    /// Returns the shared label if every word belongs to the same
    /// grouping.
    pub fn same_group<S: AsRef<str>>(&self, words: &[S]) -> Option<&str> {
        let (first, rest) = words.split_first()?;
        let label = self.group_of(first.as_ref());

        (!label.is_empty() &&
         rest.iter().all(|word| self.group_of(word.as_ref()) == label))
            .then_some(label)
    }

    /// True when the words fall into exactly two groupings split three
    /// to one.
    pub fn one_away<S: AsRef<str>>(&self, words: &[S]) -> bool {
        if self.groupings().is_none() {
            return false;
        }

        let mut counts: Vec<(&str, usize)> = Vec::with_capacity(2);

        for word in words {
            let label = self.group_of(word.as_ref());

            match counts.iter_mut().find(|(l, _)| *l == label) {
                Some((_, count)) => *count += 1,
                None => counts.push((label, 1)),
            }
        }

        counts.len() == 2 &&
            counts.iter().all(|&(_, count)| count == 1 || count == 3)
    }
}

pub fn difficulty_symbol(difficulty: u8) -> &'static str {
    match difficulty {
        1 => "🟨",
        2 => "🟩",
        3 => "🟦",
        4 => "🟪",
        _ => "",
    }
}

#[cfg(test)]
pub fn test_groupings() -> Groupings {
    let grouping = |group: &str, difficulty, words: [&str; GROUP_SIZE]| {
        Grouping {
            group: group.to_string(),
            difficulty,
            words: words.map(str::to_string),
        }
    };

    Groupings::new(vec![
        grouping("fruit", 1, ["apple", "pear", "plum", "fig"]),
        grouping("trees", 2, ["oak", "ash", "elm", "yew"]),
        grouping("birds", 3, ["crow", "wren", "owl", "swan"]),
        grouping("fish", 4, ["cod", "eel", "carp", "pike"]),
    ]).unwrap()
}

#[cfg(test)]
mod test {
    use super::*;

    fn grouping(group: &str, difficulty: u8, words: [&str; 4]) -> Grouping {
        Grouping {
            group: group.to_string(),
            difficulty,
            words: words.map(str::to_string),
        }
    }

    #[test]
    fn sorted_by_difficulty() {
        let groupings = Groupings::new(vec![
            grouping("d", 4, ["m", "n", "o", "p"]),
            grouping("b", 2, ["e", "f", "g", "h"]),
            grouping("a", 1, ["a", "b", "c", "d"]),
            grouping("c", 3, ["i", "j", "k", "l"]),
        ]).unwrap();

        assert_eq!(
            groupings.iter().map(|g| g.group.as_str()).collect::<Vec<_>>(),
            ["a", "b", "c", "d"],
        );
        assert_eq!(groupings.words().count(), N_WORDS);
        assert_eq!(groupings.words().next(), Some("a"));
    }

    #[test]
    fn invalid_groupings() {
        assert_eq!(
            &Groupings::new(Vec::new()).unwrap_err().to_string(),
            "expected 4 groupings but found 0",
        );

        let mut groupings = test_groupings().groupings;
        groupings[1].words[2] = "apple".to_string();
        assert_eq!(
            Groupings::new(groupings).unwrap_err(),
            Error::DuplicateWord("apple".to_string()),
        );

        let mut groupings = test_groupings().groupings;
        groupings[3].difficulty = 1;
        assert_eq!(
            Groupings::new(groupings).unwrap_err(),
            Error::DuplicateDifficulty(1),
        );

        let mut groupings = test_groupings().groupings;
        groupings[0].difficulty = 0;
        assert_eq!(
            Groupings::new(groupings).unwrap_err(),
            Error::InvalidDifficulty(0),
        );

        let mut groupings = test_groupings().groupings;
        groupings[2].group = " ".to_string();
        assert_eq!(Groupings::new(groupings).unwrap_err(), Error::EmptyLabel);

        let mut groupings = test_groupings().groupings;
        groupings[2].words[0].clear();
        assert_eq!(Groupings::new(groupings).unwrap_err(), Error::EmptyWord);
    }

    #[test]
    fn same_group() {
        let catalog = Catalog::Loaded(test_groupings());

        assert_eq!(
            catalog.same_group(&["apple", "pear", "plum", "fig"]),
            Some("fruit"),
        );
        assert_eq!(
            catalog.same_group(&["fig", "plum", "apple", "pear"]),
            Some("fruit"),
        );
        assert!(catalog.same_group(&["apple", "pear", "plum", "oak"]).is_none());
        assert!(catalog.same_group(&["apple", "pear", "plum", "?"]).is_none());
        assert!(catalog.same_group(&["?", "??", "???", "????"]).is_none());
        assert!(catalog.same_group::<&str>(&[]).is_none());
    }

    #[test]
    fn unresolved_catalog_never_matches() {
        for catalog in [Catalog::Loading, Catalog::Failed] {
            assert!(catalog.same_group(&["apple", "pear", "plum", "fig"])
                    .is_none());
            assert!(!catalog.one_away(&["apple", "pear", "plum", "oak"]));
            assert_eq!(catalog.group_of("apple"), "");
            assert_eq!(catalog.difficulty_of("pike"), 1);
        }
    }

    #[test]
    fn one_away() {
        let catalog = Catalog::Loaded(test_groupings());

        // 3-1 split
        assert!(catalog.one_away(&["apple", "pear", "plum", "oak"]));
        assert!(catalog.one_away(&["oak", "crow", "wren", "owl"]));
        // 2-2 split
        assert!(!catalog.one_away(&["apple", "pear", "oak", "ash"]));
        // All the same is correct, not one away
        assert!(!catalog.one_away(&["apple", "pear", "plum", "fig"]));
        // One from each
        assert!(!catalog.one_away(&["apple", "oak", "crow", "cod"]));
        // 2-1-1
        assert!(!catalog.one_away(&["apple", "pear", "oak", "cod"]));
    }

    #[test]
    fn difficulties() {
        let catalog = Catalog::Loaded(test_groupings());

        assert_eq!(catalog.difficulty_of("fig"), 1);
        assert_eq!(catalog.difficulty_of("swan"), 3);
        assert_eq!(catalog.difficulty_of("unknown"), 1);

        assert_eq!(difficulty_symbol(1), "🟨");
        assert_eq!(difficulty_symbol(4), "🟪");
        assert_eq!(difficulty_symbol(5), "");
    }
}
