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

use super::engine::{Event, Game};
use super::grouping::Grouping;
use super::positions::Position;
use super::session::TileStatus;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TileView {
    pub word: String,
    pub status: TileStatus,
    pub selected: bool,
    pub in_play: bool,
    pub position: Position,
    /// Cells between the tile’s home cell and where it is now, as
    /// (x, y).
    pub offset: (i32, i32),
    // Copied so that the tile can decide whether it reacts to clicks
    ended: bool,
}

impl TileView {
    pub fn pixel_offset(&self, cell_width: f64, cell_height: f64) -> (f64, f64) {
        (
            self.offset.0 as f64 * cell_width,
            self.offset.1 as f64 * cell_height,
        )
    }

    /// The event to send when the tile is clicked, if any.
    pub fn toggle(&self) -> Option<Event> {
        if self.ended || !self.in_play {
            None
        } else if self.selected {
            Some(Event::Deselect(self.word.clone()))
        } else {
            Some(Event::Select(self.word.clone()))
        }
    }
}

/// Everything a renderer needs to draw the game.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Board {
    pub tiles: Vec<TileView>,
    pub can_submit: bool,
    pub can_deselect_all: bool,
    pub attempts_remaining: usize,
    pub ended: bool,
    pub won: bool,
    pub auto_solve_finished: bool,
    pub loading: bool,
    pub solutions: Vec<Grouping>,
    pub share_text: Option<String>,
}

impl Board {
    /// Projects the game. `home_positions` is where each tile index
    /// sits before anything moves.
    pub fn new(game: &Game, home_positions: &[Position]) -> Board {
        let ended = game.is_ended();

        let tiles = game.tiles().iter()
            .zip(game.positions().iter())
            .zip(home_positions.iter())
            .map(|((tile, &position), &home)| {
                TileView {
                    word: tile.word.clone(),
                    status: tile.status,
                    selected: game.is_selected(&tile.word),
                    in_play: game.is_in_play(&tile.word),
                    position,
                    offset: position.offset_from(home),
                    ended,
                }
            })
            .collect();

        Board {
            tiles,
            can_submit: game.can_submit(),
            can_deselect_all: game.can_deselect_all(),
            attempts_remaining: game.attempts_remaining(),
            ended,
            won: game.is_won(),
            auto_solve_finished: game.is_auto_solve_finished(),
            loading: !game.catalog().is_resolved(),
            solutions: game.solved_groupings().into_iter().cloned().collect(),
            share_text: ended.then(|| game.share_text()),
        }
    }

    pub fn tile_at(&self, position: Position) -> Option<&TileView> {
        self.tiles.iter().find(|tile| tile.position == position)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use super::super::config::Config;
    use super::super::grouping::test_groupings;
    use super::super::positions::ORDERED_POSITIONS;
    use rand::SeedableRng;
    use rand::rngs::SmallRng;

    fn new_game() -> Game {
        let config = Config {
            shuffle_initial: false,
            ..Config::default()
        };
        let mut game = Game::new("2024-02-29", &config, SmallRng::seed_from_u64(5));
        game.apply_event(Event::GroupingsLoaded(test_groupings()));
        game
    }

    fn submit(game: &mut Game, words: &[&str]) {
        for word in words {
            game.apply_event(Event::Select(word.to_string()));
        }
        game.apply_event(Event::Submit);
    }

    #[test]
    fn loading() {
        let game = Game::new(
            "2024-02-29",
            &Config::default(),
            SmallRng::seed_from_u64(5),
        );
        let board = Board::new(&game, &ORDERED_POSITIONS);

        assert!(board.loading);
        assert!(board.tiles.is_empty());
        assert!(!board.can_submit);
        assert!(board.share_text.is_none());
    }

    #[test]
    fn selection() {
        let mut game = new_game();
        game.apply_event(Event::Select("oak".to_string()));

        let board = Board::new(&game, &ORDERED_POSITIONS);

        assert!(!board.loading);
        assert_eq!(board.tiles.len(), 16);
        assert!(board.can_deselect_all);
        assert!(!board.can_submit);
        assert_eq!(board.attempts_remaining, 4);

        let oak = &board.tiles[4];
        assert_eq!(&oak.word, "oak");
        assert!(oak.selected);
        assert!(oak.in_play);
        assert_eq!(oak.offset, (0, 0));
        assert!(matches!(oak.toggle(), Some(Event::Deselect(w)) if w == "oak"));

        assert!(matches!(
            board.tiles[0].toggle(),
            Some(Event::Select(w)) if w == "apple",
        ));
    }

    #[test]
    fn offsets() {
        let mut game = new_game();
        submit(&mut game, &["cod", "eel", "carp", "pike"]);

        let board = Board::new(&game, &ORDERED_POSITIONS);

        // cod moves from the bottom left to the top left
        let cod = &board.tiles[12];
        assert_eq!(cod.position, Position { row: 0, col: 0 });
        assert_eq!(cod.offset, (0, -3));
        assert_eq!(cod.pixel_offset(80.0, 60.0), (0.0, -180.0));
        assert!(!cod.in_play);
        assert!(cod.toggle().is_none());

        // apple takes the place that cod left
        let apple = &board.tiles[0];
        assert_eq!(apple.offset, (0, 3));
        assert_eq!(
            board.tile_at(Position { row: 3, col: 0 }).map(|t| t.word.as_str()),
            Some("apple"),
        );

        assert_eq!(board.solutions.len(), 1);
        assert_eq!(&board.solutions[0].group, "fish");
    }

    #[test]
    fn ended() {
        let mut game = new_game();

        for _ in 0..4 {
            game.apply_event(Event::DeselectAll);
            submit(&mut game, &["apple", "oak", "crow", "cod"]);
        }

        let board = Board::new(&game, &ORDERED_POSITIONS);

        assert!(board.ended);
        assert!(!board.won);
        assert!(!board.can_submit);
        assert!(!board.can_deselect_all);
        assert_eq!(board.attempts_remaining, 0);
        assert!(board.tiles.iter().all(|t| t.toggle().is_none()));
        assert_eq!(board.share_text.as_deref(), Some(game.share_text().as_str()));
    }
}
