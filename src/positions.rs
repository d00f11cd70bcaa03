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

use rand::Rng;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};

pub const GRID_SIZE: usize = 4;
pub const N_TILES: usize = GRID_SIZE * GRID_SIZE;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Position {
    pub row: u8,
    pub col: u8,
}

impl Position {
    pub fn index(&self) -> usize {
        self.row as usize * GRID_SIZE + self.col as usize
    }

    pub fn is_valid(&self) -> bool {
        (self.row as usize) < GRID_SIZE && (self.col as usize) < GRID_SIZE
    }

    /// Offset in cells from `origin` to this position, as (x, y).
    pub fn offset_from(&self, origin: Position) -> (i32, i32) {
        (
            self.col as i32 - origin.col as i32,
            self.row as i32 - origin.row as i32,
        )
    }
}

/// Where each tile index sits before anything has been moved. The nth
/// tile is at the nth cell in row-major order.
pub const ORDERED_POSITIONS: [Position; N_TILES] = ordered_positions();

const fn ordered_positions() -> [Position; N_TILES] {
    let mut positions = [Position { row: 0, col: 0 }; N_TILES];
    let mut i = 0;

    while i < N_TILES {
        positions[i] = Position {
            row: (i / GRID_SIZE) as u8,
            col: (i % GRID_SIZE) as u8,
        };
        i += 1;
    }

    positions
}

/// Checks that every position is in the grid and that no two share a
/// cell.
pub fn is_bijection(positions: &[Position]) -> bool {
    if positions.len() != N_TILES {
        return false;
    }

    let mut used = [false; N_TILES];

    positions.iter().all(|position| {
        position.is_valid() && !std::mem::replace(&mut used[position.index()], true)
    })
}

/// Returns a copy of `items` where the elements at `indices` are
/// randomly permuted amongst themselves. Every other element stays
/// where it is. Indices that are out of range or repeated are ignored.
pub fn restricted_shuffle<T, R>(
    items: &[T],
    indices: &[usize],
    rng: &mut R,
) -> Vec<T>
    where T: Clone,
          R: Rng + ?Sized
{
    let mut slots = Vec::with_capacity(indices.len());

    for &index in indices.iter() {
        if index < items.len() && !slots.contains(&index) {
            slots.push(index);
        }
    }

    let mut values = slots.iter()
        .map(|&index| items[index].clone())
        .collect::<Vec<_>>();

    values.shuffle(rng);

    let mut result = items.to_vec();

    for (&index, value) in slots.iter().zip(values.into_iter()) {
        result[index] = value;
    }

    result
}

/// Moves each of `words` into `row`, the first word into the first
/// column and so on. The tile that was already in the target cell
/// takes the place that the moved word left. `tile_words` is the tile
/// sequence that `positions` is parallel to.
pub fn relocate_words_to_row<W, S>(
    positions: &[Position],
    tile_words: &[W],
    words: &[S],
    row: u8,
) -> Vec<Position>
    where W: AsRef<str>,
          S: AsRef<str>
{
    let mut positions = positions.to_vec();

    for (col, word) in words.iter().enumerate() {
        let Some(src_index) = tile_words.iter()
            .position(|w| w.as_ref() == word.as_ref())
        else {
            continue;
        };

        let dst = Position { row, col: col as u8 };
        let src = positions[src_index];

        if let Some(occupant) = positions.iter().position(|&p| p == dst) {
            positions[occupant] = src;
        }

        positions[src_index] = dst;
    }

    positions
}
