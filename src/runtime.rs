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

use super::engine::{Event, Game, TimerEvent};
use super::storage::{self, SaveSlot};
use std::cmp::{Ordering, Reverse};
use std::collections::BinaryHeap;

struct Pending {
    due: u64,
    sequence: u64,
    event: TimerEvent,
}

// Only the due time and the sequence number matter for the order so
// that events due at the same time fire in the order they were
// scheduled.
impl Ord for Pending {
    fn cmp(&self, other: &Pending) -> Ordering {
        (self.due, self.sequence).cmp(&(other.due, other.sequence))
    }
}

impl PartialOrd for Pending {
    fn partial_cmp(&self, other: &Pending) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for Pending {
    fn eq(&self, other: &Pending) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Pending {}

/// Runs a game against a virtual clock. Timer messages from the game
/// are queued until the clock reaches them and the save slot is
/// updated after every event that changed something worth saving.
pub struct EventLoop<S: SaveSlot> {
    game: Game,
    slot: S,
    storage_key: String,
    now: u64,
    next_sequence: u64,
    queue: BinaryHeap<Reverse<Pending>>,
}

impl<S: SaveSlot> EventLoop<S> {
    /// Creates the loop and restores the saved game for the day of
    /// `game` if there is one. The slot is only read here.
    pub fn new<K: Into<String>>(
        game: Game,
        slot: S,
        storage_key: K,
    ) -> EventLoop<S> {
        let storage_key = storage_key.into();
        let saved = storage::load_session(
            &slot,
            &storage_key,
            game.date_key(),
        );

        let mut event_loop = EventLoop {
            game,
            slot,
            storage_key,
            now: 0,
            next_sequence: 0,
            queue: BinaryHeap::new(),
        };

        if let Some(session) = saved {
            event_loop.dispatch(Event::Restore(session));
        }

        event_loop
    }

    pub fn dispatch(&mut self, event: Event) {
        self.game.apply_event(event);

        for scheduled in self.game.take_scheduled() {
            self.queue.push(Reverse(Pending {
                due: self.now + scheduled.delay_ms as u64,
                sequence: self.next_sequence,
                event: scheduled.event,
            }));
            self.next_sequence += 1;
        }

        if let Some(session) = self.game.changed_session() {
            storage::save_session(&mut self.slot, &self.storage_key, &session);
        }
    }

    fn pop_due(&mut self, limit: Option<u64>) -> Option<Pending> {
        let Reverse(next) = self.queue.peek()?;

        if limit.is_some_and(|limit| next.due > limit) {
            return None;
        }

        self.queue.pop().map(|Reverse(pending)| pending)
    }

    /// Moves the clock forward by `ms`, firing every timer that
    /// becomes due on the way.
    pub fn advance(&mut self, ms: u64) {
        let target = self.now + ms;

        while let Some(pending) = self.pop_due(Some(target)) {
            self.now = pending.due;
            self.dispatch(Event::Timer(pending.event));
        }

        self.now = target;
    }

    /// Fires timers until there aren’t any left, including the ones
    /// that the fired timers schedule.
    pub fn run_until_idle(&mut self) {
        while let Some(pending) = self.pop_due(None) {
            self.now = self.now.max(pending.due);
            self.dispatch(Event::Timer(pending.event));
        }
    }

    pub fn is_idle(&self) -> bool {
        self.queue.is_empty()
    }

    pub fn now(&self) -> u64 {
        self.now
    }

    pub fn game(&self) -> &Game {
        &self.game
    }

    pub fn slot(&self) -> &S {
        &self.slot
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use super::super::config::Config;
    use super::super::grouping::test_groupings;
    use super::super::session::{Session, SubmittedBy, TileStatus};
    use super::super::storage::MemorySlot;
    use rand::SeedableRng;
    use rand::rngs::SmallRng;

    const KEY: &str = "grupoj-test";
    const DATE: &str = "2024-09-14";

    fn new_game(date: &str) -> Game {
        let config = Config {
            shuffle_initial: false,
            ..Config::default()
        };
        Game::new(date, &config, SmallRng::seed_from_u64(12))
    }

    fn new_loop(slot: MemorySlot, date: &str) -> EventLoop<MemorySlot> {
        let mut event_loop = EventLoop::new(new_game(date), slot, KEY);
        event_loop.dispatch(Event::GroupingsLoaded(test_groupings()));
        event_loop
    }

    fn guess(event_loop: &mut EventLoop<MemorySlot>, words: &[&str]) {
        event_loop.dispatch(Event::DeselectAll);
        for word in words {
            event_loop.dispatch(Event::Select(word.to_string()));
        }
        event_loop.dispatch(Event::Submit);
    }

    fn saved(event_loop: &EventLoop<MemorySlot>) -> Option<Session> {
        event_loop.slot()
            .get(KEY)
            .unwrap()
            .map(|json| json.parse::<Session>().unwrap())
    }

    fn status_of(event_loop: &EventLoop<MemorySlot>, word: &str) -> TileStatus {
        event_loop.game().tiles().iter()
            .find(|tile| tile.word == word)
            .unwrap()
            .status
    }

    #[test]
    fn reveal_timing() {
        let mut event_loop = new_loop(MemorySlot::new(), DATE);

        guess(&mut event_loop, &["apple", "pear", "plum", "fig"]);

        // Nothing fires until the clock moves
        assert_eq!(status_of(&event_loop, "apple"), TileStatus::Idle);

        event_loop.advance(0);
        assert_eq!(status_of(&event_loop, "apple"), TileStatus::Attempt);
        assert_eq!(status_of(&event_loop, "pear"), TileStatus::Idle);

        event_loop.advance(250);
        assert_eq!(status_of(&event_loop, "plum"), TileStatus::Attempt);
        assert_eq!(status_of(&event_loop, "fig"), TileStatus::Idle);

        event_loop.advance(749);
        assert_eq!(status_of(&event_loop, "fig"), TileStatus::Attempt);
        assert_eq!(status_of(&event_loop, "apple"), TileStatus::Attempt);

        event_loop.advance(1);
        for word in ["apple", "pear", "plum", "fig"] {
            assert_eq!(status_of(&event_loop, word), TileStatus::Solved);
        }
        assert_eq!(event_loop.game().selected_words().len(), 4);

        event_loop.advance(1000);
        assert!(event_loop.game().selected_words().is_empty());
        assert!(event_loop.is_idle());
        assert_eq!(event_loop.now(), 2000);
    }

    #[test]
    fn auto_solve_timing() {
        let mut event_loop = new_loop(MemorySlot::new(), DATE);

        guess(&mut event_loop, &["crow", "wren", "owl", "swan"]);
        event_loop.advance(5000);

        for _ in 0..4 {
            guess(&mut event_loop, &["oak", "apple", "cod", "ash"]);
        }
        assert!(event_loop.game().is_ended());

        event_loop.advance(2499);
        assert_eq!(event_loop.game().attempts().len(), 5);

        event_loop.advance(1);
        assert_eq!(event_loop.game().attempts().len(), 6);
        assert_eq!(
            &event_loop.game().attempts()[5].words,
            &["apple", "pear", "plum", "fig"],
        );

        event_loop.advance(2500);
        assert_eq!(event_loop.game().attempts().len(), 7);

        event_loop.advance(2500);
        assert_eq!(event_loop.game().attempts().len(), 8);
        assert!(!event_loop.game().is_auto_solve_finished());

        event_loop.advance(2999);
        assert!(!event_loop.game().is_auto_solve_finished());

        event_loop.advance(1);
        assert!(event_loop.game().is_auto_solve_finished());
        assert!(event_loop.is_idle());

        let auto = event_loop.game().attempts().iter()
            .filter(|a| a.submitted_by == SubmittedBy::Auto)
            .map(|a| a.words[0].as_str())
            .collect::<Vec<_>>();
        assert_eq!(auto, ["apple", "oak", "cod"]);

        let session = saved(&event_loop).unwrap();
        assert!(session.ended);
        assert!(!session.won);
        assert!(session.auto_solve_finished);
        assert_eq!(session.attempts.len(), 8);
    }

    #[test]
    fn nothing_saved_before_tiles() {
        let mut event_loop = EventLoop::new(
            new_game(DATE),
            MemorySlot::new(),
            KEY,
        );

        event_loop.dispatch(Event::Shuffle);
        event_loop.dispatch(Event::GroupingsFailed);
        assert!(saved(&event_loop).is_none());

        event_loop.dispatch(Event::GroupingsLoaded(test_groupings()));
        assert_eq!(saved(&event_loop).unwrap().tiles.len(), 16);
    }

    #[test]
    fn resume() {
        let mut event_loop = new_loop(MemorySlot::new(), DATE);

        guess(&mut event_loop, &["cod", "eel", "carp", "pike"]);
        event_loop.run_until_idle();
        guess(&mut event_loop, &["oak", "ash", "crow", "wren"]);
        event_loop.dispatch(Event::Select("apple".to_string()));
        event_loop.run_until_idle();

        let session = event_loop.game().session();
        assert_eq!(saved(&event_loop).as_ref(), Some(&session));

        let EventLoop { slot, .. } = event_loop;
        let resumed = new_loop(slot, DATE);

        assert_eq!(resumed.game().session(), session);
        assert_eq!(resumed.game().attempts_remaining(), 3);
        assert_eq!(resumed.game().solved_groupings().len(), 1);
    }

    #[test]
    fn resume_auto_solve() {
        let mut event_loop = new_loop(MemorySlot::new(), DATE);

        for _ in 0..4 {
            guess(&mut event_loop, &["oak", "apple", "cod", "ash"]);
        }
        event_loop.advance(2500);
        assert_eq!(event_loop.game().attempts().len(), 5);

        // Close the game in the middle of the auto-solve
        let EventLoop { slot, .. } = event_loop;
        let mut resumed = new_loop(slot, DATE);

        resumed.run_until_idle();

        assert!(resumed.game().is_auto_solve_finished());
        assert_eq!(resumed.game().attempts().len(), 8);
        assert_eq!(resumed.game().solved_groupings().len(), 4);
        assert!(!resumed.game().is_won());
    }

    #[test]
    fn other_day() {
        let mut event_loop = new_loop(MemorySlot::new(), "2024-09-13");
        guess(&mut event_loop, &["oak", "apple", "cod", "ash"]);

        let EventLoop { slot, .. } = event_loop;
        let today = new_loop(slot, DATE);

        assert!(today.game().attempts().is_empty());
        assert_eq!(today.game().date_key(), DATE);
        assert_eq!(saved(&today).unwrap().date_key, DATE);
    }
}
