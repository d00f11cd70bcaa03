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

use super::config::{Config, Timings};
use super::grouping::{self, Catalog, Grouping, Groupings, GROUP_SIZE, N_GROUPS};
use super::positions::{self, Position, GRID_SIZE, ORDERED_POSITIONS};
use super::session::{Attempt, Session, SubmittedBy, Tile, TileStatus};
use super::view::Board;
use rand::rngs::SmallRng;
use std::collections::HashSet;

/// Number of wrong attempts that end the game
pub const MAX_MISTAKES: usize = 4;

/// Reactions that are posted back to the game after a delay.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TimerEvent {
    SetTileStatus {
        word: String,
        status: TileStatus,
    },
    ClearSelection,
    AutoSolveStep,
    AutoSolveFinished,
}

#[derive(Debug, Clone)]
pub enum Event {
    GroupingsLoaded(Groupings),
    GroupingsFailed,
    Restore(Session),
    Select(String),
    Deselect(String),
    DeselectAll,
    Submit,
    Shuffle,
    Timer(TimerEvent),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Scheduled {
    pub delay_ms: u32,
    pub event: TimerEvent,
}

#[derive(Debug, thiserror::Error)]
#[error("{0}")]
pub struct AnalyticsError(pub String);

/// Somewhere to report the result of a game. Nothing that happens in
/// here can affect the game.
pub trait Analytics {
    fn game_result(
        &mut self,
        won: bool,
        n_solutions: usize,
    ) -> Result<(), AnalyticsError>;
}

pub type Observer = Box<dyn FnMut(&Board)>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum AutoSolve {
    Idle,
    // The game has ended but the groupings aren’t known yet
    Deferred,
    Running,
}

pub struct Game {
    date_key: String,
    timings: Timings,
    shuffle_initial: bool,
    catalog: Catalog,

    tiles: Vec<Tile>,
    positions: Vec<Position>,
    selected_words: Vec<String>,
    attempts: Vec<Attempt>,
    ended: bool,
    won: bool,
    auto_solve_finished: bool,

    auto_solve: AutoSolve,
    rng: SmallRng,

    scheduled: Vec<Scheduled>,
    analytics: Option<Box<dyn Analytics>>,
    one_away_notifier: Option<Box<dyn FnMut()>>,
    observers: Vec<Observer>,

    save_state_dirty: bool,
    view_dirty: bool,
}

impl Game {
    pub fn new<S: Into<String>>(
        date_key: S,
        config: &Config,
        rng: SmallRng,
    ) -> Game {
        Game {
            date_key: date_key.into(),
            timings: config.timings.clone(),
            shuffle_initial: config.shuffle_initial,
            catalog: Catalog::Loading,

            tiles: Vec::new(),
            positions: ORDERED_POSITIONS.to_vec(),
            selected_words: Vec::new(),
            attempts: Vec::new(),
            ended: false,
            won: false,
            auto_solve_finished: false,

            auto_solve: AutoSolve::Idle,
            rng,

            scheduled: Vec::new(),
            analytics: None,
            one_away_notifier: None,
            observers: Vec::new(),

            save_state_dirty: false,
            view_dirty: true,
        }
    }

    pub fn set_analytics(&mut self, analytics: Box<dyn Analytics>) {
        self.analytics = Some(analytics);
    }

    pub fn set_one_away_notifier(&mut self, notifier: Box<dyn FnMut()>) {
        self.one_away_notifier = Some(notifier);
    }

    /// Adds an observer that gets the board every time an event
    /// changes something visible.
    pub fn subscribe(&mut self, observer: Observer) {
        self.observers.push(observer);
    }

    pub fn apply_event(&mut self, event: Event) {
        match event {
            Event::GroupingsLoaded(groupings) => self.load_groupings(groupings),
            Event::GroupingsFailed => self.fail_groupings(),
            Event::Restore(session) => self.restore(session),
            Event::Select(word) => self.select_word(&word),
            Event::Deselect(word) => self.deselect_word(&word),
            Event::DeselectAll => self.deselect_all(),
            Event::Submit => self.submit(),
            Event::Shuffle => self.shuffle(),
            Event::Timer(timer) => self.handle_timer(timer),
        }

        self.notify_observers();
    }

    fn notify_observers(&mut self) {
        if !std::mem::replace(&mut self.view_dirty, false) ||
            self.observers.is_empty()
        {
            return;
        }

        let mut observers = std::mem::take(&mut self.observers);

        {
            let board = Board::new(self, &ORDERED_POSITIONS);

            for observer in observers.iter_mut() {
                observer(&board);
            }
        }

        self.observers = observers;
    }

    fn mark_changed(&mut self) {
        self.save_state_dirty = true;
        self.view_dirty = true;
    }

    fn schedule(&mut self, delay_ms: u32, event: TimerEvent) {
        self.scheduled.push(Scheduled { delay_ms, event });
    }

    /// Starts a new game with the given groupings, throwing away any
    /// previous state.
    pub fn initialize(&mut self, groupings: Groupings, shuffle: bool) {
        let words = groupings.words()
            .map(str::to_string)
            .collect::<Vec<_>>();

        let words = if shuffle {
            let indices = (0..words.len()).collect::<Vec<_>>();
            positions::restricted_shuffle(&words, &indices, &mut self.rng)
        } else {
            words
        };

        self.tiles = words.into_iter()
            .map(|word| Tile { word, status: TileStatus::Idle })
            .collect();
        self.positions = ORDERED_POSITIONS.to_vec();
        self.selected_words.clear();
        self.attempts.clear();
        self.ended = false;
        self.won = false;
        self.auto_solve_finished = false;
        self.auto_solve = AutoSolve::Idle;
        self.catalog = Catalog::Loaded(groupings);

        self.mark_changed();
    }

    fn load_groupings(&mut self, groupings: Groupings) {
        if self.tiles.is_empty() {
            self.initialize(groupings, self.shuffle_initial);
            return;
        }

        let matches_tiles = {
            let tile_words = self.tiles.iter()
                .map(|tile| tile.word.as_str())
                .collect::<HashSet<_>>();

            groupings.words().all(|word| tile_words.contains(word))
        };

        if !matches_tiles {
            tracing::warn!(
                "Saved game for {} doesn’t match the puzzle, starting again",
                self.date_key,
            );
            self.initialize(groupings, self.shuffle_initial);
            return;
        }

        self.catalog = Catalog::Loaded(groupings);
        self.view_dirty = true;
        self.resume_auto_solve();
    }

    fn fail_groupings(&mut self) {
        if self.catalog.groupings().is_none() {
            self.catalog = Catalog::Failed;
            self.view_dirty = true;
            self.resume_auto_solve();
        }
    }

    /// Replaces the state with a saved session. Sessions from another
    /// day or that don’t pass validation are ignored.
    pub fn restore(&mut self, session: Session) {
        if session.date_key != self.date_key {
            tracing::debug!(
                "Not restoring game from {} on {}",
                session.date_key,
                self.date_key,
            );
            return;
        }

        if let Err(e) = session.validate() {
            tracing::warn!("Not restoring invalid game: {}", e);
            return;
        }

        let Session {
            date_key: _,
            tiles,
            selected_words,
            attempts,
            positions,
            ended,
            won,
            auto_solve_finished,
        } = session;

        self.tiles = tiles;
        self.attempts = attempts;
        self.positions = positions;
        self.ended = ended;
        self.won = won;
        self.auto_solve_finished = auto_solve_finished;
        self.view_dirty = true;

        // A correct group is only left selected until its timer fires
        // and the timers aren’t saved
        self.selected_words = selected_words.into_iter()
            .filter(|word| self.is_in_play(word))
            .collect();

        self.settle_tile_statuses();

        // A game that was closed in the middle of the auto-solve picks
        // it up again
        self.auto_solve = if ended && !auto_solve_finished {
            AutoSolve::Deferred
        } else {
            AutoSolve::Idle
        };

        self.resume_auto_solve();
    }

    /// Puts every tile in the status that its reveal would have ended
    /// with. Used after a restore because any reveal that was still
    /// running has been lost.
    fn settle_tile_statuses(&mut self) {
        let solved = self.correct_attempts()
            .flat_map(|attempt| attempt.words.iter().cloned())
            .collect::<HashSet<_>>();
        let last_wrong = self.attempts.last()
            .filter(|attempt| !attempt.correct)
            .map(|attempt| attempt.words.clone());

        for tile in self.tiles.iter_mut() {
            let in_last_wrong = last_wrong.as_ref()
                .is_some_and(|words| words.contains(&tile.word));

            let status = if solved.contains(&tile.word) {
                TileStatus::Solved
            } else if in_last_wrong || tile.status == TileStatus::Attempt {
                TileStatus::Wrong
            } else {
                tile.status
            };

            if tile.status != status {
                tile.status = status;
                self.save_state_dirty = true;
            }
        }
    }

    pub fn select_word(&mut self, word: &str) {
        if self.ended ||
            self.selected_words.len() >= GROUP_SIZE ||
            self.is_selected(word) ||
            !self.is_in_play(word)
        {
            return;
        }

        self.selected_words.push(word.to_string());
        self.mark_changed();
    }

    pub fn deselect_word(&mut self, word: &str) {
        if self.ended || !self.is_selected(word) {
            return;
        }

        self.selected_words.retain(|w| w != word);
        self.mark_changed();
    }

    pub fn deselect_all(&mut self) {
        if self.can_deselect_all() {
            self.selected_words.clear();
            self.mark_changed();
        }
    }

    pub fn submit(&mut self) {
        if !self.can_submit() {
            return;
        }

        let Ok(words) =
            <[String; GROUP_SIZE]>::try_from(self.selected_words.clone())
        else {
            return;
        };

        self.append_attempt(words, SubmittedBy::User);
    }

    /// Rearranges the tiles that haven’t been solved yet. The solved
    /// tiles stay where they are.
    pub fn shuffle(&mut self) {
        let indices = self.tiles.iter()
            .enumerate()
            .filter_map(|(i, tile)| self.is_in_play(&tile.word).then_some(i))
            .collect::<Vec<_>>();

        if indices.len() < 2 {
            return;
        }

        self.tiles = positions::restricted_shuffle(
            &self.tiles,
            &indices,
            &mut self.rng,
        );
        self.mark_changed();
    }

    fn append_attempt(
        &mut self,
        words: [String; GROUP_SIZE],
        submitted_by: SubmittedBy,
    ) {
        let correct = self.catalog.same_group(&words).is_some();
        let one_away = !correct && self.catalog.one_away(&words);

        self.attempts.push(Attempt {
            words: words.clone(),
            correct,
            submitted_by,
        });
        self.mark_changed();

        self.react_to_attempt(&words, correct, one_away);
        self.check_for_end();
    }

    fn react_to_attempt(
        &mut self,
        words: &[String; GROUP_SIZE],
        correct: bool,
        one_away: bool,
    ) {
        if correct {
            let row = self.correct_attempts().count()
                .saturating_sub(1)
                .min(GRID_SIZE - 1);
            let tile_words = self.tiles.iter()
                .map(|tile| tile.word.as_str())
                .collect::<Vec<_>>();
            let positions = positions::relocate_words_to_row(
                &self.positions,
                &tile_words,
                words,
                row as u8,
            );
            self.positions = positions;
        } else if one_away {
            if let Some(notifier) = self.one_away_notifier.as_mut() {
                notifier();
            }
        }

        let Timings { stagger_ms, reveal_ms, clear_selection_ms, .. } =
            self.timings;

        for (i, word) in words.iter().enumerate() {
            self.schedule(
                stagger_ms * i as u32,
                TimerEvent::SetTileStatus {
                    word: word.clone(),
                    status: TileStatus::Attempt,
                },
            );
        }

        let status = if correct {
            TileStatus::Solved
        } else {
            TileStatus::Wrong
        };

        for word in words.iter() {
            self.schedule(
                reveal_ms,
                TimerEvent::SetTileStatus { word: word.clone(), status },
            );
        }

        if correct {
            self.schedule(clear_selection_ms, TimerEvent::ClearSelection);
        }
    }

    fn check_for_end(&mut self) {
        if self.ended {
            return;
        }

        let n_solutions = self.solved_groupings().len();

        if self.attempts_remaining() > 0 && n_solutions < N_GROUPS {
            return;
        }

        self.ended = true;
        self.won = n_solutions == N_GROUPS;
        self.mark_changed();

        self.auto_solve = AutoSolve::Deferred;
        self.resume_auto_solve();

        if let Some(analytics) = self.analytics.as_mut() {
            if let Err(e) = analytics.game_result(self.won, n_solutions) {
                tracing::debug!("Error reporting game result: {}", e);
            }
        }
    }

    fn resume_auto_solve(&mut self) {
        if self.auto_solve == AutoSolve::Deferred && self.catalog.is_resolved() {
            self.auto_solve = AutoSolve::Running;
            self.schedule_auto_solve_step();
        }
    }

    fn schedule_auto_solve_step(&mut self) {
        if self.unsolved_groupings().is_empty() {
            self.schedule(
                self.timings.auto_solve_trailing_ms,
                TimerEvent::AutoSolveFinished,
            );
        } else {
            self.schedule(
                self.timings.auto_solve_step_ms,
                TimerEvent::AutoSolveStep,
            );
        }
    }

    fn auto_solve_step(&mut self) {
        if self.auto_solve != AutoSolve::Running {
            return;
        }

        let next = self.unsolved_groupings()
            .first()
            .map(|grouping| grouping.words.clone());

        if let Some(words) = next {
            self.selected_words = words.to_vec();
            self.append_attempt(words, SubmittedBy::Auto);
        }

        self.schedule_auto_solve_step();
    }

    fn handle_timer(&mut self, timer: TimerEvent) {
        match timer {
            TimerEvent::SetTileStatus { word, status } => {
                let Some(tile) = self.tiles.iter_mut()
                    .find(|tile| tile.word == word)
                else {
                    return;
                };

                if tile.status != status {
                    tile.status = status;
                    self.mark_changed();
                }
            },
            TimerEvent::ClearSelection => {
                if !self.selected_words.is_empty() {
                    self.selected_words.clear();
                    self.mark_changed();
                }
            },
            TimerEvent::AutoSolveStep => self.auto_solve_step(),
            TimerEvent::AutoSolveFinished => {
                if self.auto_solve == AutoSolve::Running {
                    self.auto_solve = AutoSolve::Idle;
                    self.auto_solve_finished = true;
                    self.mark_changed();
                }
            },
        }
    }

    pub fn take_scheduled(&mut self) -> Vec<Scheduled> {
        std::mem::take(&mut self.scheduled)
    }

    /// Returns a snapshot to save if anything that is saved has
    /// changed since the last call. Nothing is returned until there
    /// are tiles so that an empty game never replaces a saved one.
    pub fn changed_session(&mut self) -> Option<Session> {
        if !self.save_state_dirty || self.tiles.is_empty() {
            return None;
        }

        self.save_state_dirty = false;

        Some(self.session())
    }

    pub fn session(&self) -> Session {
        Session {
            date_key: self.date_key.clone(),
            tiles: self.tiles.clone(),
            selected_words: self.selected_words.clone(),
            attempts: self.attempts.clone(),
            positions: self.positions.clone(),
            ended: self.ended,
            won: self.won,
            auto_solve_finished: self.auto_solve_finished,
        }
    }

    pub fn date_key(&self) -> &str {
        &self.date_key
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn tiles(&self) -> &[Tile] {
        &self.tiles
    }

    pub fn positions(&self) -> &[Position] {
        &self.positions
    }

    pub fn selected_words(&self) -> &[String] {
        &self.selected_words
    }

    pub fn attempts(&self) -> &[Attempt] {
        &self.attempts
    }

    pub fn is_ended(&self) -> bool {
        self.ended
    }

    pub fn is_won(&self) -> bool {
        self.won
    }

    pub fn is_auto_solve_finished(&self) -> bool {
        self.auto_solve_finished
    }

    pub fn is_selected(&self, word: &str) -> bool {
        self.selected_words.iter().any(|w| w == word)
    }

    pub fn correct_attempts(&self) -> impl Iterator<Item = &Attempt> {
        self.attempts.iter().filter(|attempt| attempt.correct)
    }

    pub fn n_mistakes(&self) -> usize {
        self.attempts.iter().filter(|attempt| !attempt.correct).count()
    }

    pub fn attempts_remaining(&self) -> usize {
        MAX_MISTAKES.saturating_sub(self.n_mistakes())
    }

    /// The groupings that have been found, in the order they were
    /// found. Each grouping is only included once.
    pub fn solved_groupings(&self) -> Vec<&Grouping> {
        let Some(groupings) = self.catalog.groupings()
        else {
            return Vec::new();
        };

        let mut solved: Vec<&Grouping> = Vec::new();

        for attempt in self.correct_attempts() {
            let Some(grouping) = self.catalog.same_group(&attempt.words)
                .and_then(|label| groupings.grouping_for_label(label))
            else {
                continue;
            };

            if !solved.iter().any(|g| g.group == grouping.group) {
                solved.push(grouping);
            }
        }

        solved
    }

    /// The groupings not found yet, easiest first.
    pub fn unsolved_groupings(&self) -> Vec<&Grouping> {
        let Some(groupings) = self.catalog.groupings()
        else {
            return Vec::new();
        };

        let solved = self.solved_groupings();

        groupings.iter()
            .filter(|grouping| !solved.contains(grouping))
            .collect()
    }

    /// Whether the word is on the board and not part of a found
    /// grouping.
    pub fn is_in_play(&self, word: &str) -> bool {
        self.tiles.iter().any(|tile| tile.word == word) &&
            !self.correct_attempts().any(|attempt| {
                attempt.words.iter().any(|w| w == word)
            })
    }

    /// Whether the selection is four words that are all still in
    /// play. The words of a group that was just found stay selected
    /// for a moment but can’t be submitted again.
    pub fn can_submit(&self) -> bool {
        !self.ended &&
            self.selected_words.len() == GROUP_SIZE &&
            self.selected_words.iter().all(|word| self.is_in_play(word))
    }

    pub fn can_deselect_all(&self) -> bool {
        !self.ended && !self.selected_words.is_empty()
    }

    /// One row of coloured squares for each guess that the player
    /// made, showing which grouping each word really belonged to.
    pub fn emoji_rows(&self) -> Vec<String> {
        if self.catalog.groupings().is_none() {
            return Vec::new();
        }

        self.attempts.iter()
            .filter(|attempt| attempt.submitted_by == SubmittedBy::User)
            .map(|attempt| {
                attempt.words.iter()
                    .map(|word| {
                        grouping::difficulty_symbol(
                            self.catalog.difficulty_of(word)
                        )
                    })
                    .collect::<String>()
            })
            .collect()
    }

    pub fn share_text(&self) -> String {
        let mut text = format!("Grupoj {}", self.date_key);

        for row in self.emoji_rows() {
            text.push('\n');
            text.push_str(&row);
        }

        text
    }
}
