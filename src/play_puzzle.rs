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

mod config;
mod engine;
mod game_date;
mod grouping;
mod positions;
mod runtime;
mod session;
mod sheet;
mod storage;
mod view;

use std::{process::ExitCode, ffi::OsString, path::PathBuf};
use clap::Parser;
use config::Config;
use engine::{Analytics, AnalyticsError, Event, Game};
use game_date::GameDate;
use positions::{Position, GRID_SIZE, ORDERED_POSITIONS};
use rand::SeedableRng;
use rand::rngs::SmallRng;
use runtime::EventLoop;
use session::TileStatus;
use storage::{FileSlot, SaveSlot};
use tracing_subscriber::EnvFilter;
use view::Board;

#[derive(Parser)]
#[command(name = "Play")]
struct Cli {
    /// JSON rows of the puzzle sheet
    #[arg(value_name = "SHEET")]
    sheet: OsString,
    #[arg(short, long, value_name = "YYYY-MM-DD")]
    date: Option<String>,
    /// Where to keep the saved game
    #[arg(short, long, value_name = "DIR", default_value = ".grupoj")]
    save_dir: PathBuf,
    #[arg(short, long, value_name = "FILE")]
    config: Option<OsString>,
    #[arg(long, value_name = "SEED")]
    seed: Option<u64>,
    /// Keep the tiles in the order of the groupings
    #[arg(long)]
    no_shuffle: bool,
    /// Forget the saved game before starting
    #[arg(long)]
    reset: bool,
}

struct TracingAnalytics;

impl Analytics for TracingAnalytics {
    fn game_result(
        &mut self,
        won: bool,
        n_solutions: usize,
    ) -> Result<(), AnalyticsError> {
        tracing::info!(won, num_solutions = n_solutions, "game_result");
        Ok(())
    }
}

const WORD_WIDTH: usize = 10;

fn print_board(board: &Board) {
    for row in 0..GRID_SIZE {
        for col in 0..GRID_SIZE {
            let position = Position { row: row as u8, col: col as u8 };

            let Some(tile) = board.tile_at(position)
            else {
                continue;
            };

            let marker = match (tile.status, tile.selected) {
                (TileStatus::Solved, _) => '=',
                (TileStatus::Wrong, _) => '!',
                (_, true) => '*',
                _ => ' ',
            };

            print!("{}{:<width$}", marker, tile.word, width = WORD_WIDTH);
        }

        println!();
    }

    for solution in board.solutions.iter() {
        println!(
            "{} {}",
            grouping::difficulty_symbol(solution.difficulty),
            solution.group,
        );
    }

    println!("Mistakes remaining: {}", board.attempts_remaining);
}

fn load_config(filename: Option<&OsString>) -> Result<Config, String> {
    match filename {
        None => Ok(Config::default()),
        Some(filename) => Config::load(filename).map_err(|e| {
            format!("{}: {}", filename.to_string_lossy(), e)
        }),
    }
}

fn load_groupings(
    filename: &OsString,
    date: GameDate,
) -> Result<grouping::Groupings, String> {
    let sheet_text = std::fs::read_to_string(filename)
        .map_err(|e| format!("{}: {}", filename.to_string_lossy(), e))?;

    sheet::parse_rows(&sheet_text)
        .and_then(|rows| sheet::groupings_for_date(&rows, date))
        .map_err(|e| format!("{}: {}", filename.to_string_lossy(), e))
}

fn clock_seed() -> u64 {
    let now = chrono::Utc::now();
    (now.timestamp() as u64) ^ ((now.timestamp_subsec_nanos() as u64) << 32)
}

fn play<S: SaveSlot>(event_loop: &mut EventLoop<S>) {
    let mut lines = std::io::stdin().lines();

    loop {
        let game = event_loop.game();

        if game.is_ended() && game.is_auto_solve_finished() {
            print_board(&Board::new(game, &ORDERED_POSITIONS));
            println!("\n{}", game.share_text());
            break;
        }

        print_board(&Board::new(game, &ORDERED_POSITIONS));

        let Some(Ok(line)) = lines.next()
        else {
            break;
        };

        let words = line.split(|c: char| c.is_whitespace() || c == ',')
            .filter(|word| !word.is_empty())
            .collect::<Vec<_>>();

        match words.as_slice() {
            [] => continue,
            ["shuffle"] => event_loop.dispatch(Event::Shuffle),
            ["clear"] => event_loop.dispatch(Event::DeselectAll),
            ["quit"] => break,
            words => {
                let n_attempts = event_loop.game().attempts().len();

                event_loop.dispatch(Event::DeselectAll);

                for word in words {
                    event_loop.dispatch(Event::Select(word.to_string()));
                }

                event_loop.dispatch(Event::Submit);

                if event_loop.game().attempts().len() == n_attempts {
                    println!("Pick four different words that are in play");
                }
            },
        }

        event_loop.run_until_idle();
    }
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("warn"))
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let mut config = match load_config(cli.config.as_ref()) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("{}", e);
            return ExitCode::FAILURE;
        },
    };

    if cli.no_shuffle {
        config.shuffle_initial = false;
    }

    let date = match cli.date.as_deref().map(str::parse::<GameDate>) {
        None => GameDate::today(),
        Some(Ok(date)) => date,
        Some(Err(e)) => {
            eprintln!("{}", e);
            return ExitCode::FAILURE;
        },
    };

    let groupings = match load_groupings(&cli.sheet, date) {
        Ok(g) => g,
        Err(e) => {
            eprintln!("{}", e);
            return ExitCode::FAILURE;
        },
    };

    let rng = SmallRng::seed_from_u64(cli.seed.unwrap_or_else(clock_seed));
    let mut game = Game::new(date.key(), &config, rng);

    game.set_analytics(Box::new(TracingAnalytics));
    game.set_one_away_notifier(Box::new(|| println!("One away…")));

    let mut slot = FileSlot::new(cli.save_dir);

    if cli.reset {
        storage::clear_session(&mut slot, &config.storage_key);
    }

    let mut event_loop = EventLoop::new(game, slot, config.storage_key);

    event_loop.dispatch(Event::GroupingsLoaded(groupings));
    // Finish anything that was still going when the game was saved
    event_loop.run_until_idle();

    play(&mut event_loop);

    ExitCode::SUCCESS
}
