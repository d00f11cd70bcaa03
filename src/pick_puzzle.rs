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

mod game_date;
mod grouping;
mod sheet;

use std::{process::ExitCode, ffi::OsString};
use clap::Parser;
use game_date::GameDate;
use grouping::{Grouping, Groupings};

#[derive(Parser)]
#[command(name = "Pick")]
struct Cli {
    /// JSON rows of the puzzle sheet, or “-” for stdin
    #[arg(value_name = "SHEET")]
    sheet: OsString,
    /// Day to pick the puzzle for instead of today
    #[arg(short, long, value_name = "YYYY-MM-DD")]
    date: Option<String>,
    #[arg(short = 'H', long)]
    human_readable: bool,
}

fn read_sheet(filename: &OsString) -> Result<String, std::io::Error> {
    if filename == "-" {
        std::io::read_to_string(std::io::stdin())
    } else {
        std::fs::read_to_string(filename)
    }
}

fn print_human_readable(date: GameDate, groupings: &Groupings) {
    println!("{}\n", date);

    for Grouping { group, difficulty, words } in groupings.iter() {
        println!(
            "{} {}: {}",
            grouping::difficulty_symbol(*difficulty),
            group,
            words.join(", "),
        );
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let date = match cli.date.as_deref().map(str::parse::<GameDate>) {
        None => GameDate::today(),
        Some(Ok(date)) => date,
        Some(Err(e)) => {
            eprintln!("{}", e);
            return ExitCode::FAILURE;
        },
    };

    let sheet_text = match read_sheet(&cli.sheet) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("{}: {}", cli.sheet.to_string_lossy(), e);
            return ExitCode::FAILURE;
        },
    };

    let groupings = match sheet::parse_rows(&sheet_text)
        .and_then(|rows| sheet::groupings_for_date(&rows, date))
    {
        Ok(g) => g,
        Err(e) => {
            eprintln!("{}: {}", cli.sheet.to_string_lossy(), e);
            return ExitCode::FAILURE;
        },
    };

    if cli.human_readable {
        print_human_readable(date, &groupings);
    } else {
        let groupings = groupings.iter().collect::<Vec<_>>();

        match serde_json::to_string_pretty(&groupings) {
            Ok(json) => println!("{}", json),
            Err(e) => {
                eprintln!("{}", e);
                return ExitCode::FAILURE;
            },
        }
    }

    ExitCode::SUCCESS
}
