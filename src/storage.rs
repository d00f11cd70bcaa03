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

use super::session::Session;
use std::collections::HashMap;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("storage is not available")]
    Unavailable,
    #[error("{0}")]
    Io(#[from] std::io::Error),
    #[error("{0}")]
    Backend(String),
}

/// A key-value store used as a save slot. It knows nothing about what
/// is stored in it.
pub trait SaveSlot {
    fn get(&self, key: &str) -> Result<Option<String>, Error>;
    fn set(&mut self, key: &str, value: &str) -> Result<(), Error>;
    fn delete(&mut self, key: &str) -> Result<(), Error>;
}

#[derive(Debug, Default)]
pub struct MemorySlot {
    values: HashMap<String, String>,
}

impl MemorySlot {
    pub fn new() -> MemorySlot {
        MemorySlot::default()
    }
}

impl SaveSlot for MemorySlot {
    fn get(&self, key: &str) -> Result<Option<String>, Error> {
        Ok(self.values.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), Error> {
        self.values.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn delete(&mut self, key: &str) -> Result<(), Error> {
        self.values.remove(key);
        Ok(())
    }
}

/// Stores each key as a JSON file in a directory.
#[cfg(not(target_arch = "wasm32"))]
pub struct FileSlot {
    dir: std::path::PathBuf,
}

#[cfg(not(target_arch = "wasm32"))]
impl FileSlot {
    pub fn new<P: Into<std::path::PathBuf>>(dir: P) -> FileSlot {
        FileSlot { dir: dir.into() }
    }

    fn path_for_key(&self, key: &str) -> std::path::PathBuf {
        self.dir.join(format!("{}.json", key))
    }
}

#[cfg(not(target_arch = "wasm32"))]
impl SaveSlot for FileSlot {
    fn get(&self, key: &str) -> Result<Option<String>, Error> {
        match std::fs::read_to_string(self.path_for_key(key)) {
            Ok(value) => Ok(Some(value)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), Error> {
        std::fs::create_dir_all(&self.dir)?;
        std::fs::write(self.path_for_key(key), value)?;
        Ok(())
    }

    fn delete(&mut self, key: &str) -> Result<(), Error> {
        match std::fs::remove_file(self.path_for_key(key)) {
            Err(e) if e.kind() != std::io::ErrorKind::NotFound => Err(e.into()),
            _ => Ok(()),
        }
    }
}

/// Loads the saved session for the day of `date_key`. Anything that
/// goes wrong, including a save from another day, is treated as there
/// being no save.
pub fn load_session<S>(slot: &S, key: &str, date_key: &str) -> Option<Session>
    where S: SaveSlot + ?Sized
{
    let saved = match slot.get(key) {
        Ok(Some(saved)) => saved,
        Ok(None) => return None,
        Err(e) => {
            tracing::warn!("Error loading saved game: {}", e);
            return None;
        },
    };

    let session = match saved.parse::<Session>() {
        Ok(session) => session,
        Err(e) => {
            tracing::warn!("Error parsing saved game: {}", e);
            return None;
        },
    };

    if session.date_key != date_key {
        tracing::debug!(
            saved = %session.date_key,
            today = %date_key,
            "Ignoring saved game from another day",
        );
        return None;
    }

    Some(session)
}

pub fn save_session<S>(slot: &mut S, key: &str, session: &Session)
    where S: SaveSlot + ?Sized
{
    let json = match session.to_json() {
        Ok(json) => json,
        Err(e) => {
            tracing::warn!("Error serializing game: {}", e);
            return;
        },
    };

    if let Err(e) = slot.set(key, &json) {
        tracing::warn!("Error saving game: {}", e);
    }
}

pub fn clear_session<S>(slot: &mut S, key: &str)
    where S: SaveSlot + ?Sized
{
    if let Err(e) = slot.delete(key) {
        tracing::warn!("Error clearing saved game: {}", e);
    }
}

#[cfg(test)]
pub struct BrokenSlot;

#[cfg(test)]
impl SaveSlot for BrokenSlot {
    fn get(&self, _key: &str) -> Result<Option<String>, Error> {
        Err(Error::Unavailable)
    }

    fn set(&mut self, _key: &str, _value: &str) -> Result<(), Error> {
        Err(Error::Backend("quota exceeded".to_string()))
    }

    fn delete(&mut self, _key: &str) -> Result<(), Error> {
        Err(Error::Unavailable)
    }
}
