use super::error::SaveError;
use super::format::{decompress_and_deserialize, serialize_and_compress, AppSave};

use std::fs::{remove_file, rename, File};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

/// The entire application persists under this one name; there are no
/// slots, no per-entity files and no schema migrations.
pub const DATA_FILE_NAME: &str = "club_data.dat";

/// Loads and stores the single application blob.
///
/// Writes are atomic: serialize to a temp file, fsync, rename over the
/// real one. A crash mid-save leaves the previous blob intact.
pub struct SaveManager {
    data_dir: PathBuf,
}

impl SaveManager {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self { data_dir: data_dir.into() }
    }

    /// Manager rooted at `./data` under the working directory.
    pub fn default_location() -> Self {
        let dir = std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")).join("data");
        Self::new(dir)
    }

    pub fn data_path(&self) -> PathBuf {
        self.data_dir.join(DATA_FILE_NAME)
    }

    pub fn exists(&self) -> bool {
        self.data_path().exists()
    }

    /// Persist the whole application state.
    pub fn save(&self, save: &AppSave) -> Result<(), SaveError> {
        Self::save_to_path(&self.data_path(), save)
    }

    /// Load the whole application state.
    pub fn load(&self) -> Result<AppSave, SaveError> {
        Self::load_from_path(&self.data_path())
    }

    /// Collect the global state and persist it.
    pub fn save_state(&self) -> Result<(), SaveError> {
        let save = crate::state::get_state().to_save();
        self.save(&save)?;
        log::info!("application state saved");
        Ok(())
    }

    /// Load the blob and install it as the global state.
    pub fn load_state(&self) -> Result<AppSave, SaveError> {
        let save = self.load()?;
        crate::state::set_state(crate::state::AppState::from_save(&save));
        log::info!("application state loaded");
        Ok(save)
    }

    pub fn delete(&self) -> Result<(), SaveError> {
        let path = self.data_path();
        if path.exists() {
            remove_file(&path)?;
            log::info!("deleted {:?}", path);
        }
        Ok(())
    }

    fn save_to_path(path: &Path, save: &AppSave) -> Result<(), SaveError> {
        // Ensure the data directory exists
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let data = serialize_and_compress(save)?;

        // Atomic save: write to temp file, then rename
        let temp_path = path.with_extension("tmp");

        {
            let mut file = File::create(&temp_path)?;
            file.write_all(&data)?;
            file.flush()?;

            // sync_all ensures data is written to disk (portable fsync)
            file.sync_all()?;
        }

        // Atomic rename
        rename(&temp_path, path)?;

        log::debug!("saved {} bytes to {:?}", data.len(), path);
        Ok(())
    }

    fn load_from_path(path: &Path) -> Result<AppSave, SaveError> {
        if !path.exists() {
            return Err(SaveError::FileNotFound { path: path.display().to_string() });
        }

        let mut file = File::open(path)?;
        let mut data = Vec::new();
        file.read_to_end(&mut data)?;

        let save = decompress_and_deserialize(&data)?;

        log::debug!("loaded {} bytes from {:?}", data.len(), path);
        Ok(save)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Player, PlayerRole};
    use tempfile::TempDir;

    #[test]
    fn test_save_load_roundtrip() {
        let temp_dir = TempDir::new().unwrap();
        let manager = SaveManager::new(temp_dir.path());

        let mut save = AppSave::new();
        save.players.push(Player::new("p1", "Rahul H", PlayerRole::Bowler));

        manager.save(&save).unwrap();
        let loaded = manager.load().unwrap();

        assert_eq!(save.version, loaded.version);
        assert_eq!(loaded.players.len(), 1);
    }

    #[test]
    fn test_atomic_save_leaves_no_temp_file() {
        let temp_dir = TempDir::new().unwrap();
        let manager = SaveManager::new(temp_dir.path());

        manager.save(&AppSave::new()).unwrap();

        assert!(manager.exists());
        assert!(!manager.data_path().with_extension("tmp").exists());
    }

    #[test]
    fn test_load_missing_file_reports_not_found() {
        let temp_dir = TempDir::new().unwrap();
        let manager = SaveManager::new(temp_dir.path());
        assert!(matches!(manager.load(), Err(SaveError::FileNotFound { .. })));
    }

    #[test]
    fn test_save_overwrites_previous_blob() {
        let temp_dir = TempDir::new().unwrap();
        let manager = SaveManager::new(temp_dir.path());

        manager.save(&AppSave::new()).unwrap();

        let mut second = AppSave::new();
        second.players.push(Player::new("p2", "Amol G", PlayerRole::AllRounder));
        manager.save(&second).unwrap();

        let loaded = manager.load().unwrap();
        assert_eq!(loaded.players.len(), 1);
        assert_eq!(loaded.players[0].id, "p2");
    }
}
