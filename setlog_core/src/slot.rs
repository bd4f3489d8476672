//! Single-slot persistence for the active session.
//!
//! The slot holds at most one [`SessionSnapshot`] so a workout survives a
//! restart. It is overwritten wholesale on every mutation and removed on
//! finish or cancel. There is no conflict detection: whichever writer saves
//! last wins.

use crate::controller::SessionSnapshot;
use crate::{Error, Result};
use fs2::FileExt;
use std::fs::File;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

pub struct SessionSlot {
    path: PathBuf,
}

impl SessionSlot {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the saved session with shared locking
    ///
    /// Returns `None` if the slot is empty. A corrupted slot is logged and
    /// treated as empty.
    pub fn load(&self) -> Result<Option<SessionSnapshot>> {
        if !self.path.exists() {
            tracing::debug!("No active session saved at {:?}", self.path);
            return Ok(None);
        }

        let file = match File::open(&self.path) {
            Ok(f) => f,
            Err(e) => {
                tracing::warn!("Unable to open session slot {:?}: {}. Ignoring it.", self.path, e);
                return Ok(None);
            }
        };

        if let Err(e) = file.lock_shared() {
            tracing::warn!("Unable to lock session slot {:?}: {}. Ignoring it.", self.path, e);
            return Ok(None);
        }

        let mut contents = String::new();
        let mut reader = std::io::BufReader::new(&file);
        if let Err(e) = reader.read_to_string(&mut contents) {
            let _ = file.unlock();
            tracing::warn!("Failed to read session slot {:?}: {}. Ignoring it.", self.path, e);
            return Ok(None);
        }

        file.unlock()?;

        match serde_json::from_str::<SessionSnapshot>(&contents) {
            Ok(snapshot) => {
                tracing::debug!("Restored active session from {:?}", self.path);
                Ok(Some(snapshot))
            }
            Err(e) => {
                tracing::warn!(
                    "Failed to parse session slot {:?}: {}. Starting without a session.",
                    self.path,
                    e
                );
                Ok(None)
            }
        }
    }

    /// Replace the slot contents atomically
    ///
    /// Writes to a temp file in the same directory, syncs it and renames it
    /// over the slot.
    pub fn save(&self, snapshot: &SessionSnapshot) -> Result<()> {
        let parent = self.path.parent().ok_or_else(|| {
            Error::Io(std::io::Error::new(
                std::io::ErrorKind::Other,
                "session slot path missing parent",
            ))
        })?;
        std::fs::create_dir_all(parent)?;

        let temp = NamedTempFile::new_in(parent)?;
        temp.as_file().lock_exclusive()?;

        {
            let mut writer = std::io::BufWriter::new(temp.as_file());
            let contents = serde_json::to_string(snapshot)?;
            writer.write_all(contents.as_bytes())?;
            writer.flush()?;
        }

        temp.as_file().sync_all()?;
        temp.as_file().unlock()?;

        temp.persist(&self.path).map_err(|e| Error::Io(e.error))?;

        tracing::debug!("Saved active session to {:?}", self.path);
        Ok(())
    }

    /// Empty the slot
    pub fn clear(&self) -> Result<()> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => {
                tracing::debug!("Cleared session slot {:?}", self.path);
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::controller::SessionController;
    use crate::session::{NewExercise, SetField};
    use chrono::Utc;

    fn snapshot() -> SessionSnapshot {
        let mut controller = SessionController::new();
        controller.start_custom("Garage", 75, Utc::now()).unwrap();
        controller
            .add_exercise(NewExercise {
                name: "Deadlift".into(),
                muscle: "Back".into(),
                target_sets: 2,
                target_reps: 5,
                target_weight: 140.0,
                superset: None,
            })
            .unwrap();
        controller.snapshot().unwrap()
    }

    #[test]
    fn test_save_and_load_roundtrip() {
        let temp_dir = tempfile::tempdir().unwrap();
        let slot = SessionSlot::new(temp_dir.path().join("active_session.json"));

        let saved = snapshot();
        slot.save(&saved).unwrap();

        let loaded = slot.load().unwrap().unwrap();
        assert_eq!(loaded, saved);
    }

    #[test]
    fn test_infinite_weight_edit_does_not_corrupt_slot() {
        let temp_dir = tempfile::tempdir().unwrap();
        let slot = SessionSlot::new(temp_dir.path().join("active_session.json"));

        let mut controller = SessionController::restore(snapshot());
        controller.update_set(0, 0, SetField::Weight("inf".parse().unwrap()));
        controller.update_set(0, 0, SetField::Completed(true));
        slot.save(&controller.snapshot().unwrap()).unwrap();

        let loaded = slot.load().unwrap().unwrap();
        let set = &loaded.session.exercises[0].sets[0];
        assert_eq!(set.weight, 140.0);
        assert!(set.completed);
    }

    #[test]
    fn test_empty_slot_loads_none() {
        let temp_dir = tempfile::tempdir().unwrap();
        let slot = SessionSlot::new(temp_dir.path().join("active_session.json"));
        assert!(slot.load().unwrap().is_none());
        slot.clear().unwrap();
    }

    #[test]
    fn test_corrupted_slot_loads_none() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("active_session.json");
        std::fs::write(&path, "{ invalid json }").unwrap();

        let slot = SessionSlot::new(&path);
        assert!(slot.load().unwrap().is_none());
    }

    #[test]
    fn test_save_overwrites_and_clear_removes() {
        let temp_dir = tempfile::tempdir().unwrap();
        let slot = SessionSlot::new(temp_dir.path().join("active_session.json"));

        slot.save(&snapshot()).unwrap();
        let second = snapshot();
        slot.save(&second).unwrap();
        assert_eq!(slot.load().unwrap().unwrap(), second);

        // Only the slot file remains, no stray temp files
        let extras: Vec<_> = std::fs::read_dir(temp_dir.path())
            .unwrap()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_name() != "active_session.json")
            .collect();
        assert!(extras.is_empty(), "Unexpected files: {:?}", extras);

        slot.clear().unwrap();
        assert!(!slot.path().exists());
    }
}
