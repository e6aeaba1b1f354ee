//src/store.rs
//! One account's collections, loaded whole on login and rewritten whole after
//! every mutation.
use chrono::NaiveDate;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::codec::{self, Record};
use crate::goals;
use crate::metrics;
use crate::models::{
    format_day, validate_positive, BodyweightLog, CardioWorkout, Goal, NewCardio, NewStrength,
    ProfileUpdate, RecordKind, StrengthWorkout, UserProfile, ValidationError,
};

const APP_DATA_DIR: &str = "fittrack";
const DATA_DIR_ENV_VAR: &str = "FITTRACK_DATA_DIR";

#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Invalid(#[from] ValidationError),
    #[error("Failed to get application data directory")]
    DataDir,
    #[error("Failed to create data directory {path:?}: {source}")]
    CreateDir { path: PathBuf, source: io::Error },
    #[error("Failed to write {path:?}: {source}")]
    Write { path: PathBuf, source: io::Error },
}

/// Resolves the directory holding the `.dat` files: the explicit override,
/// then `FITTRACK_DATA_DIR`, then the platform data directory.
pub fn get_data_dir(configured: Option<&Path>) -> Result<PathBuf, Error> {
    let dir = match configured {
        Some(path) => path.to_path_buf(),
        None => match std::env::var(DATA_DIR_ENV_VAR) {
            Ok(path) => PathBuf::from(path),
            Err(_) => dirs::data_dir().ok_or(Error::DataDir)?.join(APP_DATA_DIR),
        },
    };
    if !dir.exists() {
        fs::create_dir_all(&dir).map_err(|source| Error::CreateDir {
            path: dir.clone(),
            source,
        })?;
    }
    Ok(dir)
}

/// The backing files of one account.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataFile {
    Profile,
    Cardio,
    Strength,
    Bodyweight,
    Goals,
}

impl DataFile {
    pub const ALL: [Self; 5] = [
        Self::Profile,
        Self::Cardio,
        Self::Strength,
        Self::Bodyweight,
        Self::Goals,
    ];

    const fn prefix(self) -> &'static str {
        match self {
            Self::Profile => "profile",
            Self::Cardio => "cardio",
            Self::Strength => "strength",
            Self::Bodyweight => "weight",
            Self::Goals => "goals",
        }
    }

    pub fn path(self, data_dir: &Path, username: &str) -> PathBuf {
        data_dir.join(format!("{}_{username}.dat", self.prefix()))
    }
}

/// Everything resident in memory for the logged-in account.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AccountData {
    pub profile: UserProfile,
    pub cardio: Vec<CardioWorkout>,
    pub strength: Vec<StrengthWorkout>,
    pub bodyweight: Vec<BodyweightLog>,
    pub goals: Vec<Goal>,
}

#[derive(Debug)]
pub struct AccountStore {
    data_dir: PathBuf,
    data: AccountData,
}

/// Missing or unreadable files read as empty.
fn read_file(path: &Path) -> String {
    match fs::read_to_string(path) {
        Ok(text) => text,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            debug!("{path:?} not found, starting empty");
            String::new()
        }
        Err(e) => {
            warn!("failed to read {path:?}: {e}");
            String::new()
        }
    }
}

/// Writes to a temp file next to `path`, then renames it over the target.
fn write_atomic(path: &Path, contents: &str) -> Result<(), Error> {
    let write_err = |source| Error::Write {
        path: path.to_path_buf(),
        source,
    };
    let dir = path.parent().unwrap_or_else(|| Path::new("."));
    let mut tmp = NamedTempFile::new_in(dir).map_err(write_err)?;
    tmp.write_all(contents.as_bytes()).map_err(write_err)?;
    tmp.as_file().sync_all().map_err(write_err)?;
    tmp.persist(path).map_err(|e| write_err(e.error))?;
    Ok(())
}

impl AccountStore {
    /// Opens the account and loads whatever is on disk.
    pub fn open(data_dir: impl Into<PathBuf>, username: &str, display_name: &str) -> Self {
        let mut store = Self {
            data_dir: data_dir.into(),
            data: AccountData::default(),
        };
        store.data.profile.username = username.to_string();
        store.data.profile.display_name = display_name.to_string();
        store.load();
        store
    }

    pub fn username(&self) -> &str {
        &self.data.profile.username
    }

    pub fn data(&self) -> &AccountData {
        &self.data
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    fn path(&self, file: DataFile) -> PathBuf {
        file.path(&self.data_dir, self.username())
    }

    /// Clears every collection and re-reads them from disk in file order.
    /// Never fails: bad lines are dropped, missing files read as empty.
    pub fn load(&mut self) {
        let username = std::mem::take(&mut self.data.profile.username);
        let display_name = std::mem::take(&mut self.data.profile.display_name);
        self.data = AccountData::default();

        let profile_text = read_file(&DataFile::Profile.path(&self.data_dir, &username));
        if let Some(line) = profile_text.lines().next() {
            match UserProfile::decode(line) {
                Ok(profile) => self.data.profile = profile,
                Err(e) => debug!("skipping malformed profile line: {e}"),
            }
        }
        self.data.profile.username = username;
        self.data.profile.display_name = display_name;

        self.data.cardio = codec::decode_lines(&read_file(&self.path(DataFile::Cardio)));
        self.data.strength = codec::decode_lines(&read_file(&self.path(DataFile::Strength)));
        self.data.bodyweight = codec::decode_lines(&read_file(&self.path(DataFile::Bodyweight)));
        self.data.goals = codec::decode_lines(&read_file(&self.path(DataFile::Goals)));

        info!(
            "loaded account '{}': {} cardio, {} strength, {} bodyweight, {} goals",
            self.username(),
            self.data.cardio.len(),
            self.data.strength.len(),
            self.data.bodyweight.len(),
            self.data.goals.len()
        );
    }

    /// Rewrites every backing file in full from memory.
    pub fn save(&self) -> Result<(), Error> {
        for file in DataFile::ALL {
            let contents = match file {
                DataFile::Profile => self.data.profile.encode() + "\n",
                DataFile::Cardio => codec::encode_lines(&self.data.cardio),
                DataFile::Strength => codec::encode_lines(&self.data.strength),
                DataFile::Bodyweight => codec::encode_lines(&self.data.bodyweight),
                DataFile::Goals => codec::encode_lines(&self.data.goals),
            };
            write_atomic(&self.path(file), &contents)?;
        }
        debug!("saved account '{}'", self.username());
        Ok(())
    }

    /// Logs a cardio session with derived calories and speed, then credits
    /// distance goals.
    pub fn add_cardio(&mut self, new: NewCardio) -> Result<CardioWorkout, Error> {
        new.validate()?;
        let workout = CardioWorkout {
            date: format_day(new.date),
            type_: new.type_,
            duration_minutes: new.duration_minutes,
            distance_km: new.distance_km,
            calories: metrics::cardio_calories(
                new.type_,
                new.duration_minutes,
                self.data.profile.weight,
            ),
            avg_speed_kmh: metrics::avg_speed_kmh(new.distance_km, new.duration_minutes),
        };
        self.data.cardio.push(workout.clone());
        goals::on_cardio_logged(
            &mut self.data.goals,
            workout.distance_km,
            workout.duration_minutes,
        );
        self.save()?;
        Ok(workout)
    }

    /// Logs a strength workout with derived calories, then credits strength goals.
    pub fn add_strength(&mut self, new: NewStrength) -> Result<StrengthWorkout, Error> {
        new.validate()?;
        let mut workout = StrengthWorkout {
            date: format_day(new.date),
            exercises: new.exercises,
            calories: 0.0,
        };
        workout.calories = metrics::strength_calories(workout.volume(), self.data.profile.weight);
        self.data.strength.push(workout.clone());
        let advanced = goals::on_strength_logged(&mut self.data.goals, &workout);
        if advanced > 0 {
            debug!("strength workout advanced {advanced} goal(s)");
        }
        self.save()?;
        Ok(workout)
    }

    /// Logs a bodyweight entry; the profile weight follows the latest entry.
    pub fn add_bodyweight(&mut self, date: NaiveDate, weight: f64) -> Result<(), Error> {
        validate_positive("Weight", weight)?;
        self.data.bodyweight.push(BodyweightLog {
            date: format_day(date),
            weight,
        });
        self.data.profile.weight = weight;
        self.save()
    }

    pub fn add_goal(&mut self, goal: Goal) -> Result<(), Error> {
        goal.validate()?;
        self.data.goals.push(goal);
        self.save()
    }

    /// Removes one record by position. Goal progress is not recomputed.
    pub fn delete(&mut self, kind: RecordKind, index: usize) -> Result<(), Error> {
        let len = match kind {
            RecordKind::Cardio => self.data.cardio.len(),
            RecordKind::Strength => self.data.strength.len(),
            RecordKind::Bodyweight => self.data.bodyweight.len(),
            RecordKind::Goal => self.data.goals.len(),
        };
        if index >= len {
            return Err(ValidationError::NoSuchRecord { kind, index, len }.into());
        }
        match kind {
            RecordKind::Cardio => {
                self.data.cardio.remove(index);
            }
            RecordKind::Strength => {
                self.data.strength.remove(index);
            }
            RecordKind::Bodyweight => {
                self.data.bodyweight.remove(index);
            }
            RecordKind::Goal => {
                self.data.goals.remove(index);
            }
        }
        self.save()
    }

    pub fn update_profile(&mut self, update: ProfileUpdate) -> Result<(), Error> {
        update.validate()?;
        let profile = &mut self.data.profile;
        profile.gender = Some(update.gender);
        profile.weight = update.weight;
        profile.target_bodyweight = update.target_bodyweight;
        profile.height = update.height;
        profile.age = update.age;
        self.save()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::CardioType;
    use tempfile::TempDir;

    #[test]
    fn file_names_are_keyed_by_account() {
        let dir = Path::new("/data");
        assert_eq!(
            DataFile::Bodyweight.path(dir, "ana"),
            PathBuf::from("/data/weight_ana.dat")
        );
        assert_eq!(
            DataFile::Cardio.path(dir, "ana"),
            PathBuf::from("/data/cardio_ana.dat")
        );
    }

    #[test]
    fn invalid_input_leaves_state_untouched() {
        let dir = TempDir::new().unwrap();
        let mut store = AccountStore::open(dir.path(), "ana", "Ana");
        let result = store.add_cardio(NewCardio {
            date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            type_: CardioType::Running,
            duration_minutes: 0,
            distance_km: 5.0,
        });
        assert!(matches!(
            result,
            Err(Error::Invalid(ValidationError::NotPositive("Duration")))
        ));
        assert!(store.data().cardio.is_empty());
        assert!(!DataFile::Cardio.path(dir.path(), "ana").exists());
    }

    #[test]
    fn save_overwrites_instead_of_appending() {
        let dir = TempDir::new().unwrap();
        let mut store = AccountStore::open(dir.path(), "ana", "Ana");
        let day = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        store.add_bodyweight(day, 80.0).unwrap();
        store.add_bodyweight(day, 81.0).unwrap();
        store.delete(RecordKind::Bodyweight, 0).unwrap();

        let text = fs::read_to_string(DataFile::Bodyweight.path(dir.path(), "ana")).unwrap();
        assert_eq!(text, "2024-01-01|81\n");
    }
}
