use anyhow::{Context, Result};
use chrono::{Local, NaiveDate};
use std::path::{Path, PathBuf};
use tracing::info;

// --- Declare modules ---
pub mod aggregate;
pub mod codec;
mod config;
pub mod credentials;
pub mod goals;
pub mod metrics;
pub mod models;
pub mod store;

// --- Expose public types ---
pub use aggregate::{compute_dashboard, Dashboard, DailyBuckets, LifetimeTotals, WeeklyTotals};
pub use config::{load as load_config_util, Config};
pub use credentials::CredentialStore;
pub use goals::{GoalRow, GoalStatus};
pub use metrics::BmiCategory;
pub use models::{
    BodyweightLog, CardioType, CardioWorkout, Exercise, ExerciseSet, Gender, Goal, GoalKind,
    NewCardio, NewStrength, ProfileUpdate, RecordKind, StrengthWorkout, UserProfile,
    ValidationError,
};
pub use store::{AccountData, AccountStore, Error as StoreError};

/// Validation failures become a bare `ValidationError` so callers can
/// `downcast_ref` it; everything else keeps its own type.
fn store_err(err: store::Error) -> anyhow::Error {
    match err {
        store::Error::Invalid(v) => v.into(),
        other => other.into(),
    }
}

fn credentials_err(err: credentials::Error) -> anyhow::Error {
    match err {
        credentials::Error::Invalid(v) => v.into(),
        other => other.into(),
    }
}

/// The caller-owned session: configuration plus, while logged in, the one
/// resident account.
pub struct AppService {
    pub config: Config,
    pub config_path: PathBuf,
    pub data_dir: PathBuf,
    session: Option<AccountStore>,
}

impl AppService {
    /// Loads config from the standard location and restores the logged-in
    /// account, if any.
    /// # Errors
    /// Returns `anyhow::Error` if config/data path determination or loading fails.
    pub fn initialize() -> Result<Self> {
        let config_path =
            config::get_config_path().context("Failed to determine configuration file path")?;
        let config = config::load(&config_path)
            .with_context(|| format!("Failed to load config from {config_path:?}"))?;
        let data_dir = store::get_data_dir(config.data_dir.as_deref())
            .context("Failed to determine data directory")?;

        let mut service = Self::new(config, config_path, data_dir);
        service.restore_session()?;
        Ok(service)
    }

    /// Builds a logged-out service over explicit paths.
    pub fn new(config: Config, config_path: PathBuf, data_dir: PathBuf) -> Self {
        Self {
            config,
            config_path,
            data_dir,
            session: None,
        }
    }

    pub fn get_config_path(&self) -> &Path {
        &self.config_path
    }

    pub fn get_data_dir(&self) -> &Path {
        &self.data_dir
    }

    fn credentials(&self) -> CredentialStore {
        CredentialStore::new(&self.data_dir)
    }

    fn remember_user(&mut self, username: Option<String>) -> Result<()> {
        self.config.active_user = username;
        config::save(&self.config_path, &self.config).context("Failed to save config")
    }

    /// Reopens the account recorded in the config without a password check.
    pub fn restore_session(&mut self) -> Result<()> {
        let Some(username) = self.config.active_user.clone() else {
            return Ok(());
        };
        let display_name = self
            .credentials()
            .display_name(&username)
            .map_err(credentials_err)?
            .unwrap_or_else(|| username.clone());
        self.session = Some(AccountStore::open(&self.data_dir, &username, &display_name));
        Ok(())
    }

    pub fn is_logged_in(&self) -> bool {
        self.session.is_some()
    }

    fn session(&self) -> Result<&AccountStore> {
        self.session
            .as_ref()
            .ok_or_else(|| ValidationError::NotLoggedIn.into())
    }

    fn session_mut(&mut self) -> Result<&mut AccountStore> {
        self.session
            .as_mut()
            .ok_or_else(|| ValidationError::NotLoggedIn.into())
    }

    /// Collections of the logged-in account.
    pub fn account(&self) -> Result<&AccountData> {
        Ok(self.session()?.data())
    }

    /// Registers a user and logs them in with an empty profile; complete it
    /// with [`AppService::update_profile`].
    pub fn signup(
        &mut self,
        username: &str,
        password: &str,
        confirm: &str,
        display_name: &str,
    ) -> Result<()> {
        let username = username.trim();
        let display_name = display_name.trim();
        self.credentials()
            .register(username, password, confirm, display_name)
            .map_err(credentials_err)?;
        self.logout()?;
        self.session = Some(AccountStore::open(&self.data_dir, username, display_name));
        self.remember_user(Some(username.to_string()))
    }

    /// Checks credentials, unloads any current account and loads this one.
    pub fn login(&mut self, username: &str, password: &str) -> Result<&AccountData> {
        let username = username.trim();
        if username.is_empty() {
            return Err(ValidationError::EmptyField("Username").into());
        }
        if password.is_empty() {
            return Err(ValidationError::EmptyField("Password").into());
        }
        let display_name = self
            .credentials()
            .verify(username, password)
            .map_err(credentials_err)?
            .ok_or(ValidationError::InvalidCredentials)?;

        self.logout()?;
        info!("logging in '{username}'");
        self.session = Some(AccountStore::open(&self.data_dir, username, &display_name));
        self.remember_user(Some(username.to_string()))?;
        self.account()
    }

    /// Persists and unloads the current account. A no-op when logged out.
    /// The account stays loaded if saving fails.
    pub fn logout(&mut self) -> Result<()> {
        let Some(account) = self.session.as_ref() else {
            return Ok(());
        };
        account.save().map_err(store_err)?;
        info!("logged out '{}'", account.username());
        self.session = None;
        self.remember_user(None)
    }

    pub fn update_profile(&mut self, update: ProfileUpdate) -> Result<()> {
        self.session_mut()?
            .update_profile(update)
            .map_err(store_err)
    }

    /// Returns the stored workout including its derived calories and speed.
    pub fn add_cardio(&mut self, new: NewCardio) -> Result<CardioWorkout> {
        self.session_mut()?.add_cardio(new).map_err(store_err)
    }

    /// Returns the stored workout including its derived calories.
    pub fn add_strength(&mut self, new: NewStrength) -> Result<StrengthWorkout> {
        self.session_mut()?.add_strength(new).map_err(store_err)
    }

    pub fn add_bodyweight(&mut self, date: NaiveDate, weight: f64) -> Result<()> {
        self.session_mut()?
            .add_bodyweight(date, weight)
            .map_err(store_err)
    }

    pub fn add_goal(&mut self, goal: Goal) -> Result<()> {
        self.session_mut()?.add_goal(goal).map_err(store_err)
    }

    pub fn delete_record(&mut self, kind: RecordKind, index: usize) -> Result<()> {
        self.session_mut()?.delete(kind, index).map_err(store_err)
    }

    pub fn delete_goal(&mut self, index: usize) -> Result<()> {
        self.delete_record(RecordKind::Goal, index)
    }

    /// Dashboard as of `today`.
    pub fn compute_dashboard_at(&self, today: NaiveDate) -> Result<Dashboard> {
        Ok(compute_dashboard(self.account()?, today))
    }

    /// Dashboard as of the local calendar date.
    pub fn compute_dashboard(&self) -> Result<Dashboard> {
        self.compute_dashboard_at(Local::now().date_naive())
    }
}
