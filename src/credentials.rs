//src/credentials.rs
//! Append-only `users.dat`: `username|sha256(password)|displayName` per line.
use sha2::{Digest, Sha256};
use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::info;

use crate::models::{validate_name, ValidationError};

pub const USERS_FILE: &str = "users.dat";
pub const MIN_PASSWORD_LEN: usize = 6;

#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Invalid(#[from] ValidationError),
    #[error("I/O error accessing {path:?}: {source}")]
    Io { path: PathBuf, source: io::Error },
}

pub fn hash_password(password: &str) -> String {
    format!("{:x}", Sha256::digest(password.as_bytes()))
}

/// Usernames also name the account's files, so path separators are refused.
pub fn validate_username(username: &str) -> Result<(), ValidationError> {
    validate_name("Username", username)?;
    if let Some(ch) = username.chars().find(|c| matches!(c, '/' | '\\')) {
        return Err(ValidationError::ReservedCharacter {
            field: "Username",
            ch,
        });
    }
    Ok(())
}

#[derive(Debug, Clone)]
pub struct CredentialStore {
    path: PathBuf,
}

struct UserLine<'a> {
    username: &'a str,
    password_hash: &'a str,
    display_name: &'a str,
}

fn parse_line(line: &str) -> Option<UserLine<'_>> {
    let mut parts = line.split('|');
    Some(UserLine {
        username: parts.next()?,
        password_hash: parts.next()?,
        display_name: parts.next()?,
    })
}

impl CredentialStore {
    pub fn new(data_dir: &Path) -> Self {
        Self {
            path: data_dir.join(USERS_FILE),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read(&self) -> Result<String, Error> {
        match fs::read_to_string(&self.path) {
            Ok(text) => Ok(text),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(String::new()),
            Err(source) => Err(Error::Io {
                path: self.path.clone(),
                source,
            }),
        }
    }

    pub fn exists(&self, username: &str) -> Result<bool, Error> {
        Ok(self
            .read()?
            .lines()
            .any(|line| line.split('|').next() == Some(username)))
    }

    /// Validates a signup and appends the new user.
    pub fn register(
        &self,
        username: &str,
        password: &str,
        confirm: &str,
        display_name: &str,
    ) -> Result<(), Error> {
        if password.is_empty() {
            return Err(ValidationError::EmptyField("Password").into());
        }
        validate_name("Name", display_name)?;
        validate_username(username)?;
        if password.chars().count() < MIN_PASSWORD_LEN {
            return Err(ValidationError::PasswordTooShort(MIN_PASSWORD_LEN).into());
        }
        if password != confirm {
            return Err(ValidationError::PasswordMismatch.into());
        }
        if self.exists(username)? {
            return Err(ValidationError::UsernameTaken(username.to_string()).into());
        }

        let io_err = |source| Error::Io {
            path: self.path.clone(),
            source,
        };
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(io_err)?;
        writeln!(
            file,
            "{username}|{}|{display_name}",
            hash_password(password)
        )
        .map_err(io_err)?;
        info!("registered user '{username}'");
        Ok(())
    }

    /// Returns the display name when the credentials match.
    pub fn verify(&self, username: &str, password: &str) -> Result<Option<String>, Error> {
        let hash = hash_password(password);
        Ok(self
            .read()?
            .lines()
            .filter_map(parse_line)
            .find(|u| u.username == username && u.password_hash == hash)
            .map(|u| u.display_name.to_string()))
    }

    /// Display name for a registered user, without checking a password.
    pub fn display_name(&self, username: &str) -> Result<Option<String>, Error> {
        Ok(self
            .read()?
            .lines()
            .filter_map(parse_line)
            .find(|u| u.username == username)
            .map(|u| u.display_name.to_string()))
    }
}
