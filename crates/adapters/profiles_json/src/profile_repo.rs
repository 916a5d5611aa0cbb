//! `users.json` implementation of [`ProfileRepository`].

use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use serde::Deserialize;

use bodyscale_app::ports::ProfileRepository;
use bodyscale_domain::error::ScaleError;
use bodyscale_domain::id::ProfileId;
use bodyscale_domain::profile::{Sex, UserProfile};

use crate::error::ProfileStoreError;

/// On-disk document: `{ "users": [ ... ] }`.
#[derive(Debug, Default, Deserialize)]
struct ProfileDocument {
    #[serde(default)]
    users: Vec<ProfileEntry>,
}

#[derive(Debug, Deserialize)]
struct ProfileEntry {
    id: ProfileId,
    username: String,
    #[serde(default)]
    display_name: Option<String>,
    #[serde(alias = "height")]
    height_cm: f64,
    birthdate: NaiveDate,
    #[serde(default)]
    sex: Sex,
}

impl From<ProfileEntry> for UserProfile {
    fn from(entry: ProfileEntry) -> Self {
        let display_name = entry
            .display_name
            .unwrap_or_else(|| entry.username.clone());
        Self {
            id: entry.id,
            username: entry.username,
            display_name,
            height_cm: entry.height_cm,
            birthdate: entry.birthdate,
            sex: entry.sex,
        }
    }
}

/// Profile snapshot read from a JSON file.
///
/// Entries are returned as written; invariant checks are left to the caller
/// so that one bad entry does not hide the others. A missing file is an
/// empty household.
pub struct JsonProfileRepository {
    path: PathBuf,
}

impl JsonProfileRepository {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn read(&self) -> Result<Vec<UserProfile>, ProfileStoreError> {
        let content = match tokio::fs::read_to_string(&self.path).await {
            Ok(content) => content,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %self.path.display(), "profile file not found");
                return Ok(Vec::new());
            }
            Err(err) => return Err(err.into()),
        };
        let document: ProfileDocument = serde_json::from_str(&content)?;
        Ok(document.users.into_iter().map(UserProfile::from).collect())
    }
}

impl ProfileRepository for JsonProfileRepository {
    async fn list(&self) -> Result<Vec<UserProfile>, ScaleError> {
        let profiles = self.read().await?;
        tracing::trace!(count = profiles.len(), "profiles loaded");
        Ok(profiles)
    }
}
