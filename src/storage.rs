use crate::constants::SESSION_KEY;
use crate::models::User;
use anyhow::Result;
use std::fs;
use std::path::PathBuf;

/// Persists the logged-in practitioner between runs
#[derive(Clone, Debug)]
pub struct SessionStore {
    data_dir: PathBuf,
}

impl SessionStore {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        SessionStore {
            data_dir: data_dir.into(),
        }
    }

    fn path(&self) -> PathBuf {
        self.data_dir.join(format!("{}.json", SESSION_KEY))
    }

    /// Ensure data directory exists
    fn ensure_dir(&self) -> Result<()> {
        if !self.data_dir.exists() {
            fs::create_dir_all(&self.data_dir)?;
        }
        Ok(())
    }

    /// Saved session, if any. A corrupt file counts as no session.
    pub fn load(&self) -> Option<User> {
        let content = fs::read_to_string(self.path()).ok()?;
        match serde_json::from_str::<User>(&content) {
            Ok(user) if !user.email.is_empty() => Some(user),
            Ok(_) => None,
            Err(e) => {
                tracing::warn!("Ignoring unreadable saved session: {}", e);
                None
            }
        }
    }

    pub fn save(&self, user: &User) -> Result<()> {
        self.ensure_dir()?;
        fs::write(self.path(), serde_json::to_string(user)?)?;
        Ok(())
    }

    /// Remove the saved session; missing file is not an error
    pub fn clear(&self) -> Result<()> {
        match fs::remove_file(self.path()) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}
