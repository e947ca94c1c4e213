//! crates/report_dashboard_core/src/session.rs
//!
//! Per-browser session state that lives next to the reports: the current user
//! with its role, and the light/dark theme preference.

use parking_lot::RwLock;
use tracing::{info, warn};

use crate::domain::{ThemeMode, User, UserRole};
use crate::persistence::{LocalPersistence, PersistenceError};
use crate::ports::PortResult;

//=========================================================================================
// UserSession
//=========================================================================================

pub struct UserSession {
    persistence: LocalPersistence,
    user: RwLock<User>,
}

impl UserSession {
    /// Restores the stored user, falling back to the default viewer when
    /// nothing (or something unreadable) is stored.
    pub fn load(persistence: LocalPersistence) -> PortResult<Self> {
        let key = persistence.keys().user.clone();
        let user = match persistence.load_json::<User>(&key) {
            Ok(Some(user)) => user,
            Ok(None) => User::default(),
            Err(PersistenceError::Malformed { source, .. }) => {
                warn!("Stored user record is unreadable, using default user: {}", source);
                User::default()
            }
            Err(PersistenceError::Storage(e)) => return Err(e),
        };

        Ok(Self {
            persistence,
            user: RwLock::new(user),
        })
    }

    pub fn current(&self) -> User {
        self.user.read().clone()
    }

    pub fn set_role(&self, role: UserRole) -> Result<User, PersistenceError> {
        let mut user = self.user.write();
        let mut updated = user.clone();
        updated.role = role;
        self.persistence
            .save_json(&self.persistence.keys().user, &updated)?;
        *user = updated.clone();
        info!(user_id = %updated.id, role = %role, "User role changed");
        Ok(updated)
    }

    pub fn is_admin(&self) -> bool {
        self.user.read().role == UserRole::Admin
    }

    pub fn is_viewer(&self) -> bool {
        self.user.read().role == UserRole::Viewer
    }

    /// Whether create/edit/delete/summarize should be offered.
    pub fn can_edit(&self) -> bool {
        self.is_admin()
    }
}

//=========================================================================================
// ThemePreference
//=========================================================================================

pub struct ThemePreference {
    persistence: LocalPersistence,
    mode: RwLock<ThemeMode>,
}

impl ThemePreference {
    /// Uses the stored mode if there is one, otherwise the system preference.
    /// The resolved mode is written back so later sessions start from it.
    pub fn load(persistence: LocalPersistence, system_prefers_dark: bool) -> PortResult<Self> {
        let key = persistence.keys().theme.clone();
        let stored = persistence
            .load_raw(&key)?
            .and_then(|raw| raw.parse::<ThemeMode>().ok());
        let mode = stored.unwrap_or(if system_prefers_dark {
            ThemeMode::Dark
        } else {
            ThemeMode::Light
        });
        persistence.save_raw(&key, mode.as_str())?;

        Ok(Self {
            persistence,
            mode: RwLock::new(mode),
        })
    }

    pub fn mode(&self) -> ThemeMode {
        *self.mode.read()
    }

    pub fn toggle(&self) -> PortResult<ThemeMode> {
        let mut mode = self.mode.write();
        let next = mode.toggled();
        self.persistence
            .save_raw(&self.persistence.keys().theme, next.as_str())?;
        *mode = next;
        Ok(next)
    }
}
