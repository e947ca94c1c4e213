//! crates/report_dashboard_core/src/activity.rs
//!
//! Newest-first log of what the current user did to which report.

use chrono::Utc;
use parking_lot::RwLock;
use serde_json::{Map, Value};
use std::sync::Arc;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::domain::{Activity, ActivityType};
use crate::persistence::{LocalPersistence, PersistenceError};
use crate::session::UserSession;

pub struct ActivityLog {
    persistence: LocalPersistence,
    session: Arc<UserSession>,
    entries: RwLock<Vec<Activity>>,
}

impl ActivityLog {
    /// Restores the stored log. An unreadable log starts over empty.
    pub fn load(persistence: LocalPersistence, session: Arc<UserSession>) -> Result<Self, PersistenceError> {
        let key = persistence.keys().activities.clone();
        let entries = match persistence.load_json::<Vec<Activity>>(&key) {
            Ok(entries) => entries.unwrap_or_default(),
            Err(PersistenceError::Malformed { source, .. }) => {
                warn!("Stored activity log is unreadable, starting a new one: {}", source);
                Vec::new()
            }
            Err(e) => return Err(e),
        };

        Ok(Self {
            persistence,
            session,
            entries: RwLock::new(entries),
        })
    }

    /// Records an activity for the current user and persists the whole log.
    pub fn log(
        &self,
        kind: ActivityType,
        report_id: Option<&str>,
        meta: Option<Map<String, Value>>,
    ) -> Result<Activity, PersistenceError> {
        let user = self.session.current();
        let activity = Activity {
            id: Uuid::new_v4().to_string(),
            user_id: user.id,
            user_name: user.name,
            kind,
            report_id: report_id.map(str::to_string),
            timestamp: Utc::now(),
            meta,
        };

        let mut entries = self.entries.write();
        let mut updated = Vec::with_capacity(entries.len() + 1);
        updated.push(activity.clone());
        updated.extend(entries.iter().cloned());
        self.persistence
            .save_json(&self.persistence.keys().activities, &updated)?;
        *entries = updated;

        debug!(kind = ?kind, report_id = ?activity.report_id, "Activity logged");
        Ok(activity)
    }

    pub fn entries(&self) -> Vec<Activity> {
        self.entries.read().clone()
    }
}
