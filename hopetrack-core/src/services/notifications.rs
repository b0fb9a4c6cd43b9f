//! Notifications service
//!
//! Derives notifications from the case list and owns the persisted
//! notification state. Each derived notification has a deterministic id
//! (`<kind>-<caseId>`), so a condition produces at most one entry per case
//! until it is dismissed, and never again afterwards.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use uuid::Uuid;

use crate::config::{FOLLOWUP_AFTER_DAYS, MAX_NOTIFICATIONS};
use crate::error::Result;
use crate::models::{CaseRecord, Notification, NotificationType};
use crate::normalize::{normalize, Field};
use crate::status::{classify_value, is_discharged_equivalent, StatusBucket};
use crate::storage::{NotificationState, NotificationStore};

/// Owner of the notification list, dismissal set and processed case ids.
pub struct NotificationCenter {
    store: Arc<dyn NotificationStore>,
    state: NotificationState,
}

impl NotificationCenter {
    /// Load persisted state from `store`.
    pub fn open(store: Arc<dyn NotificationStore>) -> Result<Self> {
        let state = store.load()?;
        tracing::info!(
            "Notification center loaded with {} notifications",
            state.notifications.len()
        );
        Ok(Self { store, state })
    }

    /// Newest first.
    pub fn notifications(&self) -> &[Notification] {
        &self.state.notifications
    }

    pub fn is_dismissed(&self, id: &str) -> bool {
        self.state.dismissed.contains(id)
    }

    pub fn unread_count(&self) -> usize {
        self.state
            .notifications
            .iter()
            .filter(|notification| !notification.read)
            .count()
    }

    /// Evaluate every case and record the notifications that are new.
    ///
    /// Returns the notifications added by this pass.
    pub fn derive(&mut self, cases: &[CaseRecord], now: DateTime<Utc>) -> Result<Vec<Notification>> {
        let mut added: Vec<Notification> = Vec::new();
        let mut processed_changed = false;

        for record in cases {
            let Some(case_id) = record.id() else {
                tracing::debug!("Skipping case without an id");
                continue;
            };

            let case = normalize(record);
            let name = match case.full_name() {
                name if name.is_empty() => format!("Case #{}", case_id),
                name => name,
            };
            let program = case.get(Field::Program).to_string();
            let program_type = (!program.is_empty()).then(|| program.clone());

            let mut candidates = Vec::new();

            if self.state.processed_case_ids.insert(case_id) {
                processed_changed = true;
                candidates.push((
                    format!("new-case-{}", case_id),
                    NotificationType::New,
                    "New Case Added".to_string(),
                    match program.as_str() {
                        "" => format!("{} has been added", name),
                        program => format!("{} has been added to {}", name, program),
                    },
                ));
            }

            let status = record.status();
            if classify_value(status) == StatusBucket::Active {
                candidates.push((
                    format!("admission-{}", case_id),
                    NotificationType::Admission,
                    "New Admission".to_string(),
                    match program.as_str() {
                        "" => format!("{} is an active case", name),
                        program => format!("{} is an active case in {}", name, program),
                    },
                ));
            }

            if is_discharged_equivalent(status) {
                candidates.push((
                    format!("archived-{}", case_id),
                    NotificationType::Archived,
                    "Case Discharged".to_string(),
                    format!("{} has been discharged", name),
                ));
            }

            if let Some(last_updated) = record.last_updated() {
                let idle = now.signed_duration_since(last_updated);
                if idle >= Duration::days(FOLLOWUP_AFTER_DAYS) {
                    candidates.push((
                        format!("followup-{}", case_id),
                        NotificationType::Reminder,
                        "Follow-up Needed".to_string(),
                        format!(
                            "{} has not been updated in {} days",
                            name,
                            idle.num_days()
                        ),
                    ));
                }
            }

            for (id, kind, title, message) in candidates {
                if self.is_dismissed(&id) || self.contains(&id) || added.iter().any(|n| n.id == id)
                {
                    continue;
                }
                tracing::debug!("New notification {}", id);
                added.push(Notification {
                    id,
                    title,
                    message,
                    timestamp: now,
                    kind,
                    read: false,
                    case_id: Some(case_id),
                    program_type: program_type.clone(),
                });
            }
        }

        if added.is_empty() && !processed_changed {
            return Ok(added);
        }

        if !added.is_empty() {
            tracing::info!("Derived {} new notifications", added.len());
            self.prepend(added.clone());
        }
        self.persist()?;
        Ok(added)
    }

    /// Returns whether a notification with `id` existed.
    pub fn mark_read(&mut self, id: &str) -> Result<bool> {
        let Some(notification) = self.state.notifications.iter_mut().find(|n| n.id == id) else {
            return Ok(false);
        };
        if !notification.read {
            notification.read = true;
            self.persist()?;
        }
        Ok(true)
    }

    pub fn mark_all_read(&mut self) -> Result<()> {
        for notification in &mut self.state.notifications {
            notification.read = true;
        }
        self.persist()
    }

    /// Remove a notification and make sure it is never derived again.
    pub fn dismiss(&mut self, id: &str) -> Result<bool> {
        let before = self.state.notifications.len();
        self.state.notifications.retain(|n| n.id != id);
        let removed = self.state.notifications.len() != before;

        self.state.dismissed.insert(id.to_string());
        tracing::info!("Dismissed notification {}", id);
        self.persist()?;
        Ok(removed)
    }

    /// Dismiss every listed notification.
    pub fn clear_all(&mut self) -> Result<()> {
        let ids: Vec<String> = self
            .state
            .notifications
            .drain(..)
            .map(|notification| notification.id)
            .collect();
        tracing::info!("Clearing {} notifications", ids.len());
        self.state.dismissed.extend(ids);
        self.persist()
    }

    /// Add an ad hoc notification with a random id.
    pub fn push_custom(
        &mut self,
        title: &str,
        message: &str,
        kind: NotificationType,
        case_id: Option<i64>,
        program_type: Option<String>,
    ) -> Result<Notification> {
        let notification = Notification {
            id: Uuid::new_v4().to_string(),
            title: title.to_string(),
            message: message.to_string(),
            timestamp: Utc::now(),
            kind,
            read: false,
            case_id,
            program_type,
        };
        self.prepend(vec![notification.clone()]);
        self.persist()?;
        Ok(notification)
    }

    fn contains(&self, id: &str) -> bool {
        self.state.notifications.iter().any(|n| n.id == id)
    }

    /// Put `fresh` in front and keep only the newest entries.
    fn prepend(&mut self, mut fresh: Vec<Notification>) {
        fresh.append(&mut self.state.notifications);
        if fresh.len() > MAX_NOTIFICATIONS {
            tracing::debug!(
                "Dropping {} oldest notifications",
                fresh.len() - MAX_NOTIFICATIONS
            );
            fresh.truncate(MAX_NOTIFICATIONS);
        }
        self.state.notifications = fresh;
    }

    fn persist(&self) -> Result<()> {
        self.store.save(&self.state).map_err(|e| {
            tracing::error!("Failed to persist notifications: {}", e);
            e
        })
    }
}
