//! Cases service
//!
//! Holds the current case list and performs status transitions through the
//! case API. Local state only changes after the server accepted a change.

use chrono::Utc;
use serde_json::Value;

use super::api::CaseApi;
use crate::error::{AppError, Result};
use crate::models::CaseRecord;
use crate::status::{classify_value, StatusBucket, AFTER_CARE_STATUS};

pub struct CaseService {
    api: CaseApi,
    cases: Vec<CaseRecord>,
}

impl CaseService {
    pub fn new(api: CaseApi) -> Self {
        Self {
            api,
            cases: Vec::new(),
        }
    }

    pub fn with_cases(api: CaseApi, cases: Vec<CaseRecord>) -> Self {
        Self { api, cases }
    }

    pub fn api(&self) -> &CaseApi {
        &self.api
    }

    pub fn cases(&self) -> &[CaseRecord] {
        &self.cases
    }

    pub fn find(&self, id: i64) -> Option<&CaseRecord> {
        self.cases.iter().find(|case| case.id() == Some(id))
    }

    /// Replace the local list with `/cases/all`. On failure the current list
    /// is kept.
    pub async fn refresh(&mut self) -> Result<usize> {
        let cases = self.api.list_cases().await?;
        tracing::info!("Loaded {} cases", cases.len());
        self.cases = cases;
        Ok(self.cases.len())
    }

    /// Cases whose status falls in `bucket`.
    pub fn by_bucket(&self, bucket: StatusBucket) -> Vec<&CaseRecord> {
        self.cases
            .iter()
            .filter(|case| classify_value(case.status()) == bucket)
            .collect()
    }

    /// Move a case to after-care with a single PUT.
    pub async fn move_to_after_care(&mut self, id: i64) -> Result<&CaseRecord> {
        let index = self
            .cases
            .iter()
            .position(|case| case.id() == Some(id))
            .ok_or(AppError::CaseNotFound(id))?;

        let mut updated = self.cases[index].clone();
        updated.set("status", Value::String(AFTER_CARE_STATUS.to_string()));
        updated.touch(Utc::now());

        let payload = updated.clone().into_value();
        let echoed = match self.api.update_case(id, &payload).await {
            Ok(echoed) => echoed,
            Err(e) => {
                tracing::error!("Failed to move case {} to after-care: {}", id, e);
                return Err(e);
            }
        };

        tracing::info!("Case {} moved to after-care", id);
        self.cases[index] = echoed.unwrap_or(updated);
        Ok(&self.cases[index])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::settings::ApiSettings;
    use serde_json::json;

    fn unreachable_api() -> CaseApi {
        CaseApi::new(&ApiSettings {
            base_url: "http://127.0.0.1:9/api".to_string(),
            token: None,
            timeout_secs: 2,
        })
        .unwrap()
    }

    fn sample_cases() -> Vec<CaseRecord> {
        vec![
            CaseRecord::from(json!({"id": 1, "status": "active"})),
            CaseRecord::from(json!({"id": 2, "status": "Archived"})),
            CaseRecord::from(json!({"id": 3, "status": "aftercare"})),
            CaseRecord::from(json!({"id": 4})),
        ]
    }

    #[test]
    fn test_by_bucket() {
        let service = CaseService::with_cases(unreachable_api(), sample_cases());
        let ids = |bucket| {
            service
                .by_bucket(bucket)
                .iter()
                .filter_map(|case| case.id())
                .collect::<Vec<_>>()
        };
        assert_eq!(ids(StatusBucket::Active), vec![1, 4]);
        assert_eq!(ids(StatusBucket::Archived), vec![2]);
        assert_eq!(ids(StatusBucket::AfterCare), vec![3]);
    }

    #[tokio::test]
    async fn test_failed_transition_leaves_state_unchanged() {
        let mut service = CaseService::with_cases(unreachable_api(), sample_cases());
        let before = service.cases().to_vec();

        assert!(service.move_to_after_care(1).await.is_err());
        assert_eq!(service.cases(), before.as_slice());
    }

    #[tokio::test]
    async fn test_unknown_case_is_not_found() {
        let mut service = CaseService::with_cases(unreachable_api(), sample_cases());
        assert!(matches!(
            service.move_to_after_care(99).await,
            Err(AppError::CaseNotFound(99))
        ));
    }

    #[tokio::test]
    async fn test_failed_refresh_keeps_cases() {
        let mut service = CaseService::with_cases(unreachable_api(), sample_cases());
        assert!(service.refresh().await.is_err());
        assert_eq!(service.cases().len(), 4);
    }
}
