//! File-based onboarding dismissal repository
//!
//! This module provides a file-based implementation of the
//! `OnboardingStatePort`, persisting per-account onboarding dismissals to a
//! local JSON file in the application data directory.

use std::collections::HashMap;
use std::path::PathBuf;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::fs;
use tokio::io::AsyncWriteExt;

use sw_core::ids::AccountId;
use sw_core::ports::OnboardingStatePort;

pub const DEFAULT_ONBOARDING_STATE_FILE: &str = ".onboarding_dismissals";

#[derive(Debug, Default, Clone, Serialize, Deserialize)]
struct DismissalRecord {
    /// Account id -> time the account dismissed onboarding.
    dismissed: HashMap<String, DateTime<Utc>>,
}

pub struct FileOnboardingStateRepository {
    state_file_path: PathBuf,
}

impl FileOnboardingStateRepository {
    /// Create repository with custom file path
    pub fn new(state_file_path: PathBuf) -> Self {
        Self { state_file_path }
    }

    /// Create repository with defaults
    pub fn with_defaults(base_dir: PathBuf) -> Self {
        Self {
            state_file_path: base_dir.join(DEFAULT_ONBOARDING_STATE_FILE),
        }
    }

    async fn ensure_parent_dir(&self) -> anyhow::Result<()> {
        if let Some(parent) = self.state_file_path.parent() {
            fs::create_dir_all(parent).await?;
        }
        Ok(())
    }

    async fn load(&self) -> anyhow::Result<DismissalRecord> {
        if !self.state_file_path.exists() {
            return Ok(DismissalRecord::default());
        }

        let content = fs::read_to_string(&self.state_file_path).await?;
        if content.trim().is_empty() {
            return Ok(DismissalRecord::default());
        }

        let record: DismissalRecord = serde_json::from_str(&content)
            .map_err(|e| anyhow::anyhow!("Failed to parse onboarding state: {e}"))?;
        Ok(record)
    }

    async fn store(&self, record: &DismissalRecord) -> anyhow::Result<()> {
        self.ensure_parent_dir().await?;

        let json = serde_json::to_string_pretty(record)
            .map_err(|e| anyhow::anyhow!("Failed to serialize onboarding state: {e}"))?;

        let mut file = fs::File::create(&self.state_file_path)
            .await
            .map_err(|e| anyhow::anyhow!("Failed to create onboarding state file: {e}"))?;
        file.write_all(json.as_bytes())
            .await
            .map_err(|e| anyhow::anyhow!("Failed to write onboarding state file: {e}"))?;
        Ok(())
    }
}

#[async_trait]
impl OnboardingStatePort for FileOnboardingStateRepository {
    async fn is_dismissed(&self, account_id: &AccountId) -> anyhow::Result<bool> {
        let record = self.load().await?;
        Ok(record.dismissed.contains_key(account_id.as_str()))
    }

    async fn set_dismissed(&self, account_id: &AccountId) -> anyhow::Result<()> {
        let mut record = self.load().await?;
        record
            .dismissed
            .insert(account_id.as_str().to_string(), Utc::now());
        self.store(&record).await
    }

    async fn reset(&self) -> anyhow::Result<()> {
        self.store(&DismissalRecord::default()).await
    }
}
