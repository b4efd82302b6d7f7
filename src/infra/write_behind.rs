use std::sync::Arc;

use tokio::sync::mpsc;

use crate::application::use_cases::audit::ApiLogRepo;
use crate::application::use_cases::auth::{ApiKeyRepo, OAuthTokenRepo};
use crate::domain::entities::api_log::ApiLogEntry;

/// Best-effort side effects taken off the response path: credential
/// last-used refreshes and audit log appends.
#[derive(Debug)]
pub enum WriteJob {
    ApiKeyUsed(uuid::Uuid),
    OauthTokenUsed(uuid::Uuid),
    Audit(ApiLogEntry),
}

/// Bounded background writer. `submit` never blocks and never fails the
/// caller: a full queue drops the job with a warning, and per-job store
/// failures are swallowed after logging. A slow sink can therefore never
/// delay or fail a response.
#[derive(Clone)]
pub struct WriteBehind {
    tx: mpsc::Sender<WriteJob>,
}

impl WriteBehind {
    pub fn spawn(
        api_keys: Arc<dyn ApiKeyRepo>,
        oauth_tokens: Arc<dyn OAuthTokenRepo>,
        logs: Arc<dyn ApiLogRepo>,
        capacity: usize,
    ) -> Self {
        let (tx, mut rx) = mpsc::channel(capacity);

        tokio::spawn(async move {
            while let Some(job) = rx.recv().await {
                run_job(&api_keys, &oauth_tokens, &logs, job).await;
            }
        });

        Self { tx }
    }

    pub fn submit(&self, job: WriteJob) {
        if let Err(e) = self.tx.try_send(job) {
            tracing::warn!(error = %e, "Write-behind queue full, dropping job");
        }
    }
}

async fn run_job(
    api_keys: &Arc<dyn ApiKeyRepo>,
    oauth_tokens: &Arc<dyn OAuthTokenRepo>,
    logs: &Arc<dyn ApiLogRepo>,
    job: WriteJob,
) {
    match job {
        WriteJob::ApiKeyUsed(key_id) => {
            if let Err(e) = api_keys.update_last_used(key_id).await {
                tracing::warn!(key_id = %key_id, error = %e, "Failed to refresh API key last_used_at");
            }
        }
        WriteJob::OauthTokenUsed(token_id) => {
            if let Err(e) = oauth_tokens.update_last_used(token_id).await {
                tracing::warn!(token_id = %token_id, error = %e, "Failed to refresh OAuth token last_used_at");
            }
        }
        WriteJob::Audit(entry) => {
            if let Err(e) = logs.insert(&entry).await {
                tracing::warn!(company_id = %entry.company_id, error = %e, "Failed to append audit log entry");
            }
        }
    }
}
