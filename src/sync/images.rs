//! Background picture downloads for synced destinations.
//!
//! Each download runs as its own task and commits its bytes on its own,
//! independently of the reconciliation transaction. Failures are dropped.

use tokio::task::JoinHandle;

use super::client::ApiClient;
use crate::db::DestinationRepository;

/// Handles to in-flight picture downloads.
#[derive(Debug, Default)]
pub struct ImageDownloads {
    handles: Vec<JoinHandle<bool>>,
}

impl ImageDownloads {
    /// Starts one download per `(destination id, picture url)` pair, all at once.
    /// Blank URLs are skipped.
    pub fn spawn<I>(client: &ApiClient, repo: &DestinationRepository, targets: I) -> Self
    where
        I: IntoIterator<Item = (i64, String)>,
    {
        let handles = targets
            .into_iter()
            .filter(|(_, url)| !url.trim().is_empty())
            .map(|(id, url)| {
                let client = client.clone();
                let repo = repo.clone();
                tokio::spawn(async move { fetch_and_store(&client, &repo, id, &url).await })
            })
            .collect();

        Self { handles }
    }

    pub fn len(&self) -> usize {
        self.handles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }

    /// Waits for every download and returns how many pictures were stored.
    pub async fn wait(self) -> usize {
        futures::future::join_all(self.handles)
            .await
            .into_iter()
            .filter(|stored| matches!(stored, Ok(true)))
            .count()
    }
}

async fn fetch_and_store(
    client: &ApiClient,
    repo: &DestinationRepository,
    id: i64,
    url: &str,
) -> bool {
    let bytes = match client.download(url).await {
        Ok(bytes) => bytes,
        Err(e) => {
            tracing::debug!("Picture for destination {} not downloaded: {}", id, e);
            return false;
        }
    };

    match repo.set_picture(id, &bytes).await {
        Ok(stored) => stored,
        Err(e) => {
            tracing::debug!("Picture for destination {} not saved: {}", id, e);
            false
        }
    }
}
