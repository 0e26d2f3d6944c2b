//! Shared test helpers for creating DownloadManager instances in tests.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Semaphore;

use crate::config::Config;
use crate::fetch::{BatchFetch, BatchItem, FetchError, FetchRoutine};
use crate::manager::DownloadManager;
use crate::types::{DownloadedFile, FetchedItem, SourceDescriptor, SourceKind};

/// What a scripted fetcher does for single-fetch sources
#[derive(Clone)]
pub(crate) enum SingleScript {
    /// Return this file
    Ok(DownloadedFile),
    /// Fail fatally with this error text
    Err(String),
    /// Panic inside the worker task
    Panic(String),
}

/// One scripted batch item outcome
#[derive(Clone)]
pub(crate) enum ScriptedItem {
    Ok { title: &'static str },
    Err { error: &'static str, title: &'static str },
}

/// Scripted batch shape
#[derive(Clone)]
pub(crate) struct BatchScript {
    pub(crate) total: u32,
    pub(crate) estimated_size_bytes: Option<u64>,
    pub(crate) items: Vec<ScriptedItem>,
}

/// Fetch routine driven entirely by a per-test script
///
/// An optional gate (a zero-permit semaphore) holds every fetch until the
/// test releases permits, which is how "submit never waits for completion"
/// is observed.
pub(crate) struct ScriptedFetcher {
    pub(crate) single: SingleScript,
    pub(crate) batch: Option<BatchScript>,
    pub(crate) gate: Option<Arc<Semaphore>>,
}

impl ScriptedFetcher {
    pub(crate) fn single_ok(file: DownloadedFile) -> Self {
        Self {
            single: SingleScript::Ok(file),
            batch: None,
            gate: None,
        }
    }

    pub(crate) fn single_err(error: &str) -> Self {
        Self {
            single: SingleScript::Err(error.to_string()),
            batch: None,
            gate: None,
        }
    }

    pub(crate) fn panicking(message: &str) -> Self {
        Self {
            single: SingleScript::Panic(message.to_string()),
            batch: None,
            gate: None,
        }
    }

    pub(crate) fn batch(script: BatchScript) -> Self {
        Self {
            single: SingleScript::Err("single fetch not scripted".into()),
            batch: Some(script),
            gate: None,
        }
    }

    pub(crate) fn gated(mut self, gate: Arc<Semaphore>) -> Self {
        self.gate = Some(gate);
        self
    }

    async fn wait_for_gate(&self) {
        if let Some(gate) = &self.gate {
            let permit = gate.acquire().await.expect("test gate closed");
            permit.forget();
        }
    }
}

#[async_trait]
impl FetchRoutine for ScriptedFetcher {
    async fn fetch_single(
        &self,
        _source: &SourceDescriptor,
    ) -> Result<DownloadedFile, FetchError> {
        self.wait_for_gate().await;
        match &self.single {
            SingleScript::Ok(file) => Ok(file.clone()),
            SingleScript::Err(error) => Err(FetchError::new(error.clone())),
            SingleScript::Panic(message) => panic!("{}", message),
        }
    }

    async fn fetch_batch(&self, _source: &SourceDescriptor) -> Result<BatchFetch, FetchError> {
        self.wait_for_gate().await;
        let script = self
            .batch
            .clone()
            .ok_or_else(|| FetchError::new("batch fetch not scripted"))?;

        let items = script.items.into_iter().map(|item| match item {
            ScriptedItem::Ok { title } => BatchItem::Fetched {
                item: FetchedItem {
                    title: Some(title.to_string()),
                    url: None,
                    file: None,
                },
            },
            ScriptedItem::Err { error, title } => BatchItem::Failed {
                error: error.to_string(),
                title: Some(title.to_string()),
                url: None,
            },
        });

        Ok(BatchFetch {
            total: script.total,
            estimated_size_bytes: script.estimated_size_bytes,
            items: Box::pin(futures::stream::iter(items.collect::<Vec<_>>())),
        })
    }
}

/// A manager with default config and the given fetcher
pub(crate) fn manager_with(fetcher: ScriptedFetcher) -> DownloadManager {
    manager_with_config(Config::default(), fetcher)
}

pub(crate) fn manager_with_config(config: Config, fetcher: ScriptedFetcher) -> DownloadManager {
    DownloadManager::new(config, Arc::new(fetcher)).expect("test config must be valid")
}

pub(crate) fn sample_file() -> DownloadedFile {
    DownloadedFile {
        name: "track.mp3".into(),
        path: "/library/folder-music/track.mp3".into(),
        size_bytes: Some(4_194_304),
        mime_type: Some("audio/mpeg".into()),
    }
}

pub(crate) fn single_source() -> SourceDescriptor {
    SourceDescriptor {
        url: "https://host/track.mp3".into(),
        display_name: "Tavern ambience".into(),
        destination_folder_id: "folder-music".into(),
        kind: SourceKind::Single,
    }
}

pub(crate) fn playlist_source() -> SourceDescriptor {
    SourceDescriptor {
        url: "https://video/playlist?list=X".into(),
        display_name: "Session playlist".into(),
        destination_folder_id: "folder-music".into(),
        kind: SourceKind::Playlist,
    }
}
