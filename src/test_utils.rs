//! In-memory store and app builders shared by handler tests.

use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum_test::TestServer;
use bytes::Bytes;

use crate::AppState;
use crate::routes;
use crate::storage::{ObjectStore, StoreError, gcs_public_url};

pub const TEST_BUCKET: &str = "test-bucket";

/// Records every write and visibility change; can be told to fail either step.
#[derive(Default)]
pub struct RecordingStore {
    objects: Mutex<HashMap<String, (String, Bytes)>>,
    public: Mutex<HashSet<String>>,
    fail_write: Option<String>,
    fail_publish: bool,
    panic_on_write: bool,
}

impl RecordingStore {
    pub fn failing_writes(message: &str) -> Self {
        Self {
            fail_write: Some(message.to_string()),
            ..Default::default()
        }
    }

    pub fn failing_publish() -> Self {
        Self {
            fail_publish: true,
            ..Default::default()
        }
    }

    pub fn panicking() -> Self {
        Self {
            panic_on_write: true,
            ..Default::default()
        }
    }

    pub fn object(&self, key: &str) -> Option<(String, Bytes)> {
        self.objects.lock().unwrap().get(key).cloned()
    }

    pub fn object_count(&self) -> usize {
        self.objects.lock().unwrap().len()
    }

    pub fn is_public(&self, key: &str) -> bool {
        self.public.lock().unwrap().contains(key)
    }
}

#[async_trait]
impl ObjectStore for RecordingStore {
    async fn write(&self, key: &str, content_type: &str, data: Bytes) -> Result<(), StoreError> {
        if self.panic_on_write {
            panic!("store exploded");
        }
        if let Some(message) = &self.fail_write {
            return Err(StoreError::Write(message.clone()));
        }
        self.objects
            .lock()
            .unwrap()
            .insert(key.to_string(), (content_type.to_string(), data));
        Ok(())
    }

    async fn make_public(&self, key: &str) -> Result<(), StoreError> {
        if self.fail_publish {
            return Err(StoreError::Visibility("permission denied".to_string()));
        }
        self.public.lock().unwrap().insert(key.to_string());
        Ok(())
    }

    fn public_url(&self, key: &str) -> String {
        gcs_public_url("https://storage.googleapis.com", TEST_BUCKET, key)
    }

    fn describe(&self) -> String {
        "recording store".to_string()
    }
}

pub fn create_test_app(store: Arc<dyn ObjectStore>, static_dir: &Path) -> TestServer {
    let state = Arc::new(AppState { store });
    let app = routes::build_app(state, static_dir, None);
    TestServer::new(app).unwrap()
}
