//! Object storage backends for uploaded images.
//!
//! Production writes go to GCS. Setting `LOCAL_STORAGE_PATH` swaps in a
//! directory on disk so the relay can run without cloud credentials.

use std::path::{Component, Path, PathBuf};

use async_trait::async_trait;
use bytes::Bytes;
use google_cloud_storage::client::{Storage, StorageControl};
use google_cloud_storage::model::{Object, ObjectAccessControl};
use google_cloud_wkt::FieldMask;

const PUBLIC_ENTITY: &str = "allUsers";
const PUBLIC_ROLE: &str = "READER";

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("{0}")]
    Write(String),

    #[error("{0}")]
    Visibility(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// A key-addressed blob store with per-object public visibility.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Write `data` under `key`, replacing anything already stored there.
    async fn write(&self, key: &str, content_type: &str, data: Bytes) -> Result<(), StoreError>;

    /// Make a previously written object readable by anyone.
    async fn make_public(&self, key: &str) -> Result<(), StoreError>;

    /// Address at which a public object can be fetched.
    fn public_url(&self, key: &str) -> String;

    /// Short human-readable backend description for startup logs.
    fn describe(&self) -> String;
}

/// Public objects live at `<base>/<bucket>/<key>`. The key is not URL-encoded.
pub fn gcs_public_url(base_url: &str, bucket_name: &str, key: &str) -> String {
    format!("{base_url}/{bucket_name}/{key}")
}

/// Existing ACL plus an `allUsers: READER` grant, unless one is already there.
pub fn with_public_read(mut acl: Vec<ObjectAccessControl>) -> Vec<ObjectAccessControl> {
    let already_public = acl
        .iter()
        .any(|rule| rule.entity == PUBLIC_ENTITY && rule.role == PUBLIC_ROLE);
    if !already_public {
        acl.push(
            ObjectAccessControl::new()
                .set_entity(PUBLIC_ENTITY)
                .set_role(PUBLIC_ROLE),
        );
    }
    acl
}

pub struct GcsStore {
    gcs: Storage,
    control: StorageControl,
    bucket_name: String,
    public_base_url: String,
}

impl GcsStore {
    /// Both clients resolve credentials the same way (`GOOGLE_APPLICATION_CREDENTIALS`
    /// or the metadata server on Cloud Run).
    pub async fn connect(bucket_name: &str, public_base_url: &str) -> anyhow::Result<Self> {
        let gcs = Storage::builder().build().await?;
        let control = StorageControl::builder().build().await?;
        Ok(Self {
            gcs,
            control,
            bucket_name: bucket_name.to_string(),
            public_base_url: public_base_url.to_string(),
        })
    }

    fn bucket_path(&self) -> String {
        format!("projects/_/buckets/{}", self.bucket_name)
    }
}

#[async_trait]
impl ObjectStore for GcsStore {
    async fn write(&self, key: &str, content_type: &str, data: Bytes) -> Result<(), StoreError> {
        // Payloads are capped well below the resumable threshold, so this is a single-shot upload.
        self.gcs
            .write_object(self.bucket_path(), key, data)
            .set_content_type(content_type)
            .send_unbuffered()
            .await
            .map_err(|e| StoreError::Write(e.to_string()))?;
        Ok(())
    }

    async fn make_public(&self, key: &str) -> Result<(), StoreError> {
        // An `acl` update replaces the whole list, so extend what is already there.
        let current = self
            .control
            .get_object()
            .set_bucket(self.bucket_path())
            .set_object(key)
            .send()
            .await
            .map_err(|e| StoreError::Visibility(e.to_string()))?;

        let object = Object::new()
            .set_bucket(self.bucket_path())
            .set_name(key)
            .set_acl(with_public_read(current.acl));
        self.control
            .update_object()
            .set_object(object)
            .set_update_mask(FieldMask::default().set_paths(["acl"]))
            .send()
            .await
            .map_err(|e| StoreError::Visibility(e.to_string()))?;
        Ok(())
    }

    fn public_url(&self, key: &str) -> String {
        gcs_public_url(&self.public_base_url, &self.bucket_name, key)
    }

    fn describe(&self) -> String {
        format!("gcs bucket {}", self.bucket_name)
    }
}

pub struct LocalStore {
    root: PathBuf,
    public_base_url: String,
}

impl LocalStore {
    pub fn new(root: impl Into<PathBuf>, public_base_url: &str) -> Self {
        Self {
            root: root.into(),
            public_base_url: public_base_url.to_string(),
        }
    }

    /// Keys are used verbatim, but on disk they must stay inside the root.
    fn object_path(&self, key: &str) -> Result<PathBuf, StoreError> {
        let relative = Path::new(key);
        let escapes = key.contains('\0')
            || relative
                .components()
                .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir));
        if key.is_empty() || escapes {
            return Err(StoreError::Write(format!("Invalid object key: {key}")));
        }
        Ok(self.root.join(relative))
    }
}

#[async_trait]
impl ObjectStore for LocalStore {
    async fn write(&self, key: &str, _content_type: &str, data: Bytes) -> Result<(), StoreError> {
        let full_path = self.object_path(key)?;
        if let Some(parent) = full_path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&full_path, &data).await?;
        Ok(())
    }

    async fn make_public(&self, key: &str) -> Result<(), StoreError> {
        let full_path = self.object_path(key)?;
        if !tokio::fs::try_exists(&full_path).await? {
            return Err(StoreError::Visibility(format!("No such object: {key}")));
        }
        Ok(())
    }

    fn public_url(&self, key: &str) -> String {
        format!("{}/{}", self.public_base_url, key)
    }

    fn describe(&self) -> String {
        format!("local directory {:?}", self.root)
    }
}
