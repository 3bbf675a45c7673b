//! Application constants

/// GCS bucket that receives uploaded images
pub const BUCKET_NAME: &str = "roomatch-prod-static-site";

/// Base address of publicly readable GCS objects
pub const GCS_PUBLIC_BASE_URL: &str = "https://storage.googleapis.com";

/// Base path under which the local backend serves stored objects
pub const LOCAL_MEDIA_PREFIX: &str = "/media";

/// Maximum accepted image size (5 MB)
pub const MAX_IMAGE_UPLOAD_SIZE: usize = 5 * 1024 * 1024;

/// Room for multipart boundaries and the text fields on top of the image itself
pub const MULTIPART_OVERHEAD: usize = 64 * 1024;

/// Default listening port
pub const DEFAULT_PORT: u16 = 8080;

/// Default directory for the static site
pub const DEFAULT_STATIC_DIR: &str = "html";

/// Upload endpoint path
pub const UPLOAD_ROUTE: &str = "/api/upload-to-gcp";
