//! Remote raster byte access (file, http(s), S3-compatible).

use bytes::Bytes;
use object_store::{aws::AmazonS3Builder, http::HttpBuilder, path::Path, ClientOptions, ObjectStore};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use stac_common::{CatalogError, CatalogResult};

/// Configuration for S3-compatible object storage (MinIO or AWS).
///
/// When absent, `s3://` URIs fall back to the standard AWS environment
/// variables.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct S3Config {
    /// S3/MinIO endpoint URL
    pub endpoint: String,
    /// Access key ID
    pub access_key_id: String,
    /// Secret access key
    pub secret_access_key: String,
    /// AWS region (use "us-east-1" for MinIO)
    pub region: String,
    /// Allow HTTP (for local MinIO)
    pub allow_http: bool,
}

impl Default for S3Config {
    fn default() -> Self {
        Self {
            endpoint: "http://minio:9000".to_string(),
            access_key_id: "minioadmin".to_string(),
            secret_access_key: "minioadmin".to_string(),
            region: "us-east-1".to_string(),
            allow_http: true,
        }
    }
}

/// URI schemes the raster source can resolve.
#[derive(Debug, Clone, PartialEq, Eq)]
enum UriScheme {
    File,
    Http,
    S3,
}

/// Check that a URI uses a supported scheme, without touching the bytes.
///
/// Used by publish validation so that unsupported URIs are rejected
/// synchronously, before any asynchronous work starts.
pub fn validate_scheme(uri: &str) -> CatalogResult<()> {
    split_uri(uri).map(|_| ())
}

fn split_uri(uri: &str) -> CatalogResult<(UriScheme, &str)> {
    let Some((scheme, rest)) = uri.split_once("://") else {
        return Err(CatalogError::UnsupportedScheme(format!(
            "{} (expected file://, http(s)://, or s3://)",
            uri
        )));
    };

    let scheme = match scheme {
        "file" => UriScheme::File,
        "http" | "https" => UriScheme::Http,
        "s3" => UriScheme::S3,
        other => {
            return Err(CatalogError::UnsupportedScheme(other.to_string()));
        }
    };

    if rest.is_empty() {
        return Err(CatalogError::UnsupportedScheme(format!(
            "{} (empty remainder)",
            uri
        )));
    }

    Ok((scheme, rest))
}

/// Resolves raster URIs to their raw bytes.
pub struct RasterSource {
    s3: Option<S3Config>,
}

impl RasterSource {
    /// Create a source with explicit S3 configuration.
    pub fn new(s3: Option<S3Config>) -> Self {
        Self { s3 }
    }

    /// Fetch the complete raster payload behind a URI.
    #[instrument(skip(self), fields(uri = %uri))]
    pub async fn fetch(&self, uri: &str) -> CatalogResult<Bytes> {
        let (scheme, rest) = split_uri(uri)?;

        let bytes = match scheme {
            UriScheme::File => {
                let data = tokio::fs::read(rest).await.map_err(|e| {
                    CatalogError::StorageError(format!("failed to read {}: {}", uri, e))
                })?;
                Bytes::from(data)
            }
            UriScheme::Http => self.fetch_http(uri, rest).await?,
            UriScheme::S3 => self.fetch_s3(rest).await?,
        };

        debug!(size = bytes.len(), "Fetched raster payload");
        Ok(bytes)
    }

    async fn fetch_http(&self, uri: &str, rest: &str) -> CatalogResult<Bytes> {
        let scheme = if uri.starts_with("https") { "https" } else { "http" };
        let (host, path) = rest
            .split_once('/')
            .ok_or_else(|| CatalogError::UnsupportedScheme(format!("{} (no object path)", uri)))?;

        let store = HttpBuilder::new()
            .with_url(format!("{}://{}", scheme, host))
            .with_client_options(ClientOptions::new().with_allow_http(true))
            .build()
            .map_err(|e| CatalogError::StorageError(format!("HTTP client: {}", e)))?;

        read_object(&store, path, uri).await
    }

    async fn fetch_s3(&self, rest: &str) -> CatalogResult<Bytes> {
        let (bucket, path) = rest.split_once('/').ok_or_else(|| {
            CatalogError::UnsupportedScheme(format!("s3://{} (no object key)", rest))
        })?;

        let mut builder = match &self.s3 {
            Some(config) => {
                let mut b = AmazonS3Builder::new()
                    .with_endpoint(&config.endpoint)
                    .with_access_key_id(&config.access_key_id)
                    .with_secret_access_key(&config.secret_access_key)
                    .with_region(&config.region);
                if config.allow_http {
                    b = b.with_allow_http(true);
                }
                b
            }
            None => AmazonS3Builder::from_env(),
        };
        builder = builder.with_bucket_name(bucket);

        let store = builder
            .build()
            .map_err(|e| CatalogError::StorageError(format!("S3 client: {}", e)))?;

        read_object(&store, path, &format!("s3://{}", rest)).await
    }
}

async fn read_object(store: &dyn ObjectStore, path: &str, uri: &str) -> CatalogResult<Bytes> {
    let location = Path::from(path);

    let result = store
        .get(&location)
        .await
        .map_err(|e| CatalogError::StorageError(format!("failed to read {}: {}", uri, e)))?;

    result
        .bytes()
        .await
        .map_err(|e| CatalogError::StorageError(format!("failed to read bytes: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scheme_validation() {
        assert!(validate_scheme("file:///data/scene.tif").is_ok());
        assert!(validate_scheme("http://host/scene.tif").is_ok());
        assert!(validate_scheme("https://host/scene.tif").is_ok());
        assert!(validate_scheme("s3://bucket/scene.tif").is_ok());

        assert!(matches!(
            validate_scheme("ftp://host/scene.tif"),
            Err(CatalogError::UnsupportedScheme(_))
        ));
        assert!(matches!(
            validate_scheme("/bare/path.tif"),
            Err(CatalogError::UnsupportedScheme(_))
        ));
        assert!(matches!(
            validate_scheme("s3://"),
            Err(CatalogError::UnsupportedScheme(_))
        ));
    }

    #[tokio::test]
    async fn test_fetch_local_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("blob.bin");
        std::fs::write(&path, b"raster bytes").unwrap();

        let source = RasterSource::new(None);
        let uri = format!("file://{}", path.display());
        let bytes = source.fetch(&uri).await.unwrap();
        assert_eq!(&bytes[..], b"raster bytes");
    }

    #[tokio::test]
    async fn test_fetch_missing_file_is_storage_error() {
        let source = RasterSource::new(None);
        let err = source.fetch("file:///nonexistent/raster.tif").await;
        assert!(matches!(err, Err(CatalogError::StorageError(_))));
    }
}
