// ============================================================
// Layer 6 — Object Storage Clients
// ============================================================
// Two ObjectStore implementations:
//
//   GcsBucket   - Google Cloud Storage JSON API, single-request
//                 media upload:
//                   POST {endpoint}/upload/storage/v1/b/{bucket}/o
//                        ?uploadType=media&name={object}
//                 An already-issued OAuth bearer token may be
//                 attached; obtaining one is the caller's job.
//
//   LocalBucket - a directory standing in for a bucket:
//                   {root}/{bucket}/{object}
//                 Used for offline runs and tests.
//
// A client is built once by the caller and passed down; there is
// no global client. Uploads are single attempts without retries.

use anyhow::{Context, Result};
use std::{fs, path::{Path, PathBuf}};

use crate::domain::traits::ObjectStore;

pub const GCS_ENDPOINT: &str = "https://storage.googleapis.com";

pub struct GcsBucket {
    bucket:       String,
    endpoint:     String,
    bearer_token: Option<String>,
    client:       reqwest::blocking::Client,
}

impl GcsBucket {
    pub fn new(bucket: impl Into<String>) -> Self {
        Self {
            bucket:       bucket.into(),
            endpoint:     GCS_ENDPOINT.to_string(),
            bearer_token: None,
            client:       reqwest::blocking::Client::new(),
        }
    }

    pub fn with_bearer_token(mut self, token: Option<String>) -> Self {
        self.bearer_token = token;
        self
    }

    /// Use a preconfigured HTTP client (timeouts, proxies)
    pub fn with_client(mut self, client: reqwest::blocking::Client) -> Self {
        self.client = client;
        self
    }

    /// Point at a different API host (emulators, proxies)
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into().trim_end_matches('/').to_string();
        self
    }

    fn upload_url(&self) -> String {
        format!("{}/upload/storage/v1/b/{}/o", self.endpoint, self.bucket)
    }
}

impl ObjectStore for GcsBucket {
    fn bucket(&self) -> &str {
        &self.bucket
    }

    fn upload_file(&self, local: &Path, object: &str) -> Result<String> {
        let body = fs::read(local)
            .with_context(|| format!("Cannot read '{}' for upload", local.display()))?;

        let mut request = self
            .client
            .post(self.upload_url())
            .query(&[("uploadType", "media"), ("name", object)])
            .header(reqwest::header::CONTENT_TYPE, "application/octet-stream")
            .body(body);
        if let Some(token) = &self.bearer_token {
            request = request.bearer_auth(token);
        }

        let uri = format!("gs://{}/{}", self.bucket, object);
        request
            .send()
            .with_context(|| format!("Upload to {uri} failed"))?
            .error_for_status()
            .with_context(|| format!("Upload to {uri} was rejected"))?;

        Ok(uri)
    }
}

pub struct LocalBucket {
    bucket: String,
    root:   PathBuf,
}

impl LocalBucket {
    pub fn new(root: impl Into<PathBuf>, bucket: impl Into<String>) -> Self {
        Self { bucket: bucket.into(), root: root.into() }
    }

    pub fn object_path(&self, object: &str) -> PathBuf {
        self.root.join(&self.bucket).join(object)
    }
}

impl ObjectStore for LocalBucket {
    fn bucket(&self) -> &str {
        &self.bucket
    }

    fn upload_file(&self, local: &Path, object: &str) -> Result<String> {
        let dest = self.object_path(object);
        if let Some(parent) = dest.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Cannot create '{}'", parent.display()))?;
        }
        fs::copy(local, &dest).with_context(|| {
            format!("Cannot copy '{}' to '{}'", local.display(), dest.display())
        })?;
        Ok(dest.display().to_string())
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::serve_once;

    fn stub_bucket(base: &str) -> GcsBucket {
        GcsBucket::new("sid-vertex-mlops")
            .with_endpoint(base)
            .with_client(reqwest::blocking::Client::builder().no_proxy().build().unwrap())
    }

    #[test]
    fn test_local_bucket_copies_under_prefix() {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("model.joblib");
        fs::write(&src, b"{}").unwrap();

        let bucket = LocalBucket::new(dir.path().join("remote"), "sid-vertex-mlops");
        let uri = bucket
            .upload_file(&src, "bike-share-rf-regression-artifact/model.joblib")
            .unwrap();

        let expected = dir
            .path()
            .join("remote/sid-vertex-mlops/bike-share-rf-regression-artifact/model.joblib");
        assert_eq!(uri, expected.display().to_string());
        assert_eq!(fs::read(expected).unwrap(), b"{}");
    }

    #[test]
    fn test_local_bucket_missing_source_fails() {
        let dir    = tempfile::tempdir().unwrap();
        let bucket = LocalBucket::new(dir.path(), "b");
        assert!(bucket.upload_file(&dir.path().join("nope"), "x").is_err());
    }

    #[test]
    fn test_gcs_upload_url() {
        let gcs = GcsBucket::new("sid-vertex-mlops").with_endpoint("http://localhost:4443/");
        assert_eq!(
            gcs.upload_url(),
            "http://localhost:4443/upload/storage/v1/b/sid-vertex-mlops/o"
        );
        assert_eq!(gcs.bucket(), "sid-vertex-mlops");
    }

    #[test]
    fn test_gcs_media_upload_request() {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("model.joblib");
        fs::write(&src, b"{\"format_version\":1}").unwrap();
        let (base, server) = serve_once("200 OK", b"{}".to_vec());

        let uri = stub_bucket(&base)
            .with_bearer_token(Some("secret-token".into()))
            .upload_file(&src, "bike-share-rf-regression-artifact/model.joblib")
            .unwrap();
        assert_eq!(uri, "gs://sid-vertex-mlops/bike-share-rf-regression-artifact/model.joblib");

        let request = server.join().unwrap();
        let request_line = request.lines().next().unwrap();
        assert!(
            request_line.starts_with("POST /upload/storage/v1/b/sid-vertex-mlops/o?"),
            "{request_line}"
        );
        assert!(request_line.contains("uploadType=media"), "{request_line}");
        assert!(
            request_line.contains("name=bike-share-rf-regression-artifact%2Fmodel.joblib"),
            "{request_line}"
        );
        let lower = request.to_ascii_lowercase();
        assert!(lower.contains("authorization: bearer secret-token"));
        assert!(lower.contains("content-type: application/octet-stream"));
        assert!(request.ends_with("{\"format_version\":1}"));
    }

    #[test]
    fn test_gcs_without_token_sends_no_authorization() {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("model.joblib");
        fs::write(&src, b"{}").unwrap();
        let (base, server) = serve_once("200 OK", Vec::new());

        stub_bucket(&base).upload_file(&src, "model.joblib").unwrap();
        let request = server.join().unwrap();
        assert!(!request.to_ascii_lowercase().contains("authorization:"));
    }

    #[test]
    fn test_gcs_forbidden_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("model.joblib");
        fs::write(&src, b"{}").unwrap();
        let (base, server) = serve_once("403 Forbidden", b"denied".to_vec());

        let err = stub_bucket(&base)
            .with_bearer_token(Some("expired".into()))
            .upload_file(&src, "p/model.joblib")
            .unwrap_err();
        assert!(format!("{err:#}").contains("403"), "{err:#}");
        server.join().unwrap();
    }
}
