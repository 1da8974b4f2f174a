use reqwest::Client;
use reqwest::header::{CACHE_CONTROL, CONTENT_TYPE};

use super::{StoreError, StoreResult};

/// Client for a Supabase-style object storage HTTP API. Uploads land at
/// `{base}/object/{bucket}/{path}` and resolve publicly at
/// `{base}/object/public/{bucket}/{path}`.
#[derive(Debug, Clone)]
pub struct StorageClient {
    client: Client,
    base_url: String,
    api_key: String,
}

impl StorageClient {
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            client: Client::new(),
            base_url,
            api_key: api_key.into(),
        }
    }

    /// Uploads a blob and returns its public URL.
    pub async fn upload(
        &self,
        bucket: &str,
        path: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> StoreResult<String> {
        let url = format!("{}/object/{}/{}", self.base_url, bucket, path);
        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .header(CONTENT_TYPE, content_type)
            .header(CACHE_CONTROL, "3600")
            .body(bytes)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(StoreError::Other(format!(
                "storage upload to {bucket}/{path} failed with status {status}"
            )));
        }

        Ok(self.public_url(bucket, path))
    }

    pub fn public_url(&self, bucket: &str, path: &str) -> String {
        format!("{}/object/public/{}/{}", self.base_url, bucket, path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn public_url_shape() {
        let storage = StorageClient::new("https://files.example.com/storage/v1/", "key");
        assert_eq!(
            storage.public_url("activity_images", "public/1-photo.png"),
            "https://files.example.com/storage/v1/object/public/activity_images/public/1-photo.png"
        );
    }
}
