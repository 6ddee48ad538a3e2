//! Live image probe: fetch the bytes and read the header.

use reqwest::Client;

use crate::error::PlaygroundError;
use crate::media::dimensions_from_bytes;
use crate::output::fetch_image_bytes;
use crate::ports::{BackendFuture, ImageDimensions, ImageProbe};

/// Probes http(s) URLs over the network and data URIs locally.
pub struct HttpImageProbe {
    client: Client,
}

impl HttpImageProbe {
    /// Create a probe that fetches with `client`.
    #[must_use]
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

impl ImageProbe for HttpImageProbe {
    fn probe(&self, url: &str) -> BackendFuture<'_, ImageDimensions> {
        let url = url.to_string();
        Box::pin(async move {
            let (bytes, _) = fetch_image_bytes(&self.client, &url).await?;
            tokio::task::spawn_blocking(move || dimensions_from_bytes(&bytes))
                .await
                .map_err(|e| PlaygroundError::ImageDecode(format!("Dimension probe failed: {e}")))?
        })
    }
}
