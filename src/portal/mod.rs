pub mod listing;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, CONTENT_DISPOSITION, COOKIE};
use tracing::debug;
use url::Url;

use crate::download::body::{ResponseBody, VideoBody};
use crate::error::{Error, Result};

const LANDING_PATH: &str = "proflyer";

/// A video response whose body has not been read yet.
pub struct VideoResponse {
    pub content_disposition: Option<String>,
    pub body: Box<dyn VideoBody>,
}

/// The three kinds of requests the pipeline makes against the portal.
#[async_trait]
pub trait Portal: Sync {
    /// Authenticated fetch of the landing page holding the session dropdown.
    async fn landing_page(&self) -> Result<String>;

    /// Authenticated fetch of a session's filtered video listing.
    async fn filtered_listing(&self, filter_url: &str) -> Result<String>;

    /// Unauthenticated fetch of a video file.
    async fn video(&self, url: &Url) -> Result<VideoResponse>;
}

pub struct PortalClient {
    client: reqwest::Client,
    base_origin: Url,
    cookie: HeaderValue,
}

impl PortalClient {
    pub fn new(base_origin: Url, cookie: &str) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent("Mozilla/5.0 (Windows NT 10.0; rv:78.0) Gecko/20100101 Firefox/78.0")
            .build()
            .map_err(|err| Error::Config(format!("could not build http client: {err}")))?;

        let cookie = HeaderValue::from_str(cookie)
            .map_err(|_| Error::Config("cookie contains characters not allowed in a header".into()))?;

        Ok(Self {
            client,
            base_origin,
            cookie,
        })
    }

    fn portal_url(&self, path: &str) -> Result<Url> {
        self.base_origin
            .join(path)
            .map_err(|err| Error::Config(format!("cannot join {path:?} onto {}: {err}", self.base_origin)))
    }

    async fn get(&self, url: &Url, headers: HeaderMap) -> Result<reqwest::Response> {
        let transport = |source| Error::Transport {
            url: url.clone(),
            source,
        };

        let response = self
            .client
            .get(url.as_str())
            .headers(headers)
            .send()
            .await
            .map_err(transport)?;

        response.error_for_status().map_err(transport)
    }

    async fn authenticated_page(&self, url: &Url) -> Result<String> {
        let mut headers = HeaderMap::new();
        headers.insert(COOKIE, self.cookie.clone());

        let response = self.get(url, headers).await?;
        response.text().await.map_err(|source| Error::Transport {
            url: url.clone(),
            source,
        })
    }
}

#[async_trait]
impl Portal for PortalClient {
    async fn landing_page(&self) -> Result<String> {
        let url = self.portal_url(LANDING_PATH)?;
        debug!("Trying to grab landing page {}", url);
        self.authenticated_page(&url).await
    }

    async fn filtered_listing(&self, filter_url: &str) -> Result<String> {
        let url = self.portal_url(filter_url)?;
        debug!("Trying to set filter over url {}", url);
        self.authenticated_page(&url).await
    }

    async fn video(&self, url: &Url) -> Result<VideoResponse> {
        let response = self.get(url, HeaderMap::new()).await?;

        let content_disposition = response
            .headers()
            .get(CONTENT_DISPOSITION)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string);

        Ok(VideoResponse {
            content_disposition,
            body: Box::new(ResponseBody::new(url.clone(), response)),
        })
    }
}
