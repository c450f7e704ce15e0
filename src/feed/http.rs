//! JSON-over-HTTP feed source.
//!
//! Endpoints, relative to the server base URL:
//!
//! - `GET  api/dataset`   → `{"dataset": {"name", "count", "revision"} | null}`
//! - `GET  api/page/{n}?page_size={k}` → `{"items": [...], "total": N}`
//! - `POST api/selection` with `{"id", "selected"}` → `{"selected_count": N}`

use super::source::FeedSource;
use super::types::{DatasetInfo, FetchError, ItemId, Page, SelectionAck};
use futures::future::{BoxFuture, FutureExt};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use url::Url;

/// Upper bound for any single request.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Deserialize)]
struct DatasetEnvelope {
    dataset: Option<DatasetInfo>,
}

#[derive(Serialize)]
struct SelectionBody<'a> {
    id: &'a ItemId,
    selected: bool,
}

/// [`FeedSource`] talking to a dataset server over HTTP.
#[derive(Clone)]
pub struct HttpFeedSource {
    client: reqwest::Client,
    base: Url,
    page_size: u32,
}

impl HttpFeedSource {
    /// Build a source for `base`. A missing trailing slash is added so that
    /// endpoint paths are joined below the base rather than replacing its
    /// last segment.
    ///
    /// `page_size` is sent with every page request so the server slices
    /// pages the same way the controller counts them.
    pub fn new(mut base: Url, page_size: u32) -> Result<Self, FetchError> {
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }
        let client = reqwest::Client::builder()
            .pool_max_idle_per_host(2)
            .timeout(REQUEST_TIMEOUT)
            .build()?;
        Ok(Self {
            client,
            base,
            page_size: page_size.max(1),
        })
    }

    pub fn base(&self) -> &Url {
        &self.base
    }

    pub fn page_size(&self) -> u32 {
        self.page_size
    }

    fn endpoint(&self, path: &str) -> Result<Url, FetchError> {
        self.base
            .join(path)
            .map_err(|e| FetchError::Unavailable(format!("invalid endpoint '{path}': {e}")))
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, FetchError> {
        let url = self.endpoint(path)?;
        tracing::debug!(url = %url, "GET");
        let response = self.client.get(url).send().await?;
        decode(response).await
    }

    async fn get_dataset(&self) -> Result<Option<DatasetInfo>, FetchError> {
        let envelope: DatasetEnvelope = self.get_json("api/dataset").await?;
        Ok(envelope.dataset)
    }

    async fn get_page(&self, page: u32) -> Result<Page, FetchError> {
        if page == 0 {
            return Err(FetchError::Unavailable("page numbers start at 1".into()));
        }
        self.get_json(&format!("api/page/{page}?page_size={}", self.page_size))
            .await
    }

    async fn post_selection(&self, id: &ItemId, selected: bool) -> Result<SelectionAck, FetchError> {
        let url = self.endpoint("api/selection")?;
        tracing::debug!(url = %url, id = %id, selected, "POST selection");
        let response = self
            .client
            .post(url)
            .json(&SelectionBody { id, selected })
            .send()
            .await?;
        decode(response).await
    }
}

async fn decode<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, FetchError> {
    let status = response.status();
    if !status.is_success() {
        return Err(FetchError::HttpStatus(status.as_u16()));
    }
    let bytes = response.bytes().await?;
    serde_json::from_slice(&bytes).map_err(|e| FetchError::Decode(e.to_string()))
}

impl FeedSource for HttpFeedSource {
    fn dataset(&self) -> BoxFuture<'_, Result<Option<DatasetInfo>, FetchError>> {
        self.get_dataset().boxed()
    }

    fn fetch_page(&self, page: u32) -> BoxFuture<'_, Result<Page, FetchError>> {
        self.get_page(page).boxed()
    }

    fn notify_selection_changed<'a>(
        &'a self,
        id: &'a ItemId,
        selected: bool,
    ) -> BoxFuture<'a, Result<SelectionAck, FetchError>> {
        self.post_selection(id, selected).boxed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_json, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn source_for(server: &MockServer) -> HttpFeedSource {
        HttpFeedSource::new(Url::parse(&server.uri()).unwrap(), 20).unwrap()
    }

    #[test]
    fn test_base_gets_trailing_slash() {
        let source = HttpFeedSource::new(Url::parse("http://127.0.0.1:5151/grid").unwrap(), 20).unwrap();
        assert_eq!(source.base().as_str(), "http://127.0.0.1:5151/grid/");
        assert_eq!(
            source.endpoint("api/page/2").unwrap().as_str(),
            "http://127.0.0.1:5151/grid/api/page/2"
        );
    }

    #[tokio::test]
    async fn test_fetch_page_decodes_items() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/page/2"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "items": [
                    {"id": "a", "filepath": "/d/a.jpg", "labels": []},
                    {"id": "b", "filepath": "/d/b.jpg"}
                ],
                "total": 45
            })))
            .mount(&server)
            .await;

        let page = source_for(&server).await.fetch_page(2).await.unwrap();
        assert_eq!(page.total_count, 45);
        assert_eq!(page.items.len(), 2);
        assert_eq!(page.items[1].id, ItemId::new("b"));
    }

    #[tokio::test]
    async fn test_fetch_page_sends_page_size() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/page/3"))
            .and(query_param("page_size", "7"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({"items": [], "total": 14})),
            )
            .expect(1)
            .mount(&server)
            .await;

        let source = HttpFeedSource::new(Url::parse(&server.uri()).unwrap(), 7).unwrap();
        assert_eq!(source.page_size(), 7);
        let page = source.fetch_page(3).await.unwrap();
        assert_eq!(page.total_count, 14);
    }

    #[tokio::test]
    async fn test_fetch_page_http_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(503))
            .expect(1)
            .mount(&server)
            .await;

        let err = source_for(&server).await.fetch_page(1).await.unwrap_err();
        assert!(matches!(err, FetchError::HttpStatus(503)), "got {err:?}");
    }

    #[tokio::test]
    async fn test_fetch_page_bad_body() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>nope</html>"))
            .mount(&server)
            .await;

        let err = source_for(&server).await.fetch_page(1).await.unwrap_err();
        assert!(matches!(err, FetchError::Decode(_)), "got {err:?}");
    }

    #[tokio::test]
    async fn test_dataset_null_means_no_dataset() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/dataset"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({ "dataset": null })),
            )
            .mount(&server)
            .await;

        assert!(source_for(&server).await.dataset().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_dataset_info() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/dataset"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "dataset": {"name": "quickstart", "count": 200, "revision": 7}
            })))
            .mount(&server)
            .await;

        let info = source_for(&server).await.dataset().await.unwrap().unwrap();
        assert_eq!(info.name, "quickstart");
        assert_eq!(info.count, 200);
        assert_eq!(info.revision, 7);
    }

    #[tokio::test]
    async fn test_selection_posts_body_and_reads_ack() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/selection"))
            .and(body_json(serde_json::json!({"id": "s1", "selected": true})))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({"selected_count": 3})),
            )
            .expect(1)
            .mount(&server)
            .await;

        let id = ItemId::new("s1");
        let ack = source_for(&server)
            .await
            .notify_selection_changed(&id, true)
            .await
            .unwrap();
        assert_eq!(ack.selected_count, 3);
    }
}
