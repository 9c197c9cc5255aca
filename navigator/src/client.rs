use crate::config::NavigatorConfig;
use crate::error::NavigatorError;
use crate::error::Result;
use crate::source::IndexLookup;
use crate::source::ObservationSource;
use async_trait::async_trait;
use obsnav_protocol::ObjectId;
use obsnav_protocol::Observation;
use obsnav_protocol::Query;
use obsnav_protocol::SessionId;
use obsnav_protocol::observation::ObservationResponse;
use obsnav_protocol::wire::CountResponse;
use obsnav_protocol::wire::ExportRequest;
use obsnav_protocol::wire::IdLookupResponse;
use obsnav_protocol::wire::IndexResponse;
use reqwest::RequestBuilder;
use reqwest::StatusCode;
use std::time::Duration;
use tracing::debug;
use url::Url;

const EXPORT_COMMAND: &str = "export-observations";

#[derive(Clone, Debug)]
struct Credentials {
    username: String,
    password: Option<String>,
}

/// [`ObservationSource`] backed by the server's JSON endpoints.
#[derive(Clone, Debug)]
pub struct HttpObservationClient {
    http: reqwest::Client,
    base_url: Url,
    otype: String,
    credentials: Option<Credentials>,
}

impl HttpObservationClient {
    pub fn new(config: &NavigatorConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(config.request_timeout())
            .build()?;
        Self::with_http(http, config)
    }

    pub fn with_http(http: reqwest::Client, config: &NavigatorConfig) -> Result<Self> {
        let credentials = config.username.as_ref().map(|username| Credentials {
            username: username.clone(),
            password: config.password.clone(),
        });
        Ok(Self {
            http,
            base_url: config.base_url()?,
            otype: config.otype.clone(),
            credentials,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn endpoint(&self, segments: &[&str]) -> Result<Url> {
        let mut url = self.base_url.clone();
        {
            let mut path = url.path_segments_mut().map_err(|()| {
                NavigatorError::Config(format!("{} cannot be used as a base URL", self.base_url))
            })?;
            path.pop_if_empty();
            path.extend(segments);
        }
        Ok(url)
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.credentials {
            Some(credentials) => {
                request.basic_auth(&credentials.username, credentials.password.as_ref())
            }
            None => request,
        }
    }

    async fn get(&self, url: Url, params: &[(&str, String)]) -> Result<reqwest::Response> {
        debug!(url = %url, "GET");
        let resp = self
            .authorize(self.http.get(url))
            .query(params)
            .send()
            .await?;
        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            return Err(NavigatorError::Status { status, body });
        }
        Ok(resp)
    }
}

fn ordered_params(session: SessionId, query: &Query) -> Vec<(&'static str, String)> {
    vec![
        ("session", session.to_string()),
        ("search", query.search.clone()),
        ("sort", query.sort.to_string()),
        ("direction", query.direction.to_string()),
    ]
}

fn is_index_rejection(status: StatusCode, body: &str) -> bool {
    status == StatusCode::BAD_REQUEST && body.to_ascii_lowercase().contains("out of range")
}

#[async_trait]
impl ObservationSource for HttpObservationClient {
    async fn count(&self, session: SessionId, search: &str) -> Result<usize> {
        let url = self.endpoint(&[self.otype.as_str(), "count"])?;
        let params = [
            ("session", session.to_string()),
            ("search", search.to_string()),
        ];
        let resp: CountResponse = self.get(url, &params).await?.json().await?;
        Ok(resp.count)
    }

    async fn identifier_at(
        &self,
        session: SessionId,
        query: &Query,
        index: usize,
    ) -> Result<ObjectId> {
        let index_segment = index.to_string();
        let url = self.endpoint(&[self.otype.as_str(), "index", index_segment.as_str()])?;
        match self.get(url, &ordered_params(session, query)).await {
            Ok(resp) => {
                let resp: IndexResponse = resp.json().await?;
                Ok(resp.oid)
            }
            Err(NavigatorError::Status { status, body }) if is_index_rejection(status, &body) => {
                Err(NavigatorError::OutOfRange { index })
            }
            Err(err) => Err(err),
        }
    }

    async fn index_of(
        &self,
        session: SessionId,
        query: &Query,
        oid: &ObjectId,
    ) -> Result<IndexLookup> {
        let url = self.endpoint(&[self.otype.as_str(), "id", oid.as_str()])?;
        let resp: IdLookupResponse = self
            .get(url, &ordered_params(session, query))
            .await?
            .json()
            .await?;
        Ok(IndexLookup {
            oid: resp.oid,
            index: resp.oindex,
        })
    }

    async fn observation(&self, oid: &ObjectId) -> Result<Observation> {
        let url = self.endpoint(&[self.otype.as_str(), oid.as_str()])?;
        match self.get(url, &[]).await {
            Ok(resp) => {
                let resp: ObservationResponse = resp.json().await?;
                Ok(resp.into_observation())
            }
            Err(NavigatorError::Status { status, .. }) if status == StatusCode::NOT_FOUND => {
                Err(NavigatorError::NotFound(oid.clone()))
            }
            Err(err) => Err(err),
        }
    }

    async fn attributes_pre(&self, oid: &ObjectId) -> Result<String> {
        let url = self.endpoint(&[self.otype.as_str(), oid.as_str(), "attributes", "pre"])?;
        match self.get(url, &[]).await {
            Ok(resp) => Ok(resp.text().await?),
            Err(NavigatorError::Status { status, .. }) if status == StatusCode::NOT_FOUND => {
                Err(NavigatorError::NotFound(oid.clone()))
            }
            Err(err) => Err(err),
        }
    }

    async fn export_observations(&self, search: &str) -> Result<()> {
        let url = self.endpoint(&["commands", EXPORT_COMMAND])?;
        let body = ExportRequest {
            search: search.to_string(),
        };
        let resp = self
            .authorize(self.http.post(url))
            .timeout(Duration::from_secs(10))
            .json(&body)
            .send()
            .await?;
        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            return Err(NavigatorError::Status { status, body });
        }
        Ok(())
    }
}
