//! HTTP client for the upstream status page REST API

use super::config::StatusPageConfig;
use super::models::{Component, Incident, IncidentEnvelope, IncidentPayload, IncidentStatus};
use reqwest::{header, Client, RequestBuilder, Url};
use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::{debug, warn};

/// Number of incidents requested when the caller gives no limit
pub const DEFAULT_INCIDENT_LIMIT: u32 = 20;

#[derive(Debug, Error)]
pub enum StatusPageError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
    /// Non-2xx response; the body is kept as diagnostic text
    #[error("{status}: {body}")]
    Api { status: u16, body: String },
    #[error("Failed to decode response: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("Invalid request URL: {0}")]
    InvalidUrl(String),
}

/// Client bound to one page and one API key.
#[derive(Debug, Clone)]
pub struct StatusPageClient {
    http: Client,
    api_base: String,
    page_id: String,
    api_key: String,
}

impl StatusPageClient {
    /// Binds a shared connection pool to the credentials of `config`.
    pub fn new(http: Client, config: &StatusPageConfig) -> Self {
        Self {
            http,
            api_base: config.api_base.clone(),
            page_id: config.page_id.clone(),
            api_key: config.api_key.clone(),
        }
    }

    /// Create an incident
    pub async fn create_incident(
        &self,
        payload: &IncidentPayload,
    ) -> Result<Incident, StatusPageError> {
        let url = self.endpoint(&["incidents"])?;
        debug!(%url, "Creating incident");
        self.execute(
            self.http
                .post(url)
                .json(&IncidentEnvelope { incident: payload }),
        )
        .await
    }

    /// Apply a partial update to an incident
    pub async fn update_incident(
        &self,
        incident_id: &str,
        payload: &IncidentPayload,
    ) -> Result<Incident, StatusPageError> {
        let url = self.endpoint(&["incidents", incident_id])?;
        debug!(%url, "Updating incident");
        self.execute(
            self.http
                .patch(url)
                .json(&IncidentEnvelope { incident: payload }),
        )
        .await
    }

    /// Fetch a single incident
    pub async fn get_incident(&self, incident_id: &str) -> Result<Incident, StatusPageError> {
        let url = self.endpoint(&["incidents", incident_id])?;
        debug!(%url, "Fetching incident");
        self.execute(self.http.get(url)).await
    }

    /// List incidents, optionally filtered by status
    pub async fn list_incidents(
        &self,
        status: Option<IncidentStatus>,
        limit: Option<u32>,
    ) -> Result<Vec<Incident>, StatusPageError> {
        let url = self.endpoint(&["incidents"])?;
        let mut query: Vec<(&str, String)> = Vec::new();
        if let Some(status) = status {
            query.push(("status", status.as_str().to_string()));
        }
        query.push((
            "limit",
            limit.unwrap_or(DEFAULT_INCIDENT_LIMIT).to_string(),
        ));

        debug!(%url, ?query, "Listing incidents");
        self.execute(self.http.get(url).query(&query)).await
    }

    /// List all components of the page
    pub async fn list_components(&self) -> Result<Vec<Component>, StatusPageError> {
        let url = self.endpoint(&["components"])?;
        debug!(%url, "Listing components");
        self.execute(self.http.get(url)).await
    }

    /// `{api_base}/pages/{page_id}/{segments..}` with every segment
    /// percent-encoded, so ids cannot add or climb path levels.
    fn endpoint(&self, segments: &[&str]) -> Result<Url, StatusPageError> {
        let ids = std::iter::once(self.page_id.as_str()).chain(segments.iter().copied());
        for segment in ids {
            // Url drops these instead of encoding them
            if matches!(segment, "" | "." | "..") {
                return Err(StatusPageError::InvalidUrl(format!(
                    "'{}' is not a valid path segment",
                    segment
                )));
            }
        }

        let mut url = Url::parse(&self.api_base)
            .map_err(|e| StatusPageError::InvalidUrl(format!("{}: {}", self.api_base, e)))?;
        url.path_segments_mut()
            .map_err(|()| StatusPageError::InvalidUrl(self.api_base.clone()))?
            .pop_if_empty()
            .push("pages")
            .push(&self.page_id)
            .extend(segments);
        Ok(url)
    }

    /// Sends an authenticated request and decodes a successful JSON body.
    async fn execute<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
    ) -> Result<T, StatusPageError> {
        let response = request
            .header(header::AUTHORIZATION, format!("OAuth {}", self.api_key))
            .header(header::ACCEPT, "application/json")
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            warn!(status = status.as_u16(), %body, "Status page API returned an error");
            return Err(StatusPageError::Api {
                status: status.as_u16(),
                body,
            });
        }

        Ok(serde_json::from_str(&body)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{any, body_json, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client_for(server: &MockServer) -> StatusPageClient {
        let config = StatusPageConfig::new("secret", "page1").with_api_base(server.uri());
        StatusPageClient::new(Client::new(), &config)
    }

    #[tokio::test]
    async fn test_list_components_sends_oauth_header() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/pages/page1/components"))
            .and(header("authorization", "OAuth secret"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                { "id": "c1", "name": "API", "status": "operational" }
            ])))
            .expect(1)
            .mount(&server)
            .await;

        let components = client_for(&server).list_components().await.unwrap();
        assert_eq!(components.len(), 1);
        assert_eq!(components[0].name, "API");
    }

    #[tokio::test]
    async fn test_list_incidents_query_defaults_limit() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/pages/page1/incidents"))
            .and(query_param("status", "resolved"))
            .and(query_param("limit", "20"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
            .expect(1)
            .mount(&server)
            .await;

        let incidents = client_for(&server)
            .list_incidents(Some(IncidentStatus::Resolved), None)
            .await
            .unwrap();
        assert!(incidents.is_empty());
    }

    #[tokio::test]
    async fn test_update_sends_partial_envelope() {
        let server = MockServer::start().await;
        Mock::given(method("PATCH"))
            .and(path("/pages/page1/incidents/inc1"))
            .and(body_json(json!({ "incident": { "status": "monitoring" } })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": "inc1", "name": "n", "status": "monitoring", "impact": "minor"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let payload = IncidentPayload {
            status: Some(IncidentStatus::Monitoring),
            ..IncidentPayload::default()
        };
        let incident = client_for(&server)
            .update_incident("inc1", &payload)
            .await
            .unwrap();
        assert_eq!(incident.status, "monitoring");
    }

    #[tokio::test]
    async fn test_non_success_carries_upstream_body() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/pages/page1/incidents/missing"))
            .respond_with(ResponseTemplate::new(404).set_body_string("{\"error\":\"Not found\"}"))
            .mount(&server)
            .await;

        let err = client_for(&server).get_incident("missing").await.unwrap_err();
        match &err {
            StatusPageError::Api { status, body } => {
                assert_eq!(*status, 404);
                assert!(body.contains("Not found"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert!(err.to_string().contains("Not found"));
    }

    #[tokio::test]
    async fn test_ids_are_encoded_as_single_path_segments() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/pages/page1/components"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
            .expect(0)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/pages/page1/incidents/..%2Fcomponents"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": "../components", "name": "n", "status": "resolved", "impact": "none"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let incident = client_for(&server)
            .get_incident("../components")
            .await
            .unwrap();
        assert_eq!(incident.id, "../components");
    }

    #[tokio::test]
    async fn test_dot_segments_are_rejected_before_sending() {
        let server = MockServer::start().await;
        Mock::given(any())
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let client = client_for(&server);
        for id in ["..", "."] {
            let err = client.get_incident(id).await.unwrap_err();
            assert!(matches!(err, StatusPageError::InvalidUrl(_)), "{err:?}");
        }

        let config = StatusPageConfig::new("secret", "..").with_api_base(server.uri());
        let err = StatusPageClient::new(Client::new(), &config)
            .list_components()
            .await
            .unwrap_err();
        assert!(matches!(err, StatusPageError::InvalidUrl(_)));
    }

    #[test]
    fn test_endpoint_keeps_base_path() {
        let config =
            StatusPageConfig::new("k", "p 1").with_api_base("https://api.example.com/v1/");
        let client = StatusPageClient::new(Client::new(), &config);
        let url = client.endpoint(&["incidents", "a/b"]).unwrap();
        assert_eq!(
            url.as_str(),
            "https://api.example.com/v1/pages/p%201/incidents/a%2Fb"
        );
    }
}
