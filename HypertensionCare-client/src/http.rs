//! Thin JSON client over `reqwest`.
//!
//! Every request resolves its path against the configured base URL, reads the bearer
//! token from the session store at send time, and tags itself with a request id.
//! Non-success responses become [`ApiError::Http`] with the backend's message.

use reqwest::multipart::Form;
use reqwest::{Method, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, error, instrument, warn};
use url::Url;
use uuid::Uuid;

use hypertension_care_data::repository::SessionRepository;

use crate::config::ClientConfig;
use crate::error::ApiError;

/// Header carrying the per-request correlation id
pub const REQUEST_ID_HEADER: &str = "X-Request-ID";

/// Authenticated HTTP client shared by the service wrappers
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: Url,
    session: SessionRepository,
}

impl ApiClient {
    pub fn new(config: &ClientConfig, session: SessionRepository) -> Result<Self, ApiError> {
        let http = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()?;

        Ok(Self {
            http,
            base_url: config.api_base_url.clone(),
            session,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// The session store the bearer token is read from
    pub fn session(&self) -> &SessionRepository {
        &self.session
    }

    /// Absolute URL for an endpoint path such as `bp/readings`
    pub fn endpoint(&self, path: &str) -> Result<Url, ApiError> {
        Ok(self.base_url.join(path.trim_start_matches('/'))?)
    }

    fn request(&self, method: Method, path: &str) -> Result<RequestBuilder, ApiError> {
        let url = self.endpoint(path)?;
        let request_id = Uuid::new_v4().to_string();
        debug!("{} {} [{}]", method, url, request_id);

        let mut builder = self
            .http
            .request(method, url)
            .header(REQUEST_ID_HEADER, request_id);

        if let Some(token) = self.session.token()? {
            builder = builder.bearer_auth(token);
        }

        Ok(builder)
    }

    async fn send(&self, builder: RequestBuilder) -> Result<Response, ApiError> {
        let response = builder.send().await.map_err(|e| {
            error!("Request failed before a response arrived: {}", e);
            ApiError::from(e)
        })?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        let err = ApiError::from_response(status.as_u16(), &body);
        if status.is_server_error() {
            error!("Backend error: {}", err);
        } else {
            warn!("Request rejected: {}", err);
        }
        Err(err)
    }

    async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, ApiError> {
        let body = response.bytes().await?;
        Ok(serde_json::from_slice(&body)?)
    }

    /// `GET` a JSON body
    #[instrument(skip(self, query))]
    pub async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T, ApiError> {
        let builder = self.request(Method::GET, path)?.query(query);
        let response = self.send(builder).await?;
        Self::decode(response).await
    }

    /// Send `body` as JSON with `method` and decode the JSON answer
    #[instrument(skip(self, body))]
    pub async fn send_json<B, T>(&self, method: Method, path: &str, body: &B) -> Result<T, ApiError>
    where
        B: Serialize + ?Sized + Sync,
        T: DeserializeOwned,
    {
        let builder = self.request(method, path)?.json(body);
        let response = self.send(builder).await?;
        Self::decode(response).await
    }

    pub async fn post_json<B, T>(&self, path: &str, body: &B) -> Result<T, ApiError>
    where
        B: Serialize + ?Sized + Sync,
        T: DeserializeOwned,
    {
        self.send_json(Method::POST, path, body).await
    }

    pub async fn put_json<B, T>(&self, path: &str, body: &B) -> Result<T, ApiError>
    where
        B: Serialize + ?Sized + Sync,
        T: DeserializeOwned,
    {
        self.send_json(Method::PUT, path, body).await
    }

    /// `DELETE` and decode the JSON answer
    #[instrument(skip(self))]
    pub async fn delete_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        let builder = self.request(Method::DELETE, path)?;
        let response = self.send(builder).await?;
        Self::decode(response).await
    }

    /// `POST` a multipart form, as the upload endpoints expect
    #[instrument(skip(self, form))]
    pub async fn post_multipart<T: DeserializeOwned>(&self, path: &str, form: Form) -> Result<T, ApiError> {
        let builder = self.request(Method::POST, path)?.multipart(form);
        let response = self.send(builder).await?;
        Self::decode(response).await
    }

    /// `GET` a raw body, e.g. a generated report
    #[instrument(skip(self, query))]
    pub async fn get_bytes(&self, path: &str, query: &[(&str, String)]) -> Result<Vec<u8>, ApiError> {
        let builder = self.request(Method::GET, path)?.query(query);
        let response = self.send(builder).await?;
        Ok(response.bytes().await?.to_vec())
    }
}

/// Treat a 404 as "absent"
pub fn not_found_as_none<T>(result: Result<T, ApiError>) -> Result<Option<T>, ApiError> {
    match result {
        Ok(value) => Ok(Some(value)),
        Err(e) if e.is_not_found() => Ok(None),
        Err(e) => Err(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hypertension_care_data::repository::InMemoryStore;
    use std::sync::Arc;

    fn client(base: &str) -> ApiClient {
        let config = ClientConfig::new(base).unwrap();
        let session = SessionRepository::new(Arc::new(InMemoryStore::new()));
        ApiClient::new(&config, session).unwrap()
    }

    #[test]
    fn test_endpoint_resolution() {
        let api = client("http://localhost:5000/api");
        assert_eq!(
            api.endpoint("bp/readings").unwrap().as_str(),
            "http://localhost:5000/api/bp/readings"
        );
        assert_eq!(
            api.endpoint("/user-profile").unwrap().as_str(),
            "http://localhost:5000/api/user-profile"
        );
    }

    #[test]
    fn test_not_found_as_none() {
        let absent: Result<Option<u8>, _> =
            not_found_as_none(Err(ApiError::from_response(404, r#"{"message": "No profile"}"#)));
        assert!(matches!(absent, Ok(None)));

        let failed: Result<Option<u8>, _> = not_found_as_none(Err(ApiError::from_response(500, "")));
        assert!(failed.is_err());

        assert!(matches!(not_found_as_none(Ok(3u8)), Ok(Some(3))));
    }
}
