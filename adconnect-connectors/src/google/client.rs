//! HTTP client that authorizes requests with a Google access token.

use std::sync::Arc;

use adconnect_fetch::{FetchError, HttpClient};
use reqwest::RequestBuilder;
use serde::Serialize;
use serde::de::DeserializeOwned;

use super::auth::GoogleAuth;
use super::error::GoogleApiError;

/// Bearer-authorized client for Google REST APIs.
#[derive(Debug, Clone)]
pub struct GoogleClient {
    http: HttpClient,
    auth: Arc<GoogleAuth>,
}

impl GoogleClient {
    /// Creates a client.
    pub fn new(http: HttpClient, auth: Arc<GoogleAuth>) -> Self {
        Self { http, auth }
    }

    /// The token provider.
    pub fn auth(&self) -> &GoogleAuth {
        &self.auth
    }

    /// The underlying HTTP client, for building requests.
    pub fn http(&self) -> &HttpClient {
        &self.http
    }

    /// Adds the bearer token to a request.
    pub async fn authorize(&self, builder: RequestBuilder) -> Result<RequestBuilder, FetchError> {
        let token = self.auth.access_token().await?;
        Ok(builder.bearer_auth(token))
    }

    /// Sends an authorized request and parses the JSON body.
    pub async fn json<T: DeserializeOwned>(&self, builder: RequestBuilder) -> Result<T, FetchError> {
        let builder = self.authorize(builder).await?;
        self.http.json(builder).await.map_err(GoogleApiError::map)
    }

    /// Sends an authorized request and returns the body as text.
    pub async fn text(&self, builder: RequestBuilder) -> Result<String, FetchError> {
        let builder = self.authorize(builder).await?;
        self.http.text(builder).await.map_err(GoogleApiError::map)
    }

    /// Authorized GET returning JSON.
    pub async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T, FetchError> {
        self.json(self.http.get(url)).await
    }

    /// Authorized POST of a JSON body returning JSON.
    pub async fn post_json<B, T>(&self, url: &str, body: &B) -> Result<T, FetchError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.json(self.http.post(url).json(body)).await
    }

    /// Authorized GET returning text.
    pub async fn get_text(&self, url: &str) -> Result<String, FetchError> {
        self.text(self.http.get(url)).await
    }
}
