//! Google Ads REST client.

use std::collections::{HashSet, VecDeque};

use adconnect_fetch::FetchError;
use reqwest::RequestBuilder;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};
use serde_json::{Map, json};
use tracing::{debug, instrument};

use super::config::customer_id;
use crate::google::GoogleClient;

// ============================================================================
// Constants
// ============================================================================

/// Google Ads API base URL, including the API version.
pub const GOOGLE_ADS_API_BASE: &str = "https://googleads.googleapis.com/v17";

const CUSTOMER_CLIENT_QUERY: &str = "SELECT customer_client.client_customer, customer_client.level, \
     customer_client.manager, customer_client.descriptive_name, customer_client.currency_code, \
     customer_client.id FROM customer_client WHERE customer_client.level <= 1";

// ============================================================================
// Response Types
// ============================================================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StreamBatch {
    #[serde(default)]
    results: Vec<Map<String, serde_json::Value>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CustomerClientRow {
    customer_client: CustomerClient,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AccessibleCustomers {
    #[serde(default)]
    resource_names: Vec<String>,
}

/// A customer below a manager account.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerClient {
    /// Customer id.
    #[serde(deserialize_with = "int64")]
    pub id: String,
    /// Depth below the queried customer; 0 is the customer itself.
    #[serde(default, deserialize_with = "int64")]
    pub level: String,
    /// True for manager accounts.
    #[serde(default)]
    pub manager: bool,
    /// Account name.
    #[serde(default)]
    pub descriptive_name: String,
    /// Account currency.
    #[serde(default)]
    pub currency_code: Option<String>,
}

impl CustomerClient {
    fn is_self(&self) -> bool {
        self.level == "0"
    }
}

/// The REST API encodes int64 as strings.
fn int64<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Ok(match serde_json::Value::deserialize(deserializer)? {
        serde_json::Value::String(s) => s,
        other => other.to_string(),
    })
}

// ============================================================================
// Client
// ============================================================================

/// Google Ads client for one developer token.
#[derive(Debug, Clone)]
pub struct GoogleAdsClient {
    google: GoogleClient,
    base_url: String,
    developer_token: String,
    login_customer_id: Option<String>,
}

impl GoogleAdsClient {
    /// Creates a client.
    pub fn new(google: GoogleClient, developer_token: impl Into<String>) -> Self {
        Self {
            google,
            base_url: GOOGLE_ADS_API_BASE.to_string(),
            developer_token: developer_token.into(),
            login_customer_id: None,
        }
    }

    /// Sends requests on behalf of a manager account.
    #[must_use]
    pub fn with_login_customer_id(mut self, id: Option<&str>) -> Self {
        self.login_customer_id = id.map(customer_id).filter(|id| !id.is_empty());
        self
    }

    /// Overrides the API base URL.
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// The Google client, for userinfo.
    pub fn google(&self) -> &GoogleClient {
        &self.google
    }

    /// The manager account, if any.
    pub fn login_customer_id(&self) -> Option<&str> {
        self.login_customer_id.as_deref()
    }

    fn with_headers(&self, builder: RequestBuilder) -> RequestBuilder {
        let builder = builder.header("developer-token", &self.developer_token);
        match &self.login_customer_id {
            Some(id) => builder.header("login-customer-id", id),
            None => builder,
        }
    }

    async fn send<T: DeserializeOwned>(&self, builder: RequestBuilder) -> Result<T, FetchError> {
        self.google.json(self.with_headers(builder)).await
    }

    /// Runs a GAQL query and returns every result row.
    #[instrument(skip(self, query))]
    pub async fn search_stream(
        &self,
        customer: &str,
        query: &str,
    ) -> Result<Vec<Map<String, serde_json::Value>>, FetchError> {
        let url = format!("{}/customers/{}/googleAds:searchStream", self.base_url, customer_id(customer));
        let batches: Vec<StreamBatch> = self
            .send(self.google.http().post(&url).json(&json!({ "query": query })))
            .await?;
        let rows: Vec<_> = batches.into_iter().flat_map(|b| b.results).collect();
        debug!(rows = rows.len(), "searchStream results");
        Ok(rows)
    }

    /// Customers the authenticated user can access directly.
    pub async fn accessible_customers(&self) -> Result<Vec<String>, FetchError> {
        let url = format!("{}/customers:listAccessibleCustomers", self.base_url);
        let response: AccessibleCustomers = self.send(self.google.http().get(&url)).await?;
        Ok(response
            .resource_names
            .into_iter()
            .map(|name| name.trim_start_matches("customers/").to_string())
            .collect())
    }

    /// The customer and its direct children.
    pub async fn customer_clients(&self, customer: &str) -> Result<Vec<CustomerClient>, FetchError> {
        let rows = self.search_stream(customer, CUSTOMER_CLIENT_QUERY).await?;
        rows.into_iter()
            .map(|row| {
                serde_json::from_value::<CustomerClientRow>(serde_json::Value::Object(row))
                    .map(|r| r.customer_client)
                    .map_err(|e| FetchError::InvalidResponse(format!("customer_client row: {e}")))
            })
            .collect()
    }

    /// Breadth-first walk of the hierarchy below `roots`, returning every
    /// non-manager account once.
    #[instrument(skip(self))]
    pub async fn client_accounts(&self, roots: Vec<String>) -> Result<Vec<CustomerClient>, FetchError> {
        let mut queue: VecDeque<String> = roots.into_iter().map(|r| customer_id(&r)).collect();
        let mut seen: HashSet<String> = queue.iter().cloned().collect();
        let mut accounts = Vec::new();

        while let Some(customer) = queue.pop_front() {
            for client in self.customer_clients(&customer).await? {
                if client.is_self() {
                    if !client.manager && accounts.iter().all(|a: &CustomerClient| a.id != client.id) {
                        accounts.push(client);
                    }
                    continue;
                }
                if !seen.insert(client.id.clone()) {
                    continue;
                }
                if client.manager {
                    queue.push_back(client.id);
                } else {
                    accounts.push(client);
                }
            }
        }

        debug!(accounts = accounts.len(), "Walked customer hierarchy");
        Ok(accounts)
    }
}
