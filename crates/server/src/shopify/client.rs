//! Shopify Admin GraphQL client.
//!
//! Handles the app-installation OAuth exchange and the three customer
//! operations the bridge needs: lookup by email, update with a quiz-results
//! metafield, and create with the metafield pre-populated.

use std::sync::Arc;

use quiz_bridge_core::{CustomerId, MetafieldId, ShopDomain};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use tracing::instrument;

use crate::config::ShopifyConfig;

use super::ShopifyError;
use super::types::{
    CustomerCreateInput, CustomerNode, CustomerUpdateInput, MetafieldInput, UserError,
};

/// First page size for the customer lookup.
const LOOKUP_PAGE_SIZE: i64 = 10;

// ─────────────────────────────────────────────────────────────────────────────
// GraphQL Types
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
struct GraphQLRequest {
    query: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    variables: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct GraphQLResponse<T> {
    data: Option<T>,
    errors: Option<Vec<GraphQLErrorResponse>>,
}

#[derive(Debug, Deserialize)]
struct GraphQLErrorResponse {
    message: String,
}

impl<T> GraphQLResponse<T> {
    fn into_result(self) -> Result<T, ShopifyError> {
        if let Some(errors) = self.errors
            && !errors.is_empty()
        {
            return Err(ShopifyError::GraphQL(
                errors.into_iter().map(|e| e.message).collect(),
            ));
        }

        self.data
            .ok_or_else(|| ShopifyError::GraphQL(vec!["No data in response".to_string()]))
    }
}

/// Result of exchanging an installation code for an Admin API token.
#[derive(Debug, Deserialize)]
pub struct AccessTokenGrant {
    /// The access token for subsequent API calls.
    pub access_token: String,
    /// Granted scopes, comma-separated.
    pub scope: String,
}

// ─────────────────────────────────────────────────────────────────────────────
// Admin Client
// ─────────────────────────────────────────────────────────────────────────────

/// Client for the Shopify Admin GraphQL API.
///
/// The client itself holds no token: every call takes the shop and its
/// access token explicitly, because the token belongs to the session store
/// and is produced per shop by the OAuth callback.
#[derive(Clone)]
pub struct AdminClient {
    inner: Arc<AdminClientInner>,
}

struct AdminClientInner {
    client: reqwest::Client,
    api_key: String,
    api_secret: String,
    api_version: String,
    /// Base URL replacing `https://{shop}` in tests.
    endpoint_override: Option<String>,
}

impl AdminClient {
    /// Create a new Admin API client.
    #[must_use]
    pub fn new(config: &ShopifyConfig) -> Self {
        Self::build(config, None)
    }

    /// Create a client that sends all traffic to `base_url` instead of the
    /// shop's own domain (for testing with a mock server).
    #[must_use]
    pub fn with_endpoint(config: &ShopifyConfig, base_url: impl Into<String>) -> Self {
        Self::build(config, Some(base_url.into()))
    }

    fn build(config: &ShopifyConfig, endpoint_override: Option<String>) -> Self {
        Self {
            inner: Arc::new(AdminClientInner {
                client: reqwest::Client::new(),
                api_key: config.api_key.clone(),
                api_secret: config.api_secret.expose_secret().to_string(),
                api_version: config.api_version.clone(),
                endpoint_override,
            }),
        }
    }

    fn base_url(&self, shop: &ShopDomain) -> String {
        self.inner
            .endpoint_override
            .clone()
            .unwrap_or_else(|| format!("https://{shop}"))
    }

    fn graphql_endpoint(&self, shop: &ShopDomain) -> String {
        format!(
            "{}/admin/api/{}/graphql.json",
            self.base_url(shop),
            self.inner.api_version
        )
    }

    // ─────────────────────────────────────────────────────────────────────────
    // OAuth Flow
    // ─────────────────────────────────────────────────────────────────────────

    /// Generate the OAuth authorization URL for installing the app.
    ///
    /// Redirect the merchant to this URL to begin the install flow.
    #[must_use]
    pub fn authorization_url(
        &self,
        shop: &ShopDomain,
        redirect_uri: &str,
        scopes: &[String],
        state: &str,
    ) -> String {
        let scope = scopes.join(",");
        format!(
            "https://{shop}/admin/oauth/authorize?client_id={}&scope={}&redirect_uri={}&state={}",
            urlencoding::encode(&self.inner.api_key),
            urlencoding::encode(&scope),
            urlencoding::encode(redirect_uri),
            urlencoding::encode(state)
        )
    }

    /// Exchange an authorization code for an access token.
    ///
    /// Call this in the OAuth callback handler after the merchant approves.
    ///
    /// # Errors
    ///
    /// Returns `ShopifyError::OAuth` if the exchange is rejected and
    /// `ShopifyError::Http` if the request itself fails.
    pub async fn exchange_code(
        &self,
        shop: &ShopDomain,
        code: &str,
    ) -> Result<AccessTokenGrant, ShopifyError> {
        let url = format!("{}/admin/oauth/access_token", self.base_url(shop));

        let params = [
            ("client_id", self.inner.api_key.as_str()),
            ("client_secret", self.inner.api_secret.as_str()),
            ("code", code),
        ];

        let response = self.inner.client.post(&url).form(&params).send().await?;

        if !response.status().is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(ShopifyError::OAuth(format!("Token exchange failed: {text}")));
        }

        Ok(response.json().await?)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // GraphQL Execution
    // ─────────────────────────────────────────────────────────────────────────

    /// Execute a GraphQL document against the shop's Admin API.
    async fn query<T: DeserializeOwned>(
        &self,
        shop: &ShopDomain,
        token: &SecretString,
        document: &str,
        variables: serde_json::Value,
    ) -> Result<T, ShopifyError> {
        let request = GraphQLRequest {
            query: document.to_string(),
            variables: Some(variables),
        };

        let response = self
            .inner
            .client
            .post(self.graphql_endpoint(shop))
            .header("X-Shopify-Access-Token", token.expose_secret())
            .header("Content-Type", "application/json")
            .json(&request)
            .send()
            .await?;

        // A non-success envelope is preserved as-is so the caller can
        // forward the original status and body.
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ShopifyError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let envelope: GraphQLResponse<T> = response.json().await?;
        envelope.into_result()
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Customer Operations
    // ─────────────────────────────────────────────────────────────────────────

    /// Look up customers by exact email match, first page only.
    ///
    /// An empty result means "no existing customer". Transport failures and
    /// non-success upstream statuses are errors, never an empty list.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self, token))]
    pub async fn find_customers_by_email(
        &self,
        shop: &ShopDomain,
        token: &SecretString,
        email: &str,
    ) -> Result<Vec<CustomerNode>, ShopifyError> {
        #[derive(Deserialize)]
        struct Response {
            customers: Connection,
        }

        #[derive(Deserialize)]
        struct Connection {
            edges: Vec<Edge>,
        }

        #[derive(Deserialize)]
        struct Edge {
            node: CustomerNode,
        }

        const QUERY: &str = r#"
            query customersByEmail($first: Int!, $query: String) {
                customers(first: $first, query: $query) {
                    edges {
                        node {
                            id
                            state
                            email
                            locale
                            metafield(namespace: "custom", key: "quiz_results") {
                                id
                                value
                            }
                        }
                    }
                }
            }
        "#;

        let variables = serde_json::json!({
            "first": LOOKUP_PAGE_SIZE,
            "query": format!("email:{email}"),
        });

        let response: Response = self.query(shop, token, QUERY, variables).await?;

        Ok(response
            .customers
            .edges
            .into_iter()
            .map(|e| e.node)
            .collect())
    }

    /// Overwrite (or attach) the quiz-results metafield on an existing
    /// customer.
    ///
    /// When `metafield_id` is known the exact metafield is overwritten;
    /// otherwise a new one is attached under the fixed coordinate in the
    /// same mutation.
    ///
    /// # Errors
    ///
    /// Returns `ShopifyError::UserError` with the first validation message
    /// if the mutation reports `userErrors`, or another variant if the API
    /// request fails.
    #[instrument(skip(self, token, value))]
    pub async fn update_customer_quiz_results(
        &self,
        shop: &ShopDomain,
        token: &SecretString,
        customer_id: CustomerId,
        metafield_id: Option<MetafieldId>,
        value: String,
    ) -> Result<CustomerNode, ShopifyError> {
        #[derive(Deserialize)]
        struct Response {
            #[serde(rename = "customerUpdate")]
            customer_update: MutationPayload,
        }

        const QUERY: &str = r#"
            mutation customerQuizResultsUpdate($input: CustomerInput!) {
                customerUpdate(input: $input) {
                    customer {
                        id
                        email
                        locale
                        metafield(namespace: "custom", key: "quiz_results") {
                            id
                            value
                        }
                    }
                    userErrors {
                        field
                        message
                    }
                }
            }
        "#;

        let metafield = match metafield_id {
            Some(id) => MetafieldInput::keyed(id, value),
            None => MetafieldInput::attach(value),
        };
        let input = CustomerUpdateInput {
            id: customer_id,
            metafields: vec![metafield],
        };

        let variables = serde_json::json!({ "input": input });
        let response: Response = self.query(shop, token, QUERY, variables).await?;

        response.customer_update.into_customer("customerUpdate")
    }

    /// Create a customer with the quiz-results metafield pre-populated.
    ///
    /// # Errors
    ///
    /// Returns `ShopifyError::UserError` with the first validation message
    /// if the mutation reports `userErrors`, or another variant if the API
    /// request fails.
    #[instrument(skip(self, token, value))]
    pub async fn create_customer_with_quiz_results(
        &self,
        shop: &ShopDomain,
        token: &SecretString,
        email: &str,
        locale: Option<&str>,
        value: String,
    ) -> Result<CustomerNode, ShopifyError> {
        #[derive(Deserialize)]
        struct Response {
            #[serde(rename = "customerCreate")]
            customer_create: MutationPayload,
        }

        const QUERY: &str = r#"
            mutation customerQuizResultsCreate($input: CustomerInput!) {
                customerCreate(input: $input) {
                    customer {
                        id
                        email
                        locale
                        metafield(namespace: "custom", key: "quiz_results") {
                            id
                            value
                        }
                    }
                    userErrors {
                        field
                        message
                    }
                }
            }
        "#;

        let input = CustomerCreateInput {
            email: email.to_string(),
            locale: locale.map(String::from),
            metafields: vec![MetafieldInput::attach(value)],
        };

        let variables = serde_json::json!({ "input": input });
        let response: Response = self.query(shop, token, QUERY, variables).await?;

        response.customer_create.into_customer("customerCreate")
    }
}

/// Shared payload shape of both customer mutations.
#[derive(Debug, Deserialize)]
struct MutationPayload {
    customer: Option<CustomerNode>,
    #[serde(rename = "userErrors", default)]
    user_errors: Vec<UserError>,
}

impl MutationPayload {
    /// Surface the first `userError` message, or the customer node.
    fn into_customer(self, mutation: &str) -> Result<CustomerNode, ShopifyError> {
        if let Some(first) = self.user_errors.into_iter().next() {
            return Err(ShopifyError::UserError(first.message));
        }

        self.customer
            .ok_or_else(|| ShopifyError::GraphQL(vec![format!("No customer returned from {mutation}")]))
    }
}
