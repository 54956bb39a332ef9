//! Wire types for the Admin API customer operations.

use quiz_bridge_core::{CustomerId, MetafieldId};
use serde::{Deserialize, Serialize};

/// Namespace of the quiz-results metafield.
pub const QUIZ_METAFIELD_NAMESPACE: &str = "custom";

/// Key of the quiz-results metafield.
pub const QUIZ_METAFIELD_KEY: &str = "quiz_results";

/// Metafield content type; the value is a JSON-encoded string.
pub const QUIZ_METAFIELD_TYPE: &str = "json";

/// A customer node as returned by the lookup query and the mutations.
///
/// This is a fresh, partial view - only the fields this service reads.
/// The `metafield` field is present only when the quiz-results metafield
/// was previously set.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerNode {
    /// Opaque platform identifier.
    pub id: CustomerId,
    /// Customer email as known to the platform.
    pub email: Option<String>,
    /// Account state (e.g., `ENABLED`, `DISABLED`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
    /// Customer locale.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub locale: Option<String>,
    /// The quiz-results metafield, if previously set.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metafield: Option<Metafield>,
}

/// The quiz-results metafield attached to a customer.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Metafield {
    /// Opaque metafield identifier.
    pub id: MetafieldId,
    /// JSON-encoded metafield value.
    pub value: String,
}

/// A structured, field-level error returned inside a successful mutation
/// response - distinct from transport errors.
#[derive(Debug, Clone, Deserialize)]
pub struct UserError {
    /// Input path the error refers to, if any.
    #[serde(default)]
    pub field: Option<Vec<String>>,
    /// Human-readable error message.
    pub message: String,
}

/// One entry of a mutation's `metafields` input list.
///
/// Exactly one of two shapes is sent: keyed (`id` set, namespace and key
/// omitted) to overwrite an existing metafield, or attach (`namespace` and
/// `key` set, no id) to create one on the customer in the same mutation.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MetafieldInput {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<MetafieldId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub namespace: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub key: Option<&'static str>,
    pub value: String,
    #[serde(rename = "type")]
    pub value_type: &'static str,
}

impl MetafieldInput {
    /// Keyed update: overwrite the metafield with the given id.
    #[must_use]
    pub fn keyed(id: MetafieldId, value: String) -> Self {
        Self {
            id: Some(id),
            namespace: None,
            key: None,
            value,
            value_type: QUIZ_METAFIELD_TYPE,
        }
    }

    /// Attach a new quiz-results metafield under the fixed coordinate.
    #[must_use]
    pub fn attach(value: String) -> Self {
        Self {
            id: None,
            namespace: Some(QUIZ_METAFIELD_NAMESPACE),
            key: Some(QUIZ_METAFIELD_KEY),
            value,
            value_type: QUIZ_METAFIELD_TYPE,
        }
    }
}

/// Input for the `customerUpdate` mutation.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerUpdateInput {
    pub id: CustomerId,
    pub metafields: Vec<MetafieldInput>,
}

/// Input for the `customerCreate` mutation.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerCreateInput {
    pub email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub locale: Option<String>,
    pub metafields: Vec<MetafieldInput>,
}
