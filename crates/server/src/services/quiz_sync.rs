//! Quiz-results synchronization.
//!
//! Reconciles one quiz submission with the customer store: look the
//! customer up by email, then either overwrite the existing quiz-results
//! metafield or create the customer with it pre-populated. Exactly one
//! write call per submission, never both, and no retries - a failed call
//! surfaces to the handler as-is.
//!
//! Two submissions for the same unknown email can race: both observe "no
//! existing customer" and both issue a create. Closing that would need an
//! atomic upsert on the platform side; the duplicate is left to the
//! platform's own email-uniqueness validation, which fails the loser with
//! a `userError`.

use quiz_bridge_core::{CustomerId, Email, MetafieldId, ShopDomain};
use secrecy::SecretString;
use serde::Serialize;
use tracing::instrument;

use crate::shopify::{AdminClient, CustomerNode, ShopifyError};

/// An inbound quiz submission.
#[derive(Debug)]
pub struct QuizSubmission {
    /// Customer email the results belong to.
    pub email: Email,
    /// Arbitrary results value; stored JSON-encoded in the metafield.
    pub results: serde_json::Value,
    /// Customer locale, forwarded on create only.
    pub locale: Option<String>,
}

/// Which write the reconciliation performed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncAction {
    /// An existing customer's metafield was written.
    Updated,
    /// A new customer was created with the metafield.
    Created,
}

/// Outcome of a synchronization, echoed to the caller.
#[derive(Debug, Serialize)]
pub struct SyncReceipt {
    /// Which mutation ran.
    pub action: SyncAction,
    /// The customer node the mutation returned.
    pub customer: CustomerNode,
}

/// The write the lookup result calls for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpsertPlan {
    /// No match: create the customer with the metafield.
    Create,
    /// At least one match: write the first node's metafield.
    Update {
        customer: CustomerId,
        /// Set iff the node already carries the quiz-results metafield;
        /// decides keyed-overwrite vs attach-new.
        metafield: Option<MetafieldId>,
    },
}

impl UpsertPlan {
    /// Decide the write from the lookup result.
    ///
    /// The first returned node is authoritative; there is no tie-break
    /// beyond the platform's own ordering.
    #[must_use]
    pub fn from_matches(matches: &[CustomerNode]) -> Self {
        match matches.first() {
            Some(node) => Self::Update {
                customer: node.id.clone(),
                metafield: node.metafield.as_ref().map(|m| m.id.clone()),
            },
            None => Self::Create,
        }
    }
}

/// Reconcile a submission with the customer store.
///
/// # Errors
///
/// Returns `ShopifyError::Parse` if the results value cannot be serialized,
/// `ShopifyError::UserError` for mutation validation failures, and the
/// transport variants for everything the platform call can fail with.
#[instrument(skip_all, fields(shop = %shop, email = %submission.email))]
pub async fn sync_submission(
    client: &AdminClient,
    shop: &ShopDomain,
    token: &SecretString,
    submission: &QuizSubmission,
) -> Result<SyncReceipt, ShopifyError> {
    // Serialized once; the stored string parses back to the exact value.
    let value = serde_json::to_string(&submission.results)?;

    let matches = client
        .find_customers_by_email(shop, token, submission.email.as_str())
        .await?;

    match UpsertPlan::from_matches(&matches) {
        UpsertPlan::Update {
            customer,
            metafield,
        } => {
            tracing::debug!(customer = %customer, keyed = metafield.is_some(), "updating existing customer");
            let node = client
                .update_customer_quiz_results(shop, token, customer, metafield, value)
                .await?;
            Ok(SyncReceipt {
                action: SyncAction::Updated,
                customer: node,
            })
        }
        UpsertPlan::Create => {
            tracing::debug!("creating new customer");
            let node = client
                .create_customer_with_quiz_results(
                    shop,
                    token,
                    submission.email.as_str(),
                    submission.locale.as_deref(),
                    value,
                )
                .await?;
            Ok(SyncReceipt {
                action: SyncAction::Created,
                customer: node,
            })
        }
    }
}
