//! Incident sync API trait.

use async_trait::async_trait;

use crate::envelope::Envelope;
use crate::models::InboundRequest;

/// Public API of the incident sync gateway.
///
/// One call is one invocation: credentials are acquired, the request is
/// dispatched to an incident operation, and the outcome is normalized into an
/// [`Envelope`]. Implementations never fail; every error is reported in-band.
#[async_trait]
pub trait IncidentSyncApi: Send + Sync {
    /// Handle a single inbound request.
    async fn handle(&self, req: InboundRequest) -> Envelope;
}
