use serde::{Deserialize, Serialize};

/// Ambient session values attached to every rule engine request.
///
/// Passed explicitly into the compiler and the HTTP adapters so neither reads
/// process-wide state.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionContext {
    pub access_token: String,
    /// Identifier of the loyalty program the rule belongs to.
    pub loyalty_type_id: String,
    pub company_id: u64,
}

impl SessionContext {
    pub fn new(
        access_token: impl Into<String>,
        loyalty_type_id: impl Into<String>,
        company_id: u64,
    ) -> Self {
        Self {
            access_token: access_token.into(),
            loyalty_type_id: loyalty_type_id.into(),
            company_id,
        }
    }
}
