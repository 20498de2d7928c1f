use serde::{Deserialize, Serialize};

use super::domain::{Role, VendorId};
use super::error::WorkflowError;

/// Caller context supplied by the host's identity check. The engine trusts
/// it and performs no credential verification of its own; it is threaded
/// explicitly into every vendor-facing operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub role: Role,
    pub vendor_id: Option<VendorId>,
}

impl Identity {
    pub fn admin() -> Self {
        Self {
            role: Role::Admin,
            vendor_id: None,
        }
    }

    pub fn vendor(vendor_id: VendorId) -> Self {
        Self {
            role: Role::Vendor,
            vendor_id: Some(vendor_id),
        }
    }

    /// The vendor behind the call, for operations only vendors perform.
    pub fn require_vendor(&self) -> Result<VendorId, WorkflowError> {
        self.vendor_id
            .ok_or_else(|| WorkflowError::bad_request("caller is not a vendor"))
    }
}
