//! Provisioning target configuration.

use std::fmt;

use serde::{Deserialize, Serialize};

/// The CID/UID pair to be written to every presented tag.
///
/// Configured once at startup and immutable for the process lifetime.
/// Numeric ranges and wire encoding are the device driver's concern.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProvisioningTarget {
    /// Customer identifier to write.
    pub cid: u32,

    /// Unique identifier to write.
    pub uid: u32,
}

impl ProvisioningTarget {
    /// Create a new target pair.
    pub fn new(cid: u32, uid: u32) -> Self {
        Self { cid, uid }
    }
}

impl fmt::Display for ProvisioningTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.cid, self.uid)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_target_display() {
        let target = ProvisioningTarget::new(77, 1_234_567_890);
        assert_eq!(target.to_string(), "77:1234567890");
    }

    #[test]
    fn test_target_serialization() {
        let target = ProvisioningTarget::new(77, 42);
        let json = serde_json::to_string(&target).unwrap();
        assert_eq!(json, r#"{"cid":77,"uid":42}"#);
    }
}
