//! Contact snapshots.
//!
//! Shipment labels must not change when a user later edits their profile, so
//! the profile is read once and frozen into the shipment row.

use serde::{Deserialize, Serialize};

use crate::users;

/// A party's contact data frozen at snapshot time.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactSnapshot {
    pub name: String,
    pub phone: String,
    pub address: String,
}

impl ContactSnapshot {
    /// Freeze a user's current profile.
    ///
    /// A non-empty `fallback_address` (the destination entered on the trade)
    /// takes priority over the profile address.
    pub fn from_profile(user: &users::Model, fallback_address: Option<&str>) -> Self {
        let address = match fallback_address {
            Some(addr) if !addr.trim().is_empty() => addr.trim().to_string(),
            _ => user.address.clone().unwrap_or_default(),
        };
        Self {
            name: user
                .display_name
                .clone()
                .filter(|n| !n.is_empty())
                .unwrap_or_else(|| user.username.clone()),
            phone: user.phone.clone().unwrap_or_default(),
            address,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn profile() -> users::Model {
        users::Model {
            username: "alice".to_string(),
            password: "pw".to_string(),
            display_name: Some("Alice A.".to_string()),
            phone: Some("090-0000-0000".to_string()),
            address: Some("1-2-3 Home St".to_string()),
        }
    }

    #[test]
    fn fallback_address_wins() {
        let snap = ContactSnapshot::from_profile(&profile(), Some("9-9 Office Rd"));
        assert_eq!(snap.address, "9-9 Office Rd");
        assert_eq!(snap.name, "Alice A.");
    }

    #[test]
    fn blank_fallback_keeps_profile_address() {
        let snap = ContactSnapshot::from_profile(&profile(), Some("  "));
        assert_eq!(snap.address, "1-2-3 Home St");
    }

    #[test]
    fn username_stands_in_for_missing_display_name() {
        let mut user = profile();
        user.display_name = None;
        let snap = ContactSnapshot::from_profile(&user, None);
        assert_eq!(snap.name, "alice");
    }
}
