//! Caller identity and ownership checks.
//!
//! Identity comes from outside the service: in proxy mode a trusted fronting
//! proxy names the caller's pharmacy, otherwise every caller is anonymous.

use medfinder_core::config::AuthMethod;

use crate::error::{ServiceError, ServiceResult};

pub mod depot_keys {
    pub const CALLER: &str = "__caller";
}

/// The identity a request acts under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Caller {
    #[default]
    Anonymous,
    /// The owner of the pharmacy record with this id.
    Pharmacy(uuid::Uuid),
}

/// Get the caller from the depot, anonymous when none was set.
#[must_use]
pub fn caller_from_depot(depot: &salvo::Depot) -> Caller {
    depot
        .get::<Caller>(depot_keys::CALLER)
        .ok()
        .copied()
        .unwrap_or_default()
}

/// ## Summary
/// Checks that `caller` may mutate the pharmacy record `target`.
///
/// In open mode every mutation is allowed. In proxy mode only the owner may
/// mutate a record.
///
/// ## Errors
/// Returns `Forbidden` when the caller is anonymous or owns another record.
pub fn authorize_mutation(caller: Caller, method: AuthMethod, target: uuid::Uuid) -> ServiceResult<()> {
    match (method, caller) {
        (AuthMethod::Open, _) => Ok(()),
        (AuthMethod::Proxy, Caller::Pharmacy(id)) if id == target => Ok(()),
        (AuthMethod::Proxy, Caller::Pharmacy(id)) => {
            tracing::warn!(caller = %id, target = %target, "Rejected mutation of another pharmacy");
            Err(ServiceError::Forbidden(
                "You can only modify your own pharmacy".to_string(),
            ))
        }
        (AuthMethod::Proxy, Caller::Anonymous) => Err(ServiceError::Forbidden(
            "Authentication required".to_string(),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn open_mode_allows_everyone() {
        let target = uuid::Uuid::now_v7();
        assert!(authorize_mutation(Caller::Anonymous, AuthMethod::Open, target).is_ok());
        assert!(
            authorize_mutation(Caller::Pharmacy(uuid::Uuid::nil()), AuthMethod::Open, target)
                .is_ok()
        );
    }

    #[test]
    fn proxy_mode_allows_only_the_owner() {
        let target = uuid::Uuid::now_v7();
        assert!(authorize_mutation(Caller::Pharmacy(target), AuthMethod::Proxy, target).is_ok());
        assert!(matches!(
            authorize_mutation(Caller::Pharmacy(uuid::Uuid::nil()), AuthMethod::Proxy, target),
            Err(ServiceError::Forbidden(_))
        ));
        assert!(matches!(
            authorize_mutation(Caller::Anonymous, AuthMethod::Proxy, target),
            Err(ServiceError::Forbidden(_))
        ));
    }

    #[test]
    fn missing_depot_entry_is_anonymous() {
        let mut depot = salvo::Depot::new();
        assert_eq!(caller_from_depot(&depot), Caller::Anonymous);

        let id = uuid::Uuid::now_v7();
        depot.insert(depot_keys::CALLER, Caller::Pharmacy(id));
        assert_eq!(caller_from_depot(&depot), Caller::Pharmacy(id));
    }
}
