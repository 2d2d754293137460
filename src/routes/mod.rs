/// Router Module Index
///
/// Routes are grouped by the resource they serve. Each group also declares the
/// role requirements of its routes next to the routes themselves; the access
/// guard reads the merged [`AccessPolicy`] at dispatch time.
use crate::auth::AccessPolicy;

/// Health check, login. Never gated.
pub mod public;

/// Category CRUD. Mutations carry no role requirement.
pub mod categories;

/// City CRUD. Mutations require `Role::Admin`.
pub mod cities;

/// The complete route-to-role map for the application router.
pub fn access_policy() -> AccessPolicy {
    cities::city_policy(categories::category_policy(AccessPolicy::new()))
}
