/// Route Table Assembly
///
/// Routes are grouped by access level. Each group registers into the same
/// `RouteTable`; protection comes from the guard ids listed per route, not from layers.

/// Routes open to anyone.
pub mod public;

/// The admin login/logout flow and the guarded admin area.
pub mod admin;

use crate::routing::{PatternError, RouteTable};

/// route_table
///
/// The full application table. Public routes are registered first, so within a method
/// they take priority over admin routes with overlapping patterns.
pub fn route_table() -> Result<RouteTable, PatternError> {
    let mut table = RouteTable::new();
    public::register(&mut table)?;
    admin::register(&mut table)?;
    Ok(table)
}
