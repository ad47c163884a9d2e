/// Route component constants shared across crates
pub const API_ROUTE_COMPONENT: &str = "api";
pub const API_ROUTE_PREFIX: &str = const_str::concat!("/", API_ROUTE_COMPONENT);

pub const HEALTH_ROUTE_COMPONENT: &str = "health";
pub const HEALTH_ROUTE_PREFIX: &str =
    const_str::concat!(API_ROUTE_PREFIX, "/", HEALTH_ROUTE_COMPONENT);

pub const USERS_ROUTE_COMPONENT: &str = "users";
pub const USERS_ROUTE_PREFIX: &str =
    const_str::concat!(API_ROUTE_PREFIX, "/", USERS_ROUTE_COMPONENT);

pub const MEDICINES_ROUTE_COMPONENT: &str = "medicines";
pub const MEDICINES_ROUTE_PREFIX: &str =
    const_str::concat!(USERS_ROUTE_PREFIX, "/", MEDICINES_ROUTE_COMPONENT);

pub const UPDATE_MEDICINES_ROUTE_COMPONENT: &str = "updateMedicines";
pub const UPDATE_MEDICINES_ROUTE_PREFIX: &str =
    const_str::concat!(USERS_ROUTE_PREFIX, "/", UPDATE_MEDICINES_ROUTE_COMPONENT);

/// Meters per kilometer; search radii arrive in km, storage measures in m.
pub const METERS_PER_KILOMETER: f64 = 1000.0;
