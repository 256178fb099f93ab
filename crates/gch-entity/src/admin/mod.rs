//! Admin profiles: the authorization records for back-office access.

pub mod model;
pub mod role;

pub use model::{AdminProfile, NewAdminProfile, UpdateAdminProfile};
pub use role::AdminRole;
