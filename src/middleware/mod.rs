mod admin_auth;
mod gate;

pub use admin_auth::require_admin;
pub use gate::{enforce_limit, is_passthrough_path, request_gate};
