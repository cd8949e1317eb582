pub mod activity;
pub mod intervals;
pub mod revocation;
pub mod tokens;
