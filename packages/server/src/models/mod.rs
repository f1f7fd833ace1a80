pub mod auth;
pub mod identification;
pub mod shared;
