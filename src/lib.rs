pub mod configuration;
pub mod session;
