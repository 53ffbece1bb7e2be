pub mod call;
pub mod config;
pub mod endpoints;
pub mod invoke;
pub mod plan;
pub mod validate;
