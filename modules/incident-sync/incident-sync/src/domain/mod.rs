pub mod credentials;
pub mod mirror;
pub mod ports;
pub mod repo;
pub mod router;
pub mod service;
pub mod telemetry;
