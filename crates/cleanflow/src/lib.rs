//! Job lifecycle, reliability tiering, and smart matching for a cleaning-services marketplace.
//!
//! The engines are stateless computations over records fetched by the caller. Persistence,
//! notification delivery, and payment settlement stay behind the collaborator traits each
//! workflow exposes.

pub mod config;
pub mod error;
pub mod geo;
pub mod telemetry;
pub mod workflows;
