// Service Manager Library - lifecycle orchestration for independent services
// Drives registered services through start, stop and destroy with a bounded
// time budget per phase, isolating failures per service.

pub mod errors;
pub mod lifecycle;
pub mod manager;
pub mod config;
pub mod telemetry;
pub mod observability;

// Re-export key types for easy access
pub use errors::{ErrorKind, ServiceError};
pub use lifecycle::{
    OutcomeStatus, Phase, Service, ServiceResult, ServiceStatus, ServiceWrapper, State,
    StateMachine,
};
pub use manager::ServiceManager;
pub use config::{ServiceManagerOptions, DEFAULT_TIMEOUT_MS};
pub use telemetry::{init_telemetry, shutdown_telemetry, generate_correlation_id};
pub use observability::PhaseTimer;
