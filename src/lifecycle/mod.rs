// Service Lifecycle Module
//
// State machine, timeout race and the wrapper that binds one service's hooks
// to its own lifecycle state.

pub mod types;
pub mod state_machine;
pub mod timeout;
pub mod traits;
pub mod wrapper;


pub use state_machine::StateMachine;
pub use timeout::race;
pub use traits::Service;
pub use types::{Phase, ServiceResult, State};
pub use wrapper::{OutcomeStatus, ServiceStatus, ServiceWrapper};
