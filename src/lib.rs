pub mod config;
pub mod logic;
pub mod model;
pub mod store;

// Export the pipeline steps
pub use logic::{
    run, HaltReason, Propagator, Resolution, Resolver, RunOutcome, Shaper, Unresolved,
    WalkOutcome,
};

// Export all model types
pub use model::*;

// Export store types
pub use store::{RallyService, ServiceError, WorkItemService};
