//! Import module - pipeline from remote API definitions to built services.
//!
//! This module provides the core of the importer:
//! - **Builder**: pure planning of a service tree plus a single commit step
//!   via [`plan_service`] and [`commit`]
//! - **Importer**: batch orchestration with cancellation and error
//!   aggregation via [`ApiImporter`]
//! - **Memory**: a reference in-memory [`ServiceContainer`](crate::traits::ServiceContainer)
//!   implementation via [`InMemoryContainer`]

pub mod builder;
pub mod importer;
pub mod memory;

// Re-export commonly used types
pub use builder::{
    commit, endpoint_url, plan_service, BuildError, MethodPlan, ParameterPlan, ResourcePlan,
    ServicePlan, DEFAULT_REQUEST_NAME,
};

pub use importer::{
    ApiImporter, ImportFailure, ImportReport, ItemError, StartError, ERROR_REPORT_TAIL,
};

pub use memory::{
    InMemoryContainer, MethodRecord, ParameterRecord, ResourceRecord, ServiceRecord,
};
