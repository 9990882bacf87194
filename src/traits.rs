//! Collaborator boundaries for the import pipeline.
//!
//! This module defines the capabilities the host injects into the importer:
//! - Remote definition access via [`ApiReader`]
//! - Target model mutation via [`ServiceContainer`]
//! - User feedback via [`ProgressSink`]
//! - Standardized error types for each boundary
//!
//! The pipeline itself never performs I/O or touches the host's data model
//! directly; everything flows through these traits.

use async_trait::async_trait;
use thiserror::Error;

use crate::model::{Api, ApiDescription, ParameterStyle};

// ============================================================================
// Reader Boundary
// ============================================================================

/// Errors that can occur while fetching a remote API definition.
#[derive(Error, Debug)]
pub enum FetchError {
    /// The configured account credentials were rejected
    #[error("the access credentials are invalid")]
    InvalidCredentials,

    /// The provider host could not be reached
    #[error("the \"{0}\" host is unavailable or invalid")]
    UnavailableHost(String),

    /// The provider answered but returned no usable data
    #[error("no data available at the \"{0}\" location")]
    UnavailableData(String),

    /// The response body is not parseable JSON
    #[error("cannot parse the response from \"{0}\" as JSON")]
    InvalidJson(String),

    /// The response parsed but does not have the expected shape
    #[error("unexpected response format for the {0}")]
    UnexpectedFormat(String),

    /// Generic I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Capability to fetch fully-typed API definitions from the remote account.
///
/// Implementations wrap the provider SDK or raw HTTP calls; the pipeline
/// only sees the normalized [`Api`] entities they produce.
///
/// # Thread Safety
///
/// Implementations must be `Send + Sync`: the importer runs on a background
/// worker while the host keeps a handle on its own thread.
#[async_trait]
pub trait ApiReader: Send + Sync {
    /// Returns the region the account is configured for.
    ///
    /// Used to derive service endpoints; must not be empty.
    fn region(&self) -> &str;

    /// Fetches the full definition for one described API.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError`] if the definition cannot be retrieved or
    /// parsed. The error message is user-facing: it ends up in the
    /// aggregated import report.
    async fn fetch(&self, description: &ApiDescription) -> Result<Api, FetchError>;
}

// ============================================================================
// Target Container Boundary
// ============================================================================

/// Errors a target container can raise when a creation call is rejected.
#[derive(Error, Debug)]
pub enum ContainerError {
    /// An object with the same name already exists at the same level
    #[error("a {kind} named \"{name}\" already exists")]
    DuplicateName { kind: &'static str, name: String },

    /// A handle does not refer to a live object
    #[error("unknown {kind} handle")]
    UnknownHandle { kind: &'static str },

    /// Any other container-specific rejection
    #[error("{0}")]
    Rejected(String),
}

/// Capability to materialize built services in the host's data model.
///
/// The builder drives this trait with fine-grained creation calls while
/// walking a [`ServicePlan`](crate::import::ServicePlan); the handles
/// returned by creation calls are only ever used for subsequent calls on the
/// same container.
///
/// Mutation is single-writer by construction: the importer holds the only
/// `&mut` reference for the duration of a run.
pub trait ServiceContainer: Send {
    /// Handle to a created service; returned to the caller as the built output
    type Service: Send;

    /// Handle to a created resource
    type Resource;

    /// Handle to a created method
    type Method;

    /// Creates a new, empty service.
    fn create_service(
        &mut self,
        name: &str,
        description: &str,
        base_path: &str,
    ) -> Result<Self::Service, ContainerError>;

    /// Registers an endpoint URL on a service.
    fn add_endpoint(&mut self, service: &Self::Service, url: &str) -> Result<(), ContainerError>;

    /// Creates a resource under `parent`, or a root resource when `parent`
    /// is `None`.
    fn add_resource(
        &mut self,
        service: &Self::Service,
        parent: Option<&Self::Resource>,
        name: &str,
        path: &str,
        description: &str,
    ) -> Result<Self::Resource, ContainerError>;

    /// Creates a method with the given HTTP verb on a resource.
    fn add_method(
        &mut self,
        resource: &Self::Resource,
        name: &str,
        verb: &str,
    ) -> Result<Self::Method, ContainerError>;

    /// Adds a typed parameter to a method.
    fn add_parameter(
        &mut self,
        method: &Self::Method,
        name: &str,
        style: &ParameterStyle,
        required: bool,
    ) -> Result<(), ContainerError>;

    /// Adds a named example request to a method.
    fn add_request(&mut self, method: &Self::Method, name: &str) -> Result<(), ContainerError>;

    /// Removes a service and everything under it.
    ///
    /// The builder calls this to discard partial artifacts when a build
    /// fails midway.
    fn remove_service(&mut self, service: Self::Service) -> Result<(), ContainerError>;
}

// ============================================================================
// Progress Boundary
// ============================================================================

/// Coarse progress feedback for a running import.
///
/// `progress` is invoked after every processed item; `completed` exactly
/// once when the run reaches a terminal state, with `success = false` for
/// cancelled or partially failed runs.
pub trait ProgressSink: Send + Sync {
    fn progress(&self, current: usize, total: usize);

    fn completed(&self, success: bool);
}

impl<P: ProgressSink + ?Sized> ProgressSink for std::sync::Arc<P> {
    fn progress(&self, current: usize, total: usize) {
        (**self).progress(current, total);
    }

    fn completed(&self, success: bool) {
        (**self).completed(success);
    }
}

/// Sink that discards all progress, for headless hosts.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullProgress;

impl ProgressSink for NullProgress {
    fn progress(&self, _current: usize, _total: usize) {}

    fn completed(&self, _success: bool) {}
}
