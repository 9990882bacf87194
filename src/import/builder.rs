//! Service tree builder.
//!
//! Converts a fetched [`Api`] into a target-model service in two steps:
//! 1. [`plan_service`] maps the source hierarchy into a plain
//!    [`ServicePlan`] tree, a pure function with no container access
//! 2. [`commit`] materializes a plan against a [`ServiceContainer`] in one
//!    pass, rolling the service back if any creation call is rejected
//!
//! Keeping traversal separate from container side effects lets the planning
//! logic be unit-tested without a container at all.

use thiserror::Error;
use tracing::warn;

use crate::model::{Api, HttpResource, ParameterStyle};
use crate::traits::{ContainerError, ServiceContainer};

/// Name of the example request attached to every imported method.
///
/// Downstream tooling expects at least one concrete request template per
/// method.
pub const DEFAULT_REQUEST_NAME: &str = "Request 1";

// ============================================================================
// Plan Types
// ============================================================================

/// Plain description of one service to be created in a target container.
#[derive(Debug, Clone, PartialEq)]
pub struct ServicePlan {
    pub name: String,
    pub description: String,
    pub base_path: String,
    /// Endpoint derived from the API id and the account region
    pub endpoint: String,
    /// Stage resource (or the "root" fallback); the source tree hangs below it
    pub root: ResourcePlan,
}

/// Planned resource node.
#[derive(Debug, Clone, PartialEq)]
pub struct ResourcePlan {
    pub name: String,
    pub path: String,
    pub description: String,
    pub methods: Vec<MethodPlan>,
    pub children: Vec<ResourcePlan>,
}

/// Planned method on a resource.
#[derive(Debug, Clone, PartialEq)]
pub struct MethodPlan {
    pub name: String,
    /// HTTP verb, passed through from the source definition
    pub verb: String,
    pub parameters: Vec<ParameterPlan>,
    pub requests: Vec<String>,
}

/// Planned parameter on a method.
#[derive(Debug, Clone, PartialEq)]
pub struct ParameterPlan {
    pub name: String,
    pub style: ParameterStyle,
    pub required: bool,
}

// ============================================================================
// Builder Errors
// ============================================================================

/// Failure to materialize a plan against a target container.
#[derive(Error, Debug)]
pub enum BuildError {
    /// The container rejected a creation call
    #[error("failed to create {kind} \"{name}\": {source}")]
    Creation {
        kind: &'static str,
        name: String,
        #[source]
        source: ContainerError,
    },
}

impl BuildError {
    fn creation(kind: &'static str, name: &str, source: ContainerError) -> Self {
        BuildError::Creation {
            kind,
            name: name.to_string(),
            source,
        }
    }
}

// ============================================================================
// Planning
// ============================================================================

/// Derives the service endpoint for an API id in a region.
///
/// The template is fixed by the provider:
/// `https://{id}.execute-api.{region}.amazonaws.com`.
pub fn endpoint_url(api_id: &str, region: &str) -> String {
    format!("https://{api_id}.execute-api.{region}.amazonaws.com")
}

/// Plans the target service tree for a fetched API.
///
/// The plan mirrors the source hierarchy node for node, pre-order and
/// order-preserving. When the API carries no stage, the tree is rooted at a
/// resource named `"root"` with an empty path and description; otherwise the
/// root is named and pathed after the stage.
pub fn plan_service(api: &Api, region: &str) -> ServicePlan {
    let root = match &api.stage {
        Some(stage) => ResourcePlan {
            name: stage.name.clone(),
            path: stage.name.clone(),
            description: stage.description.clone(),
            methods: Vec::new(),
            children: plan_children(&api.root_resource),
        },
        None => ResourcePlan {
            name: "root".to_string(),
            path: String::new(),
            description: String::new(),
            methods: Vec::new(),
            children: plan_children(&api.root_resource),
        },
    };

    ServicePlan {
        name: api.name.clone(),
        description: api.description.clone(),
        base_path: api.base_url.clone(),
        endpoint: endpoint_url(&api.id, region),
        root,
    }
}

fn plan_children(source: &HttpResource) -> Vec<ResourcePlan> {
    source.resources.iter().map(plan_resource).collect()
}

fn plan_resource(source: &HttpResource) -> ResourcePlan {
    ResourcePlan {
        name: source.name.clone(),
        path: source.path.clone(),
        description: String::new(),
        methods: source
            .methods
            .iter()
            .map(|method| MethodPlan {
                name: method.name.clone(),
                verb: method.http_method.clone(),
                parameters: method
                    .parameters
                    .iter()
                    .map(|param| ParameterPlan {
                        name: param.name.clone(),
                        style: param.style.clone(),
                        required: param.required,
                    })
                    .collect(),
                requests: vec![DEFAULT_REQUEST_NAME.to_string()],
            })
            .collect(),
        children: plan_children(source),
    }
}

// ============================================================================
// Commit
// ============================================================================

/// Materializes a plan against a target container.
///
/// Creates the service, its endpoint, the root resource, and then the whole
/// planned tree depth-first. If any creation call is rejected the service is
/// removed again so the container holds no partial artifacts, and the
/// original rejection is returned.
///
/// # Errors
///
/// Returns [`BuildError`] naming the object whose creation the container
/// rejected.
pub fn commit<C: ServiceContainer>(
    plan: &ServicePlan,
    container: &mut C,
) -> Result<C::Service, BuildError> {
    let service = container
        .create_service(&plan.name, &plan.description, &plan.base_path)
        .map_err(|source| BuildError::creation("service", &plan.name, source))?;

    match commit_tree(plan, &service, container) {
        Ok(()) => Ok(service),
        Err(err) => {
            // Discard whatever was created for this API before the rejection.
            if let Err(cleanup) = container.remove_service(service) {
                warn!(service = %plan.name, error = %cleanup, "failed to remove partially built service");
            }
            Err(err)
        }
    }
}

fn commit_tree<C: ServiceContainer>(
    plan: &ServicePlan,
    service: &C::Service,
    container: &mut C,
) -> Result<(), BuildError> {
    container
        .add_endpoint(service, &plan.endpoint)
        .map_err(|source| BuildError::creation("endpoint", &plan.endpoint, source))?;

    let root = container
        .add_resource(
            service,
            None,
            &plan.root.name,
            &plan.root.path,
            &plan.root.description,
        )
        .map_err(|source| BuildError::creation("resource", &plan.root.name, source))?;

    commit_resource(&plan.root, service, &root, container)
}

/// Creates the methods of `plan` on `resource`, then recurses into its
/// children in order.
fn commit_resource<C: ServiceContainer>(
    plan: &ResourcePlan,
    service: &C::Service,
    resource: &C::Resource,
    container: &mut C,
) -> Result<(), BuildError> {
    for method in &plan.methods {
        let handle = container
            .add_method(resource, &method.name, &method.verb)
            .map_err(|source| BuildError::creation("method", &method.name, source))?;

        for param in &method.parameters {
            container
                .add_parameter(&handle, &param.name, &param.style, param.required)
                .map_err(|source| BuildError::creation("parameter", &param.name, source))?;
        }

        for request in &method.requests {
            container
                .add_request(&handle, request)
                .map_err(|source| BuildError::creation("request", request, source))?;
        }
    }

    for child in &plan.children {
        let handle = container
            .add_resource(service, Some(resource), &child.name, &child.path, &child.description)
            .map_err(|source| BuildError::creation("resource", &child.name, source))?;

        commit_resource(child, service, &handle, container)?;
    }

    Ok(())
}

// ============================================================================
// Tests
// ============================================================================
