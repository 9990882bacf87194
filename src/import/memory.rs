//! In-memory service container.
//!
//! Reference [`ServiceContainer`] implementation that records built services
//! as plain data. Used by the crate's own tests and by hosts that want to
//! stage an import before persisting it into their real model.

use crate::model::ParameterStyle;
use crate::traits::{ContainerError, ServiceContainer};

/// Records services keyed by a monotonically increasing id, in creation
/// order. Service and sibling-resource names must be unique at their level;
/// everything else is accepted as-is.
#[derive(Debug, Default)]
pub struct InMemoryContainer {
    next_id: u64,
    services: Vec<ServiceRecord>,
}

/// One recorded service with its resource tree.
#[derive(Debug, Clone, PartialEq)]
pub struct ServiceRecord {
    id: u64,
    pub name: String,
    pub description: String,
    pub base_path: String,
    pub endpoints: Vec<String>,
    /// Root resources in creation order
    pub resources: Vec<ResourceRecord>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ResourceRecord {
    pub name: String,
    pub path: String,
    pub description: String,
    pub methods: Vec<MethodRecord>,
    pub children: Vec<ResourceRecord>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MethodRecord {
    pub name: String,
    pub verb: String,
    pub parameters: Vec<ParameterRecord>,
    pub requests: Vec<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ParameterRecord {
    pub name: String,
    pub style: ParameterStyle,
    pub required: bool,
}

/// Opaque handle to a recorded service.
#[derive(Debug, Clone)]
pub struct ServiceHandle {
    id: u64,
}

/// Opaque handle to a recorded resource.
///
/// Encodes the index path from the service's root list down to the node.
/// Indices stay valid because resources are only ever appended.
#[derive(Debug, Clone)]
pub struct ResourceHandle {
    service: u64,
    path: Vec<usize>,
}

/// Opaque handle to a recorded method.
#[derive(Debug, Clone)]
pub struct MethodHandle {
    service: u64,
    path: Vec<usize>,
    index: usize,
}

impl InMemoryContainer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Recorded services in creation order.
    pub fn services(&self) -> &[ServiceRecord] {
        &self.services
    }

    fn service_mut(&mut self, id: u64) -> Result<&mut ServiceRecord, ContainerError> {
        self.services
            .iter_mut()
            .find(|service| service.id == id)
            .ok_or(ContainerError::UnknownHandle { kind: "service" })
    }

    fn resource_mut(
        &mut self,
        service: u64,
        path: &[usize],
    ) -> Result<&mut ResourceRecord, ContainerError> {
        let record = self.service_mut(service)?;
        let (first, rest) = path
            .split_first()
            .ok_or(ContainerError::UnknownHandle { kind: "resource" })?;

        let mut node = record
            .resources
            .get_mut(*first)
            .ok_or(ContainerError::UnknownHandle { kind: "resource" })?;
        for index in rest {
            node = node
                .children
                .get_mut(*index)
                .ok_or(ContainerError::UnknownHandle { kind: "resource" })?;
        }
        Ok(node)
    }
}

impl ServiceContainer for InMemoryContainer {
    type Service = ServiceHandle;
    type Resource = ResourceHandle;
    type Method = MethodHandle;

    fn create_service(
        &mut self,
        name: &str,
        description: &str,
        base_path: &str,
    ) -> Result<Self::Service, ContainerError> {
        if self.services.iter().any(|service| service.name == name) {
            return Err(ContainerError::DuplicateName {
                kind: "service",
                name: name.to_string(),
            });
        }

        let id = self.next_id;
        self.next_id += 1;
        self.services.push(ServiceRecord {
            id,
            name: name.to_string(),
            description: description.to_string(),
            base_path: base_path.to_string(),
            endpoints: Vec::new(),
            resources: Vec::new(),
        });
        Ok(ServiceHandle { id })
    }

    fn add_endpoint(&mut self, service: &Self::Service, url: &str) -> Result<(), ContainerError> {
        let record = self.service_mut(service.id)?;
        record.endpoints.push(url.to_string());
        Ok(())
    }

    fn add_resource(
        &mut self,
        service: &Self::Service,
        parent: Option<&Self::Resource>,
        name: &str,
        path: &str,
        description: &str,
    ) -> Result<Self::Resource, ContainerError> {
        let record = ResourceRecord {
            name: name.to_string(),
            path: path.to_string(),
            description: description.to_string(),
            methods: Vec::new(),
            children: Vec::new(),
        };

        match parent {
            None => {
                let target = self.service_mut(service.id)?;
                if target.resources.iter().any(|r| r.name == name) {
                    return Err(ContainerError::DuplicateName {
                        kind: "resource",
                        name: name.to_string(),
                    });
                }
                target.resources.push(record);
                Ok(ResourceHandle {
                    service: service.id,
                    path: vec![target.resources.len() - 1],
                })
            }
            Some(parent) => {
                if parent.service != service.id {
                    return Err(ContainerError::UnknownHandle { kind: "resource" });
                }
                let node = self.resource_mut(parent.service, &parent.path)?;
                if node.children.iter().any(|r| r.name == name) {
                    return Err(ContainerError::DuplicateName {
                        kind: "resource",
                        name: name.to_string(),
                    });
                }
                node.children.push(record);
                let mut child_path = parent.path.clone();
                child_path.push(node.children.len() - 1);
                Ok(ResourceHandle {
                    service: parent.service,
                    path: child_path,
                })
            }
        }
    }

    fn add_method(
        &mut self,
        resource: &Self::Resource,
        name: &str,
        verb: &str,
    ) -> Result<Self::Method, ContainerError> {
        let node = self.resource_mut(resource.service, &resource.path)?;
        if node.methods.iter().any(|m| m.name == name) {
            return Err(ContainerError::DuplicateName {
                kind: "method",
                name: name.to_string(),
            });
        }
        node.methods.push(MethodRecord {
            name: name.to_string(),
            verb: verb.to_string(),
            parameters: Vec::new(),
            requests: Vec::new(),
        });
        Ok(MethodHandle {
            service: resource.service,
            path: resource.path.clone(),
            index: node.methods.len() - 1,
        })
    }

    fn add_parameter(
        &mut self,
        method: &Self::Method,
        name: &str,
        style: &ParameterStyle,
        required: bool,
    ) -> Result<(), ContainerError> {
        let node = self.resource_mut(method.service, &method.path)?;
        let record = node
            .methods
            .get_mut(method.index)
            .ok_or(ContainerError::UnknownHandle { kind: "method" })?;
        record.parameters.push(ParameterRecord {
            name: name.to_string(),
            style: style.clone(),
            required,
        });
        Ok(())
    }

    fn add_request(&mut self, method: &Self::Method, name: &str) -> Result<(), ContainerError> {
        let node = self.resource_mut(method.service, &method.path)?;
        let record = node
            .methods
            .get_mut(method.index)
            .ok_or(ContainerError::UnknownHandle { kind: "method" })?;
        record.requests.push(name.to_string());
        Ok(())
    }

    fn remove_service(&mut self, service: Self::Service) -> Result<(), ContainerError> {
        let before = self.services.len();
        self.services.retain(|record| record.id != service.id);
        if self.services.len() == before {
            return Err(ContainerError::UnknownHandle { kind: "service" });
        }
        Ok(())
    }
}
