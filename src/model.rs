use serde::{Deserialize, Serialize};

/// Lightweight handle identifying a remote API prior to a full fetch.
///
/// Produced by the host's selection step, consumed by the
/// [`ApiReader`](crate::traits::ApiReader).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiDescription {
    /// Provider-assigned API identifier, e.g. "a1b2c3d4"
    pub id: String,
    /// Human-readable API name
    pub name: String,
}

/// Fully fetched definition of one remote API.
///
/// Produced once per successful fetch and not mutated afterwards.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Api {
    pub id: String,
    pub name: String,
    pub description: String,
    pub base_url: String,
    /// Deployment stage the definition was taken from, if any
    pub stage: Option<Stage>,
    /// Root of the resource hierarchy; always present, possibly childless
    pub root_resource: HttpResource,
}

/// Named deployment environment of a remote API.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Stage {
    pub name: String,
    pub description: String,
}

/// A node in the path hierarchy of an API.
///
/// `resources` are the direct children; each child belongs to exactly one
/// parent and sibling order is meaningful.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpResource {
    pub name: String,
    pub path: String,
    pub methods: Vec<HttpMethod>,
    pub resources: Vec<HttpResource>,
}

/// One HTTP verb endpoint attached to a resource.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpMethod {
    pub name: String,
    /// HTTP verb, e.g. "GET"
    pub http_method: String,
    pub parameters: Vec<MethodParameter>,
}

/// Typed parameter of a method.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MethodParameter {
    pub name: String,
    pub style: ParameterStyle,
    pub required: bool,
}

/// Location of a method parameter.
///
/// Values outside the recognized set are preserved verbatim in
/// [`ParameterStyle::Other`] rather than rejected, so definitions using
/// parameter locations this crate does not know about still import.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ParameterStyle {
    /// Path template parameter ("path")
    Path,
    /// Query string parameter ("query"; the provider also spells it "querystring")
    Query,
    /// Header parameter ("header")
    Header,
    /// Unrecognized location, passed through verbatim
    Other(String),
}

impl ParameterStyle {
    pub fn as_str(&self) -> &str {
        match self {
            ParameterStyle::Path => "path",
            ParameterStyle::Query => "query",
            ParameterStyle::Header => "header",
            ParameterStyle::Other(value) => value,
        }
    }
}

impl From<String> for ParameterStyle {
    fn from(value: String) -> Self {
        match value.as_str() {
            "path" => ParameterStyle::Path,
            "query" | "querystring" => ParameterStyle::Query,
            "header" => ParameterStyle::Header,
            _ => ParameterStyle::Other(value),
        }
    }
}

impl From<ParameterStyle> for String {
    fn from(style: ParameterStyle) -> Self {
        style.as_str().to_string()
    }
}

impl std::fmt::Display for ParameterStyle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
