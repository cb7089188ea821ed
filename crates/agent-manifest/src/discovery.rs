//! The discovery manifest served at the well-known endpoint.
//!
//! Built fresh from a [`DiscoveryProfile`] on every call.

use agent_manifest_core::{Manifest, ManifestError};
use serde::Serialize;

/// Feed type advertised to agents.
pub const FEED_TYPE: &str = "mcp";

/// Version of the discovery document layout.
pub const DISCOVERY_VERSION: &str = "1.0";

/// A tool an agent may invoke through the MCP endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ToolDescriptor {
    pub name: String,
    pub description: String,
}

impl ToolDescriptor {
    /// A tool entry with a name and description.
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
        }
    }
}

/// Describes the site and what it offers to agents.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoveryProfile {
    pub title: String,
    pub description: String,
    pub author: String,
    pub site_url: String,
    pub mcp_endpoint: String,
    pub tools: Vec<ToolDescriptor>,
}

impl Default for DiscoveryProfile {
    fn default() -> Self {
        Self {
            title: "Portfolio".to_string(),
            description: "Personal portfolio: projects, skills and contact details".to_string(),
            author: "Site owner".to_string(),
            site_url: "https://example.dev".to_string(),
            mcp_endpoint: "/api/mcp".to_string(),
            tools: vec![
                ToolDescriptor::new("get_projects", "List portfolio projects"),
                ToolDescriptor::new("get_skills", "List skills grouped by area"),
                ToolDescriptor::new("get_contact", "How to get in touch"),
            ],
        }
    }
}

#[derive(Serialize)]
struct DiscoveryDocument<'a> {
    feed_type: &'static str,
    version: &'static str,
    metadata: Metadata<'a>,
    capabilities: Capabilities<'a>,
}

#[derive(Serialize)]
struct Metadata<'a> {
    title: &'a str,
    description: &'a str,
    author: &'a str,
    url: &'a str,
}

#[derive(Serialize)]
struct Capabilities<'a> {
    mcp_endpoint: &'a str,
    tools: &'a [ToolDescriptor],
}

/// Build the discovery manifest for `profile`.
pub fn discovery_manifest(profile: &DiscoveryProfile) -> Result<Manifest, ManifestError> {
    let doc = DiscoveryDocument {
        feed_type: FEED_TYPE,
        version: DISCOVERY_VERSION,
        metadata: Metadata {
            title: &profile.title,
            description: &profile.description,
            author: &profile.author,
            url: &profile.site_url,
        },
        capabilities: Capabilities {
            mcp_endpoint: &profile.mcp_endpoint,
            tools: &profile.tools,
        },
    };
    Manifest::from_serialize(&doc)
}
