//! Configuration schema definitions.
//!
//! This module defines the structure of the stub configuration file.
//! All types derive Serde traits for deserialization from TOML.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Query parameter name → expected value of its first occurrence.
///
/// An empty mapping is interpreted by [`EmptyQueryPolicy`](crate::routing::EmptyQueryPolicy).
pub type QueryMatch = BTreeMap<String, String>;

/// One parsed configuration file.
///
/// Immutable once constructed; a reload produces a brand-new snapshot.
#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq)]
#[serde(default)]
pub struct ConfigurationSnapshot {
    /// Route declarations in file order.
    pub routes: Vec<RouteDeclaration>,
}

impl ConfigurationSnapshot {
    pub fn new(routes: Vec<RouteDeclaration>) -> Self {
        Self { routes }
    }
}

/// A single configured endpoint.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct RouteDeclaration {
    /// Exact request path (no wildcards).
    pub path: String,

    /// HTTP method, compared case-sensitively.
    pub method: String,

    /// Default status code.
    #[serde(default = "default_status_code")]
    pub status_code: u16,

    /// Default `Content-Type` header.
    #[serde(default = "default_content_type")]
    pub content_type: String,

    /// Default artificial latency in milliseconds.
    #[serde(default)]
    pub delay_ms: u64,

    /// Default response body.
    #[serde(default, rename = "response_body", alias = "body")]
    pub body: String,

    /// Conditional responses, tried in order.
    #[serde(default, rename = "responses", alias = "variants")]
    pub variants: Vec<ResponseVariant>,
}

impl RouteDeclaration {
    /// Declaration with the file-format defaults for everything but path and method.
    pub fn new(path: impl Into<String>, method: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            method: method.into(),
            status_code: default_status_code(),
            content_type: default_content_type(),
            delay_ms: 0,
            body: String::new(),
            variants: Vec::new(),
        }
    }

    pub fn with_status(mut self, status_code: u16) -> Self {
        self.status_code = status_code;
        self
    }

    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = content_type.into();
        self
    }

    pub fn with_delay_ms(mut self, delay_ms: u64) -> Self {
        self.delay_ms = delay_ms;
        self
    }

    pub fn with_body(mut self, body: impl Into<String>) -> Self {
        self.body = body.into();
        self
    }

    pub fn with_variant(mut self, variant: ResponseVariant) -> Self {
        self.variants.push(variant);
        self
    }
}

/// One candidate response of a route.
///
/// Every `Option` field left unset inherits the owning declaration's value.
#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq)]
#[serde(default)]
pub struct ResponseVariant {
    /// Selection condition.
    pub query: QueryMatch,

    pub status_code: Option<u16>,

    pub content_type: Option<String>,

    #[serde(rename = "response_body", alias = "body")]
    pub body: Option<String>,

    pub delay_ms: Option<u64>,
}

impl ResponseVariant {
    /// Variant selected when every `(name, value)` pair matches.
    pub fn matching<K, V>(pairs: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            query: pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
            ..Self::default()
        }
    }

    pub fn with_status(mut self, status_code: u16) -> Self {
        self.status_code = Some(status_code);
        self
    }

    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }

    pub fn with_body(mut self, body: impl Into<String>) -> Self {
        self.body = Some(body.into());
        self
    }

    pub fn with_delay_ms(mut self, delay_ms: u64) -> Self {
        self.delay_ms = Some(delay_ms);
        self
    }
}

fn default_status_code() -> u16 {
    200
}

fn default_content_type() -> String {
    "text/plain".to_string()
}
