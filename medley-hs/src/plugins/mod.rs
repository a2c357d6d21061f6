//! Plugin capability surface
//!
//! Third-party modules extend Medley by implementing the `Plugin` trait: a
//! capability set covering configuration, API routes, UI descriptors, and
//! lifecycle. Concrete plugins implement the subset meaningful to them;
//! the defaults describe a plugin with no extra surfaces. Dependencies
//! (database pool, event bus, stores) are injected at construction rather
//! than reached through process-wide singletons.

pub mod history_sync;

pub use history_sync::HistorySyncPlugin;

use async_trait::async_trait;
use medley_common::Result;
use serde::Serialize;
use serde_json::Value;

/// An API route a plugin asks the host HTTP layer to mount
#[derive(Debug, Clone, Serialize)]
pub struct ApiDescriptor {
    pub path: String,
    pub method: String,
    pub summary: String,
}

/// Configuration form: an opaque UI descriptor plus default values
///
/// The descriptor format belongs to the UI layer; plugins treat it as
/// uninterpreted JSON.
#[derive(Debug, Clone, Serialize)]
pub struct ConfigForm {
    pub form: Value,
    pub defaults: Value,
}

/// Capability set a Medley plugin exposes to the host application
#[async_trait]
pub trait Plugin: Send + Sync {
    /// Stable identifier; also the suffix of the plugin's settings key
    fn id(&self) -> &'static str;

    /// Human-readable name
    fn name(&self) -> &'static str;

    /// One-line description
    fn description(&self) -> &'static str;

    /// Apply configuration and start whatever background work it implies
    async fn initialize(&self, config: Option<Value>) -> Result<()>;

    /// API routes the plugin contributes
    fn describe_api(&self) -> Vec<ApiDescriptor> {
        Vec::new()
    }

    /// Configuration page descriptor and defaults
    fn describe_config_form(&self) -> ConfigForm;

    /// Detail page descriptor, if the plugin has one
    fn describe_page(&self) -> Option<Value> {
        None
    }

    /// Whether the plugin currently has work enabled
    fn is_active(&self) -> bool;

    /// Release resources; in-flight work may run to completion
    async fn shutdown(&self) {}
}
