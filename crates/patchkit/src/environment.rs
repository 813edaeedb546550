//! Deployment environment detection.
//!
//! Optional-patch conflict analysis reverts and probes patches freely, so it
//! only runs on managed cloud instances where the tree is disposable.

/// Default environment variable marking a managed cloud instance.
pub const DEFAULT_MARKER: &str = "PLATFORM_PROJECT";

/// Predicate describing the deployment environment.
pub trait Environment: Send + Sync {
    /// Whether this is a managed (disposable) cloud instance.
    fn is_managed_cloud(&self) -> bool;
}

/// Detects a managed instance by a non-empty environment variable.
#[derive(Debug, Clone)]
pub struct EnvMarker {
    var: String,
}

impl EnvMarker {
    /// Use `var` as the marker.
    pub fn new(var: impl Into<String>) -> Self {
        Self { var: var.into() }
    }

    /// The marker variable name.
    pub fn var(&self) -> &str {
        &self.var
    }
}

impl Default for EnvMarker {
    fn default() -> Self {
        Self::new(DEFAULT_MARKER)
    }
}

impl Environment for EnvMarker {
    fn is_managed_cloud(&self) -> bool {
        std::env::var(&self.var)
            .map(|v| !v.trim().is_empty())
            .unwrap_or(false)
    }
}

/// Environment with a fixed answer (configuration override, tests).
#[derive(Debug, Clone, Copy)]
pub struct Fixed(pub bool);

impl Environment for Fixed {
    fn is_managed_cloud(&self) -> bool {
        self.0
    }
}
