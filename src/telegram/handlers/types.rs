//! Handler types and shared dependencies

use std::sync::Arc;

use crate::batch::BatchCoordinator;
use crate::conversion::SvgConverter;
use crate::registry::UserRegistry;

/// Error type for handlers
pub type HandlerError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Dependencies required by handlers
#[derive(Clone)]
pub struct HandlerDeps {
    pub registry: Arc<UserRegistry>,
    pub coordinator: Arc<BatchCoordinator>,
    pub converter: Arc<dyn SvgConverter>,
}

impl HandlerDeps {
    /// Create new handler dependencies
    pub fn new(
        registry: Arc<UserRegistry>,
        coordinator: Arc<BatchCoordinator>,
        converter: Arc<dyn SvgConverter>,
    ) -> Self {
        Self {
            registry,
            coordinator,
            converter,
        }
    }
}
