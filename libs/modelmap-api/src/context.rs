use std::any::Any;
use std::fmt;
use std::sync::Arc;

/// Transformation context.
///
/// Carries one opaque, caller-defined payload. The engine never looks inside;
/// only contextual transformers and the caller interpret it.
#[derive(Clone, Default)]
pub struct Context {
    payload: Option<Arc<dyn Any + Send + Sync>>,
}

impl Context {
    pub fn new<T: Any + Send + Sync>(payload: T) -> Self {
        Self {
            payload: Some(Arc::new(payload)),
        }
    }

    /// Context without payload.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn has_payload(&self) -> bool {
        self.payload.is_some()
    }

    /// Borrow the payload if it is a `T`.
    pub fn payload<T: Any>(&self) -> Option<&T> {
        self.payload.as_deref().and_then(|p| p.downcast_ref::<T>())
    }
}

impl fmt::Debug for Context {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Context")
            .field("has_payload", &self.has_payload())
            .finish()
    }
}
