use std::fmt;
use std::sync::Arc;

use crate::context::Context;
use crate::error::TransformError;
use crate::model::Model;

/// Plain transformer: decides support per value and target type.
///
/// Principle: `supports` must be cheap and side-effect free, the engine may
/// call it many times per resolution. Whenever it returns `true`, `transform`
/// for the same arguments is expected to succeed or fail with its own error.
pub trait Transformer: Send + Sync {
    /// Name used in logs, diagnostics and priority overrides.
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }

    fn supports(&self, value: &Model, target: &str) -> bool;

    fn transform(&self, value: &Model, target: &str) -> Result<Model, TransformError>;
}

/// Transformer that also receives the caller's context, if any.
pub trait ContextualTransformer: Send + Sync {
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }

    fn supports(&self, value: &Model, target: &str, context: Option<&Context>) -> bool;

    fn transform(
        &self,
        value: &Model,
        target: &str,
        context: Option<&Context>,
    ) -> Result<Model, TransformError>;
}

/// Exact-pair transformer: converts one fixed source type into one fixed target type.
///
/// Registered in the exact type-pair index and never asked whether it supports
/// a value: registration for the pair implies support.
pub trait ObjectTransformer: Send + Sync {
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }

    /// Runtime type label of supported values (see `Model::type_label`).
    fn supported_type(&self) -> &str;

    /// Target type identifier produced by this transformer.
    fn target_type(&self) -> &str;

    fn transform(&self, value: &Model) -> Result<Model, TransformError>;
}

/// Discriminant of a `Converter`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConverterKind {
    Plain,
    Contextual,
    Object,
}

impl fmt::Display for ConverterKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConverterKind::Plain => f.write_str("plain"),
            ConverterKind::Contextual => f.write_str("contextual"),
            ConverterKind::Object => f.write_str("object"),
        }
    }
}

/// A registrable converter, tagged with its capability shape.
///
/// The engine switches on the variant to pick the invocation signature.
/// Cloning is cheap: all variants share the underlying transformer.
#[derive(Clone)]
pub enum Converter {
    Plain(Arc<dyn Transformer>),
    Contextual(Arc<dyn ContextualTransformer>),
    Object(Arc<dyn ObjectTransformer>),
}

impl Converter {
    pub fn plain(t: impl Transformer + 'static) -> Self {
        Converter::Plain(Arc::new(t))
    }

    pub fn contextual(t: impl ContextualTransformer + 'static) -> Self {
        Converter::Contextual(Arc::new(t))
    }

    pub fn object(t: impl ObjectTransformer + 'static) -> Self {
        Converter::Object(Arc::new(t))
    }

    pub fn kind(&self) -> ConverterKind {
        match self {
            Converter::Plain(_) => ConverterKind::Plain,
            Converter::Contextual(_) => ConverterKind::Contextual,
            Converter::Object(_) => ConverterKind::Object,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Converter::Plain(t) => t.name(),
            Converter::Contextual(t) => t.name(),
            Converter::Object(t) => t.name(),
        }
    }

    /// `(supported_type, target_type)` for exact-pair converters.
    pub fn exact_pair(&self) -> Option<(&str, &str)> {
        match self {
            Converter::Object(t) => Some((t.supported_type(), t.target_type())),
            _ => None,
        }
    }

    /// Ask the converter about support using the signature of its shape.
    ///
    /// Exact-pair converters support a value iff its runtime type label and the
    /// target match their declared pair exactly.
    pub fn supports(&self, value: &Model, target: &str, context: Option<&Context>) -> bool {
        match self {
            Converter::Plain(t) => t.supports(value, target),
            Converter::Contextual(t) => t.supports(value, target, context),
            Converter::Object(t) => {
                t.supported_type() == value.type_label() && t.target_type() == target
            }
        }
    }

    /// Run the converter using the signature of its shape.
    pub fn transform(
        &self,
        value: &Model,
        target: &str,
        context: Option<&Context>,
    ) -> Result<Model, TransformError> {
        match self {
            Converter::Plain(t) => t.transform(value, target),
            Converter::Contextual(t) => t.transform(value, target, context),
            Converter::Object(t) => t.transform(value),
        }
    }

    /// Whether both handles point at the same registered transformer.
    pub fn same_as(&self, other: &Converter) -> bool {
        match (self, other) {
            (Converter::Plain(a), Converter::Plain(b)) => Arc::ptr_eq(a, b),
            (Converter::Contextual(a), Converter::Contextual(b)) => Arc::ptr_eq(a, b),
            (Converter::Object(a), Converter::Object(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl fmt::Debug for Converter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut s = f.debug_struct("Converter");
        s.field("kind", &self.kind()).field("name", &self.name());
        if let Some((source, target)) = self.exact_pair() {
            s.field("source", &source).field("target", &target);
        }
        s.finish()
    }
}
