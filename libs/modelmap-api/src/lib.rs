pub mod context;
pub mod error;
pub mod model;
pub mod transformer;

pub use context::Context;
pub use error::TransformError;
pub use model::{Model, Object, ObjectValue, short_name, type_name_of};
pub use transformer::{ContextualTransformer, Converter, ConverterKind, ObjectTransformer, Transformer};
