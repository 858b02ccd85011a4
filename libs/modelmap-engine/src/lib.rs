pub mod collection;
pub mod config;
pub mod error;
pub mod registry;

pub use collection::CollectionTransformer;
pub use config::{CollectionPolicy, ConfigParser, JsonParser, PairTieBreak, RegistryConfig, TomlParser};
pub use error::ConfigError;
pub use registry::{Dispatch, TransformerRegistry};

pub use modelmap_api::{
    Context, ContextualTransformer, Converter, ConverterKind, Model, Object, ObjectTransformer,
    TransformError, Transformer,
};
