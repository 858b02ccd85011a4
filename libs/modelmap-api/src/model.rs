use std::any::Any;
use std::fmt;
use std::sync::Arc;

/// Dynamic value handed to converters.
///
/// Strategy by kind:
/// - Scalars (Bool, Int, Float, Str): owned, cheap to clone.
/// - List: one level of collection, elements dispatched individually.
/// - Object: any domain type behind an `Arc`, identified by its runtime type name.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Model {
    #[default]
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    List(Vec<Model>),
    Object(Object),
}

impl Model {
    /// Wrap a domain value as an object model.
    pub fn object<T: ObjectValue>(value: T) -> Self {
        Model::Object(Object::new(value))
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Model::Null)
    }

    /// Runtime type label used for resolution and the exact-pair index.
    ///
    /// Objects report their full type name, everything else a kind label.
    pub fn type_label(&self) -> &str {
        match self {
            Model::Null => "null",
            Model::Bool(_) => "bool",
            Model::Int(_) => "int",
            Model::Float(_) => "float",
            Model::Str(_) => "string",
            Model::List(_) => "list",
            Model::Object(obj) => obj.type_name(),
        }
    }

    /// `type_label` without the module path, for display only.
    pub fn short_type_label(&self) -> &str {
        short_name(self.type_label())
    }

    pub fn as_list(&self) -> Option<&[Model]> {
        match self {
            Model::List(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&Object> {
        match self {
            Model::Object(obj) => Some(obj),
            _ => None,
        }
    }

    /// Borrow the wrapped domain value if this is an object of type `T`.
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.as_object().and_then(Object::downcast_ref::<T>)
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Model::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Model::Int(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Model::Float(v) => Some(*v),
            Model::Int(v) => Some(*v as f64),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Model::Bool(v) => Some(*v),
            _ => None,
        }
    }
}

/// Strip the module path from a fully qualified type name.
///
/// Generic arguments are kept intact: `a::Page<b::Item>` -> `Page<b::Item>`.
pub fn short_name(type_name: &str) -> &str {
    let head = type_name.split('<').next().unwrap_or(type_name);
    match head.rfind("::") {
        Some(idx) => &type_name[idx + 2..],
        None => type_name,
    }
}

/// Runtime type name of `T`, in the form `Model::type_label` reports for objects.
pub fn type_name_of<T: ?Sized>() -> &'static str {
    std::any::type_name::<T>()
}

// ---------------------------------------------------------------------------
// Object: type-erased domain value
// ---------------------------------------------------------------------------

/// Values that can live inside `Model::Object`.
///
/// Blanket-implemented for every `'static + Debug + PartialEq + Send + Sync` type.
pub trait ObjectValue: Any + fmt::Debug + Send + Sync {
    fn as_any(&self) -> &dyn Any;
    fn dyn_eq(&self, other: &dyn Any) -> bool;
}

impl<T> ObjectValue for T
where
    T: Any + fmt::Debug + PartialEq + Send + Sync,
{
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn dyn_eq(&self, other: &dyn Any) -> bool {
        other.downcast_ref::<T>().is_some_and(|o| self == o)
    }
}

/// Shared, immutable domain value with its runtime type name.
#[derive(Clone)]
pub struct Object {
    type_name: &'static str,
    value: Arc<dyn ObjectValue>,
}

impl Object {
    pub fn new<T: ObjectValue>(value: T) -> Self {
        Self {
            type_name: std::any::type_name::<T>(),
            value: Arc::new(value),
        }
    }

    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    pub fn short_type_name(&self) -> &'static str {
        short_name(self.type_name)
    }

    pub fn is<T: Any>(&self) -> bool {
        self.value.as_any().is::<T>()
    }

    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.value.as_any().downcast_ref::<T>()
    }
}

impl PartialEq for Object {
    fn eq(&self, other: &Self) -> bool {
        self.type_name == other.type_name && self.value.dyn_eq(other.value.as_any())
    }
}

impl fmt::Debug for Object {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&*self.value, f)
    }
}

// ---------------------------------------------------------------------------
// From impls: plain Rust values -> Model
// ---------------------------------------------------------------------------

impl From<bool> for Model {
    fn from(v: bool) -> Self {
        Model::Bool(v)
    }
}

impl From<i64> for Model {
    fn from(v: i64) -> Self {
        Model::Int(v)
    }
}

impl From<i32> for Model {
    fn from(v: i32) -> Self {
        Model::Int(v.into())
    }
}

impl From<f64> for Model {
    fn from(v: f64) -> Self {
        Model::Float(v)
    }
}

impl From<String> for Model {
    fn from(v: String) -> Self {
        Model::Str(v)
    }
}

impl From<&str> for Model {
    fn from(v: &str) -> Self {
        Model::Str(v.to_string())
    }
}

impl From<Vec<Model>> for Model {
    fn from(v: Vec<Model>) -> Self {
        Model::List(v)
    }
}

impl From<Object> for Model {
    fn from(v: Object) -> Self {
        Model::Object(v)
    }
}

impl<T: Into<Model>> From<Option<T>> for Model {
    fn from(v: Option<T>) -> Self {
        v.map_or(Model::Null, Into::into)
    }
}
