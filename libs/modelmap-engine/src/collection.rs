use std::sync::{Arc, Weak};

use modelmap_api::{Context, ContextualTransformer, Model, TransformError};

use crate::config::CollectionPolicy;
use crate::registry::Dispatch;

/// Dispatcher the collection transformer forwards elements to.
enum Target {
    Owned(Arc<dyn Dispatch>),
    /// Back-reference into the registry that owns this transformer.
    Cyclic(Weak<dyn Dispatch>),
}

/// Transforms `Model::List` values element by element.
///
/// Output preserves order and length. On any failure the whole call fails,
/// partial results are never returned. The context, if any, is passed through
/// to every element.
pub struct CollectionTransformer {
    target: Target,
    policy: CollectionPolicy,
}

impl CollectionTransformer {
    /// Wrap an independent dispatcher.
    pub fn new<D: Dispatch + 'static>(dispatcher: Arc<D>) -> Self {
        Self {
            target: Target::Owned(dispatcher),
            policy: CollectionPolicy::default(),
        }
    }

    /// Wrap the dispatcher this transformer is registered in.
    ///
    /// See `TransformerRegistry::shared`.
    pub fn cyclic<D: Dispatch + 'static>(dispatcher: Weak<D>) -> Self {
        Self {
            target: Target::Cyclic(dispatcher),
            policy: CollectionPolicy::default(),
        }
    }

    pub fn with_policy(mut self, policy: CollectionPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn policy(&self) -> CollectionPolicy {
        self.policy
    }

    fn dispatcher(&self) -> Option<Arc<dyn Dispatch>> {
        match &self.target {
            Target::Owned(d) => Some(d.clone()),
            Target::Cyclic(weak) => {
                let upgraded = weak.upgrade();
                if upgraded.is_none() {
                    tracing::warn!("collection transformer outlived its registry");
                }
                upgraded
            }
        }
    }

    fn supports_items(
        &self,
        dispatcher: &dyn Dispatch,
        items: &[Model],
        target: &str,
        context: Option<&Context>,
    ) -> bool {
        match self.policy {
            CollectionPolicy::Strict => items
                .iter()
                .all(|item| dispatcher.supports(item, target, context)),
            CollectionPolicy::Representative => representative(items)
                .is_none_or(|item| dispatcher.supports(item, target, context)),
        }
    }

    /// Transform every element through the one transformer found for the representative.
    fn transform_representative(
        &self,
        dispatcher: &dyn Dispatch,
        items: &[Model],
        target: &str,
        context: Option<&Context>,
    ) -> Result<Vec<Model>, TransformError> {
        let Some(first) = representative(items) else {
            return Ok(vec![Model::Null; items.len()]);
        };
        let converter = dispatcher
            .find_supported_transformer(first, target, context)
            .ok_or_else(|| TransformError::unsupported(first.type_label(), target))?;

        items
            .iter()
            .map(|item| {
                if item.is_null() {
                    return Ok(Model::Null);
                }
                if !converter.supports(item, target, context) {
                    tracing::debug!(
                        transformer = %converter.name(),
                        element = %item.type_label(),
                        target = %target,
                        "collection element rejected by representative transformer"
                    );
                    return Err(TransformError::unsupported(item.type_label(), target));
                }
                converter.transform(item, target, context)
            })
            .collect()
    }
}

/// First non-null element.
fn representative(items: &[Model]) -> Option<&Model> {
    items.iter().find(|item| !item.is_null())
}

impl ContextualTransformer for CollectionTransformer {
    fn name(&self) -> &str {
        "collection"
    }

    fn supports(&self, value: &Model, target: &str, context: Option<&Context>) -> bool {
        let Some(items) = value.as_list() else {
            return false;
        };
        if items.is_empty() {
            return true;
        }
        match self.dispatcher() {
            Some(dispatcher) => self.supports_items(dispatcher.as_ref(), items, target, context),
            None => false,
        }
    }

    fn transform(
        &self,
        value: &Model,
        target: &str,
        context: Option<&Context>,
    ) -> Result<Model, TransformError> {
        let items = value
            .as_list()
            .ok_or_else(|| TransformError::unsupported(value.type_label(), target))?;
        if items.is_empty() {
            return Ok(Model::List(Vec::new()));
        }

        let dispatcher = self
            .dispatcher()
            .ok_or_else(|| TransformError::unsupported(value.type_label(), target))?;

        // Support is re-derived on every call; an earlier `supports` answer is not trusted.
        if !self.supports_items(dispatcher.as_ref(), items, target, context) {
            return Err(TransformError::unsupported(value.type_label(), target));
        }

        let elements = match self.policy {
            CollectionPolicy::Strict => items
                .iter()
                .map(|item| dispatcher.transform(item, target, context))
                .collect::<Result<Vec<_>, _>>()?,
            CollectionPolicy::Representative => {
                self.transform_representative(dispatcher.as_ref(), items, target, context)?
            }
        };
        Ok(Model::List(elements))
    }
}
