use std::collections::HashMap;
use std::sync::{Arc, Weak};

use modelmap_api::{Context, Converter, Model, TransformError};

use crate::collection::CollectionTransformer;
use crate::config::{PairTieBreak, RegistryConfig};

/// Resolution entry point, as seen by code that wraps a dispatcher.
pub trait Dispatch: Send + Sync {
    fn supports(&self, value: &Model, target: &str, context: Option<&Context>) -> bool;

    fn transform(
        &self,
        value: &Model,
        target: &str,
        context: Option<&Context>,
    ) -> Result<Model, TransformError>;

    fn find_supported_transformer(
        &self,
        value: &Model,
        target: &str,
        context: Option<&Context>,
    ) -> Option<Converter>;
}

/// One accepted `add_transformer` call.
struct Registration {
    converter: Converter,
    priority: i32,
    /// Stable ingest ordinal.
    sequence: u64,
}

/// Tier that produced a resolution, for logging.
#[derive(Debug, Clone, Copy)]
enum Tier {
    ExactPair,
    Ordered,
}

/// Registry of transformers and the dispatcher over them.
///
/// Built once with `add_transformer`, then used read-only (typically behind an `Arc`).
/// Derived indices are rebuilt on every registration, so lookups never see a stale order.
pub struct TransformerRegistry {
    config: RegistryConfig,
    registrations: Vec<Registration>,
    next_sequence: u64,
    /// Plain and contextual registrations: priority desc, then sequence asc.
    ordered: Vec<usize>,
    /// Exact-pair winners: source type label -> target type -> registration.
    pairs: HashMap<String, HashMap<String, usize>>,
    /// Effective resolution order: pair winners, then `ordered`.
    resolution_order: Vec<Converter>,
}

impl std::fmt::Debug for TransformerRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TransformerRegistry")
            .field("config", &self.config)
            .field("transformers", &self.resolution_order)
            .finish()
    }
}

impl Default for TransformerRegistry {
    fn default() -> Self {
        Self::with_config(RegistryConfig::default())
    }
}

impl TransformerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: RegistryConfig) -> Self {
        Self {
            config,
            registrations: Vec::new(),
            next_sequence: 0,
            ordered: Vec::new(),
            pairs: HashMap::new(),
            resolution_order: Vec::new(),
        }
    }

    /// Build a shared registry that can transform lists of anything it can transform.
    ///
    /// Runs `build`, then registers a `CollectionTransformer` that dispatches
    /// elements back into the returned registry.
    pub fn shared<F>(config: RegistryConfig, build: F) -> Result<Arc<Self>, TransformError>
    where
        F: FnOnce(&mut TransformerRegistry) -> Result<(), TransformError>,
    {
        let mut outcome = Ok(());
        let registry = Arc::new_cyclic(|weak: &Weak<TransformerRegistry>| {
            let mut registry = TransformerRegistry::with_config(config);
            outcome = build(&mut registry).and_then(|()| {
                let collection = CollectionTransformer::cyclic(weak.clone())
                    .with_policy(registry.config.collection_policy);
                let priority = registry.config.collection_priority;
                registry
                    .add_transformer(Converter::contextual(collection), priority)
                    .map(|_| ())
            });
            registry
        });
        outcome.map(|()| registry)
    }

    pub fn config(&self) -> &RegistryConfig {
        &self.config
    }

    /// Register with the default priority (0).
    pub fn add(&mut self, converter: Converter) -> Result<&mut Self, TransformError> {
        self.add_transformer(converter, 0)
    }

    /// Register a converter.
    ///
    /// Fails fast when the converter does not satisfy its capability shape;
    /// the registry is left untouched in that case.
    pub fn add_transformer(
        &mut self,
        converter: Converter,
        priority: i32,
    ) -> Result<&mut Self, TransformError> {
        validate(&converter)?;

        let priority = match self.config.priority_for(converter.name()) {
            Some(overridden) => {
                tracing::debug!(
                    transformer = %converter.name(),
                    requested = priority,
                    priority = overridden,
                    "priority overridden by config"
                );
                overridden
            }
            None => priority,
        };

        let sequence = self.next_sequence;
        self.next_sequence += 1;

        if let Some((source, target)) = converter.exact_pair() {
            self.warn_if_shadowed(&converter, source, target, priority);
        }

        tracing::debug!(
            transformer = %converter.name(),
            kind = %converter.kind(),
            priority,
            sequence,
            "registered transformer"
        );

        self.registrations.push(Registration {
            converter,
            priority,
            sequence,
        });
        self.rebuild_index();
        Ok(self)
    }

    /// Recompute the ordered list, the exact-pair index and the resolution order.
    ///
    /// Idempotent and deterministic for a given registration set.
    pub fn rebuild_index(&mut self) {
        let regs = &self.registrations;

        let mut ordered: Vec<usize> = (0..regs.len())
            .filter(|&i| regs[i].converter.exact_pair().is_none())
            .collect();
        ordered.sort_by(|&a, &b| {
            regs[b]
                .priority
                .cmp(&regs[a].priority)
                .then_with(|| regs[a].sequence.cmp(&regs[b].sequence))
        });

        let mut pairs: HashMap<String, HashMap<String, usize>> = HashMap::new();
        for (idx, reg) in regs.iter().enumerate() {
            let Some((source, target)) = reg.converter.exact_pair() else {
                continue;
            };
            let by_target = pairs.entry(source.to_string()).or_default();
            let replace = match by_target.get(target) {
                Some(&current) => self
                    .config
                    .pair_tie_break
                    .prefers(reg.priority, regs[current].priority),
                None => true,
            };
            if replace {
                by_target.insert(target.to_string(), idx);
            }
        }

        let mut winners: Vec<usize> = pairs.values().flat_map(|t| t.values().copied()).collect();
        winners.sort_unstable();
        let shadowed: Vec<usize> = (0..regs.len())
            .filter(|&i| regs[i].converter.exact_pair().is_some())
            .filter(|i| winners.binary_search(i).is_err())
            .collect();

        self.resolution_order = winners
            .iter()
            .chain(shadowed.iter())
            .chain(ordered.iter())
            .map(|&i| regs[i].converter.clone())
            .collect();
        self.ordered = ordered;
        self.pairs = pairs;

        tracing::trace!(
            ordered = self.ordered.len(),
            exact_pairs = winners.len(),
            shadowed = shadowed.len(),
            "rebuilt transformer index"
        );
    }

    /// Every accepted registration, in resolution order.
    ///
    /// Exact-pair winners come first (registration order), then exact-pair
    /// registrations shadowed by a winner for the same pair, then the
    /// priority-ordered list. Always `len()` entries long.
    pub fn transformers(&self) -> &[Converter] {
        &self.resolution_order
    }

    /// Number of accepted registrations, shadowed ones included.
    pub fn len(&self) -> usize {
        self.registrations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.registrations.is_empty()
    }

    /// Whether some transformer can handle `value` -> `target`.
    ///
    /// Null is always transformable (it maps to null).
    pub fn supports(&self, value: &Model, target: &str, context: Option<&Context>) -> bool {
        value.is_null() || self.resolve(value, target, context).is_some()
    }

    /// Transform `value` into `target` with the first transformer that supports it.
    ///
    /// Errors raised by the transformer are returned unchanged.
    pub fn transform(
        &self,
        value: &Model,
        target: &str,
        context: Option<&Context>,
    ) -> Result<Model, TransformError> {
        if value.is_null() {
            return Ok(Model::Null);
        }

        match self.resolve(value, target, context) {
            Some(converter) => converter.transform(value, target, context),
            None => {
                tracing::debug!(
                    source = %value.type_label(),
                    target = %target,
                    "no transformer supports transformation"
                );
                Err(TransformError::unsupported(value.type_label(), target))
            }
        }
    }

    /// Resolution step alone: the transformer `transform` would delegate to.
    pub fn find_supported_transformer(
        &self,
        value: &Model,
        target: &str,
        context: Option<&Context>,
    ) -> Option<Converter> {
        self.resolve(value, target, context).cloned()
    }

    fn resolve(&self, value: &Model, target: &str, context: Option<&Context>) -> Option<&Converter> {
        let (converter, tier) = match self.exact_pair(value.type_label(), target) {
            Some(converter) => (converter, Tier::ExactPair),
            None => {
                let converter = self
                    .ordered
                    .iter()
                    .map(|&i| &self.registrations[i].converter)
                    .find(|c| c.supports(value, target, context))?;
                (converter, Tier::Ordered)
            }
        };

        tracing::trace!(
            source = %value.type_label(),
            target = %target,
            transformer = %converter.name(),
            tier = ?tier,
            "resolved transformer"
        );
        Some(converter)
    }

    fn exact_pair(&self, source: &str, target: &str) -> Option<&Converter> {
        let idx = *self.pairs.get(source)?.get(target)?;
        Some(&self.registrations[idx].converter)
    }

    fn warn_if_shadowed(&self, converter: &Converter, source: &str, target: &str, priority: i32) {
        let Some(current) = self.pairs.get(source).and_then(|t| t.get(target)) else {
            return;
        };
        let current = &self.registrations[*current];
        let (winner, loser) = if self.config.pair_tie_break.prefers(priority, current.priority) {
            (converter.name(), current.converter.name())
        } else {
            (current.converter.name(), converter.name())
        };
        tracing::warn!(
            source = %source,
            target = %target,
            winner = %winner,
            shadowed = %loser,
            "exact-pair transformer shadowed"
        );
    }
}

impl Dispatch for TransformerRegistry {
    fn supports(&self, value: &Model, target: &str, context: Option<&Context>) -> bool {
        TransformerRegistry::supports(self, value, target, context)
    }

    fn transform(
        &self,
        value: &Model,
        target: &str,
        context: Option<&Context>,
    ) -> Result<Model, TransformError> {
        TransformerRegistry::transform(self, value, target, context)
    }

    fn find_supported_transformer(
        &self,
        value: &Model,
        target: &str,
        context: Option<&Context>,
    ) -> Option<Converter> {
        TransformerRegistry::find_supported_transformer(self, value, target, context)
    }
}

impl PairTieBreak {
    /// Whether a later registration with `challenger` priority beats `current` for the same pair.
    fn prefers(self, challenger: i32, current: i32) -> bool {
        match self {
            PairTieBreak::HighestPriority => challenger > current,
            PairTieBreak::LowestPriority => challenger < current,
        }
    }
}

/// Check that a converter satisfies the capability shape it claims.
fn validate(converter: &Converter) -> Result<(), TransformError> {
    if let Some((source, target)) = converter.exact_pair() {
        if source.trim().is_empty() {
            return Err(TransformError::configuration(
                "exact-pair transformer declares an empty supported type",
            )
            .with_context(converter.name()));
        }
        if target.trim().is_empty() {
            return Err(TransformError::configuration(
                "exact-pair transformer declares an empty target type",
            )
            .with_context(converter.name()));
        }
    }
    Ok(())
}
