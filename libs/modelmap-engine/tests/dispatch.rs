//! Integration tests: resolution order, context threading and error reporting
//! of `TransformerRegistry`, with mocked transformers.

use std::sync::Mutex;

use mockall::mock;
use modelmap_api::type_name_of;
use modelmap_engine::{
    Context, ContextualTransformer, Converter, Model, ObjectTransformer, TransformError,
    Transformer, TransformerRegistry,
};

mock! {
    pub Plain {}

    impl Transformer for Plain {
        fn supports(&self, value: &Model, target: &str) -> bool;
        fn transform(&self, value: &Model, target: &str) -> Result<Model, TransformError>;
    }
}

#[derive(Debug, Clone, PartialEq)]
struct Order {
    id: i64,
}

#[derive(Debug, Clone, PartialEq)]
struct Point {
    x: i64,
    y: i64,
}

fn order() -> Model {
    Model::object(Order { id: 1 })
}

/// Contextual transformer that records the payload it was handed.
#[derive(Default)]
struct Recording {
    seen: Mutex<Vec<Option<String>>>,
}

impl Recording {
    fn record(&self, context: Option<&Context>) {
        let payload = context.and_then(|c| c.payload::<String>()).cloned();
        self.seen.lock().unwrap().push(payload);
    }
}

impl ContextualTransformer for Recording {
    fn name(&self) -> &str {
        "recording"
    }

    fn supports(&self, _value: &Model, target: &str, context: Option<&Context>) -> bool {
        self.record(context);
        target == "SomeClass"
    }

    fn transform(
        &self,
        _value: &Model,
        _target: &str,
        context: Option<&Context>,
    ) -> Result<Model, TransformError> {
        self.record(context);
        Ok(Model::from("recorded"))
    }
}

struct PointToVector;

impl ObjectTransformer for PointToVector {
    fn name(&self) -> &str {
        "point_to_vector"
    }

    fn supported_type(&self) -> &str {
        type_name_of::<Point>()
    }

    fn target_type(&self) -> &str {
        "Vector"
    }

    fn transform(&self, value: &Model) -> Result<Model, TransformError> {
        let point = value
            .downcast_ref::<Point>()
            .ok_or_else(|| TransformError::conversion(self.name(), "expected a Point"))?;
        Ok(Model::from(vec![Model::from(point.x), Model::from(point.y)]))
    }
}

#[test]
fn prioritizes_transformers() {
    let mut first = MockPlain::new();
    let mut second = MockPlain::new();
    let mut third = MockPlain::new();

    first
        .expect_supports()
        .withf(|_, target| target == "SomeClass")
        .times(1)
        .returning(|_, _| false);
    second
        .expect_supports()
        .withf(|_, target| target == "SomeClass")
        .times(1)
        .returning(|_, _| true);
    third.expect_supports().never();

    let mut registry = TransformerRegistry::new();
    registry
        .add_transformer(Converter::plain(second), 2)
        .unwrap()
        .add_transformer(Converter::plain(third), 2)
        .unwrap()
        .add_transformer(Converter::plain(first), 15)
        .unwrap();

    assert!(registry.supports(&order(), "SomeClass", None));
}

#[test]
fn supports_if_at_least_one_transformer_supports() {
    let mut supported = MockPlain::new();
    let mut not_supported = MockPlain::new();
    supported.expect_supports().returning(|_, _| true);
    not_supported.expect_supports().returning(|_, _| false);

    let mut registry = TransformerRegistry::new();
    registry
        .add(Converter::plain(supported))
        .unwrap()
        .add(Converter::plain(not_supported))
        .unwrap();

    assert!(registry.supports(&order(), "SomeClass", None));
}

#[test]
fn does_not_support_if_no_transformer_supports() {
    let mut a = MockPlain::new();
    let mut b = MockPlain::new();
    a.expect_supports().returning(|_, _| false);
    b.expect_supports().returning(|_, _| false);

    let mut registry = TransformerRegistry::new();
    registry.add(Converter::plain(a)).unwrap().add(Converter::plain(b)).unwrap();

    assert!(!registry.supports(&order(), "SomeClass", None));
    assert!(registry.find_supported_transformer(&order(), "SomeClass", None).is_none());
    let err = registry.transform(&order(), "SomeClass", None).unwrap_err();
    assert!(err.is_unsupported());
}

#[test]
fn transforms_with_first_supporting_transformer() {
    let mut not_supported = MockPlain::new();
    let mut supported = MockPlain::new();
    not_supported.expect_supports().returning(|_, _| false);
    not_supported.expect_transform().never();
    supported.expect_supports().returning(|_, _| true);
    supported
        .expect_transform()
        .times(1)
        .returning(|_, _| Ok(Model::from("dto")));

    let mut registry = TransformerRegistry::new();
    registry
        .add(Converter::plain(not_supported))
        .unwrap()
        .add(Converter::plain(supported))
        .unwrap();

    assert_eq!(registry.transform(&order(), "SomeClass", None), Ok(Model::from("dto")));
}

#[test]
fn passes_context_to_contextual_transformers() {
    let recording = std::sync::Arc::new(Recording::default());
    let mut registry = TransformerRegistry::new();
    registry
        .add(Converter::Contextual(recording.clone()))
        .unwrap();

    let ctx = Context::new("tenant-7".to_string());
    assert!(registry.supports(&order(), "SomeClass", Some(&ctx)));
    assert_eq!(
        registry.transform(&order(), "SomeClass", Some(&ctx)),
        Ok(Model::from("recorded"))
    );
    assert!(registry.supports(&order(), "SomeClass", None));

    let seen = recording.seen.lock().unwrap().clone();
    let tenant = Some("tenant-7".to_string());
    assert_eq!(seen, [tenant.clone(), tenant.clone(), tenant, None]);
}

#[test]
fn plain_transformers_are_consulted_when_context_is_given() {
    let mut plain = MockPlain::new();
    plain.expect_supports().times(1).returning(|_, _| true);
    plain
        .expect_transform()
        .times(1)
        .returning(|_, _| Ok(Model::from(1)));

    let mut registry = TransformerRegistry::new();
    registry.add(Converter::plain(plain)).unwrap();

    let ctx = Context::new(42_u32);
    assert_eq!(registry.transform(&order(), "SomeClass", Some(&ctx)), Ok(Model::from(1)));
}

#[test]
fn finds_the_registered_transformer() {
    let mut not_supported = MockPlain::new();
    let mut supported = MockPlain::new();
    not_supported.expect_supports().returning(|_, _| false);
    supported.expect_supports().returning(|_, _| true);

    let expected = Converter::plain(supported);
    let mut registry = TransformerRegistry::new();
    registry
        .add(Converter::plain(not_supported))
        .unwrap()
        .add(expected.clone())
        .unwrap();

    let found = registry
        .find_supported_transformer(&order(), "SomeClass", None)
        .unwrap();
    assert!(found.same_as(&expected));
}

#[test]
fn exact_pair_short_circuits_general_transformers() {
    let mut general = MockPlain::new();
    general.expect_supports().never();
    general.expect_transform().never();

    let mut registry = TransformerRegistry::new();
    registry
        .add_transformer(Converter::plain(general), 1000)
        .unwrap()
        .add_transformer(Converter::object(PointToVector), -1000)
        .unwrap();

    let point = Model::object(Point { x: 3, y: 4 });
    assert!(registry.supports(&point, "Vector", None));
    assert_eq!(
        registry.transform(&point, "Vector", None),
        Ok(Model::from(vec![Model::from(3), Model::from(4)]))
    );
}

#[test]
fn null_is_transformed_without_consulting_transformers() {
    let mut plain = MockPlain::new();
    plain.expect_supports().never();
    plain.expect_transform().never();

    let mut registry = TransformerRegistry::new();
    registry.add(Converter::plain(plain)).unwrap();

    for target in ["SomeClass", "Vector", ""] {
        assert!(registry.supports(&Model::Null, target, None));
        assert_eq!(registry.transform(&Model::Null, target, None), Ok(Model::Null));
    }
}

#[test]
fn transformer_errors_propagate_unchanged() {
    let mut failing = MockPlain::new();
    failing.expect_supports().returning(|_, _| true);
    failing
        .expect_transform()
        .returning(|_, _| Err(TransformError::conversion("order_dto", "missing customer")));

    let mut registry = TransformerRegistry::new();
    registry.add(Converter::plain(failing)).unwrap();

    assert_eq!(
        registry.transform(&order(), "OrderDto", None),
        Err(TransformError::conversion("order_dto", "missing customer"))
    );
}

#[test]
fn unsupported_error_names_source_and_target() {
    let registry = TransformerRegistry::new();
    let err = registry
        .transform(&Model::object(Point { x: 0, y: 0 }), "Vector", None)
        .unwrap_err();

    assert_eq!(
        err,
        TransformError::unsupported(type_name_of::<Point>(), "Vector")
    );
    insta::assert_snapshot!(
        err.to_string(),
        @r#"can not transform value of type "dispatch::Point" to type "Vector""#
    );
}

#[test]
fn rejected_registration_leaves_registry_unchanged() {
    struct Nameless;

    impl ObjectTransformer for Nameless {
        fn name(&self) -> &str {
            "nameless"
        }

        fn supported_type(&self) -> &str {
            ""
        }

        fn target_type(&self) -> &str {
            "Vector"
        }

        fn transform(&self, value: &Model) -> Result<Model, TransformError> {
            Ok(value.clone())
        }
    }

    let mut registry = TransformerRegistry::new();
    registry.add(Converter::object(PointToVector)).unwrap();
    let before = registry.transformers().len();

    let err = registry.add(Converter::object(Nameless)).unwrap_err();
    insta::assert_snapshot!(
        err.to_string(),
        @"configuration error: nameless: exact-pair transformer declares an empty supported type"
    );
    assert_eq!(registry.transformers().len(), before);
    assert_eq!(registry.len(), 1);
}

#[test]
fn repeated_transforms_are_equal_and_leave_registry_unchanged() {
    let mut registry = TransformerRegistry::new();
    registry.add(Converter::object(PointToVector)).unwrap();

    let point = Model::object(Point { x: 1, y: 2 });
    let first = registry.transform(&point, "Vector", None);
    let second = registry.transform(&point, "Vector", None);

    assert_eq!(first, second);
    assert_eq!(registry.len(), 1);
    assert_eq!(registry.transformers().len(), 1);
}

#[test]
fn lists_transformers_in_resolution_order() {
    let mut registry = TransformerRegistry::new();
    let mut low = MockPlain::new();
    let mut high = MockPlain::new();
    low.expect_supports().never();
    high.expect_supports().never();

    registry
        .add_transformer(Converter::plain(low), -5)
        .unwrap()
        .add_transformer(Converter::contextual(Recording::default()), 3)
        .unwrap()
        .add_transformer(Converter::plain(high), 10)
        .unwrap()
        .add_transformer(Converter::object(PointToVector), 0)
        .unwrap();

    let listing = registry
        .transformers()
        .iter()
        .map(|c| format!("{}:{}", c.kind(), c.name().rsplit("::").next().unwrap_or_default()))
        .collect::<Vec<_>>()
        .join(", ");
    insta::assert_snapshot!(
        listing,
        @"object:point_to_vector, plain:MockPlain, contextual:recording, plain:MockPlain"
    );
}

#[test]
fn frozen_registry_is_shared_across_threads() {
    let mut registry = TransformerRegistry::new();
    registry.add(Converter::object(PointToVector)).unwrap();
    let registry = std::sync::Arc::new(registry);

    std::thread::scope(|scope| {
        for i in 0..4_i64 {
            let registry = registry.clone();
            scope.spawn(move || {
                let point = Model::object(Point { x: i, y: -i });
                assert_eq!(
                    registry.transform(&point, "Vector", None),
                    Ok(Model::from(vec![Model::from(i), Model::from(-i)]))
                );
            });
        }
    });
}
