use tycho_resolve::{resolve_param_type, ParamRef, ResolveError};
use tycho_types::{
    ClassDef, ClassId, ClassKind, CtorDef, MethodDef, ParamDef, Type, TypeEnv, TypeStore,
};

use pretty_assertions::assert_eq;

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init();
}

struct Fixture {
    store: TypeStore,
    boxed: ClassId,
    string_box: ClassId,
    integer_box: ClassId,
    pair: ClassId,
    int_string_pair: ClassId,
    wrapper: ClassId,
    string_wrapper: ClassId,
}

/// `Box<T>` with `get(): T` / `set(T)`, `Pair<A, B>` with `first(): A`,
/// `second(): B` and `both(): Pair<A, B>`, `Wrapper<T>` with
/// `items(): List<T>`, plus concrete subclasses supplying the arguments.
fn fixture() -> Fixture {
    let mut store = TypeStore::with_minimal_jdk();
    let object_ty = Type::class(store.well_known().object, vec![]);
    let string_ty = Type::class(store.well_known().string, vec![]);
    let integer_ty = Type::class(store.well_known().integer, vec![]);
    let list = store.well_known().list;

    let box_t = store.add_type_param("T", vec![object_ty.clone()]);
    let boxed = store.add_class(ClassDef {
        name: "com.example.Box".to_string(),
        kind: ClassKind::Class,
        type_params: vec![box_t],
        super_class: Some(object_ty.clone()),
        interfaces: vec![],
        fields: vec![],
        constructors: vec![CtorDef {
            params: vec![ParamDef::named("value", Type::TypeVar(box_t))],
        }],
        methods: vec![
            MethodDef {
                name: "get".to_string(),
                type_params: vec![],
                params: vec![],
                return_type: Type::TypeVar(box_t),
                is_static: false,
            },
            MethodDef {
                name: "set".to_string(),
                type_params: vec![],
                params: vec![ParamDef {
                    name: Some("value".to_string()),
                    ty: Type::TypeVar(box_t),
                    annotations: vec!["@Nullable".to_string()],
                }],
                return_type: Type::Void,
                is_static: false,
            },
        ],
    });

    let string_box = store.add_class(ClassDef {
        name: "com.example.StringBox".to_string(),
        kind: ClassKind::Class,
        type_params: vec![],
        super_class: Some(Type::class(boxed, vec![string_ty.clone()])),
        interfaces: vec![],
        fields: vec![],
        constructors: vec![],
        methods: vec![],
    });

    let integer_box = store.add_class(ClassDef {
        name: "com.example.IntegerBox".to_string(),
        kind: ClassKind::Class,
        type_params: vec![],
        super_class: Some(Type::class(boxed, vec![integer_ty.clone()])),
        interfaces: vec![],
        fields: vec![],
        constructors: vec![],
        methods: vec![],
    });

    let pair_a = store.add_type_param("A", vec![object_ty.clone()]);
    let pair_b = store.add_type_param("B", vec![object_ty.clone()]);
    let pair = store.add_class(ClassDef {
        name: "com.example.Pair".to_string(),
        kind: ClassKind::Class,
        type_params: vec![pair_a, pair_b],
        super_class: Some(object_ty.clone()),
        interfaces: vec![],
        fields: vec![],
        constructors: vec![],
        methods: vec![
            MethodDef {
                name: "first".to_string(),
                type_params: vec![],
                params: vec![],
                return_type: Type::TypeVar(pair_a),
                is_static: false,
            },
            MethodDef {
                name: "second".to_string(),
                type_params: vec![],
                params: vec![],
                return_type: Type::TypeVar(pair_b),
                is_static: false,
            },
        ],
    });
    // `both(): Pair<A, B>` needs Pair's own id, so it is added after.
    store.class_mut(pair).unwrap().methods.push(MethodDef {
        name: "both".to_string(),
        type_params: vec![],
        params: vec![],
        return_type: Type::class(pair, vec![Type::TypeVar(pair_a), Type::TypeVar(pair_b)]),
        is_static: false,
    });

    let int_string_pair = store.add_class(ClassDef {
        name: "com.example.IntStringPair".to_string(),
        kind: ClassKind::Class,
        type_params: vec![],
        super_class: Some(Type::class(pair, vec![integer_ty, string_ty.clone()])),
        interfaces: vec![],
        fields: vec![],
        constructors: vec![],
        methods: vec![],
    });

    let wrapper_t = store.add_type_param("T", vec![object_ty.clone()]);
    let wrapper = store.add_class(ClassDef {
        name: "com.example.Wrapper".to_string(),
        kind: ClassKind::Class,
        type_params: vec![wrapper_t],
        super_class: Some(object_ty.clone()),
        interfaces: vec![],
        fields: vec![],
        constructors: vec![],
        methods: vec![MethodDef {
            name: "items".to_string(),
            type_params: vec![],
            params: vec![],
            return_type: Type::class(list, vec![Type::TypeVar(wrapper_t)]),
            is_static: false,
        }],
    });

    let string_wrapper = store.add_class(ClassDef {
        name: "com.example.StringWrapper".to_string(),
        kind: ClassKind::Class,
        type_params: vec![],
        super_class: Some(Type::class(wrapper, vec![string_ty])),
        interfaces: vec![],
        fields: vec![],
        constructors: vec![],
        methods: vec![],
    });

    Fixture {
        store,
        boxed,
        string_box,
        integer_box,
        pair,
        int_string_pair,
        wrapper,
        string_wrapper,
    }
}

#[test]
fn box_return_resolves_to_string() {
    init_tracing();
    let fx = fixture();
    let string_ty = Type::class(fx.store.well_known().string, vec![]);

    let mut param = ParamRef::method(&fx.store, fx.boxed, "get", vec![], -1).unwrap();
    let resolved = resolve_param_type(&fx.store, &mut param, fx.string_box).unwrap();
    assert_eq!(resolved, string_ty);
    assert_eq!(param.resolved_type(), Some(&string_ty));
    assert_eq!(param.containing_class(), Some(fx.string_box));
}

#[test]
fn pair_components_resolve_independently() {
    let fx = fixture();
    let string_ty = Type::class(fx.store.well_known().string, vec![]);
    let integer_ty = Type::class(fx.store.well_known().integer, vec![]);

    let mut first = ParamRef::method(&fx.store, fx.pair, "first", vec![], -1).unwrap();
    assert_eq!(
        resolve_param_type(&fx.store, &mut first, fx.int_string_pair).unwrap(),
        integer_ty,
    );

    let mut second = ParamRef::method(&fx.store, fx.pair, "second", vec![], -1).unwrap();
    assert_eq!(
        resolve_param_type(&fx.store, &mut second, fx.int_string_pair).unwrap(),
        string_ty,
    );
}

#[test]
fn nested_generic_unwraps_per_level() {
    let fx = fixture();
    let list = fx.store.well_known().list;
    let string_ty = Type::class(fx.store.well_known().string, vec![]);

    let mut level_one = ParamRef::method(&fx.store, fx.wrapper, "items", vec![], -1).unwrap();
    assert_eq!(
        resolve_param_type(&fx.store, &mut level_one, fx.string_wrapper).unwrap(),
        Type::class(list, vec![]),
    );

    let mut level_two = level_one.with_nesting_level(2);
    assert_eq!(
        resolve_param_type(&fx.store, &mut level_two, fx.string_wrapper).unwrap(),
        string_ty,
    );
}

#[test]
fn nesting_type_index_selects_the_argument() {
    let fx = fixture();
    let string_ty = Type::class(fx.store.well_known().string, vec![]);
    let integer_ty = Type::class(fx.store.well_known().integer, vec![]);

    let both = ParamRef::method(&fx.store, fx.pair, "both", vec![], -1).unwrap();

    let mut probe = both.clone();
    assert_eq!(probe.generic_type(&fx.store).unwrap().type_argument_count(), 2);

    // Default at level 2 is the first argument.
    let mut first = both.with_nesting_level(2);
    assert_eq!(
        resolve_param_type(&fx.store, &mut first, fx.int_string_pair).unwrap(),
        integer_ty,
    );

    let mut second = both.with_nesting_level(2);
    second.set_type_index_for_level(2, 1);
    assert_eq!(
        resolve_param_type(&fx.store, &mut second, fx.int_string_pair).unwrap(),
        string_ty,
    );
}

#[test]
fn constructor_parameters_resolve_like_method_parameters() {
    let fx = fixture();
    let object_ty = Type::class(fx.store.well_known().object, vec![]);
    let string_ty = Type::class(fx.store.well_known().string, vec![]);

    // Box(T value): the erased signature is (Object).
    let mut param =
        ParamRef::constructor(&fx.store, fx.boxed, vec![object_ty], 0).unwrap();
    assert_eq!(
        resolve_param_type(&fx.store, &mut param, fx.string_box).unwrap(),
        string_ty,
    );
}

#[test]
fn unrelated_implementation_class_is_rejected() {
    let fx = fixture();

    let mut param = ParamRef::method(&fx.store, fx.pair, "first", vec![], -1).unwrap();
    let err = resolve_param_type(&fx.store, &mut param, fx.string_box).unwrap_err();
    assert!(matches!(
        err,
        ResolveError::UnrelatedClass { implementation, declaring }
            if implementation == fx.string_box && declaring == fx.pair,
    ));
}

#[test]
fn resolving_against_the_declaring_class_falls_back_to_bounds() {
    let mut fx = fixture();
    let number = fx.store.class_id("java.lang.Number").unwrap();
    let number_ty = Type::class(number, vec![]);
    let object_ty = Type::class(fx.store.well_known().object, vec![]);

    // Counter<N extends Number> with peek(): N, resolved against Counter
    // itself: no bindings exist, so N falls back to its declared bound.
    let n = fx.store.add_type_param("N", vec![number_ty.clone()]);
    let counter = fx.store.add_class(ClassDef {
        name: "com.example.Counter".to_string(),
        kind: ClassKind::Class,
        type_params: vec![n],
        super_class: Some(object_ty),
        interfaces: vec![],
        fields: vec![],
        constructors: vec![],
        methods: vec![MethodDef {
            name: "peek".to_string(),
            type_params: vec![],
            params: vec![],
            return_type: Type::TypeVar(n),
            is_static: false,
        }],
    });

    let mut param = ParamRef::method(&fx.store, counter, "peek", vec![], -1).unwrap();
    assert_eq!(
        resolve_param_type(&fx.store, &mut param, counter).unwrap(),
        number_ty,
    );
}

#[test]
fn changing_the_containing_class_invalidates_memoized_results() {
    let fx = fixture();
    let string_ty = Type::class(fx.store.well_known().string, vec![]);
    let integer_ty = Type::class(fx.store.well_known().integer, vec![]);

    let mut param = ParamRef::method(&fx.store, fx.boxed, "get", vec![], -1).unwrap();

    assert_eq!(
        resolve_param_type(&fx.store, &mut param, fx.string_box).unwrap(),
        string_ty,
    );
    assert_eq!(param.resolved_type(), Some(&string_ty));

    // The same descriptor re-rooted at another implementation class must
    // recompute, not serve the stale memo.
    assert_eq!(
        resolve_param_type(&fx.store, &mut param, fx.integer_box).unwrap(),
        integer_ty,
    );
    assert_eq!(param.resolved_type(), Some(&integer_ty));
}

#[test]
fn annotated_parameter_metadata_is_memoized_per_level() {
    let fx = fixture();
    let object_ty = Type::class(fx.store.well_known().object, vec![]);

    let mut param =
        ParamRef::method(&fx.store, fx.boxed, "set", vec![object_ty], 0).unwrap();
    assert_eq!(param.parameter_name(&fx.store).unwrap(), Some("value".to_string()));
    assert_eq!(
        param.annotations(&fx.store).unwrap(),
        vec!["@Nullable".to_string()],
    );
}
