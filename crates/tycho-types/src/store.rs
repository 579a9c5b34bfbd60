use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::{
    ClassDef, ClassId, ClassKind, CtorDef, MethodDef, ParamDef, PrimitiveType, Type, TypeEnv,
    TypeParamDef, TypeVarId, WellKnownTypes,
};

static NEXT_UNIVERSE: AtomicU64 = AtomicU64::new(1);

/// The in-memory registry of class and type-parameter declarations.
///
/// Ids are allocation indices and stay valid for the lifetime of the store.
/// Mutation is only possible through `&mut self`; every resolution algorithm
/// reads the store through [`TypeEnv`], so a store shared behind `&` is safe
/// to consult from any number of threads.
///
/// Every store gets a fresh universe id (clones included): ids from
/// different stores are unrelated, and the process-wide shape cache keys on
/// the universe to keep them apart.
#[derive(Debug)]
pub struct TypeStore {
    universe: u64,
    classes: Vec<ClassDef>,
    type_params: Vec<TypeParamDef>,
    by_name: HashMap<String, ClassId>,
    well_known: WellKnownTypes,
}

impl Clone for TypeStore {
    fn clone(&self) -> Self {
        Self {
            universe: NEXT_UNIVERSE.fetch_add(1, Ordering::Relaxed),
            classes: self.classes.clone(),
            type_params: self.type_params.clone(),
            by_name: self.by_name.clone(),
            well_known: self.well_known,
        }
    }
}

impl TypeStore {
    /// Create a store seeded with a minimal JDK-like universe: `Object`,
    /// `Cloneable`, `Serializable`, `String`, `Number`, `Integer`,
    /// `List<E>` and `ArrayList<E>`.
    pub fn with_minimal_jdk() -> Self {
        let mut classes = Vec::new();
        let mut type_params = Vec::new();
        let mut by_name = HashMap::new();

        let add = |classes: &mut Vec<ClassDef>,
                   by_name: &mut HashMap<String, ClassId>,
                   def: ClassDef| {
            let id = ClassId::new(classes.len() as u32);
            by_name.insert(def.name.clone(), id);
            classes.push(def);
            id
        };

        let object = add(
            &mut classes,
            &mut by_name,
            ClassDef {
                name: "java.lang.Object".to_string(),
                kind: ClassKind::Class,
                type_params: vec![],
                super_class: None,
                interfaces: vec![],
                fields: vec![],
                constructors: vec![CtorDef { params: vec![] }],
                methods: vec![MethodDef {
                    name: "hashCode".to_string(),
                    type_params: vec![],
                    params: vec![],
                    return_type: Type::Primitive(PrimitiveType::Int),
                    is_static: false,
                }],
            },
        );
        let object_ty = Type::class(object, vec![]);

        let cloneable = add(
            &mut classes,
            &mut by_name,
            ClassDef {
                name: "java.lang.Cloneable".to_string(),
                kind: ClassKind::Interface,
                type_params: vec![],
                super_class: Some(object_ty.clone()),
                interfaces: vec![],
                fields: vec![],
                constructors: vec![],
                methods: vec![],
            },
        );

        let serializable = add(
            &mut classes,
            &mut by_name,
            ClassDef {
                name: "java.io.Serializable".to_string(),
                kind: ClassKind::Interface,
                type_params: vec![],
                super_class: Some(object_ty.clone()),
                interfaces: vec![],
                fields: vec![],
                constructors: vec![],
                methods: vec![],
            },
        );

        let string = add(
            &mut classes,
            &mut by_name,
            ClassDef {
                name: "java.lang.String".to_string(),
                kind: ClassKind::Class,
                type_params: vec![],
                super_class: Some(object_ty.clone()),
                interfaces: vec![Type::class(serializable, vec![])],
                fields: vec![],
                constructors: vec![CtorDef { params: vec![] }],
                methods: vec![MethodDef {
                    name: "length".to_string(),
                    type_params: vec![],
                    params: vec![],
                    return_type: Type::Primitive(PrimitiveType::Int),
                    is_static: false,
                }],
            },
        );

        let number = add(
            &mut classes,
            &mut by_name,
            ClassDef {
                name: "java.lang.Number".to_string(),
                kind: ClassKind::Class,
                type_params: vec![],
                super_class: Some(object_ty.clone()),
                interfaces: vec![Type::class(serializable, vec![])],
                fields: vec![],
                constructors: vec![],
                methods: vec![],
            },
        );

        let integer = add(
            &mut classes,
            &mut by_name,
            ClassDef {
                name: "java.lang.Integer".to_string(),
                kind: ClassKind::Class,
                type_params: vec![],
                super_class: Some(Type::class(number, vec![])),
                interfaces: vec![],
                fields: vec![],
                constructors: vec![],
                methods: vec![],
            },
        );

        // List<E> and ArrayList<E>. Their `E`s are distinct declaration
        // sites; ArrayList forwards its own E to List's.
        let list_e = TypeVarId::new(type_params.len() as u32);
        type_params.push(TypeParamDef {
            name: "E".to_string(),
            upper_bounds: vec![object_ty.clone()],
        });
        let list = add(
            &mut classes,
            &mut by_name,
            ClassDef {
                name: "java.util.List".to_string(),
                kind: ClassKind::Interface,
                type_params: vec![list_e],
                super_class: Some(object_ty.clone()),
                interfaces: vec![],
                fields: vec![],
                constructors: vec![],
                methods: vec![
                    MethodDef {
                        name: "get".to_string(),
                        type_params: vec![],
                        params: vec![ParamDef::named(
                            "index",
                            Type::Primitive(PrimitiveType::Int),
                        )],
                        return_type: Type::TypeVar(list_e),
                        is_static: false,
                    },
                    MethodDef {
                        name: "size".to_string(),
                        type_params: vec![],
                        params: vec![],
                        return_type: Type::Primitive(PrimitiveType::Int),
                        is_static: false,
                    },
                ],
            },
        );

        let array_list_e = TypeVarId::new(type_params.len() as u32);
        type_params.push(TypeParamDef {
            name: "E".to_string(),
            upper_bounds: vec![object_ty],
        });
        add(
            &mut classes,
            &mut by_name,
            ClassDef {
                name: "java.util.ArrayList".to_string(),
                kind: ClassKind::Class,
                type_params: vec![array_list_e],
                super_class: Some(Type::class(object, vec![])),
                interfaces: vec![
                    Type::class(list, vec![Type::TypeVar(array_list_e)]),
                    Type::class(cloneable, vec![]),
                    Type::class(serializable, vec![]),
                ],
                fields: vec![],
                constructors: vec![CtorDef { params: vec![] }],
                methods: vec![],
            },
        );

        Self {
            universe: NEXT_UNIVERSE.fetch_add(1, Ordering::Relaxed),
            classes,
            type_params,
            by_name,
            well_known: WellKnownTypes {
                object,
                cloneable,
                serializable,
                string,
                integer,
                list,
            },
        }
    }

    /// Register a class definition and return its id.
    pub fn add_class(&mut self, def: ClassDef) -> ClassId {
        let id = ClassId::new(self.classes.len() as u32);
        self.by_name.insert(def.name.clone(), id);
        self.classes.push(def);
        id
    }

    /// Allocate a fresh type variable with the given bounds. The returned id
    /// is the variable's declaration-site identity.
    pub fn add_type_param(&mut self, name: &str, upper_bounds: Vec<Type>) -> TypeVarId {
        let id = TypeVarId::new(self.type_params.len() as u32);
        self.type_params.push(TypeParamDef {
            name: name.to_string(),
            upper_bounds,
        });
        id
    }

    pub fn class_id(&self, name: &str) -> Option<ClassId> {
        self.by_name.get(name).copied()
    }

    pub fn class_mut(&mut self, id: ClassId) -> Option<&mut ClassDef> {
        self.classes.get_mut(id.index())
    }

    pub fn type_param_mut(&mut self, id: TypeVarId) -> Option<&mut TypeParamDef> {
        self.type_params.get_mut(id.index())
    }
}

impl TypeEnv for TypeStore {
    fn class(&self, id: ClassId) -> Option<&ClassDef> {
        self.classes.get(id.index())
    }

    fn type_param(&self, id: TypeVarId) -> Option<&TypeParamDef> {
        self.type_params.get(id.index())
    }

    fn lookup_class(&self, name: &str) -> Option<ClassId> {
        self.by_name.get(name).copied()
    }

    fn well_known(&self) -> &WellKnownTypes {
        &self.well_known
    }

    fn universe_id(&self) -> u64 {
        self.universe
    }
}
