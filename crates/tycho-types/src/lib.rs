//! The modeled type universe Tycho resolves against.
//!
//! There is no runtime introspection to lean on, so generic declarations are
//! described explicitly: classes, their type parameters, members and
//! inheritance are registered in a [`TypeStore`] and consulted through the
//! [`TypeEnv`] trait. [`Type`] is the plain structural representation of a
//! generic type expression; the shape layer (`tycho-shape`) wraps it with
//! resolution context.

mod lookup;
mod store;
mod subst;

pub use lookup::{find_constructor, find_field, find_method};
pub use store::TypeStore;
pub use subst::{
    contains_type_var, erasure, is_assignable_class, substitute, supertype_bindings, view_as,
};

use serde::{Deserialize, Serialize};

pub use tycho_ids::{ClassId, TypeVarId};

/// Built-in value types.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PrimitiveType {
    Boolean,
    Byte,
    Short,
    Int,
    Long,
    Char,
    Float,
    Double,
}

/// A class reference with its type arguments. `args` is empty for raw uses of
/// a generic class as well as for non-generic classes.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ClassType {
    pub def: ClassId,
    pub args: Vec<Type>,
}

/// Wildcard bounds. Both lists may be empty; an unbounded wildcard has
/// neither upper nor lower bounds.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct WildcardType {
    pub upper: Vec<Type>,
    pub lower: Vec<Type>,
}

/// A structural generic type expression.
///
/// `Empty` is the "no type" sentinel: every operation on it yields `Empty`
/// again (or nothing), never an error.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Type {
    Class(ClassType),
    Array(Box<Type>),
    TypeVar(TypeVarId),
    Wildcard(WildcardType),
    Primitive(PrimitiveType),
    Void,
    Empty,
}

impl Type {
    pub fn class(def: ClassId, args: Vec<Type>) -> Type {
        Type::Class(ClassType { def, args })
    }

    pub fn array(component: Type) -> Type {
        Type::Array(Box::new(component))
    }

    pub fn is_array(&self) -> bool {
        matches!(self, Type::Array(_))
    }

    pub fn is_primitive(&self) -> bool {
        matches!(self, Type::Primitive(_))
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Type::Empty)
    }

    /// The declared element type of an array. `None` for anything that is not
    /// an array.
    pub fn component(&self) -> Option<&Type> {
        match self {
            Type::Array(component) => Some(component),
            _ => None,
        }
    }

    /// The raw class behind this type, if there is one: the class itself for
    /// class types, regardless of type arguments.
    pub fn as_class(&self) -> Option<ClassId> {
        match self {
            Type::Class(class) => Some(class.def),
            _ => None,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ClassKind {
    Class,
    Interface,
}

/// A declared type parameter. The owning `TypeVarId` is the variable's
/// identity; the name exists for diagnostics only.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeParamDef {
    pub name: String,
    pub upper_bounds: Vec<Type>,
}

/// A formal parameter of a method or constructor.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParamDef {
    pub name: Option<String>,
    pub ty: Type,
    pub annotations: Vec<String>,
}

impl ParamDef {
    pub fn new(ty: Type) -> Self {
        Self {
            name: None,
            ty,
            annotations: Vec::new(),
        }
    }

    pub fn named(name: impl Into<String>, ty: Type) -> Self {
        Self {
            name: Some(name.into()),
            ty,
            annotations: Vec::new(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MethodDef {
    pub name: String,
    pub type_params: Vec<TypeVarId>,
    pub params: Vec<ParamDef>,
    pub return_type: Type,
    pub is_static: bool,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CtorDef {
    pub params: Vec<ParamDef>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldDef {
    pub name: String,
    pub ty: Type,
    pub is_static: bool,
}

/// A registered class or interface declaration.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassDef {
    pub name: String,
    pub kind: ClassKind,
    pub type_params: Vec<TypeVarId>,
    pub super_class: Option<Type>,
    pub interfaces: Vec<Type>,
    pub fields: Vec<FieldDef>,
    pub constructors: Vec<CtorDef>,
    pub methods: Vec<MethodDef>,
}

/// Ids of the handful of classes every universe is seeded with.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct WellKnownTypes {
    pub object: ClassId,
    pub cloneable: ClassId,
    pub serializable: ClassId,
    pub string: ClassId,
    pub integer: ClassId,
    pub list: ClassId,
}

/// Read access to the type universe.
///
/// All resolution algorithms are written against this trait so callers can
/// supply registries other than [`TypeStore`] (layered or filtered views).
pub trait TypeEnv {
    fn class(&self, id: ClassId) -> Option<&ClassDef>;

    fn type_param(&self, id: TypeVarId) -> Option<&TypeParamDef>;

    fn lookup_class(&self, name: &str) -> Option<ClassId>;

    fn well_known(&self) -> &WellKnownTypes;

    /// Identity of this universe. Ids are allocation indices, so numerically
    /// equal ids from different registries are unrelated; process-wide
    /// structural identity (the shape cache) must include this.
    fn universe_id(&self) -> u64;
}

/// `java.lang.Object` as a type, the universal fallback bound.
pub fn object_type(env: &dyn TypeEnv) -> Type {
    Type::class(env.well_known().object, vec![])
}
