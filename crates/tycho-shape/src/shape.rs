use std::collections::hash_map::DefaultHasher;
use std::collections::HashSet;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::{Arc, OnceLock};

use once_cell::sync::OnceCell;
use tycho_types::{
    contains_type_var, erasure, object_type, view_as, ClassId, ClassType, Type, TypeEnv,
    TypeVarId,
};

use crate::cache::ShapeCache;
use crate::handle::{HandleError, Provenance};
use crate::resolver::VariableResolver;

/// Upper bound on recursive resolution depth. Cyclic variable bounds are
/// already cut off by a seen-set; this bounds pathological non-cyclic
/// nesting as well.
pub const MAX_RESOLUTION_DEPTH: usize = 64;

pub(crate) struct ShapeInner {
    ty: Type,
    provenance: Option<Provenance>,
    resolver: Option<Arc<dyn VariableResolver>>,
    component: Option<TypeShape>,
    hash: u64,
    /// Erased raw type, filled on first use (and primed by the cache).
    raw: OnceCell<Type>,
}

impl PartialEq for ShapeInner {
    fn eq(&self, other: &Self) -> bool {
        // Provenance is excluded on purpose: it records where a type was
        // read from, and its underlying type is already `ty`. Two shapes
        // built from different origins but the same logical type must
        // compare equal.
        //
        // The precomputed hash participates because it carries the universe
        // id: ids from different registries are unrelated even when
        // numerically equal.
        self.hash == other.hash
            && self.ty == other.ty
            && self.resolver.as_ref().map(|r| r.source())
                == other.resolver.as_ref().map(|r| r.source())
            && self.component == other.component
    }
}

impl Eq for ShapeInner {}

/// An immutable generic type expression plus the context needed to resolve
/// and erase it. Cloning is cheap and shares the underlying record.
#[derive(Clone)]
pub struct TypeShape {
    pub(crate) inner: Arc<ShapeInner>,
}

impl PartialEq for TypeShape {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner) || *self.inner == *other.inner
    }
}

impl Eq for TypeShape {}

impl Hash for TypeShape {
    fn hash<H: Hasher>(&self, state: &mut H) {
        state.write_u64(self.inner.hash);
    }
}

impl fmt::Debug for TypeShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeShape")
            .field("ty", &self.inner.ty)
            .field("has_resolver", &self.inner.resolver.is_some())
            .field("has_provenance", &self.inner.provenance.is_some())
            .finish_non_exhaustive()
    }
}

static NONE_SHAPE: OnceLock<TypeShape> = OnceLock::new();

impl TypeShape {
    /// The "no type" sentinel. Every operation on it yields the sentinel
    /// again, never an error.
    pub fn none() -> TypeShape {
        NONE_SHAPE
            .get_or_init(|| Self::new_uncached(0, Type::Empty, None, None, None))
            .clone()
    }

    /// A shape for a plain type expression with no resolution scope.
    pub fn for_type(env: &dyn TypeEnv, ty: Type) -> TypeShape {
        Self::for_type_resolved(env, ty, None)
    }

    /// A shape for a type expression whose variables resolve through
    /// `resolver`.
    pub fn for_type_resolved(
        env: &dyn TypeEnv,
        ty: Type,
        resolver: Option<Arc<dyn VariableResolver>>,
    ) -> TypeShape {
        if ty.is_empty() {
            return Self::none();
        }
        let shape = Self::new_uncached(env.universe_id(), ty, None, resolver, None);
        ShapeCache::global().intern(env, shape)
    }

    /// A shape read through a durable handle. The handle is kept as the
    /// shape's provenance; re-acquisition failures surface here.
    pub fn for_provenance(
        env: &dyn TypeEnv,
        provenance: Provenance,
    ) -> Result<TypeShape, HandleError> {
        let ty = provenance.provided_type(env)?;
        if ty.is_empty() {
            return Ok(Self::none());
        }
        let shape = Self::new_uncached(env.universe_id(), ty, Some(provenance), None, None);
        Ok(ShapeCache::global().intern(env, shape))
    }

    /// An array shape whose component shape is already known, bypassing
    /// recomputation in [`TypeShape::component_type`].
    pub fn for_array_of(env: &dyn TypeEnv, component: TypeShape) -> TypeShape {
        if component.is_none() {
            return Self::none();
        }
        let ty = Type::array(component.ty().clone());
        let resolver = component.inner.resolver.clone();
        let shape =
            Self::new_uncached(env.universe_id(), ty, None, resolver, Some(component));
        ShapeCache::global().intern(env, shape)
    }

    pub(crate) fn new_uncached(
        universe: u64,
        ty: Type,
        provenance: Option<Provenance>,
        resolver: Option<Arc<dyn VariableResolver>>,
        component: Option<TypeShape>,
    ) -> TypeShape {
        let hash = structural_hash(universe, &ty, resolver.as_deref(), component.as_ref());
        TypeShape {
            inner: Arc::new(ShapeInner {
                ty,
                provenance,
                resolver,
                component,
                hash,
                raw: OnceCell::new(),
            }),
        }
    }

    pub fn ty(&self) -> &Type {
        &self.inner.ty
    }

    pub fn provenance(&self) -> Option<&Provenance> {
        self.inner.provenance.as_ref()
    }

    pub fn resolver(&self) -> Option<&Arc<dyn VariableResolver>> {
        self.inner.resolver.as_ref()
    }

    pub fn is_none(&self) -> bool {
        self.inner.ty.is_empty()
    }

    /// Whether two shapes share the same underlying record (the strongest
    /// form of "same canonical entry").
    pub fn ptr_eq(a: &TypeShape, b: &TypeShape) -> bool {
        Arc::ptr_eq(&a.inner, &b.inner)
    }

    /// The precomputed structural hash, also used as the cache key.
    pub fn structural_hash(&self) -> u64 {
        self.inner.hash
    }

    /// Collapse this shape to its erasure: a parameterized type yields its
    /// raw class, an array yields an array of its component's erasure, a
    /// variable or wildcard yields its first upper bound's erasure (`Object`
    /// when unbounded). The sentinel stays the sentinel. Memoized.
    pub fn raw_type(&self, env: &dyn TypeEnv) -> Type {
        self.inner
            .raw
            .get_or_init(|| erasure(env, &self.resolved_ty(env)))
            .clone()
    }

    /// The element shape of an array. Non-arrays (including the sentinel)
    /// yield the sentinel.
    pub fn component_type(&self, env: &dyn TypeEnv) -> TypeShape {
        if self.is_none() {
            return self.clone();
        }
        if let Some(component) = &self.inner.component {
            return component.clone();
        }
        match &self.inner.ty {
            Type::Array(component) => Self::for_type_resolved(
                env,
                (**component).clone(),
                self.inner.resolver.clone(),
            ),
            _ => Self::none(),
        }
    }

    /// The `index`-th type argument of a parameterized shape, inheriting
    /// this shape's resolution scope. Anything else yields the sentinel.
    pub fn type_argument(&self, env: &dyn TypeEnv, index: usize) -> TypeShape {
        match &self.inner.ty {
            Type::Class(ClassType { args, .. }) => match args.get(index) {
                Some(arg) => {
                    Self::for_type_resolved(env, arg.clone(), self.inner.resolver.clone())
                }
                None => Self::none(),
            },
            _ => Self::none(),
        }
    }

    pub fn type_argument_count(&self) -> usize {
        match &self.inner.ty {
            Type::Class(ClassType { args, .. }) => args.len(),
            _ => 0,
        }
    }

    /// Replace every reachable type variable through `resolver`, recursing
    /// into class arguments, array components and wildcard bounds.
    ///
    /// A variable the resolver does not bind falls back to its declared
    /// upper bound, or `Object` when unbounded: resolution never produces
    /// the sentinel and never fails. Shapes with no reachable variables are
    /// returned unchanged (same underlying record).
    pub fn resolve(&self, env: &dyn TypeEnv, resolver: &Arc<dyn VariableResolver>) -> TypeShape {
        if self.is_none() || !contains_type_var(&self.inner.ty) {
            return self.clone();
        }
        let resolved = resolve_type(
            env,
            &self.inner.ty,
            resolver.as_ref(),
            &mut HashSet::new(),
            0,
        );
        Self::for_type_resolved(env, resolved, Some(resolver.clone()))
    }

    /// View this shape as `target` by walking the supertype graph, keeping
    /// the resolution scope. Unrelated targets yield the sentinel.
    pub fn as_supertype(&self, env: &dyn TypeEnv, target: ClassId) -> TypeShape {
        if self.is_none() {
            return self.clone();
        }
        match view_as(env, &self.resolved_ty(env), target) {
            Some(viewed) => Self::for_type_resolved(env, viewed, self.inner.resolver.clone()),
            None => Self::none(),
        }
    }

    /// `ty` with the attached resolution scope applied, when there is one.
    fn resolved_ty(&self, env: &dyn TypeEnv) -> Type {
        match &self.inner.resolver {
            Some(resolver) if contains_type_var(&self.inner.ty) => resolve_type(
                env,
                &self.inner.ty,
                resolver.as_ref(),
                &mut HashSet::new(),
                0,
            ),
            _ => self.inner.ty.clone(),
        }
    }

    pub(crate) fn is_cacheable(&self) -> bool {
        match &self.inner.ty {
            Type::Class(class) => !class.args.is_empty(),
            Type::Array(_) => {
                self.inner.resolver.is_some()
                    || self.inner.component.is_some()
                    || contains_type_var(&self.inner.ty)
            }
            Type::TypeVar(_) | Type::Wildcard(_) => true,
            Type::Primitive(_) | Type::Void | Type::Empty => false,
        }
    }
}

fn structural_hash(
    universe: u64,
    ty: &Type,
    resolver: Option<&dyn VariableResolver>,
    component: Option<&TypeShape>,
) -> u64 {
    let mut hasher = DefaultHasher::new();
    hasher.write_u64(universe);
    ty.hash(&mut hasher);
    match resolver {
        Some(resolver) => {
            hasher.write_u8(1);
            for shape in resolver.source() {
                hasher.write_u64(shape.structural_hash());
            }
        }
        None => hasher.write_u8(0),
    }
    match component {
        Some(component) => {
            hasher.write_u8(1);
            hasher.write_u64(component.structural_hash());
        }
        None => hasher.write_u8(0),
    }
    hasher.finish()
}

fn resolve_type(
    env: &dyn TypeEnv,
    ty: &Type,
    resolver: &dyn VariableResolver,
    seen: &mut HashSet<TypeVarId>,
    depth: usize,
) -> Type {
    if depth >= MAX_RESOLUTION_DEPTH {
        tracing::debug!(depth, "resolution depth bound hit, falling back to Object");
        return object_type(env);
    }
    // Concrete subtrees are reused as-is; only variable-bearing nodes are
    // rebuilt.
    if !contains_type_var(ty) {
        return ty.clone();
    }
    match ty {
        Type::TypeVar(id) => {
            // The seen-set cuts cycles through variable bounds or bindings.
            if !seen.insert(*id) {
                return object_type(env);
            }
            let out = match resolver.resolve_variable(*id) {
                Some(bound_shape) => {
                    let bound = bound_shape.ty().clone();
                    if contains_type_var(&bound) {
                        resolve_type(env, &bound, resolver, seen, depth + 1)
                    } else {
                        bound
                    }
                }
                None => match env.type_param(*id).and_then(|tp| tp.upper_bounds.first()) {
                    // Unbound: fall back to the declared bound, never fail.
                    Some(bound) => resolve_type(env, bound, resolver, seen, depth + 1),
                    None => object_type(env),
                },
            };
            seen.remove(id);
            out
        }
        Type::Class(ClassType { def, args }) => Type::Class(ClassType {
            def: *def,
            args: args
                .iter()
                .map(|arg| resolve_type(env, arg, resolver, seen, depth + 1))
                .collect(),
        }),
        Type::Array(component) => {
            Type::array(resolve_type(env, component, resolver, seen, depth + 1))
        }
        Type::Wildcard(wc) => Type::Wildcard(tycho_types::WildcardType {
            upper: wc
                .upper
                .iter()
                .map(|b| resolve_type(env, b, resolver, seen, depth + 1))
                .collect(),
            lower: wc
                .lower
                .iter()
                .map(|b| resolve_type(env, b, resolver, seen, depth + 1))
                .collect(),
        }),
        _ => ty.clone(),
    }
}
