use tycho_ids::TypeVarId;

use crate::shape::TypeShape;

/// Capability that binds type-variable identities to concrete shapes within
/// one resolution root.
///
/// A resolver is created per root (e.g. per implementation class), shared by
/// every shape resolved under it, and never mutated after construction.
pub trait VariableResolver: Send + Sync {
    /// Identity used for hashing and equality: two resolvers carrying the
    /// same bound shapes are interchangeable in the shape cache.
    fn source(&self) -> &[TypeShape];

    /// The shape bound to `variable` in this scope, if any. Matching is by
    /// declaration-site identity, never by name.
    fn resolve_variable(&self, variable: TypeVarId) -> Option<TypeShape>;
}

/// The default resolver: a parallel pair of declared variables and the
/// concrete shapes bound to them.
#[derive(Debug)]
pub struct TypeVariablesResolver {
    variables: Vec<TypeVarId>,
    bound: Vec<TypeShape>,
}

impl TypeVariablesResolver {
    /// Pair `variables` with `bound` positionally. A raw inheritance chain
    /// can supply fewer bindings than there are declared variables; the
    /// unmatched tail stays unbound.
    pub fn new(mut variables: Vec<TypeVarId>, mut bound: Vec<TypeShape>) -> Self {
        let len = variables.len().min(bound.len());
        variables.truncate(len);
        bound.truncate(len);
        Self { variables, bound }
    }
}

impl VariableResolver for TypeVariablesResolver {
    fn source(&self) -> &[TypeShape] {
        &self.bound
    }

    fn resolve_variable(&self, variable: TypeVarId) -> Option<TypeShape> {
        self.variables
            .iter()
            .position(|v| *v == variable)
            .map(|idx| self.bound[idx].clone())
    }
}
