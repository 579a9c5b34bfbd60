use std::sync::Arc;

use tycho_shape::{TypeShape, TypeVariablesResolver, VariableResolver};
use tycho_types::{supertype_bindings, ClassId, Type, TypeEnv};

use crate::{ParamRef, ResolveError, Result};

/// Resolve the concrete raw type of `param`'s position as seen from
/// `implementation_class`.
///
/// The implementation class's inheritance chain supplies the concrete type
/// arguments for the declaring class's variables; the declared shape is
/// resolved against those bindings and collapsed to its erasure. The result
/// is memoized on the descriptor for its current nesting level.
///
/// Fails with [`ResolveError::UnrelatedClass`] when `implementation_class`
/// does not extend or implement the member's declaring class.
pub fn resolve_param_type(
    env: &dyn TypeEnv,
    param: &mut ParamRef,
    implementation_class: ClassId,
) -> Result<Type> {
    if env.class(implementation_class).is_none() {
        return Err(ResolveError::MissingArgument("implementation class"));
    }

    let declaring = param.declaring_class();
    let bindings = supertype_bindings(env, implementation_class, declaring).ok_or(
        ResolveError::UnrelatedClass {
            implementation: implementation_class,
            declaring,
        },
    )?;

    let declaring_def = env
        .class(declaring)
        .ok_or(ResolveError::MissingArgument("declaring class"))?;
    let variables = declaring_def.type_params.clone();
    let bound = bindings
        .iter()
        .map(|ty| TypeShape::for_type(env, ty.clone()))
        .collect();
    let resolver: Arc<dyn VariableResolver> =
        Arc::new(TypeVariablesResolver::new(variables, bound));

    param.set_containing_class(implementation_class);
    let shape = param.generic_type(env)?;
    let raw = shape.resolve(env, &resolver).raw_type(env);
    tracing::debug!(
        implementation = ?implementation_class,
        declaring = ?declaring,
        level = param.nesting_level(),
        resolved = ?raw,
        "resolved parameter type"
    );

    param.memoize_resolved(raw.clone());
    Ok(raw)
}
