use std::collections::{HashMap, HashSet, VecDeque};

use crate::{object_type, ClassId, ClassKind, ClassType, Type, TypeEnv, TypeVarId, WildcardType};

/// Replace every type variable in `ty` that has a mapping in `subst`,
/// recursing through class arguments, array components and wildcard bounds.
/// Unmapped variables are kept as-is.
pub fn substitute(ty: &Type, subst: &HashMap<TypeVarId, Type>) -> Type {
    match ty {
        Type::TypeVar(id) => subst.get(id).cloned().unwrap_or_else(|| ty.clone()),
        Type::Class(ClassType { def, args }) => Type::Class(ClassType {
            def: *def,
            args: args.iter().map(|a| substitute(a, subst)).collect(),
        }),
        Type::Array(component) => Type::Array(Box::new(substitute(component, subst))),
        Type::Wildcard(wc) => Type::Wildcard(WildcardType {
            upper: wc.upper.iter().map(|b| substitute(b, subst)).collect(),
            lower: wc.lower.iter().map(|b| substitute(b, subst)).collect(),
        }),
        _ => ty.clone(),
    }
}

/// Whether any type variable is reachable in `ty`.
pub fn contains_type_var(ty: &Type) -> bool {
    match ty {
        Type::TypeVar(_) => true,
        Type::Class(ClassType { args, .. }) => args.iter().any(contains_type_var),
        Type::Array(component) => contains_type_var(component),
        Type::Wildcard(wc) => {
            wc.upper.iter().any(contains_type_var) || wc.lower.iter().any(contains_type_var)
        }
        _ => false,
    }
}

/// Collapse `ty` to its erasure: class types lose their arguments, arrays
/// erase their component, variables and wildcards collapse to their first
/// upper bound (`Object` when unbounded). Total over every variant; `Empty`
/// stays `Empty`.
pub fn erasure(env: &dyn TypeEnv, ty: &Type) -> Type {
    erasure_inner(env, ty, &mut HashSet::new())
}

fn erasure_inner(env: &dyn TypeEnv, ty: &Type, seen: &mut HashSet<TypeVarId>) -> Type {
    match ty {
        Type::Class(ClassType { def, .. }) => Type::class(*def, vec![]),
        Type::Array(component) => Type::array(erasure_inner(env, component, seen)),
        Type::TypeVar(id) => {
            // Guard against cyclic bounds (`T extends U, U extends T`).
            if !seen.insert(*id) {
                return object_type(env);
            }
            let out = match env.type_param(*id).and_then(|tp| tp.upper_bounds.first()) {
                Some(bound) => erasure_inner(env, bound, seen),
                None => object_type(env),
            };
            seen.remove(id);
            out
        }
        Type::Wildcard(wc) => match wc.upper.first() {
            Some(bound) => erasure_inner(env, bound, seen),
            None => object_type(env),
        },
        Type::Primitive(_) | Type::Void | Type::Empty => ty.clone(),
    }
}

/// Return `ty` viewed as `target` by walking the supertype graph and applying
/// type argument substitution along the way.
///
/// Missing class metadata simply returns `None`; this never panics.
///
/// Example: `ArrayList<String>` viewed as `List` returns `List<String>`.
pub fn view_as(env: &dyn TypeEnv, ty: &Type, target: ClassId) -> Option<Type> {
    fn inner(
        env: &dyn TypeEnv,
        ty: &Type,
        target: ClassId,
        seen_type_vars: &mut HashSet<TypeVarId>,
    ) -> Option<Type> {
        // Non-class cases up front.
        match ty {
            Type::Array(_) => {
                let wk = env.well_known();
                if target == wk.object || target == wk.cloneable || target == wk.serializable {
                    return Some(Type::class(target, vec![]));
                }
                return None;
            }
            Type::TypeVar(id) => {
                if !seen_type_vars.insert(*id) {
                    return None;
                }
                let mut out = None;
                if let Some(tp) = env.type_param(*id) {
                    for bound in tp.upper_bounds.clone() {
                        if let Some(found) = inner(env, &bound, target, seen_type_vars) {
                            out = Some(found);
                            break;
                        }
                    }
                }
                seen_type_vars.remove(id);
                return out;
            }
            _ => {}
        }

        let Type::Class(ClassType { def, args }) = ty else {
            return None;
        };

        let mut queue: VecDeque<Type> = VecDeque::new();
        let mut seen: HashSet<(ClassId, Vec<Type>)> = HashSet::new();
        queue.push_back(Type::class(*def, args.clone()));

        while let Some(current) = queue.pop_front() {
            let Type::Class(ClassType { def, args }) = current.clone() else {
                continue;
            };
            if !seen.insert((def, args.clone())) {
                continue;
            }

            if def == target {
                return Some(current);
            }

            let Some(class_def) = env.class(def) else {
                continue;
            };

            // A raw instantiation (`List` rather than `List<String>`) can't
            // recover meaningful arguments for supertypes. Preserve rawness
            // when walking.
            let raw = args.is_empty() && !class_def.type_params.is_empty();
            if raw {
                if let Some(sc) = class_def.super_class.as_ref().and_then(Type::as_class) {
                    queue.push_back(Type::class(sc, vec![]));
                }
                for iface in class_def.interfaces.iter().filter_map(Type::as_class) {
                    queue.push_back(Type::class(iface, vec![]));
                }
                if class_def.kind == ClassKind::Interface {
                    queue.push_back(object_type(env));
                }
                continue;
            }

            // Apply the current instantiation's substitution to its
            // supertypes.
            let mut subst: HashMap<TypeVarId, Type> =
                HashMap::with_capacity(class_def.type_params.len());
            for (idx, formal) in class_def.type_params.iter().copied().enumerate() {
                if let Some(arg) = args.get(idx) {
                    subst.insert(formal, arg.clone());
                }
            }

            if let Some(sc) = &class_def.super_class {
                queue.push_back(substitute(sc, &subst));
            }
            for iface in &class_def.interfaces {
                queue.push_back(substitute(iface, &subst));
            }

            // Every interface implicitly has `Object` as a supertype
            // (JLS 4.10.2).
            if class_def.kind == ClassKind::Interface {
                queue.push_back(object_type(env));
            }
        }

        None
    }

    let mut seen_type_vars = HashSet::new();
    inner(env, ty, target, &mut seen_type_vars)
}

/// The concrete type arguments `implementation` supplies for `declaring`'s
/// type parameters, recovered by walking the inheritance chain.
///
/// Returns `None` when `implementation` does not extend or implement
/// `declaring` at all. The returned list is empty when the relationship only
/// exists through raw instantiations (no argument information survives).
pub fn supertype_bindings(
    env: &dyn TypeEnv,
    implementation: ClassId,
    declaring: ClassId,
) -> Option<Vec<Type>> {
    let viewed = view_as(env, &Type::class(implementation, vec![]), declaring)?;
    match viewed {
        Type::Class(ClassType { args, .. }) => Some(args),
        _ => None,
    }
}

/// Raw-class assignability: whether `sub` reaches `sup` through its supertype
/// graph (reflexively).
pub fn is_assignable_class(env: &dyn TypeEnv, sub: ClassId, sup: ClassId) -> bool {
    supertype_bindings(env, sub, sup).is_some()
}
