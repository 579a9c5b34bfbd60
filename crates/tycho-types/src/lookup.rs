use crate::{erasure, CtorDef, FieldDef, MethodDef, ParamDef, Type, TypeEnv};
use tycho_ids::ClassId;

/// Locate a method on `owner` by name and erased parameter signature.
///
/// `signature` entries are compared against the erasure of each declared
/// parameter type, so `get(int): T` is found with `&[Type::Primitive(Int)]`
/// and `add(T)` with `&[Object]`.
pub fn find_method<'e>(
    env: &'e dyn TypeEnv,
    owner: ClassId,
    name: &str,
    signature: &[Type],
) -> Option<&'e MethodDef> {
    let class = env.class(owner)?;
    class
        .methods
        .iter()
        .find(|m| m.name == name && signature_matches(env, &m.params, signature))
}

/// Locate a constructor on `owner` by erased parameter signature.
pub fn find_constructor<'e>(
    env: &'e dyn TypeEnv,
    owner: ClassId,
    signature: &[Type],
) -> Option<&'e CtorDef> {
    let class = env.class(owner)?;
    class
        .constructors
        .iter()
        .find(|c| signature_matches(env, &c.params, signature))
}

/// Locate a field on `owner` by name.
pub fn find_field<'e>(env: &'e dyn TypeEnv, owner: ClassId, name: &str) -> Option<&'e FieldDef> {
    let class = env.class(owner)?;
    class.fields.iter().find(|f| f.name == name)
}

fn signature_matches(env: &dyn TypeEnv, params: &[ParamDef], signature: &[Type]) -> bool {
    params.len() == signature.len()
        && params
            .iter()
            .zip(signature)
            .all(|(param, expected)| erasure(env, &param.ty) == *expected)
}
