use std::collections::HashMap;

use tycho_shape::{ParamHandle, Provenance, TypeShape};
use tycho_types::{find_constructor, find_method, ClassId, Type, TypeEnv};

use crate::{ResolveError, Result};

/// Identity of an invocable member: a named method with its erased
/// signature, or a constructor.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum MemberKey {
    Method { name: String, signature: Vec<Type> },
    Constructor { signature: Vec<Type> },
}

#[derive(Clone, Debug, Default)]
struct LevelMemo {
    raw: Option<Type>,
    shape: Option<TypeShape>,
    name: Option<Option<String>>,
    annotations: Option<Vec<String>>,
}

/// One position of an invocable member at a generic nesting level.
///
/// Index `-1` denotes the return value; `0..parameter_count` a formal
/// parameter. Nesting level 1 is the declared type itself; level *n*
/// addresses the *n*-th layer of a nested generic (level 2 of
/// `List<List<String>>` is the inner list).
///
/// Resolved types, shapes, names and annotations are memoized per nesting
/// level. Attaching a containing class invalidates all memo slots as a
/// group. A descriptor is single-owner state: share resolved results, not
/// the descriptor itself, across threads.
#[derive(Clone, Debug)]
pub struct ParamRef {
    owner: ClassId,
    member: MemberKey,
    index: i32,
    nesting_level: usize,
    type_indexes_per_level: HashMap<usize, usize>,
    containing_class: Option<ClassId>,
    memo: HashMap<usize, LevelMemo>,
}

impl ParamRef {
    /// Descriptor for a method parameter or return value. The member must
    /// exist and `index` must lie in `[-1, parameter_count)`.
    pub fn method(
        env: &dyn TypeEnv,
        owner: ClassId,
        name: &str,
        signature: Vec<Type>,
        index: i32,
    ) -> Result<Self> {
        let method = find_method(env, owner, name, &signature)
            .ok_or(ResolveError::MissingArgument("method"))?;
        validate_index(index, method.params.len())?;
        Ok(Self {
            owner,
            member: MemberKey::Method {
                name: name.to_string(),
                signature,
            },
            index,
            nesting_level: 1,
            type_indexes_per_level: HashMap::new(),
            containing_class: None,
            memo: HashMap::new(),
        })
    }

    /// Descriptor for a constructor parameter (or, at index `-1`, the
    /// constructed type).
    pub fn constructor(
        env: &dyn TypeEnv,
        owner: ClassId,
        signature: Vec<Type>,
        index: i32,
    ) -> Result<Self> {
        let ctor = find_constructor(env, owner, &signature)
            .ok_or(ResolveError::MissingArgument("constructor"))?;
        validate_index(index, ctor.params.len())?;
        Ok(Self {
            owner,
            member: MemberKey::Constructor { signature },
            index,
            nesting_level: 1,
            type_indexes_per_level: HashMap::new(),
            containing_class: None,
            memo: HashMap::new(),
        })
    }

    /// The class declaring the member.
    pub fn declaring_class(&self) -> ClassId {
        self.owner
    }

    pub fn member(&self) -> &MemberKey {
        &self.member
    }

    pub fn index(&self) -> i32 {
        self.index
    }

    pub fn nesting_level(&self) -> usize {
        self.nesting_level
    }

    /// A derived descriptor for the same member position addressing a deeper
    /// generic layer. Memoized results carry over (they are keyed by level).
    pub fn with_nesting_level(&self, level: usize) -> ParamRef {
        let mut derived = self.clone();
        derived.nesting_level = level.max(1);
        derived
    }

    /// Choose which type argument to step into when unwrapping a
    /// multi-argument generic at `level`. Unset levels use argument 0.
    pub fn set_type_index_for_level(&mut self, level: usize, type_index: usize) {
        self.type_indexes_per_level.insert(level, type_index);
    }

    pub fn containing_class(&self) -> Option<ClassId> {
        self.containing_class
    }

    /// Attach the resolution root. All previously memoized results are
    /// invalidated as a group: they were computed against another root.
    pub fn set_containing_class(&mut self, class: ClassId) {
        self.containing_class = Some(class);
        self.memo.clear();
    }

    /// The declared generic type shape at the current nesting level.
    ///
    /// Level 1 reads the member's own declared type (through a durable
    /// handle, so the shape carries its provenance); deeper levels step into
    /// the array component or the configured type argument of the previous
    /// layer.
    pub fn generic_type(&mut self, env: &dyn TypeEnv) -> Result<TypeShape> {
        if let Some(shape) = self
            .memo
            .get(&self.nesting_level)
            .and_then(|memo| memo.shape.clone())
        {
            return Ok(shape);
        }

        let mut shape = TypeShape::for_provenance(env, self.provenance())?;
        for level in 2..=self.nesting_level {
            if shape.is_none() {
                break;
            }
            shape = if shape.ty().is_array() {
                shape.component_type(env)
            } else {
                let type_index = self
                    .type_indexes_per_level
                    .get(&level)
                    .copied()
                    .unwrap_or(0);
                shape.type_argument(env, type_index)
            };
        }

        self.memo
            .entry(self.nesting_level)
            .or_default()
            .shape = Some(shape.clone());
        Ok(shape)
    }

    /// The declared name of the parameter, when the universe records one.
    /// The return value has no name.
    pub fn parameter_name(&mut self, env: &dyn TypeEnv) -> Result<Option<String>> {
        if let Some(name) = self
            .memo
            .get(&self.nesting_level)
            .and_then(|memo| memo.name.clone())
        {
            return Ok(name);
        }
        let name = self.with_param(env, |param| param.name.clone())?.flatten();
        self.memo.entry(self.nesting_level).or_default().name = Some(name.clone());
        Ok(name)
    }

    /// Annotations declared on the parameter. Empty for the return value.
    pub fn annotations(&mut self, env: &dyn TypeEnv) -> Result<Vec<String>> {
        if let Some(annotations) = self
            .memo
            .get(&self.nesting_level)
            .and_then(|memo| memo.annotations.clone())
        {
            return Ok(annotations);
        }
        let annotations = self
            .with_param(env, |param| param.annotations.clone())?
            .unwrap_or_default();
        self.memo.entry(self.nesting_level).or_default().annotations =
            Some(annotations.clone());
        Ok(annotations)
    }

    /// The raw type memoized by the facade for the current nesting level.
    pub fn resolved_type(&self) -> Option<&Type> {
        self.memo
            .get(&self.nesting_level)
            .and_then(|memo| memo.raw.as_ref())
    }

    pub(crate) fn memoize_resolved(&mut self, raw: Type) {
        self.memo.entry(self.nesting_level).or_default().raw = Some(raw);
    }

    fn provenance(&self) -> Provenance {
        let method = match &self.member {
            MemberKey::Method { name, .. } => Some(name.clone()),
            MemberKey::Constructor { .. } => None,
        };
        let signature = match &self.member {
            MemberKey::Method { signature, .. } | MemberKey::Constructor { signature } => {
                signature.clone()
            }
        };
        Provenance::Param(ParamHandle::new(self.owner, method, signature, self.index))
    }

    fn with_param<T>(
        &self,
        env: &dyn TypeEnv,
        read: impl FnOnce(&tycho_types::ParamDef) -> T,
    ) -> Result<Option<T>> {
        if self.index == -1 {
            return Ok(None);
        }
        let param = match &self.member {
            MemberKey::Method { name, signature } => {
                let method = find_method(env, self.owner, name, signature)
                    .ok_or(ResolveError::MissingArgument("method"))?;
                method.params.get(self.index as usize)
            }
            MemberKey::Constructor { signature } => {
                let ctor = find_constructor(env, self.owner, signature)
                    .ok_or(ResolveError::MissingArgument("constructor"))?;
                ctor.params.get(self.index as usize)
            }
        };
        Ok(param.map(read))
    }
}

fn validate_index(index: i32, count: usize) -> Result<()> {
    if index < -1 || index >= count as i32 {
        return Err(ResolveError::IndexOutOfRange { index, count });
    }
    Ok(())
}
