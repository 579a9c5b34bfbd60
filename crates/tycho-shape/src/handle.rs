use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use once_cell::sync::OnceCell;
use serde::{Deserialize, Serialize};
use tycho_ids::ClassId;
use tycho_types::{find_constructor, find_field, find_method, Type, TypeEnv};

/// Errors surfaced by durable type handles, only at first use after revival
/// (eager validation is impossible once the original member is gone).
#[derive(Debug, thiserror::Error)]
pub enum HandleError {
    /// The structure the handle describes no longer exists in the universe.
    #[error("could not find original structure: {0}")]
    StructureNotFound(String),

    /// The handle's operation does not produce a type for its target.
    #[error("operation does not produce a type: {0}")]
    InvalidHandle(String),
}

/// A reconstructable record of where a type was read from.
///
/// Handles capture enough identity (owner, member name, signature, index) to
/// re-acquire the declared type after the original lookup result is gone,
/// e.g. after a serde round-trip: the transient cache slots are skipped
/// during serialization and refilled lazily on first use.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub enum Provenance {
    Param(ParamHandle),
    Field(FieldHandle),
    Invoke(Box<InvokeHandle>),
}

impl Provenance {
    /// The type this handle stands for, re-acquiring the member if needed.
    pub fn provided_type(&self, env: &dyn TypeEnv) -> Result<Type, HandleError> {
        match self {
            Provenance::Param(handle) => handle.provided_type(env),
            Provenance::Field(handle) => handle.provided_type(env),
            Provenance::Invoke(handle) => handle.provided_type(env),
        }
    }

    /// Follow derived-handle indirection down to the underlying member
    /// handle. Needed before comparing handles that may wrap each other.
    pub fn root(&self) -> &Provenance {
        let mut current = self;
        while let Provenance::Invoke(invoke) = current {
            current = &invoke.parent;
        }
        current
    }

    /// Two handles are interchangeable iff their provided types are
    /// structurally equal, regardless of how each one was captured.
    pub fn provides_equal(
        &self,
        env: &dyn TypeEnv,
        other: &Provenance,
    ) -> Result<bool, HandleError> {
        Ok(self.provided_type(env)? == other.provided_type(env)?)
    }

    /// Hash of the provided type, matching [`Provenance::provides_equal`].
    pub fn provided_hash(&self, env: &dyn TypeEnv) -> Result<u64, HandleError> {
        let mut hasher = DefaultHasher::new();
        self.provided_type(env)?.hash(&mut hasher);
        Ok(hasher.finish())
    }
}

/// Identifies one parameter position (or the return value) of a method or
/// constructor.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ParamHandle {
    owner: ClassId,
    /// `None` identifies a constructor.
    method: Option<String>,
    /// Erased formal parameter types, the lookup signature.
    signature: Vec<Type>,
    /// `-1` denotes the return value.
    index: i32,
    #[serde(skip)]
    cached: OnceCell<Type>,
}

impl ParamHandle {
    /// A handle that will acquire its member lazily on first use.
    pub fn new(owner: ClassId, method: Option<String>, signature: Vec<Type>, index: i32) -> Self {
        Self {
            owner,
            method,
            signature,
            index,
            cached: OnceCell::new(),
        }
    }

    /// Capture a method parameter eagerly: the member is looked up now and
    /// the declared type cached, so later uses don't re-acquire.
    pub fn for_method(
        env: &dyn TypeEnv,
        owner: ClassId,
        name: &str,
        signature: Vec<Type>,
        index: i32,
    ) -> Result<Self, HandleError> {
        let handle = Self::new(owner, Some(name.to_string()), signature, index);
        handle.provided_type(env)?;
        Ok(handle)
    }

    /// Capture a constructor parameter eagerly.
    pub fn for_constructor(
        env: &dyn TypeEnv,
        owner: ClassId,
        signature: Vec<Type>,
        index: i32,
    ) -> Result<Self, HandleError> {
        let handle = Self::new(owner, None, signature, index);
        handle.provided_type(env)?;
        Ok(handle)
    }

    pub fn provided_type(&self, env: &dyn TypeEnv) -> Result<Type, HandleError> {
        self.cached.get_or_try_init(|| self.acquire(env)).cloned()
    }

    fn acquire(&self, env: &dyn TypeEnv) -> Result<Type, HandleError> {
        let class = env.class(self.owner).ok_or_else(|| {
            HandleError::StructureNotFound(format!("class {:?}", self.owner))
        })?;
        tracing::trace!(owner = %class.name, member = ?self.method, index = self.index, "acquiring member type");

        match &self.method {
            Some(name) => {
                let method =
                    find_method(env, self.owner, name, &self.signature).ok_or_else(|| {
                        HandleError::StructureNotFound(format!("{}.{}", class.name, name))
                    })?;
                if self.index == -1 {
                    return Ok(method.return_type.clone());
                }
                method
                    .params
                    .get(self.index as usize)
                    .map(|param| param.ty.clone())
                    .ok_or_else(|| {
                        HandleError::StructureNotFound(format!(
                            "{}.{} parameter {}",
                            class.name, name, self.index
                        ))
                    })
            }
            None => {
                let ctor = find_constructor(env, self.owner, &self.signature).ok_or_else(|| {
                    HandleError::StructureNotFound(format!("{}.<init>", class.name))
                })?;
                if self.index == -1 {
                    // A constructor "returns" its declaring class.
                    return Ok(Type::class(self.owner, vec![]));
                }
                ctor.params
                    .get(self.index as usize)
                    .map(|param| param.ty.clone())
                    .ok_or_else(|| {
                        HandleError::StructureNotFound(format!(
                            "{}.<init> parameter {}",
                            class.name, self.index
                        ))
                    })
            }
        }
    }
}

/// Identifies a field's declared type.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct FieldHandle {
    owner: ClassId,
    field: String,
    #[serde(skip)]
    cached: OnceCell<Type>,
}

impl FieldHandle {
    pub fn new(owner: ClassId, field: impl Into<String>) -> Self {
        Self {
            owner,
            field: field.into(),
            cached: OnceCell::new(),
        }
    }

    /// Capture a field eagerly.
    pub fn for_field(
        env: &dyn TypeEnv,
        owner: ClassId,
        field: &str,
    ) -> Result<Self, HandleError> {
        let handle = Self::new(owner, field);
        handle.provided_type(env)?;
        Ok(handle)
    }

    pub fn provided_type(&self, env: &dyn TypeEnv) -> Result<Type, HandleError> {
        self.cached
            .get_or_try_init(|| {
                let class = env.class(self.owner).ok_or_else(|| {
                    HandleError::StructureNotFound(format!("class {:?}", self.owner))
                })?;
                find_field(env, self.owner, &self.field)
                    .map(|f| f.ty.clone())
                    .ok_or_else(|| {
                        HandleError::StructureNotFound(format!(
                            "{}.{}",
                            class.name, self.field
                        ))
                    })
            })
            .cloned()
    }
}

/// A handle derived from another handle by applying a type-producing
/// operation to the parent's type and selecting one result.
///
/// The operation result is cached after the first success; revival re-runs
/// it lazily like the member handles re-acquire their members.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct InvokeHandle {
    parent: Provenance,
    operation: String,
    index: usize,
    #[serde(skip)]
    cached: OnceCell<Vec<Type>>,
}

impl InvokeHandle {
    pub fn new(parent: Provenance, operation: impl Into<String>, index: usize) -> Self {
        Self {
            parent,
            operation: operation.into(),
            index,
            cached: OnceCell::new(),
        }
    }

    pub fn provided_type(&self, env: &dyn TypeEnv) -> Result<Type, HandleError> {
        let results = self.cached.get_or_try_init(|| {
            let target = self.parent.provided_type(env)?;
            apply_operation(env, &self.operation, &target)
        })?;
        results.get(self.index).cloned().ok_or_else(|| {
            HandleError::StructureNotFound(format!(
                "{} result {} of {}",
                self.operation,
                self.index,
                results.len()
            ))
        })
    }
}

/// The zero-argument type-producing operations a derived handle may name.
fn apply_operation(
    env: &dyn TypeEnv,
    operation: &str,
    target: &Type,
) -> Result<Vec<Type>, HandleError> {
    match operation {
        "type_arguments" => match target {
            Type::Class(class) => Ok(class.args.clone()),
            _ => Err(HandleError::InvalidHandle(format!(
                "type_arguments on non-class type {target:?}"
            ))),
        },
        "upper_bounds" => match target {
            Type::Wildcard(wc) => Ok(wc.upper.clone()),
            Type::TypeVar(id) => env
                .type_param(*id)
                .map(|tp| tp.upper_bounds.clone())
                .ok_or_else(|| {
                    HandleError::StructureNotFound(format!("type variable {id:?}"))
                }),
            _ => Err(HandleError::InvalidHandle(format!(
                "upper_bounds on {target:?}"
            ))),
        },
        "lower_bounds" => match target {
            Type::Wildcard(wc) => Ok(wc.lower.clone()),
            _ => Err(HandleError::InvalidHandle(format!(
                "lower_bounds on {target:?}"
            ))),
        },
        "component_type" => match target {
            Type::Array(component) => Ok(vec![(**component).clone()]),
            _ => Err(HandleError::InvalidHandle(format!(
                "component_type on non-array type {target:?}"
            ))),
        },
        unknown => Err(HandleError::StructureNotFound(format!(
            "unknown operation `{unknown}`"
        ))),
    }
}
