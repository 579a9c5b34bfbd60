//! Type shapes: structural generic type expressions enriched with the
//! context needed to resolve them.
//!
//! A [`TypeShape`] wraps a `tycho_types::Type` together with an optional
//! [`VariableResolver`] (the scope that binds its type variables), an
//! optional [`Provenance`] handle (a reconstructable record of where the
//! type was read from) and a precomputed structural hash. Structurally
//! composite shapes are deduplicated process-wide through [`ShapeCache`],
//! which holds weak entries and purges dead ones opportunistically.

mod cache;
mod handle;
mod resolver;
mod shape;

pub use cache::ShapeCache;
pub use handle::{FieldHandle, HandleError, InvokeHandle, ParamHandle, Provenance};
pub use resolver::{TypeVariablesResolver, VariableResolver};
pub use shape::{TypeShape, MAX_RESOLUTION_DEPTH};
