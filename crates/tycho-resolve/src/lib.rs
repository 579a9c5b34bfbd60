//! Parameter descriptors and the resolution facade.
//!
//! A [`ParamRef`] pins down one position of an invocable member (a formal
//! parameter, or the return value at index `-1`) at a given generic nesting
//! level. [`resolve_param_type`] resolves that position's declared type
//! against an implementation class: the class's inheritance chain supplies
//! concrete bindings for the declaring class's type variables, and the
//! resulting raw type is memoized on the descriptor per nesting level.

mod param;
mod resolve;

pub use param::{MemberKey, ParamRef};
pub use resolve::resolve_param_type;

use tycho_shape::HandleError;
use tycho_types::ClassId;

pub type Result<T> = std::result::Result<T, ResolveError>;

#[derive(Debug, thiserror::Error)]
pub enum ResolveError {
    /// A required class or member is absent from the universe. Raised at the
    /// call that introduced the bad value, never deferred into resolution.
    #[error("required {0} is missing")]
    MissingArgument(&'static str),

    #[error("parameter index {index} out of range for member with {count} parameter(s)")]
    IndexOutOfRange { index: i32, count: usize },

    /// The implementation class is not related to the member's declaring
    /// class, so no variable bindings can exist.
    #[error("class {implementation:?} does not extend or implement {declaring:?}")]
    UnrelatedClass {
        implementation: ClassId,
        declaring: ClassId,
    },

    #[error(transparent)]
    Handle(#[from] HandleError),
}
