//! Size, type and count policy for candidate files.
//!
//! Validation is pure: it never touches the entry store. Callers pass the
//! number of files already held and get back the accepted candidates (in
//! submission order) plus one [`Rejection`] per refused file.

mod accept;
mod policy;

pub use accept::{parse_accept, AcceptPattern};
pub use policy::{validate, Rejection, ValidationError, ValidationOutcome, ValidationRules};
