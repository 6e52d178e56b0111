//! General types used in the library, at present only error types.

pub mod err;
