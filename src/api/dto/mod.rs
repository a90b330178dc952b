//! Data Transfer Objects for the status API.
//!
//! Store records are serialized as they are; these types only add
//! pagination and the few shapes that exist solely on the HTTP surface.

pub mod common_dto;
pub mod status_dto;

pub use common_dto::*;
pub use status_dto::*;
