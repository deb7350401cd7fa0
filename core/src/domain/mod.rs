//! Domain layer containing the entities of the auth core.

pub mod entities;

pub use entities::*;
