//! Entity model and type registry for the BroadWorks OCI-P protocol.
//!
//! This crate carries the protocol's data layer: typed entities and their
//! static descriptors, the dynamic [`Instance`] form the codec works on,
//! dict projections, and the process-wide [`Registry`] of known commands.
//! The wire codec, transports, and client live in the `ocip` crate.

#![deny(missing_debug_implementations)]

pub mod commands;
pub mod core;
pub mod descriptor;
pub mod dict;
pub mod entity;
pub mod error;
pub mod registry;
pub mod utils;

pub use crate::core::{FieldState, FieldValue, Instance, Nillable, Table};
pub use crate::descriptor::{Descriptor, EntityKind, FieldDescriptor, FieldKind, ScalarKind};
pub use crate::entity::OciEntity;
pub use crate::error::EntityError;
pub use crate::registry::Registry;
