// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Resource abstraction and the label schema built on top of it.

pub mod resource;
pub mod role;

pub use resource::{ManagedResource, ResourceKind};
pub use role::{
    parse_namespace_list, sync_timestamp, ReplicaRecord, Role, SourceDeclaration, SourceRef,
    Strategy, TargetNamespaceSet,
};
