//! Proto Explorer
//!
//! Browse and search the type graph of compiled protobuf schemas.
//!
//! ## Features
//!
//! - **Import-root detection**: infers the `--proto_path` a schema file's
//!   imports resolve against, by scoring its ancestor directories
//! - **Descriptor loading**: compiles with `protoc` (or reads a prebuilt
//!   descriptor set) into a full-name-indexed pool, cached per module
//! - **Type resolution**: `map<K,V>`, message, enum and scalar labels, with
//!   oneof alternatives grouped
//! - **Search**: regex matching that looks through the whole reachable graph,
//!   terminating on recursive schemas, with optional branch filtering
//!
//! ## Architecture
//!
//! ```text
//! schema.proto ──RootResolver──▶ include root ──ProtocCompiler──▶ FileDescriptorSet
//!                                                                      │
//!                                            DescriptorCache ◀── DescriptorPool
//!                                                                      │
//!                   SearchPattern ──▶ Renderer ──▶ RenderOutput { lines, panels }
//! ```

pub mod compiler;
pub mod config;
pub mod descriptor;
pub mod error;
pub mod explorer;
pub mod resolver;
pub mod search;

pub use compiler::{CompiledModule, ProtocCompiler};
pub use config::ExplorerConfig;
pub use descriptor::{
    DescriptorCache, DescriptorPool, EnumDescriptor, FieldDescriptor, MessageDescriptor, ModuleKey,
    TypeRef,
};
pub use error::{ExplorerError, Result};
pub use explorer::{Explorer, RenderReport};
pub use resolver::{resolve_root, RootResolver};
pub use search::{
    matches_pattern, render, DisplayLine, LineKind, PanelHint, RenderOutput, Renderer,
    SearchPattern, TextFormatter,
};
