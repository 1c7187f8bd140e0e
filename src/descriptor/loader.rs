//! Descriptor Loading
//!
//! Flattens an encoded `FileDescriptorSet` (as written by
//! `protoc --descriptor_set_out`) into a [`DescriptorPool`] and builds the
//! message reference graph.

use petgraph::graph::DiGraph;
use prost::Message;
use prost_types::field_descriptor_proto::Label;
use prost_types::{DescriptorProto, EnumDescriptorProto, FieldDescriptorProto, FileDescriptorSet};
use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::Path;

use super::{
    DescriptorPool, EnumDescriptor, FieldDescriptor, FileEntry, FullName, MessageDescriptor,
    TypeRef, TYPE_ENUM, TYPE_MESSAGE,
};
use crate::error::{ExplorerError, Result};

/// Wire type code for proto2 groups, which reference a message like fields do
const TYPE_GROUP: i32 = prost_types::field_descriptor_proto::Type::Group as i32;

/// Fields that name a type without a type tag, kind decided after collection
const TYPE_UNSET: i32 = 0;

impl DescriptorPool {
    /// Decode an encoded descriptor set
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let set = FileDescriptorSet::decode(bytes)?;
        Ok(Self::from_file_descriptor_set(&set))
    }

    /// Read and decode a descriptor set file
    pub fn from_file(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(ExplorerError::NotFound {
                path: path.to_path_buf(),
            });
        }
        let bytes = fs::read(path)?;
        Self::from_bytes(&bytes)
    }

    /// Build a pool from already decoded descriptors
    pub fn from_file_descriptor_set(set: &FileDescriptorSet) -> Self {
        let mut pool = DescriptorPool::default();

        for file in &set.file {
            let file_name = file.name().to_string();
            let package = file.package().to_string();

            let mut top_level = Vec::with_capacity(file.message_type.len());
            for message in &file.message_type {
                top_level.push(collect_message(&mut pool, &package, message, &file_name));
            }
            for enum_type in &file.enum_type {
                collect_enum(&mut pool, &package, enum_type);
            }

            pool.files.push(FileEntry {
                name: file_name,
                package,
                messages: top_level,
            });
        }

        resolve_untagged_fields(&mut pool);
        build_graph(&mut pool);

        tracing::debug!(
            files = pool.files.len(),
            messages = pool.messages.len(),
            enums = pool.enums.len(),
            edges = pool.graph.edge_count(),
            "loaded descriptor set"
        );
        pool
    }
}

fn qualify(scope: &str, name: &str) -> FullName {
    if scope.is_empty() {
        name.to_string()
    } else {
        format!("{}.{}", scope, name)
    }
}

fn collect_message(
    pool: &mut DescriptorPool,
    scope: &str,
    proto: &DescriptorProto,
    file: &str,
) -> FullName {
    let full_name = qualify(scope, proto.name());

    let fields = proto
        .field
        .iter()
        .map(|field| convert_field(proto, field))
        .collect();

    let map_entry = proto
        .options
        .as_ref()
        .map(|options| options.map_entry())
        .unwrap_or(false);

    for nested in &proto.nested_type {
        collect_message(pool, &full_name, nested, file);
    }
    for enum_type in &proto.enum_type {
        collect_enum(pool, &full_name, enum_type);
    }

    pool.messages.insert(
        full_name.clone(),
        MessageDescriptor {
            full_name: full_name.clone(),
            file: file.to_string(),
            fields,
            map_entry,
        },
    );
    full_name
}

fn convert_field(owner: &DescriptorProto, field: &FieldDescriptorProto) -> FieldDescriptor {
    let type_code = field.r#type.unwrap_or(TYPE_UNSET);
    let target = field.type_name().trim_start_matches('.');

    let type_ref = if target.is_empty() {
        None
    } else if type_code == TYPE_MESSAGE || type_code == TYPE_GROUP || type_code == TYPE_UNSET {
        // an untagged `type_name` is settled as message or enum once every
        // file has been collected
        Some(TypeRef::Message(target.to_string()))
    } else if type_code == TYPE_ENUM {
        Some(TypeRef::Enum(target.to_string()))
    } else {
        None
    };

    // proto3 `optional` is encoded as a single-field synthetic oneof
    let oneof_group = match field.oneof_index {
        Some(index) if !field.proto3_optional() => owner
            .oneof_decl
            .get(index as usize)
            .map(|decl| decl.name().to_string()),
        _ => None,
    };

    FieldDescriptor {
        name: field.name().to_string(),
        number: field.number(),
        type_code,
        type_ref,
        repeated: field.label() == Label::Repeated,
        oneof_group,
    }
}

fn collect_enum(pool: &mut DescriptorPool, scope: &str, proto: &EnumDescriptorProto) {
    let full_name = qualify(scope, proto.name());
    let values = proto.value.iter().map(|v| v.name().to_string()).collect();
    pool.enums.insert(full_name.clone(), EnumDescriptor { full_name, values });
}

/// Give untagged fields the kind of the type they name. Names found nowhere
/// in the set are kept as message references.
fn resolve_untagged_fields(pool: &mut DescriptorPool) {
    let DescriptorPool { messages, enums, .. } = pool;
    let message_names: HashSet<FullName> = messages.keys().cloned().collect();

    for message in messages.values_mut() {
        for field in message.fields.iter_mut().filter(|f| f.type_code == TYPE_UNSET) {
            let Some(TypeRef::Message(target)) = field.type_ref.take() else {
                continue;
            };
            if !message_names.contains(&target) && enums.contains_key(&target) {
                field.type_code = TYPE_ENUM;
                field.type_ref = Some(TypeRef::Enum(target));
            } else {
                if !message_names.contains(&target) {
                    tracing::debug!(field = %field.name, target = %target, "untagged field names an unknown type");
                }
                field.type_code = TYPE_MESSAGE;
                field.type_ref = Some(TypeRef::Message(target));
            }
        }
    }
}

fn build_graph(pool: &mut DescriptorPool) {
    let mut names: Vec<&FullName> = pool.messages.keys().collect();
    names.sort();

    let mut graph = DiGraph::with_capacity(names.len(), names.len() * 2);
    let mut node_indices = HashMap::with_capacity(names.len());
    for name in names {
        node_indices.insert(name.clone(), graph.add_node(name.clone()));
    }

    for message in pool.messages.values() {
        let from = node_indices[&message.full_name];
        for field in &message.fields {
            // groups reference a message too
            let Some(TypeRef::Message(target)) = &field.type_ref else {
                continue;
            };
            if let Some(&to) = node_indices.get(target) {
                graph.update_edge(from, to, ());
            }
        }
    }

    pool.graph = graph;
    pool.node_indices = node_indices;
}
