//! Descriptor Graph
//!
//! Read-only view of compiled message/field/enum descriptors. Messages are
//! keyed by their dotted full name (no leading dot), which is also the
//! identity used for cycle detection. Message-typed fields refer to their
//! target by full name, so self-referential and mutually recursive schemas
//! need no special representation.
//!
//! A petgraph index over message references backs the recursive-group report.

pub mod cache;
pub mod loader;

pub use cache::{DescriptorCache, ModuleKey};

use petgraph::algo::kosaraju_scc;
use petgraph::graph::{DiGraph, NodeIndex};
use prost_types::field_descriptor_proto::Type;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

/// Dotted, globally unique descriptor name (e.g. `shop.Order.Item`)
pub type FullName = String;

/// Wire type code for message-typed fields
pub const TYPE_MESSAGE: i32 = Type::Message as i32;

/// Wire type code for enum-typed fields
pub const TYPE_ENUM: i32 = Type::Enum as i32;

/// Scalar type name for a wire type code: `9` -> `STRING`, `11` -> `MESSAGE`
pub fn scalar_type_name(type_code: i32) -> Option<&'static str> {
    Type::try_from(type_code)
        .ok()
        .map(|ty| ty.as_str_name().trim_start_matches("TYPE_"))
}

/// Target of a field's type reference
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "name", rename_all = "snake_case")]
pub enum TypeRef {
    Message(FullName),
    Enum(FullName),
}

/// A single field of a message
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldDescriptor {
    pub name: String,
    pub number: i32,
    /// Numeric type tag (scalar, enum or message)
    pub type_code: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub type_ref: Option<TypeRef>,
    pub repeated: bool,
    /// Shared by the mutually exclusive alternatives of a oneof
    #[serde(skip_serializing_if = "Option::is_none")]
    pub oneof_group: Option<String>,
}

impl FieldDescriptor {
    /// Referenced message, when the field is message-typed
    pub fn message_type(&self) -> Option<&str> {
        match &self.type_ref {
            Some(TypeRef::Message(name)) if self.type_code == TYPE_MESSAGE => Some(name),
            _ => None,
        }
    }

    /// Referenced enum, when the field is enum-typed
    pub fn enum_type(&self) -> Option<&str> {
        match &self.type_ref {
            Some(TypeRef::Enum(name)) if self.type_code == TYPE_ENUM => Some(name),
            _ => None,
        }
    }
}

/// A named message type
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageDescriptor {
    pub full_name: FullName,
    /// Declaring file (as named in the descriptor set)
    pub file: String,
    pub fields: Vec<FieldDescriptor>,
    /// Synthetic key/value entry backing a map field
    pub map_entry: bool,
}

impl MessageDescriptor {
    /// Last segment of the full name
    pub fn name(&self) -> &str {
        simple_name(&self.full_name)
    }

    pub fn field(&self, name: &str) -> Option<&FieldDescriptor> {
        self.fields.iter().find(|f| f.name == name)
    }
}

/// A named enum type
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnumDescriptor {
    pub full_name: FullName,
    pub values: Vec<String>,
}

/// One file of a descriptor set
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileEntry {
    pub name: String,
    pub package: String,
    /// Top-level messages in declaration order
    pub messages: Vec<FullName>,
}

/// Fuzzy lookup result
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageMatch {
    pub full_name: FullName,
    pub score: i64,
}

/// All descriptors of a compiled module, indexed by full name
#[derive(Debug, Clone, Default)]
pub struct DescriptorPool {
    pub(crate) messages: HashMap<FullName, MessageDescriptor>,
    pub(crate) enums: HashMap<FullName, EnumDescriptor>,
    pub(crate) files: Vec<FileEntry>,
    /// Message reference graph (field -> referenced message)
    pub(crate) graph: DiGraph<FullName, ()>,
    pub(crate) node_indices: HashMap<FullName, NodeIndex>,
}

impl DescriptorPool {
    pub fn message(&self, full_name: &str) -> Option<&MessageDescriptor> {
        self.messages.get(full_name)
    }

    pub fn enum_type(&self, full_name: &str) -> Option<&EnumDescriptor> {
        self.enums.get(full_name)
    }

    pub fn message_count(&self) -> usize {
        self.messages.len()
    }

    pub fn files(&self) -> &[FileEntry] {
        &self.files
    }

    pub fn file(&self, name: &str) -> Option<&FileEntry> {
        self.files.iter().find(|f| f.name == name)
    }

    /// The file the set was compiled for (compilers emit it last)
    pub fn module_file(&self) -> Option<&FileEntry> {
        self.files.last()
    }

    /// Top-level messages declared by the module file, keyed by full name
    pub fn list_top_level_messages(&self) -> BTreeMap<&str, &MessageDescriptor> {
        self.module_file()
            .map(|file| self.top_level_messages_of(file))
            .unwrap_or_default()
    }

    /// Top-level messages declared by a named file
    pub fn top_level_messages(&self, file: &str) -> crate::Result<BTreeMap<&str, &MessageDescriptor>> {
        let entry = self.file(file).ok_or_else(|| crate::ExplorerError::UnknownFile {
            name: file.to_string(),
        })?;
        Ok(self.top_level_messages_of(entry))
    }

    fn top_level_messages_of(&self, file: &FileEntry) -> BTreeMap<&str, &MessageDescriptor> {
        file.messages
            .iter()
            .filter_map(|name| self.messages.get_key_value(name))
            .map(|(name, message)| (name.as_str(), message))
            .collect()
    }

    /// Resolve a user query to a message: exact full name, then unique simple
    /// name, then case-insensitive match
    pub fn resolve(&self, query: &str) -> Option<&MessageDescriptor> {
        let query = query.trim_start_matches('.');
        if let Some(message) = self.messages.get(query) {
            return Some(message);
        }

        let by_simple: Vec<&MessageDescriptor> = self
            .messages
            .values()
            .filter(|m| m.name() == query)
            .collect();
        if let [only] = by_simple.as_slice() {
            return Some(*only);
        }

        let query_lower = query.to_lowercase();
        let mut insensitive: Vec<&MessageDescriptor> = self
            .messages
            .values()
            .filter(|m| {
                m.full_name.to_lowercase() == query_lower || m.name().to_lowercase() == query_lower
            })
            .collect();
        insensitive.sort_by(|a, b| a.full_name.cmp(&b.full_name));
        insensitive.into_iter().next()
    }

    /// Like [`resolve`](Self::resolve), with fuzzy suggestions on failure
    pub fn require(&self, query: &str) -> crate::Result<&MessageDescriptor> {
        self.resolve(query).ok_or_else(|| crate::ExplorerError::UnknownMessage {
            name: query.to_string(),
            suggestions: self.search(query, 3).into_iter().map(|m| m.full_name).collect(),
        })
    }

    /// Search message full names (fuzzy), best first
    pub fn search(&self, query: &str, limit: usize) -> Vec<MessageMatch> {
        use fuzzy_matcher::skim::SkimMatcherV2;
        use fuzzy_matcher::FuzzyMatcher;

        let matcher = SkimMatcherV2::default();
        let mut results: Vec<MessageMatch> = self
            .messages
            .values()
            .filter(|m| !m.map_entry)
            .filter_map(|m| {
                matcher.fuzzy_match(&m.full_name, query).map(|score| MessageMatch {
                    full_name: m.full_name.clone(),
                    score,
                })
            })
            .collect();

        results.sort_by(|a, b| b.score.cmp(&a.score).then_with(|| a.full_name.cmp(&b.full_name)));
        results.truncate(limit);
        results
    }

    /// Groups of messages that reference each other (directly or through a
    /// chain), including messages that reference themselves
    pub fn recursive_groups(&self) -> Vec<Vec<FullName>> {
        let mut groups: Vec<Vec<FullName>> = kosaraju_scc(&self.graph)
            .into_iter()
            .filter(|scc| scc.len() > 1 || self.graph.contains_edge(scc[0], scc[0]))
            .map(|scc| {
                let mut names: Vec<FullName> = scc
                    .into_iter()
                    .filter_map(|idx| self.graph.node_weight(idx).cloned())
                    .collect();
                names.sort();
                names
            })
            .collect();
        groups.sort();
        groups
    }

    /// Direct message dependencies of a message
    pub fn refs_out(&self, full_name: &str) -> Vec<&str> {
        let Some(&idx) = self.node_indices.get(full_name) else {
            return Vec::new();
        };
        let mut refs: Vec<&str> = self
            .graph
            .neighbors(idx)
            .filter_map(|n| self.graph.node_weight(n).map(String::as_str))
            .collect();
        refs.sort();
        refs.dedup();
        refs
    }
}

/// Last dotted segment of a full name
pub fn simple_name(full_name: &str) -> &str {
    full_name.rsplit('.').next().unwrap_or(full_name)
}

#[cfg(test)]
pub(crate) mod fixtures;
