//! End-to-end Tests
//!
//! Root detection against on-disk schema layouts, and rendering of descriptor
//! sets written to disk the way `protoc --descriptor_set_out` writes them.

use std::fs;
use std::path::{Path, PathBuf};

use prost::Message;
use prost_types::field_descriptor_proto::{Label, Type};
use prost_types::{
    DescriptorProto, FieldDescriptorProto, FileDescriptorProto, FileDescriptorSet, MessageOptions,
};

use proto_explorer::{
    DescriptorPool, Explorer, ExplorerConfig, ExplorerError, LineKind, RenderOutput, RootResolver,
};

fn fixtures_path() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures")
}

// =============================================================================
// Descriptor set builders
// =============================================================================

fn field(name: &str, number: i32, ty: Type) -> FieldDescriptorProto {
    FieldDescriptorProto {
        name: Some(name.to_string()),
        number: Some(number),
        label: Some(Label::Optional as i32),
        r#type: Some(ty as i32),
        ..Default::default()
    }
}

fn message_ref(name: &str, number: i32, type_name: &str) -> FieldDescriptorProto {
    FieldDescriptorProto {
        type_name: Some(format!(".{}", type_name)),
        ..field(name, number, Type::Message)
    }
}

fn repeated(mut field: FieldDescriptorProto) -> FieldDescriptorProto {
    field.label = Some(Label::Repeated as i32);
    field
}

fn message(name: &str, fields: Vec<FieldDescriptorProto>) -> DescriptorProto {
    DescriptorProto {
        name: Some(name.to_string()),
        field: fields,
        ..Default::default()
    }
}

/// shop/types.proto: Money
/// shop/order.proto: Order { Item, MetaEntry }, Customer
fn shop_descriptor_set() -> FileDescriptorSet {
    let money = message(
        "Money",
        vec![field("currency", 1, Type::String), field("units", 2, Type::Int64)],
    );

    let meta_entry = DescriptorProto {
        options: Some(MessageOptions {
            map_entry: Some(true),
            ..Default::default()
        }),
        ..message(
            "MetaEntry",
            vec![field("key", 1, Type::String), field("value", 2, Type::String)],
        )
    };

    let order = DescriptorProto {
        nested_type: vec![
            message(
                "Item",
                vec![field("sku", 1, Type::String), message_ref("price", 2, "shop.Money")],
            ),
            meta_entry,
        ],
        ..message(
            "Order",
            vec![
                field("id", 1, Type::String),
                repeated(message_ref("items", 2, "shop.Order.Item")),
                repeated(message_ref("meta", 3, "shop.Order.MetaEntry")),
                message_ref("customer", 4, "shop.Customer"),
                message_ref("total", 5, "shop.Money"),
            ],
        )
    };

    let customer = message("Customer", vec![field("name", 1, Type::String)]);

    FileDescriptorSet {
        file: vec![
            FileDescriptorProto {
                name: Some("shop/types.proto".to_string()),
                package: Some("shop".to_string()),
                message_type: vec![money],
                ..Default::default()
            },
            FileDescriptorProto {
                name: Some("shop/order.proto".to_string()),
                package: Some("shop".to_string()),
                dependency: vec!["shop/types.proto".to_string()],
                message_type: vec![order, customer],
                ..Default::default()
            },
        ],
    }
}

fn write_descriptor_set(dir: &Path) -> PathBuf {
    let path = dir.join("shop.pb");
    fs::write(&path, shop_descriptor_set().encode_to_vec()).unwrap();
    path
}

fn lines(output: &RenderOutput) -> Vec<(usize, &str)> {
    output
        .lines
        .iter()
        .map(|line| (line.depth, line.text.as_str()))
        .collect()
}

// =============================================================================
// Root detection
// =============================================================================

#[test]
fn test_root_is_directory_resolving_imports() {
    let file = fixtures_path().join("layout/r/pkg/a.proto");
    let expected = fixtures_path().join("layout/r").canonicalize().unwrap();

    let root = RootResolver::new().resolve(&file).unwrap();
    assert_eq!(root, expected);
    assert!(root.join("shared/common.proto").exists());
}

#[test]
fn test_root_without_imports_is_containing_directory() {
    let file = fixtures_path().join("flat/standalone.proto");
    let expected = fixtures_path().join("flat").canonicalize().unwrap();

    assert_eq!(proto_explorer::resolve_root(&file).unwrap(), expected);
}

#[test]
fn test_root_is_deterministic() {
    let file = fixtures_path().join("layout/r/pkg/a.proto");
    let resolver = RootResolver::new();
    assert_eq!(resolver.resolve(&file).unwrap(), resolver.resolve(&file).unwrap());
}

#[test]
fn test_root_of_non_schema_file() {
    let file = fixtures_path().join("flat/notes.txt");
    let err = RootResolver::new().resolve(&file).unwrap_err();
    assert!(matches!(err, ExplorerError::InvalidExtension { .. }));
}

#[test]
fn test_root_of_missing_file() {
    let file = fixtures_path().join("layout/r/pkg/missing.proto");
    let err = RootResolver::new().resolve(&file).unwrap_err();
    assert!(matches!(err, ExplorerError::NotFound { .. }));
}

#[test]
fn test_root_with_single_level_falls_back_to_parent() {
    // only pkg/ is considered, and it resolves nothing
    let file = fixtures_path().join("layout/r/pkg/a.proto");
    let expected = fixtures_path().join("layout/r/pkg").canonicalize().unwrap();

    let root = RootResolver::new().with_max_levels(1).resolve(&file).unwrap();
    assert_eq!(root, expected);
}

// =============================================================================
// Descriptor loading and rendering
// =============================================================================

#[test]
fn test_list_top_level_messages_from_disk() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_descriptor_set(dir.path());

    let pool = DescriptorPool::from_file(&path).unwrap();
    let names: Vec<&str> = pool.list_top_level_messages().keys().copied().collect();
    assert_eq!(names, vec!["shop.Customer", "shop.Order"]);

    let module = pool.module_file().unwrap();
    assert_eq!(module.name, "shop/order.proto");
}

#[test]
fn test_render_unfiltered_tree() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_descriptor_set(dir.path());

    let mut explorer = Explorer::default();
    let pool = explorer.load_descriptor_set(&path).unwrap();
    let report = explorer.render(&pool, "Order", "", None).unwrap();

    assert_eq!(report.message, "shop.Order");
    assert_eq!(
        lines(&report.output),
        vec![
            (0, "shop.Order"),
            (0, "id: STRING"),
            (0, "items: shop.Order.Item [repeated]"),
            (1, "shop.Order.Item"),
            (1, "sku: STRING"),
            (1, "price: shop.Money"),
            (2, "shop.Money"),
            (2, "currency: STRING"),
            (2, "units: INT64"),
            (0, "meta: map<STRING,STRING>"),
            (0, "customer: shop.Customer"),
            (1, "shop.Customer"),
            (1, "name: STRING"),
            // already rendered above
            (0, "total: shop.Money"),
        ]
    );

    // without a pattern only the root panel is open
    let expanded: Vec<&str> = report
        .output
        .panels
        .iter()
        .filter(|p| p.expanded)
        .map(|p| p.panel_id.as_str())
        .collect();
    assert_eq!(expanded, vec!["shop.Order"]);
}

#[test]
fn test_render_filtered_by_pattern() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_descriptor_set(dir.path());

    let mut explorer = Explorer::default();
    let pool = explorer.load_descriptor_set(&path).unwrap();
    let report = explorer.render(&pool, "shop.Order", "currency", Some(true)).unwrap();
    let output = &report.output;

    assert!(output.contains_text("id: STRING"));
    assert!(output.contains_text("items: shop.Order.Item [repeated]"));
    assert!(output.contains_text("total: shop.Money"));
    assert!(!output.contains_text("meta: map<STRING,STRING>"));
    assert!(!output.contains_text("customer: shop.Customer"));

    let matched: Vec<&str> = output
        .lines
        .iter()
        .filter(|line| line.is_match)
        .map(|line| line.text.as_str())
        .collect();
    assert_eq!(matched, vec!["currency: STRING"]);

    assert!(output.panel("shop.Order.Item").unwrap().expanded);
    assert!(output.panel("shop.Money").unwrap().expanded);
    assert!(output.panel("shop.Customer").is_none());
}

#[test]
fn test_render_text_output() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_descriptor_set(dir.path());

    let mut explorer = Explorer::default();
    let pool = explorer.load_descriptor_set(&path).unwrap();
    let report = explorer.render(&pool, "Customer", "", None).unwrap();

    assert_eq!(explorer.format_text(&report), "▾ shop.Customer\n- name: STRING\n");
}

#[test]
fn test_render_output_serializes_for_display_layers() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_descriptor_set(dir.path());

    let mut explorer = Explorer::default();
    let pool = explorer.load_descriptor_set(&path).unwrap();
    let report = explorer.render(&pool, "Customer", "name", None).unwrap();

    let json = serde_json::to_value(&report.output).unwrap();
    assert_eq!(json["lines"][0]["kind"], "message");
    assert_eq!(json["lines"][1]["text"], "name: STRING");
    assert_eq!(json["lines"][1]["is_match"], true);
    assert_eq!(json["panels"][0]["panel_id"], "shop.Customer");
    assert_eq!(report.output.lines[1].kind, LineKind::Field);
}

#[test]
fn test_unknown_message_suggests_names() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_descriptor_set(dir.path());

    let mut explorer = Explorer::default();
    let pool = explorer.load_descriptor_set(&path).unwrap();

    match explorer.render(&pool, "Ordr", "", None) {
        Err(ExplorerError::UnknownMessage { name, suggestions }) => {
            assert_eq!(name, "Ordr");
            assert!(suggestions.iter().any(|s| s == "shop.Order"));
        }
        other => panic!("Expected UnknownMessage, got {:?}", other.map(|r| r.message)),
    }
}

#[test]
fn test_corrupt_descriptor_set() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("garbage.pb");
    fs::write(&path, [0xff, 0xff, 0xff, 0xff]).unwrap();

    let mut explorer = Explorer::default();
    let err = explorer.load_descriptor_set(&path).unwrap_err();
    assert!(matches!(err, ExplorerError::Decode(_)));
    // failed loads are not cached
    assert!(explorer.cache().is_empty());
}

#[test]
fn test_missing_compiler_reports_unavailable() {
    let mut config = ExplorerConfig::default();
    config.compiler.program = "protoc-not-installed-here".to_string();
    let mut explorer = Explorer::new(config);

    let err = explorer
        .load_schema(&fixtures_path().join("flat/standalone.proto"))
        .unwrap_err();
    assert!(matches!(err, ExplorerError::CompilerUnavailable { .. }));
}
