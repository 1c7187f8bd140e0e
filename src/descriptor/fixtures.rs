//! Descriptor fixtures shared by unit tests.
//!
//! ```text
//! shop/common.proto:  Money
//! shop/order.proto:   Order { Item, GiftCard, MetaEntry, TotalsEntry, Status }, Customer,
//!                     Tier, Node (self-recursive), RingA -> RingB -> RingC -> RingA
//! fan/hub.proto:      Hub -> {Leaf x3, Spoke x2}, Spoke -> {Leaf, Hub}, Leaf -> Hub
//! ```

use prost_types::field_descriptor_proto::{Label, Type};
use prost_types::{
    DescriptorProto, EnumDescriptorProto, EnumValueDescriptorProto, FieldDescriptorProto,
    FileDescriptorProto, FileDescriptorSet, MessageOptions, OneofDescriptorProto,
};

use super::DescriptorPool;

pub(crate) fn scalar(name: &str, number: i32, ty: Type) -> FieldDescriptorProto {
    FieldDescriptorProto {
        name: Some(name.to_string()),
        number: Some(number),
        label: Some(Label::Optional as i32),
        r#type: Some(ty as i32),
        ..Default::default()
    }
}

pub(crate) fn typed(name: &str, number: i32, ty: Type, type_name: &str) -> FieldDescriptorProto {
    FieldDescriptorProto {
        type_name: Some(format!(".{}", type_name)),
        ..scalar(name, number, ty)
    }
}

pub(crate) fn message_field(name: &str, number: i32, type_name: &str) -> FieldDescriptorProto {
    typed(name, number, Type::Message, type_name)
}

pub(crate) fn repeated(mut field: FieldDescriptorProto) -> FieldDescriptorProto {
    field.label = Some(Label::Repeated as i32);
    field
}

pub(crate) fn in_oneof(mut field: FieldDescriptorProto, index: i32) -> FieldDescriptorProto {
    field.oneof_index = Some(index);
    field
}

pub(crate) fn message(name: &str, fields: Vec<FieldDescriptorProto>) -> DescriptorProto {
    DescriptorProto {
        name: Some(name.to_string()),
        field: fields,
        ..Default::default()
    }
}

pub(crate) fn map_entry(name: &str, key: Type, value: FieldDescriptorProto) -> DescriptorProto {
    let mut value = value;
    value.name = Some("value".to_string());
    value.number = Some(2);
    DescriptorProto {
        options: Some(MessageOptions {
            map_entry: Some(true),
            ..Default::default()
        }),
        ..message(name, vec![scalar("key", 1, key), value])
    }
}

pub(crate) fn oneof(name: &str) -> OneofDescriptorProto {
    OneofDescriptorProto {
        name: Some(name.to_string()),
        ..Default::default()
    }
}

pub(crate) fn enumeration(name: &str, values: &[&str]) -> EnumDescriptorProto {
    EnumDescriptorProto {
        name: Some(name.to_string()),
        value: values
            .iter()
            .enumerate()
            .map(|(i, v)| EnumValueDescriptorProto {
                name: Some(v.to_string()),
                number: Some(i as i32),
                ..Default::default()
            })
            .collect(),
        ..Default::default()
    }
}

pub(crate) fn file(
    name: &str,
    package: &str,
    messages: Vec<DescriptorProto>,
    enums: Vec<EnumDescriptorProto>,
) -> FileDescriptorProto {
    FileDescriptorProto {
        name: Some(name.to_string()),
        package: Some(package.to_string()),
        message_type: messages,
        enum_type: enums,
        syntax: Some("proto3".to_string()),
        ..Default::default()
    }
}

pub(crate) fn shop_set() -> FileDescriptorSet {
    let money = message(
        "Money",
        vec![scalar("currency", 1, Type::String), scalar("units", 2, Type::Int64)],
    );

    let mut note = scalar("note", 10, Type::String);
    note.proto3_optional = Some(true);
    note.oneof_index = Some(1);

    let order = DescriptorProto {
        nested_type: vec![
            message(
                "Item",
                vec![
                    scalar("sku", 1, Type::String),
                    scalar("quantity", 2, Type::Int32),
                    message_field("price", 3, "shop.Money"),
                ],
            ),
            message(
                "GiftCard",
                vec![scalar("code", 1, Type::String), message_field("balance", 2, "shop.Money")],
            ),
            map_entry("MetaEntry", Type::String, scalar("value", 2, Type::String)),
            map_entry("TotalsEntry", Type::String, message_field("value", 2, "shop.Money")),
        ],
        enum_type: vec![enumeration("Status", &["PENDING", "SHIPPED"])],
        oneof_decl: vec![oneof("payment"), oneof("_note")],
        ..message(
            "Order",
            vec![
                scalar("id", 1, Type::String),
                repeated(message_field("items", 2, "shop.Order.Item")),
                repeated(message_field("meta", 3, "shop.Order.MetaEntry")),
                message_field("customer", 4, "shop.Customer"),
                typed("status", 5, Type::Enum, "shop.Order.Status"),
                in_oneof(message_field("cash", 6, "shop.Money"), 0),
                in_oneof(scalar("voucher_code", 7, Type::String), 0),
                repeated(message_field("totals", 8, "shop.Order.TotalsEntry")),
                in_oneof(message_field("gift_from", 9, "shop.Customer"), 0),
                note,
                in_oneof(message_field("card", 11, "shop.Order.GiftCard"), 0),
            ],
        )
    };

    let customer = message(
        "Customer",
        vec![scalar("name", 1, Type::String), typed("tier", 2, Type::Enum, "shop.Tier")],
    );

    let node = message(
        "Node",
        vec![
            scalar("label", 1, Type::String),
            repeated(message_field("children", 2, "shop.Node")),
            message_field("parent", 3, "shop.Node"),
        ],
    );

    let ring_a = message(
        "RingA",
        vec![message_field("next", 1, "shop.RingB"), scalar("a_note", 2, Type::String)],
    );
    let ring_b = message("RingB", vec![message_field("next", 1, "shop.RingC")]);
    let ring_c = message(
        "RingC",
        vec![message_field("next", 1, "shop.RingA"), scalar("deep_marker", 2, Type::Bool)],
    );

    FileDescriptorSet {
        file: vec![
            file("shop/common.proto", "shop", vec![money], vec![]),
            file(
                "shop/order.proto",
                "shop",
                vec![order, customer, node, ring_a, ring_b, ring_c],
                vec![enumeration("Tier", &["BASIC", "GOLD"])],
            ),
        ],
    }
}

pub(crate) fn shop_pool() -> DescriptorPool {
    DescriptorPool::from_file_descriptor_set(&shop_set())
}

/// Many references converging on the same few messages
pub(crate) fn fan_in_pool() -> DescriptorPool {
    let hub = message(
        "Hub",
        vec![
            message_field("first", 1, "fan.Leaf"),
            message_field("second", 2, "fan.Leaf"),
            repeated(message_field("many", 3, "fan.Leaf")),
            message_field("left", 4, "fan.Spoke"),
            message_field("right", 5, "fan.Spoke"),
        ],
    );
    let spoke = message(
        "Spoke",
        vec![message_field("leaf", 1, "fan.Leaf"), message_field("hub", 2, "fan.Hub")],
    );
    let leaf = message(
        "Leaf",
        vec![scalar("weight", 1, Type::Double), message_field("hub", 2, "fan.Hub")],
    );

    DescriptorPool::from_file_descriptor_set(&FileDescriptorSet {
        file: vec![file("fan/hub.proto", "fan", vec![hub, spoke, leaf], vec![])],
    })
}
