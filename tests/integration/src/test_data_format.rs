//! Data-format document tests.

use qlm_model::{Description, InfoItem, MetaData, Object, Objects, QlmId, Value};
use qlm_xml::{CodecConfig, ErrorKind, decode_objects, decode_objects_with, encode_objects};

use crate::{as_text, fixture, init_tracing};

fn fridge() -> Object {
    Object {
        type_: "Refrigerator Assembly Product".to_owned(),
        ..Object::with_id("SmartFridge22334411")
    }
}

fn typed_value(type_: &str, text: &str) -> Value {
    Value {
        type_: type_.to_owned(),
        ..Value::new(text)
    }
}

fn timed_value(date_time: &str, text: &str) -> Value {
    Value {
        date_time: date_time.to_owned(),
        ..Value::new(text)
    }
}

fn item_with_values(name: &str, values: Vec<Value>) -> InfoItem {
    InfoItem {
        values,
        ..InfoItem::new(name)
    }
}

fn assert_fixture(name: &str, expected: &Objects) {
    init_tracing();
    let xml = fixture(name);

    let decoded = decode_objects(xml.as_bytes()).expect("fixture should decode");
    assert_eq!(&decoded, expected);

    let encoded = as_text(encode_objects(expected).expect("tree should encode"));
    assert_eq!(encoded, xml);
}

#[test]
fn test_should_match_measurement_values_fixture() {
    let item = InfoItem {
        udef: "b.o.9_1.1.14.13".to_owned(),
        description: Some(Description::new("Power consumption values with timestamp.")),
        values: vec![
            timed_value("2001-10-26T15:33:21", "15.5"),
            timed_value("2001-10-26T15:33:50", "15.7"),
            timed_value("2001-10-26T15:34:15", "1.3"),
            timed_value("2001-10-26T15:34:35", "1.5"),
            timed_value("2001-10-26T15:34:52", "15.3"),
        ],
        ..InfoItem::new("Consumed Electrical Power Measure")
    };
    let expected = Objects::new(vec![Object {
        info_items: vec![item],
        ..fridge()
    }]);
    assert_fixture("fridge_measurements.xml", &expected);
}

#[test]
fn test_should_match_metadata_fixture() {
    let meta = MetaData {
        info_items: vec![
            item_with_values("format", vec![typed_value("xs:string", "xs:double")]),
            item_with_values("latency", vec![typed_value("xs:int", "5")]),
            item_with_values("readable", vec![typed_value("xs:boolean", "true")]),
            item_with_values("writable", vec![typed_value("xs:boolean", "false")]),
            item_with_values("unit", vec![typed_value("xs:string", "Watts")]),
            item_with_values("accuracy", vec![typed_value("xs:double", "1")]),
        ],
    };
    let expected = Objects::new(vec![Object {
        info_items: vec![InfoItem {
            meta_data: Some(meta),
            ..InfoItem::new("PowerConsumption")
        }],
        ..Object::with_id("SmartFridge22334411")
    }]);
    assert_fixture("fridge_metadata.xml", &expected);
}

#[test]
fn test_should_match_nested_objects_fixture() {
    let typed = |id: &str| Object {
        type_: "someType".to_owned(),
        ..Object::with_id(id)
    };
    let sub_sub = Object {
        info_items: vec![item_with_values(
            "SubSubTarget1InfoItem1",
            vec![Value::new("22.5")],
        )],
        ..typed("SubSubTarget1")
    };
    let sub1 = Object {
        info_items: vec![InfoItem::new("SubInfoItem1")],
        objects: vec![sub_sub],
        ..typed("SubTarget1")
    };
    let sub2 = Object {
        info_items: vec![item_with_values(
            "SubTarget2InfoItem1",
            vec![Value::new("34.6")],
        )],
        ..typed("SubTarget2")
    };
    let root = Object {
        info_items: vec![
            item_with_values(
                "InfoItem1",
                vec![Value::new("Value1"), Value::new("Value2"), Value::new("Value3")],
            ),
            item_with_values("InfoItem2", vec![Value::new("Value")]),
        ],
        objects: vec![sub1, sub2],
        ..typed("UniqueTargetID_1")
    };
    let expected = Objects::new(vec![root]);
    assert_fixture("nested_objects.xml", &expected);

    let found = expected
        .find_object(&["UniqueTargetID_1", "SubTarget1", "SubSubTarget1"])
        .expect("nested object");
    assert_eq!(
        found
            .info_item("SubSubTarget1InfoItem1")
            .and_then(InfoItem::latest_value)
            .map(|v| v.text.as_str()),
        Some("22.5")
    );
}

#[test]
fn test_should_match_identifier_and_other_names_fixture() {
    let id = QlmId {
        id_type: "some id type".to_owned(),
        tag_type: "some tag type".to_owned(),
        start_date: "2013-10-26T21:32:52".to_owned(),
        end_date: "2015-10-26T21:32:52".to_owned(),
        udef: "appropriate.udef.code".to_owned(),
        ..QlmId::new("SmartFridge22334411")
    };
    let description = Description {
        lang: "en".to_owned(),
        udef: "appropriate.udef.code".to_owned(),
        ..Description::new("Power consumption values with timestamp.")
    };
    let item = InfoItem {
        udef: "b.o.9_1.1.14.13".to_owned(),
        other_names: vec!["Some Name 1".to_owned(), "Some Name 2".to_owned()],
        values: vec![Value {
            unix_time: 1_412_775_405,
            ..Value::new("Value")
        }],
        ..InfoItem::new("Consumed Electrical Power Measure")
    };
    let expected = Objects {
        version: "1.0".to_owned(),
        objects: vec![Object {
            id: Some(id),
            description: Some(description),
            info_items: vec![item],
            ..fridge()
        }],
    };
    assert_fixture("other_names.xml", &expected);
}

#[test]
fn test_should_decode_compact_input_to_same_tree() {
    init_tracing();
    let compact = r#"<?xml version="1.0" encoding="UTF-8"?><Objects><Object type="someType"><id>SubTarget2</id><InfoItem name="SubTarget2InfoItem1"><value>34.6</value></InfoItem></Object></Objects>"#;
    let decoded = decode_objects(compact.as_bytes()).expect("compact input should decode");
    let object = &decoded.objects[0];
    assert_eq!(object.id_text(), Some("SubTarget2"));
    assert_eq!(object.info_items[0].values, vec![Value::new("34.6")]);
}

#[test]
fn test_should_reject_document_deeper_than_configured_limit() {
    init_tracing();
    let config = CodecConfig::builder().max_depth(3).build();
    let err = decode_objects_with(fixture("nested_objects.xml").as_bytes(), &config)
        .expect_err("nesting exceeds limit");
    assert_eq!(err.kind(), ErrorKind::DepthExceeded);
}

#[test]
fn test_should_reject_malformed_document_with_position() {
    init_tracing();
    let xml = "<Objects><Object><id>A</Object></Objects>";
    let err = decode_objects(xml.as_bytes()).expect_err("mismatched tags");
    assert_eq!(err.kind(), ErrorKind::MalformedInput);
    assert!(err.position().is_some());
}

#[test]
fn test_should_dump_decoded_tree_as_json() {
    let decoded = decode_objects(fixture("other_names.xml").as_bytes()).expect("fixture should decode");
    let json = serde_json::to_value(&decoded).expect("tree should serialize");
    assert_eq!(json["objects"][0]["infoItems"][0]["otherNames"][1], "Some Name 2");
    assert_eq!(json["objects"][0]["infoItems"][0]["values"][0]["unixTime"], 1_412_775_405);
}
