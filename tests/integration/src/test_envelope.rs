//! Envelope tests.

use qlm_model::mi::{TTL_IMMEDIATE, TTL_INFINITE};
use qlm_model::{
    CancelRequest, Envelope, Message, NodeList, ReadRequest, Request, RequestId, RequestResult,
    Return, TtlKind, WriteRequest,
};
use qlm_xml::{
    CodecConfig, DocumentKind, decode_envelope, decode_objects, detect_document, encode_envelope,
    encode_envelope_with,
};

use crate::{as_text, fixture, init_tracing};

/// Build a pretty-printed payload: each line on its own row at the given
/// indentation, followed by the indentation of the closing `</msg>`.
fn payload(lines: &[(usize, &str)], closing: usize) -> String {
    let mut data = String::new();
    for (indent, line) in lines {
        data.push('\n');
        data.push_str(&" ".repeat(*indent));
        data.push_str(line);
    }
    data.push('\n');
    data.push_str(&" ".repeat(closing));
    data
}

fn nodes() -> NodeList {
    NodeList::urls(["http://192.168.0.1/", "http://192.168.0.2/"])
}

fn ok_result(msg_format: &str, request_id: RequestId, data: String) -> RequestResult {
    RequestResult {
        msg_format: msg_format.to_owned(),
        request_id: Some(request_id),
        message: Some(Message::new(data)),
        ..RequestResult::status("200", "")
    }
}

fn assert_fixture(name: &str, expected: &Envelope) {
    init_tracing();
    let xml = fixture(name);

    let decoded = decode_envelope(xml.as_bytes()).expect("fixture should decode");
    assert_eq!(&decoded, expected);

    let encoded = as_text(encode_envelope(expected).expect("envelope should encode"));
    assert_eq!(encoded, xml);
}

#[test]
fn test_should_match_cancel_request_fixture() {
    let expected = Envelope::new(
        "1.0",
        10.0,
        Request::Cancel(CancelRequest {
            request_ids: vec![RequestId::new("REQ0011212121212")],
            node_list: Some(nodes()),
        }),
    );
    assert_fixture("cancel_request.xml", &expected);
}

#[test]
fn test_should_match_error_response_fixture() {
    let expected = Envelope::response(
        "1.0",
        TTL_IMMEDIATE,
        vec![RequestResult::status("404", "Not Found")],
    );
    assert_fixture("error_response.xml", &expected);

    let result = &expected.response_body().expect("response").results[0];
    assert!(!result.return_.as_ref().is_some_and(Return::is_success));
}

#[test]
fn test_should_match_typical_minimal_response_fixture() {
    let expected = Envelope::response("0.2", 0.0, vec![RequestResult::status("200", "")]);
    assert_fixture("typical_minimal_response.xml", &expected);
    assert_eq!(expected.ttl_kind(), TtlKind::Immediate);
}

#[test]
fn test_should_match_multiple_payload_response_fixture() {
    let obix = payload(
        &[
            (16, r#"<obj href="http://myhome/thermostat" >"#),
            (20, r#"<real name="spaceTemp" unit="obix:units/fahrenheit" val="67.2"/>"#),
            (20, r#"<real name="setpoint" unit="obix:units/fahrenheit" val="72.0"/>"#),
            (20, r#"<bool name="furnaceOn" val="true"/>"#),
            (16, "</obj>"),
        ],
        12,
    );
    let csv = format!("11,22,33\n{}44,55,66", " ".repeat(16));
    let odf = payload(
        &[
            (16, "<Objects>"),
            (20, "<Object>"),
            (24, "<id>SmartFridge22334411</id>"),
            (24, "<!-- Only most recent value, bogus timestamp. -->"),
            (24, r#"<InfoItem name="PowerConsumption">"#),
            (28, r#"<value type="xs:int" unixTime="5453563">43</value>"#),
            (24, "</InfoItem>"),
            (20, "</Object>"),
            (16, "</Objects>"),
        ],
        12,
    );
    let formatted_id = RequestId {
        format: "REQ".to_owned(),
        ..RequestId::new("REQ654534")
    };
    let expected = Envelope::response(
        "1.0",
        10.0,
        vec![
            ok_result("obix", RequestId::new("REQ0011212121212"), obix),
            ok_result("CSV", RequestId::new("REQ232323"), csv),
            ok_result("QLMdf", formatted_id, odf),
        ],
    );
    assert_fixture("multiple_payload_response.xml", &expected);
}

#[test]
fn test_should_decode_embedded_data_format_payload() {
    let envelope = decode_envelope(fixture("multiple_payload_response.xml").as_bytes())
        .expect("fixture should decode");
    let results = &envelope.response_body().expect("response").results;
    let data = &results[2].message.as_ref().expect("payload").data;

    assert_eq!(
        detect_document(data.as_bytes()).expect("payload root"),
        DocumentKind::Objects
    );
    let objects = decode_objects(data.as_bytes()).expect("payload should decode");
    let item = objects
        .find_object(&["SmartFridge22334411"])
        .and_then(|o| o.info_item("PowerConsumption"))
        .expect("info item");
    assert_eq!(item.values[0].unix_time, 5_453_563);
    assert_eq!(item.values[0].text, "43");
}

#[test]
fn test_should_match_read_request_fixture() {
    let data = payload(
        &[
            (12, "<Objects>"),
            (16, "<Object>"),
            (20, "<id>SmartFridge22334411</id>"),
            (20, r#"<InfoItem name="PowerConsumption"></InfoItem>"#),
            (16, "</Object>"),
            (12, "</Objects>"),
        ],
        8,
    );
    let expected = Envelope::new(
        "1.0",
        10.0,
        Request::Read(ReadRequest {
            node_list: Some(nodes()),
            message: Some(Message::new(data)),
            msg_format: "QLM_mf.xsd".to_owned(),
            interval: 3.5,
            oldest: 10,
            newest: 15,
            begin: "2014-01-01T00:00".to_owned(),
            end: "2014-02-01T00:00".to_owned(),
            ..ReadRequest::default()
        }),
    );
    assert_fixture("read_request.xml", &expected);
}

#[test]
fn test_should_match_write_request_fixture() {
    let data = payload(
        &[
            (12, "<Objects>"),
            (16, "<Object>"),
            (20, "<id>SmartFridge22334411</id>"),
            (20, r#"<InfoItem name="FridgeTemperatureSetpoint">"#),
            (24, "<value>3.5</value>"),
            (20, "</InfoItem>"),
            (20, r#"<InfoItem name="FreezerTemperatureSetpoint">"#),
            (24, "<value>-20.0</value>"),
            (20, "</InfoItem>"),
            (16, "</Object>"),
            (12, "</Objects>"),
        ],
        8,
    );
    let expected = Envelope::new(
        "1.0",
        TTL_INFINITE,
        Request::Write(WriteRequest {
            message: Some(Message::new(data)),
            msg_format: "QLMdf".to_owned(),
            target_type: "device".to_owned(),
            ..WriteRequest::default()
        }),
    );
    assert_fixture("write_request.xml", &expected);
    assert_eq!(expected.ttl_kind(), TtlKind::Infinite);
}

#[test]
fn test_should_match_cancel_with_two_request_ids_fixture() {
    let expected = Envelope::new(
        "1.0",
        10.0,
        Request::Cancel(CancelRequest {
            request_ids: vec![
                RequestId::new("REQ0011212121212"),
                RequestId::new("REQ0011212121213"),
            ],
            node_list: None,
        }),
    );
    assert_fixture("cancel_two_requests.xml", &expected);

    let decoded = decode_envelope(fixture("cancel_two_requests.xml").as_bytes())
        .expect("fixture should decode");
    let Some(Request::Cancel(cancel)) = decoded.request else {
        panic!("expected a cancel body");
    };
    let ids: Vec<_> = cancel.request_ids.iter().map(|id| id.text.as_str()).collect();
    assert_eq!(ids, ["REQ0011212121212", "REQ0011212121213"]);
}

#[test]
fn test_should_match_read_request_with_callback_fixture() {
    let data = payload(
        &[
            (12, "<Objects>"),
            (16, "<Object>"),
            (20, "<id>SmartFridge22334411</id>"),
            (20, r#"<InfoItem name="PowerConsumption"></InfoItem>"#),
            (16, "</Object>"),
            (12, "</Objects>"),
        ],
        8,
    );
    let expected = Envelope::new(
        "1.0",
        10.0,
        Request::Read(ReadRequest {
            message: Some(Message::new(data)),
            msg_format: "QLM_mf.xsd".to_owned(),
            callback: "http://192.168.0.1/".to_owned(),
            ..ReadRequest::default()
        }),
    );
    assert_fixture("read_request_callback.xml", &expected);
}

#[test]
fn test_should_match_response_with_nodes_fixture() {
    let expected = Envelope::response(
        "1.0",
        10.0,
        vec![RequestResult {
            target_type: "device".to_owned(),
            node_list: Some(nodes()),
            ..RequestResult::status("200", "")
        }],
    );
    assert_fixture("response_with_nodes.xml", &expected);
}

#[test]
fn test_should_match_csv_write_request_fixture() {
    let expected = Envelope::new(
        "1.0",
        10.0,
        Request::Write(WriteRequest {
            node_list: Some(NodeList::urls(["http://192.168.0.2/"])),
            request_ids: vec![RequestId::new("REQ232323")],
            message: Some(Message::new("11,22,33\n44,55,66")),
            msg_format: "CSV".to_owned(),
            callback: "http://192.168.0.1/".to_owned(),
            ..WriteRequest::default()
        }),
    );
    assert_fixture("write_csv_request.xml", &expected);

    let xml = as_text(encode_envelope(&expected).expect("envelope should encode"));
    assert!(xml.contains("<msg>11,22,33\n44,55,66</msg>"));
}

#[test]
fn test_should_round_trip_nested_result_envelope() {
    init_tracing();
    let inner = Envelope::new(
        "1.0",
        TTL_INFINITE,
        Request::Cancel(CancelRequest {
            request_ids: vec![RequestId::new("REQ1")],
            node_list: None,
        }),
    );
    let outer = Envelope::response(
        "1.0",
        10.0,
        vec![RequestResult {
            envelope: Some(Box::new(inner)),
            ..RequestResult::status("200", "")
        }],
    );
    let xml = encode_envelope(&outer).expect("envelope should encode");
    let text = as_text(xml.clone());
    assert!(text.contains("            <QlmEnvelope version=\"1.0\" ttl=\"-1\">\n"));
    assert!(text.ends_with(
        "            </QlmEnvelope>\n        </result>\n    </response>\n</qlmEnvelope>"
    ));
    assert_eq!(decode_envelope(&xml).expect("round trip"), outer);
}

#[test]
fn test_should_encode_compact_envelope() {
    let config = CodecConfig::builder().indent(0).build();
    let envelope = Envelope::response("0.2", 0.0, vec![RequestResult::status("200", "")]);
    let xml = as_text(encode_envelope_with(&envelope, &config).expect("envelope should encode"));
    assert_eq!(
        xml,
        r#"<qlmEnvelope version="0.2" ttl="0"><response><result><return returnCode="200"></return></result></response></qlmEnvelope>"#
    );
}

#[test]
fn test_should_reject_invalid_envelope() {
    init_tracing();
    assert!(decode_envelope(b"invalid").is_err());
    assert!(decode_envelope(br#"<Objects></Objects>"#).is_err());
}
