use machine_core::MachineSystem;
use machine_io::protocol::{IncomingMessage, ProtocolError, ProtocolVersion, StateMsg};

#[test]
fn parses_hello_message() {
    let raw = r#"{
        "type":"hello",
        "protocol_version":{"major":1,"minor":0},
        "capabilities":["snapshot.v1"],
        "client_id":"editor"
    }"#;

    let msg = IncomingMessage::parse(raw).expect("hello should parse");
    match msg {
        IncomingMessage::Hello(hello) => {
            assert!(hello.protocol_version.is_supported());
            assert_eq!(hello.client_id.as_deref(), Some("editor"));
            assert_eq!(hello.capabilities, vec!["snapshot.v1".to_string()]);
        }
        _ => panic!("expected hello message"),
    }
}

#[test]
fn parses_commands() {
    let cases = [
        (
            r#"{"type":"choose_machine","machine":2}"#,
            IncomingMessage::ChooseMachine { machine: 2 },
        ),
        (
            r#"{"type":"set_frame_rate","rate":24.0}"#,
            IncomingMessage::SetFrameRate { rate: 24.0 },
        ),
        (
            r#"{"type":"request_frame","frame":120}"#,
            IncomingMessage::RequestFrame { frame: 120 },
        ),
        (
            r#"{"type":"set_location","x":-20,"y":400}"#,
            IncomingMessage::SetLocation { x: -20, y: 400 },
        ),
        (
            r#"{"type":"set_flags","flags":255}"#,
            IncomingMessage::SetFlags { flags: 255 },
        ),
        (r#"{"type":"snapshot"}"#, IncomingMessage::Snapshot),
    ];

    for (raw, expected) in cases {
        let msg = IncomingMessage::parse(raw).expect("command should parse");
        assert_eq!(msg, expected, "{raw}");
    }
}

#[test]
fn rejects_malformed_commands() {
    assert!(matches!(
        IncomingMessage::parse(r#"{"frame":1}"#),
        Err(ProtocolError::MissingType)
    ));
    assert!(matches!(
        IncomingMessage::parse(r#"{"type":"recommendation"}"#),
        Err(ProtocolError::UnknownType(t)) if t == "recommendation"
    ));
    // Negative frames are out of range for a frame counter.
    assert!(matches!(
        IncomingMessage::parse(r#"{"type":"request_frame","frame":-1}"#),
        Err(ProtocolError::Json(_))
    ));
    assert!(matches!(
        IncomingMessage::parse(r#"{"type":"set_flags","flags":256}"#),
        Err(ProtocolError::Json(_))
    ));
}

#[test]
fn state_message_shape() {
    let mut system = MachineSystem::new();
    system.request_frame(30);
    let msg = StateMsg::from_system(7, &system);
    let value = serde_json::to_value(&msg).unwrap();

    assert_eq!(value["type"], "state");
    assert_eq!(value["sequence"], 7);
    assert_eq!(value["machine"], 1);
    assert_eq!(value["frame"], 30);
    assert_eq!(value["time"], 1.0);
    assert_eq!(value["stats"]["frames_stepped"], 30);
    assert_eq!(
        serde_json::from_value::<ProtocolVersion>(value["protocol_version"].clone()).unwrap(),
        ProtocolVersion::v1()
    );
}
