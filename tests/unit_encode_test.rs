use bytes::Bytes;
use peridot::command::{Command, CommandKind};
use peridot::protocol::encode_command;

#[tokio::test]
async fn test_encode_command_with_arguments() {
    let payload = Command::new("SET").arg("key").arg("value").encode();
    assert_eq!(
        &payload[..],
        b"*3\r\n$3\r\nSET\r\n$3\r\nkey\r\n$5\r\nvalue\r\n"
    );
}

#[tokio::test]
async fn test_encode_command_without_arguments() {
    let payload = encode_command("PING", &[]);
    assert_eq!(&payload[..], b"*1\r\n$4\r\nPING\r\n");
}

#[tokio::test]
async fn test_encode_preserves_binary_arguments() {
    let payload = encode_command(
        "SET",
        &[Bytes::from_static(b"k"), Bytes::from_static(b"\x00\x01")],
    );
    assert_eq!(
        &payload[..],
        b"*3\r\n$3\r\nSET\r\n$1\r\nk\r\n$2\r\n\x00\x01\r\n"
    );
}

#[tokio::test]
async fn test_command_kind_classification() {
    assert_eq!(Command::new("GET").kind(), CommandKind::Regular);
    assert_eq!(Command::new("subscribe").kind(), CommandKind::Subscribe);
    assert_eq!(Command::new("PSUBSCRIBE").kind(), CommandKind::Subscribe);
    assert_eq!(Command::new("Monitor").kind(), CommandKind::Monitor);
}
