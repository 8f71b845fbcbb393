use anyhow::Result;
use bytes::Bytes;
use peridot::command::Command;
use peridot::config::ConnectionConfig;
use peridot::connection::{Connection, ConnectionState};
use peridot::protocol::Reply;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::sync::mpsc;

const RECV_TIMEOUT: Duration = Duration::from_secs(5);

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .compact()
        .try_init();
}

/// Binds a loopback listener that waits for `expected_request_bytes` request
/// bytes, writes `replies`, and then holds the connection open until the
/// client goes away.
async fn spawn_stub_server(expected_request_bytes: usize, replies: &'static [u8]) -> Result<u16> {
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let port = listener.local_addr()?.port();
    tokio::spawn(async move {
        let Ok((mut socket, _)) = listener.accept().await else {
            return;
        };
        let mut buf = vec![0u8; 4096];
        let mut seen = 0usize;
        while seen < expected_request_bytes {
            match socket.read(&mut buf).await {
                Ok(0) | Err(_) => return,
                Ok(n) => seen += n,
            }
        }
        if socket.write_all(replies).await.is_err() {
            return;
        }
        let _ = socket.read(&mut buf).await;
    });
    Ok(port)
}

async fn recv<T>(rx: &mut mpsc::UnboundedReceiver<T>) -> Result<T> {
    tokio::time::timeout(RECV_TIMEOUT, rx.recv())
        .await?
        .ok_or_else(|| anyhow::anyhow!("channel closed before a message arrived"))
}

#[tokio::test]
async fn test_pipelined_commands_round_trip_in_order() -> Result<()> {
    init_tracing();
    let expected = Command::new("SET").arg("a").arg("1").encode().len()
        + Command::new("GET").arg("a").encode().len();
    let port = spawn_stub_server(expected, b"+OK\r\n$1\r\n1\r\n").await?;

    let connection = Connection::new(ConnectionConfig::tcp("127.0.0.1", port));
    let (tx, mut rx) = mpsc::unbounded_channel();

    // Both commands are submitted while still disconnected; their bytes are
    // buffered and flushed once establishment completes.
    let set_tx = tx.clone();
    connection.execute(Command::new("SET").arg("a").arg("1"), move |reply, is_error| {
        let _ = set_tx.send(("set", reply, is_error));
    })?;
    let get_tx = tx.clone();
    connection.execute(Command::new("GET").arg("a"), move |reply, is_error| {
        let _ = get_tx.send(("get", reply, is_error));
    })?;

    connection.connect()?;
    let state = connection.wait_for_state(|s| s.is_connected()).await?;
    assert_eq!(state, ConnectionState::Ready);

    assert_eq!(recv(&mut rx).await?, ("set", Reply::Ok, false));
    assert_eq!(
        recv(&mut rx).await?,
        ("get", Reply::Bulk(Bytes::from_static(b"1")), false)
    );

    connection.disconnect();
    Ok(())
}

#[tokio::test]
async fn test_subscribe_streams_pushed_messages_to_one_callback() -> Result<()> {
    init_tracing();
    let subscribe = Command::new("SUBSCRIBE").arg("ch");
    let port = spawn_stub_server(
        subscribe.encode().len(),
        b"*3\r\n$9\r\nsubscribe\r\n$2\r\nch\r\n:1\r\n\
          *3\r\n$7\r\nmessage\r\n$2\r\nch\r\n$2\r\nm1\r\n\
          *3\r\n$7\r\nmessage\r\n$2\r\nch\r\n$2\r\nm2\r\n\
          *3\r\n$7\r\nmessage\r\n$2\r\nch\r\n$2\r\nm3\r\n",
    )
    .await?;

    let connection = Connection::new(ConnectionConfig::tcp("127.0.0.1", port));
    connection.connect()?;
    connection.wait_for_state(|s| s.is_connected()).await?;

    let (tx, mut rx) = mpsc::unbounded_channel();
    connection.execute(subscribe, move |reply, _| {
        let _ = tx.send(reply);
    })?;

    // The acknowledgment and all three pushed messages arrive through the
    // same sticky callback.
    let ack = recv(&mut rx).await?;
    assert!(matches!(ack, Reply::Array(_)));
    for expected in [b"m1", b"m2", b"m3"] {
        let Reply::Array(items) = recv(&mut rx).await? else {
            panic!("pushed message should be an array");
        };
        assert_eq!(items[2], Reply::Bulk(Bytes::copy_from_slice(expected)));
    }

    let state = connection
        .wait_for_state(|s| *s == ConnectionState::Subscribed)
        .await?;
    assert_eq!(state, ConnectionState::Subscribed);
    connection.disconnect();
    Ok(())
}

#[tokio::test]
async fn test_refused_connect_reports_through_error_callback() -> Result<()> {
    init_tracing();
    // Bind and drop a listener to find a port nothing is listening on.
    let port = TcpListener::bind("127.0.0.1:0").await?.local_addr()?.port();

    let connection = Connection::new(ConnectionConfig::tcp("127.0.0.1", port));
    let (tx, mut rx) = mpsc::unbounded_channel();
    connection.set_error_callback(move |err| {
        let _ = tx.send(err.to_string());
    })?;

    connection.connect()?;
    let message = recv(&mut rx).await?;
    assert!(message.contains("IO Error"), "unexpected error: {message}");

    let state = connection
        .wait_for_state(|s| *s == ConnectionState::Disconnected)
        .await?;
    assert_eq!(state, ConnectionState::Disconnected);
    assert!(!connection.is_connected());
    Ok(())
}

#[tokio::test]
async fn test_connect_callback_fires_once_ready() -> Result<()> {
    init_tracing();
    let port = spawn_stub_server(usize::MAX, b"").await?;

    let connection = Connection::new(ConnectionConfig::tcp("127.0.0.1", port));
    let (tx, mut rx) = mpsc::unbounded_channel();
    connection.set_connect_callback(move || {
        let _ = tx.send(());
    })?;

    assert_eq!(connection.state(), ConnectionState::Disconnected);
    connection.connect()?;
    recv(&mut rx).await?;
    connection.wait_for_state(|s| s.is_connected()).await?;
    assert!(connection.is_connected());
    assert_eq!(connection.endpoint(), format!("127.0.0.1:{port}"));

    // A second connect while established is rejected up front.
    assert!(connection.connect().is_err());
    connection.disconnect();
    Ok(())
}
