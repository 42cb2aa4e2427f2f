//! End-to-end protocol tests over real TCP sockets.
//!
//! Each test starts the service with the demo catalog, connects as a raw
//! protocol client built from the core primitives, and exercises the
//! message ordering the session layer promises: `generalInfo`, catalog
//! fetch, `readyForCommand`, command execution with streamed responses, and
//! the transport's failure modes.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use futures::stream::StreamExt;
use futures::SinkExt;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinHandle;
use tokio::time::timeout;
use tokio_util::codec::Framed;

use approach_core::catalog::CommandsSpecification;
use approach_core::info::HostInfo;
use approach_core::parser::evaluate;
use approach_core::wire::{
    FilePayload, Frame, FrameCodec, Message, MessageType, SERVICE_HANDSHAKE, TransportError,
    handshake_as_client,
};
use approach_service::demo::{DemoHandler, demo_specification};
use approach_service::{Server, ServerConfig};

const TEST_TIMEOUT: Duration = Duration::from_secs(5);

async fn start_service() -> (SocketAddr, JoinHandle<()>) {
    let config = ServerConfig::new("127.0.0.1:0".parse().unwrap(), "test-instance");
    let mut server = Server::bind(config, demo_specification().unwrap(), Arc::new(DemoHandler))
        .await
        .expect("bind service");
    let addr = server.local_addr().unwrap();
    let handle = tokio::spawn(async move { server.run().await });
    (addr, handle)
}

async fn connect(addr: SocketAddr) -> Framed<TcpStream, FrameCodec> {
    let mut stream = TcpStream::connect(addr).await.expect("connect");
    timeout(TEST_TIMEOUT, handshake_as_client(&mut stream))
        .await
        .expect("handshake timed out")
        .expect("handshake");
    Framed::new(stream, FrameCodec::new())
}

async fn recv_message(framed: &mut Framed<TcpStream, FrameCodec>) -> Message {
    let frame = timeout(TEST_TIMEOUT, framed.next())
        .await
        .expect("receive timed out")
        .expect("connection closed")
        .expect("frame error");
    Message::from_frame(&frame).expect("valid envelope")
}

async fn send_message(framed: &mut Framed<TcpStream, FrameCodec>, message: Message) {
    framed
        .send(message.to_frame().unwrap())
        .await
        .expect("send");
}

/// Completes the opening sequence and returns the received catalog.
async fn open_session(framed: &mut Framed<TcpStream, FrameCodec>) -> CommandsSpecification {
    let info_message = recv_message(framed).await;
    assert_eq!(info_message.message_type(), MessageType::GeneralInfo);
    let info = HostInfo::decode(&info_message.payload).unwrap();
    assert_eq!(info.instance_name, "test-instance");

    send_message(framed, Message::list_commands()).await;

    let spec_message = recv_message(framed).await;
    assert_eq!(
        spec_message.message_type(),
        MessageType::CommandsSpecification
    );
    let specification = CommandsSpecification::decode(&spec_message.payload).unwrap();

    let ready = recv_message(framed).await;
    assert_eq!(ready.message_type(), MessageType::ReadyForCommand);

    specification
}

#[tokio::test]
async fn session_executes_command_and_streams_responses() {
    let (addr, server) = start_service().await;
    let mut framed = connect(addr).await;

    let specification = open_session(&mut framed).await;

    // The synthesized help entries travel inside the catalog document.
    let stuff = specification.command("stuff").unwrap();
    assert!(stuff.subcommand("help").is_some());
    let process = stuff.subcommand("process").unwrap();
    assert!(process.flags().iter().any(|f| f.name == "help"));

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("banana.txt");
    std::fs::write(&path, b"ripe").unwrap();

    let line = format!("stuff process -v --passes 2 {}", path.display());
    let invocation = evaluate(&line, &specification.commands).unwrap();
    send_message(&mut framed, Message::execute_command(&invocation).unwrap()).await;

    let mut console_lines = Vec::new();
    loop {
        let message = recv_message(&mut framed).await;
        match message.message_type() {
            MessageType::ConsoleOutput => {
                console_lines.push(message.payload_utf8().unwrap().to_string());
            },
            MessageType::ReadyForCommand => break,
            other => panic!("unexpected message type {other}"),
        }
    }
    assert_eq!(console_lines.len(), 3);
    assert_eq!(
        console_lines[2],
        "processed banana.txt (4 bytes) in 2 pass(es)"
    );

    server.abort();
}

#[tokio::test]
async fn screenshot_and_file_messages_are_typed() {
    let (addr, server) = start_service().await;
    let mut framed = connect(addr).await;
    let specification = open_session(&mut framed).await;

    let invocation = evaluate("screenshot", &specification.commands).unwrap();
    send_message(&mut framed, Message::execute_command(&invocation).unwrap()).await;

    let shot = recv_message(&mut framed).await;
    assert_eq!(shot.message_type(), MessageType::Screenshot);
    assert_eq!(&shot.payload[..4], &[0x89, b'P', b'N', b'G']);
    assert_eq!(
        recv_message(&mut framed).await.message_type(),
        MessageType::ReadyForCommand
    );

    let invocation = evaluate("sendfile report", &specification.commands).unwrap();
    send_message(&mut framed, Message::execute_command(&invocation).unwrap()).await;

    let file = recv_message(&mut framed).await;
    assert_eq!(file.message_type(), MessageType::File);
    let payload = FilePayload::decode(&file.payload).unwrap();
    assert_eq!(payload.filename, "report.txt");
    assert_eq!(
        recv_message(&mut framed).await.message_type(),
        MessageType::ReadyForCommand
    );

    server.abort();
}

#[tokio::test]
async fn parse_errors_stay_client_side_and_session_continues() {
    let (addr, server) = start_service().await;
    let mut framed = connect(addr).await;
    let specification = open_session(&mut framed).await;

    // A failing parse produces no traffic; the session then continues
    // normally with the next, valid command.
    assert!(evaluate("stuff process --passes xyz /tmp/x", &specification.commands).is_err());

    let invocation = evaluate("echo hello", &specification.commands).unwrap();
    send_message(&mut framed, Message::execute_command(&invocation).unwrap()).await;

    let output = recv_message(&mut framed).await;
    assert_eq!(output.payload_utf8().unwrap(), "hello");
    assert_eq!(
        recv_message(&mut framed).await.message_type(),
        MessageType::ReadyForCommand
    );

    server.abort();
}

#[tokio::test]
async fn service_rejects_wrong_client_handshake() {
    let (addr, server) = start_service().await;

    let mut stream = TcpStream::connect(addr).await.unwrap();

    let mut greeting = [0u8; SERVICE_HANDSHAKE.len()];
    timeout(TEST_TIMEOUT, stream.read_exact(&mut greeting))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(greeting, SERVICE_HANDSHAKE);

    stream.write_all(b"APPCLIENTV9999").await.unwrap();

    // The service drops the connection without sending a framed message.
    let mut rest = Vec::new();
    let read = timeout(TEST_TIMEOUT, stream.read_to_end(&mut rest))
        .await
        .expect("service should close the connection");
    assert!(matches!(read, Ok(0)), "expected clean close, got {read:?}");

    server.abort();
}

#[tokio::test]
async fn client_rejects_wrong_service_handshake() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let fake_service = tokio::spawn(async move {
        let (mut stream, _) = listener.accept().await.unwrap();
        stream.write_all(b"XXXSERVICEV0001").await.unwrap();
        // Hold the socket open long enough for the client to judge it.
        let mut sink = Vec::new();
        let _ = stream.read_to_end(&mut sink).await;
    });

    let mut stream = TcpStream::connect(addr).await.unwrap();
    let err = timeout(TEST_TIMEOUT, handshake_as_client(&mut stream))
        .await
        .unwrap()
        .unwrap_err();
    assert!(matches!(err, TransportError::HandshakeFailed { .. }));

    drop(stream);
    fake_service.await.unwrap();
}

#[tokio::test]
async fn oversized_payload_length_tears_the_session_down() {
    let (addr, server) = start_service().await;

    let mut stream = TcpStream::connect(addr).await.unwrap();
    handshake_as_client(&mut stream).await.unwrap();

    // Raw frame header advertising a payload at the cap.
    let mut raw = Vec::new();
    raw.extend_from_slice(&0i16.to_le_bytes());
    raw.extend_from_slice(&10_000_000i32.to_le_bytes());
    stream.write_all(&raw).await.unwrap();

    // read_to_end only completes once the service closes or resets the
    // connection; either way the session is gone.
    let mut rest = Vec::new();
    let _ = timeout(TEST_TIMEOUT, stream.read_to_end(&mut rest))
        .await
        .expect("service should tear the connection down");

    server.abort();
}

#[tokio::test]
async fn garbage_metadata_tears_the_session_down() {
    let (addr, server) = start_service().await;

    let mut stream = TcpStream::connect(addr).await.unwrap();
    handshake_as_client(&mut stream).await.unwrap();

    let mut framed = Framed::new(stream, FrameCodec::new());
    // Metadata that is not an envelope document.
    framed.send(Frame::new(vec![1u8], Vec::new())).await.unwrap();

    let mut closed = false;
    while let Ok(next) = timeout(TEST_TIMEOUT, framed.next()).await {
        match next {
            None => {
                closed = true;
                break;
            },
            Some(Err(_)) => {
                closed = true;
                break;
            },
            // Skip the generalInfo already in flight.
            Some(Ok(_)) => {},
        }
    }
    assert!(closed, "expected the service to close the connection");

    server.abort();
}

#[tokio::test]
async fn two_clients_get_independent_sessions() {
    let (addr, server) = start_service().await;

    let mut first = connect(addr).await;
    let mut second = connect(addr).await;

    let spec_first = open_session(&mut first).await;
    let spec_second = open_session(&mut second).await;
    assert_eq!(spec_first, spec_second);

    // Each session executes independently.
    let invocation = evaluate("echo one", &spec_first.commands).unwrap();
    send_message(&mut first, Message::execute_command(&invocation).unwrap()).await;
    let invocation = evaluate("echo two", &spec_second.commands).unwrap();
    send_message(&mut second, Message::execute_command(&invocation).unwrap()).await;

    assert_eq!(recv_message(&mut first).await.payload_utf8().unwrap(), "one");
    assert_eq!(
        recv_message(&mut second).await.payload_utf8().unwrap(),
        "two"
    );

    server.abort();
}
