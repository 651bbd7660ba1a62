use listener::error::ErrorKind;
use listener::listener::{Listener, ListenerState};
use listener::publisher::memory::MemoryPublisher;
use listener::test_utils::source::{ScriptedSource, data, heartbeat};
use listener::test_utils::test_listener_config;
use listener_telemetry::init_test_tracing;
use tokio_postgres::types::PgLsn;

const INSERTS: &str = r#"{"change":[
    {"kind":"insert","schema":"public","table":"outbox","columnnames":["id","topic","payload"],"columnvalues":[1,"orders","{\"id\":1}"]},
    {"kind":"delete","schema":"public","table":"outbox","oldkeys":{"keynames":["id"],"keyvalues":[1]}},
    {"kind":"insert","schema":"public","table":"outbox","columnnames":["id","topic","payload"],"columnvalues":[2,"orders","{\"id\":2}"]}
]}"#;

#[tokio::test]
async fn listener_stops_gracefully_on_shutdown() {
    init_test_tracing();

    let publisher = MemoryPublisher::new();
    let mut listener = Listener::new(test_listener_config(10), publisher.clone());
    let source = ScriptedSource::new()
        .event(heartbeat(100))
        .event(data(INSERTS, 150, 200))
        .shutdown_when_exhausted(listener.shutdown_tx());
    let acks = source.ack_recorder();

    listener.replicate(source, PgLsn::from(0)).await.unwrap();

    assert_eq!(listener.state(), ListenerState::Stopped);
    assert_eq!(
        acks.acknowledged(),
        vec![PgLsn::from(100), PgLsn::from(150)]
    );

    let values: Vec<_> = publisher
        .events()
        .await
        .into_iter()
        .map(|event| event.value)
        .collect();
    assert_eq!(values, vec!["{\"id\":1}", "{\"id\":2}"]);

    let snapshot = listener.metrics().snapshot();
    assert_eq!(snapshot.messages_total, 2);
    assert_eq!(snapshot.heartbeats_total, 1);
    assert_eq!(snapshot.last_acked_position, 150);
}

#[tokio::test]
async fn shutdown_requested_before_replication_is_not_lost() {
    init_test_tracing();

    let publisher = MemoryPublisher::new();
    let mut listener = Listener::new(test_listener_config(10), publisher.clone());
    listener.shutdown_tx().shutdown().unwrap();

    let source = ScriptedSource::new().event(data(INSERTS, 150, 200));
    let acks = source.ack_recorder();

    listener.replicate(source, PgLsn::from(0)).await.unwrap();

    assert_eq!(listener.state(), ListenerState::Stopped);
    assert!(acks.acknowledged().is_empty());
    assert!(publisher.events().await.is_empty());
}

#[tokio::test]
async fn shutdown_requested_while_connecting_stops_the_listener() {
    init_test_tracing();

    let mut config = test_listener_config(10);
    config.pg_connection.port = 1;
    let mut listener = Listener::new(config, MemoryPublisher::new());
    listener.shutdown_tx().shutdown().unwrap();

    listener.run().await.unwrap();

    assert_eq!(listener.state(), ListenerState::Stopped);
}

#[tokio::test]
async fn listener_fails_on_session_error() {
    init_test_tracing();

    let mut listener = Listener::new(test_listener_config(10), MemoryPublisher::new());
    let source = ScriptedSource::new().event(heartbeat(100));

    let err = listener.replicate(source, PgLsn::from(0)).await.unwrap_err();

    assert_eq!(err.kind(), ErrorKind::ReplicationStreamEnded);
    assert_eq!(listener.state(), ListenerState::Failed);
}

#[tokio::test]
async fn invalid_start_position_fails_before_connecting() {
    init_test_tracing();

    let mut config = test_listener_config(10);
    config.replication.start_lsn = Some("not-an-lsn".to_owned());
    // Nothing listens on this port, reaching the connection step would fail differently.
    config.pg_connection.port = 1;
    let mut listener = Listener::new(config, MemoryPublisher::new());

    let err = listener.run().await.unwrap_err();

    assert_eq!(err.kind(), ErrorKind::ConfigError);
    assert_eq!(listener.state(), ListenerState::Failed);
}

#[tokio::test]
async fn missing_slot_name_fails_before_connecting() {
    init_test_tracing();

    let mut config = test_listener_config(10);
    config.replication.slot_name = "  ".to_owned();
    config.pg_connection.port = 1;
    let mut listener = Listener::new(config, MemoryPublisher::new());

    let err = listener.run().await.unwrap_err();

    assert_eq!(err.kind(), ErrorKind::ConfigError);
    assert_eq!(listener.state(), ListenerState::Failed);
}

#[tokio::test]
async fn unreachable_database_is_a_connection_failure() {
    init_test_tracing();

    let mut config = test_listener_config(10);
    config.pg_connection.port = 1;
    let mut listener = Listener::new(config, MemoryPublisher::new());

    let err = listener.run().await.unwrap_err();

    assert_eq!(err.kind(), ErrorKind::SourceConnectionFailed);
    assert_eq!(listener.state(), ListenerState::Failed);
}
