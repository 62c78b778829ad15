//! Binary wiring against a backend that is not running.

use shaperoute::{build_runtime, Config};
use shaperoute_ui::orchestrator::SHAPES_FAILED_NOTICE;
use shaperoute_ui::Message;
use tokio::net::TcpListener;

#[tokio::test]
async fn test_unreachable_backend_leaves_session_usable() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let dir = tempfile::tempdir().unwrap();
    let mut config = Config::default();
    config.api.base_url = format!("http://{}/", addr);
    config.download.use_dialog = false;
    config.download.directory = dir.path().to_path_buf();

    let mut runtime = build_runtime(&config).unwrap();
    runtime.dispatch(Message::Started);
    runtime.settle().await;

    let state = runtime.orchestrator().state();
    assert!(state.shapes_loaded);
    assert!(state.shapes.is_empty());
    assert_eq!(state.notice.as_ref().unwrap().message, SHAPES_FAILED_NOTICE);
    assert!(!state.can_generate());
}

#[test]
fn test_version_is_set() {
    assert!(!shaperoute::VERSION.is_empty());
    assert!(!shaperoute::BUILD_DATE.is_empty());
}
