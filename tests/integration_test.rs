use loan_desk::data::{RestBackend, ScreenOps};
use loan_desk::{
    AppConfig, AppState, StatusCode, StatusKind, StatusNotifier, StatusStore, Tab, Visibility,
};
use std::sync::Arc;
use std::time::Duration;

async fn settle() {
    for _ in 0..5 {
        tokio::task::yield_now().await;
    }
}

#[test]
fn test_app_state_creation() {
    let state = AppState::new(AppConfig::default());

    assert_eq!(state.active_tab(), Tab::Dashboard);
    assert!(state.dashboard().is_none());
    assert!(state.filter().is_none());
    assert!(!state.is_loading());
}

#[test]
fn test_config_defaults() {
    let config = AppConfig::default();
    assert_eq!(config.api_base_url, "http://localhost:8080/api");
    assert_eq!(config.request_timeout, Duration::from_secs(10));
    assert_eq!(config.status_display, Duration::from_secs(5));
    assert_eq!(config.page_size, 10);
    assert!(config.confirm_deletes);
    assert!(config.validate().is_ok());
}

#[test]
fn test_latest_status_wins() {
    let store = StatusStore::new();
    store.report_info("Found 2 loans with status: PENDING", None);
    let latest = store.report_error("Customer not found with this email", Some(404.into()));

    let current = store.current().unwrap();
    assert_eq!(current, latest);
    assert_eq!(current.kind, StatusKind::Error);
    assert_eq!(current.code_label().as_deref(), Some("HTTP 404"));
}

#[tokio::test(start_paused = true)]
async fn test_status_lifecycle() {
    let store = StatusStore::new();
    let notifier = StatusNotifier::spawn(store.clone(), Duration::from_secs(5));
    settle().await;
    assert_eq!(notifier.visibility(), Visibility::Hidden);

    store.report_success("Loan created successfully", Some(201.into()));
    settle().await;
    assert_eq!(notifier.visibility(), Visibility::Visible);

    // A newer status restarts the display period
    tokio::time::sleep(Duration::from_secs(3)).await;
    store.report_error("Failed to delete loan", Some(500.into()));
    settle().await;
    tokio::time::sleep(Duration::from_secs(3)).await;
    settle().await;
    assert_eq!(
        notifier.visible().map(|s| s.message),
        Some("Failed to delete loan".to_string())
    );

    tokio::time::sleep(Duration::from_millis(2_100)).await;
    settle().await;
    assert_eq!(notifier.visibility(), Visibility::Hidden);
    assert!(store.current().is_none());
}

#[tokio::test]
async fn test_unreachable_backend_reports_network_error() {
    // Grab a free port, then close it so connections are refused
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);

    let base = format!("http://127.0.0.1:{}/api", port);
    let backend = RestBackend::new(&base, Duration::from_secs(2)).unwrap();
    let store = StatusStore::new();
    let ops = ScreenOps::new(Arc::new(backend), store.clone());

    assert!(ops.dashboard().await.is_none());

    let status = store.current().unwrap();
    assert_eq!(status.kind, StatusKind::Error);
    assert_eq!(status.code, Some(StatusCode::NetworkError));
    assert_eq!(status.code_label().as_deref(), Some("NETWORK_ERROR"));
    assert!(status.message.contains(&base));
}
