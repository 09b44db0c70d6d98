use super::*;
use crate::env::Paths;
use ltoarc_adapters::Library;
use ltoarc_core::{Clock, FixedClock};
use ltoarc_engine::TaskContext;
use ltoarc_storage::{Catalog, WorkQueue};
use std::time::SystemTime;
use tempfile::tempdir;
use tokio::io::AsyncWriteExt;

#[test]
fn splits_on_nul_and_drops_empty_segments() {
    let buf = b"prepare\0/data/photos\0family photos\0";
    assert_eq!(
        split_argv(buf),
        vec!["prepare".to_string(), "/data/photos".to_string(), "family photos".to_string()]
    );
}

#[test]
fn an_empty_request_splits_to_no_arguments() {
    assert!(split_argv(b"").is_empty());
}

fn state_with(dir: &std::path::Path) -> Arc<DaemonState> {
    let clock: Arc<dyn Clock> = Arc::new(FixedClock(SystemTime::UNIX_EPOCH));
    let catalog = Arc::new(Catalog::load(&dir.join("database.json"), clock.clone()).unwrap());
    let queue = Arc::new(WorkQueue::load(&dir.join("queue.json")).unwrap());
    let library = Arc::new(Library::new("/dev/sch0", "/dev/nst0"));
    let context = Arc::new(TaskContext {
        catalog: catalog.clone(),
        library: library.clone(),
        clock,
        exclude_folders: Vec::new(),
        tape_max_size_kb: 17_000_000,
        nfs_export_options: "ro".to_string(),
        nfs_export_target: "*".to_string(),
        smtp: None,
    });
    let paths = Paths {
        socket_path: dir.join("ltoarc_service.sock"),
        pid_path: dir.join("ltoarc_service.pid"),
        catalog_path: dir.join("database.json"),
        queue_path: dir.join("queue.json"),
        log_path: dir.join("ltoarc.log"),
    };
    Arc::new(DaemonState::for_tests(paths, catalog, queue, library, context, Vec::new()))
}

#[tokio::test]
async fn a_round_trip_request_gets_a_response_and_the_connection_closes() {
    let dir = tempdir().unwrap();
    let state = state_with(dir.path());
    let unix_listener = tokio::net::UnixListener::bind(&state.paths.socket_path).unwrap();

    let server_state = state.clone();
    tokio::spawn(async move { run(unix_listener, server_state).await });

    let mut client = UnixStream::connect(&state.paths.socket_path).await.unwrap();
    client.write_all(b"queue").await.unwrap();
    client.shutdown().await.unwrap();

    let mut response = Vec::new();
    tokio::io::AsyncReadExt::read_to_end(&mut client, &mut response).await.unwrap();
    assert_eq!(String::from_utf8(response).unwrap(), "queue is empty");

    state.shutdown.notify_waiters();
}
