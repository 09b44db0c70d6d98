// `archive` and `explore` validations that check tape existence call into
// `Library::find_tape`, which shells out to `mtx` — unavailable in the test
// environment. Those paths are exercised only up to the point where they'd
// invoke `mtx`; full coverage is left to deployment-environment integration
// tests. `prepare`, `restore`, `requeue`, `abort`, and `deleteable` need
// only `du`/`find`/`timeout`/`test`, all present here, so those are tested
// end to end.

use super::*;
use crate::env::Paths;
use ltoarc_adapters::Library;
use ltoarc_core::{Clock, FixedClock, TaskKind};
use ltoarc_engine::TaskContext;
use ltoarc_storage::Catalog;
use std::sync::Arc;
use std::time::SystemTime;
use tempfile::tempdir;

fn state_with(dir: &std::path::Path) -> DaemonState {
    let clock: Arc<dyn Clock> = Arc::new(FixedClock(SystemTime::UNIX_EPOCH));
    let catalog = Arc::new(Catalog::load(&dir.join("database.json"), clock.clone()).unwrap());
    let queue = Arc::new(ltoarc_storage::WorkQueue::load(&dir.join("queue.json")).unwrap());
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
    DaemonState::for_tests(paths, catalog, queue, library, context, vec!["/default/src".to_string()])
}

#[tokio::test]
async fn prepare_registers_the_folder_and_queues_a_task() {
    let dir = tempdir().unwrap();
    let target = dir.path().join("photos");
    std::fs::create_dir(&target).unwrap();
    let state = state_with(dir.path());

    let reply = handle(&state, Command::Prepare {
        folder: target.to_string_lossy().into_owned(),
        description: "family photos".to_string(),
        compress: false,
        priority: 0,
    })
    .await;

    assert!(reply.contains("queued prepare"), "{reply}");
    assert_eq!(state.queue.len(), 1);
    assert!(state.catalog.get(&target.to_string_lossy()).is_ok());
}

#[tokio::test]
async fn prepare_rejects_a_folder_already_in_the_catalog() {
    let dir = tempdir().unwrap();
    let target = dir.path().join("photos");
    std::fs::create_dir(&target).unwrap();
    let state = state_with(dir.path());
    state.catalog.create_entry(&target.to_string_lossy(), "desc").unwrap();

    let reply = handle(&state, Command::Prepare {
        folder: target.to_string_lossy().into_owned(),
        description: "desc".to_string(),
        compress: false,
        priority: 0,
    })
    .await;

    assert!(reply.contains("already in the catalog"), "{reply}");
    assert_eq!(state.queue.len(), 0);
}

#[tokio::test]
async fn prepare_rejects_a_nonexistent_directory() {
    let dir = tempdir().unwrap();
    let state = state_with(dir.path());

    let reply = handle(&state, Command::Prepare {
        folder: "/no/such/directory".to_string(),
        description: "desc".to_string(),
        compress: false,
        priority: 0,
    })
    .await;

    assert!(reply.contains("not a readable directory"), "{reply}");
}

#[tokio::test]
async fn archive_rejects_a_folder_that_is_not_prepared() {
    let dir = tempdir().unwrap();
    let target = dir.path().join("photos");
    std::fs::create_dir(&target).unwrap();
    let state = state_with(dir.path());
    state.catalog.create_entry(&target.to_string_lossy(), "desc").unwrap();

    let reply = handle(&state, Command::Archive {
        folder: target.to_string_lossy().into_owned(),
        tapelabel: "AAK123".to_string(),
        targetname: None,
        priority: 100,
    })
    .await;

    assert!(reply.contains("not prepared"), "{reply}");
    assert_eq!(state.queue.len(), 0);
}

#[tokio::test]
async fn archive_refuses_a_duplicate_enqueue_for_a_folder_already_pending() {
    let dir = tempdir().unwrap();
    let target = dir.path().join("photos");
    std::fs::create_dir(&target).unwrap();
    let folder = target.to_string_lossy().into_owned();
    let state = state_with(dir.path());
    state.catalog.create_entry(&folder, "desc").unwrap();
    state.catalog.set_prepared(&folder, 10, false).unwrap();
    state
        .queue
        .append(ltoarc_core::WorkItem::new(
            100,
            TaskKind::Archive { folder: folder.clone(), tape: "AAK123".to_string(), target_filename: "photos".to_string() },
            SystemTime::UNIX_EPOCH,
        ))
        .unwrap();

    let reply = handle(&state, Command::Archive {
        folder: folder.clone(),
        tapelabel: "AAK123".to_string(),
        targetname: None,
        priority: 100,
    })
    .await;

    assert!(reply.contains("already has a pending archive task"), "{reply}");
    assert_eq!(state.queue.len(), 1);
}

#[tokio::test]
async fn restore_rejects_a_folder_that_is_not_archived() {
    let dir = tempdir().unwrap();
    let target = dir.path().join("photos");
    std::fs::create_dir(&target).unwrap();
    let state = state_with(dir.path());
    state.catalog.create_entry(&target.to_string_lossy(), "desc").unwrap();

    let reply = handle(&state, Command::Restore {
        folder: target.to_string_lossy().into_owned(),
        restore_path: dir.path().join("out").to_string_lossy().into_owned(),
        subfolder: None,
        priority: 100,
    })
    .await;

    assert!(reply.contains("not archived"), "{reply}");
}

#[tokio::test]
async fn restore_rejects_a_nonempty_destination() {
    let dir = tempdir().unwrap();
    let state = state_with(dir.path());
    state.catalog.create_entry("/orig/photos", "desc").unwrap();
    state.catalog.set_prepared("/orig/photos", 10, false).unwrap();
    state.catalog.set_archiving_queued("/orig/photos", "AAK123").unwrap();
    state.catalog.set_archiving("/orig/photos", "photos").unwrap();
    state.catalog.set_archived("/orig/photos", Some(10)).unwrap();

    let dest = dir.path().join("out");
    std::fs::create_dir(&dest).unwrap();
    std::fs::write(dest.join("stray.txt"), b"oops").unwrap();

    let reply = handle(&state, Command::Restore {
        folder: "/orig/photos".to_string(),
        restore_path: dest.to_string_lossy().into_owned(),
        subfolder: None,
        priority: 100,
    })
    .await;

    assert!(reply.contains("already exists and is not empty"), "{reply}");
}

#[tokio::test]
async fn restore_removes_an_empty_destination_and_queues_the_task() {
    let dir = tempdir().unwrap();
    let state = state_with(dir.path());
    state.catalog.create_entry("/orig/photos", "desc").unwrap();
    state.catalog.set_prepared("/orig/photos", 10, false).unwrap();
    state.catalog.set_archiving_queued("/orig/photos", "AAK123").unwrap();
    state.catalog.set_archiving("/orig/photos", "photos").unwrap();
    state.catalog.set_archived("/orig/photos", Some(10)).unwrap();

    let dest = dir.path().join("out");
    std::fs::create_dir(&dest).unwrap();

    let reply = handle(&state, Command::Restore {
        folder: "/orig/photos".to_string(),
        restore_path: dest.to_string_lossy().into_owned(),
        subfolder: None,
        priority: 100,
    })
    .await;

    assert!(reply.contains("queued restore"), "{reply}");
    assert!(!dest.exists());
    assert_eq!(state.queue.len(), 1);
}

#[tokio::test]
async fn abort_removes_a_queued_task_and_leaves_a_running_one_flagged() {
    let dir = tempdir().unwrap();
    let state = state_with(dir.path());
    let id = state
        .queue
        .append(ltoarc_core::WorkItem::new(
            0,
            TaskKind::Inventory { folder: "/data".to_string() },
            SystemTime::UNIX_EPOCH,
        ))
        .unwrap();

    let reply = handle(&state, Command::Abort { task_ids: vec![id.to_string()] }).await;
    assert!(reply.contains("removed from the queue"), "{reply}");
    assert_eq!(state.queue.len(), 0);

    let id2 = state
        .queue
        .append(ltoarc_core::WorkItem::new(
            0,
            TaskKind::Inventory { folder: "/data".to_string() },
            SystemTime::UNIX_EPOCH,
        ))
        .unwrap();
    state.queue.set_running(id2, true).unwrap();
    let reply = handle(&state, Command::Abort { task_ids: vec![id2.to_string()] }).await;
    assert!(reply.contains("abort requested"), "{reply}");
    assert_eq!(state.queue.len(), 1);
    assert!(state.queue.abort_handle(id2).unwrap().is_set());
}

#[tokio::test]
async fn abort_accepts_multiple_task_ids_and_reports_one_line_each() {
    let dir = tempdir().unwrap();
    let state = state_with(dir.path());
    let id1 = state
        .queue
        .append(ltoarc_core::WorkItem::new(
            0,
            TaskKind::Inventory { folder: "/data/a".to_string() },
            SystemTime::UNIX_EPOCH,
        ))
        .unwrap();
    let id2 = state
        .queue
        .append(ltoarc_core::WorkItem::new(
            0,
            TaskKind::Inventory { folder: "/data/b".to_string() },
            SystemTime::UNIX_EPOCH,
        ))
        .unwrap();

    let reply = handle(
        &state,
        Command::Abort { task_ids: vec![id1.to_string(), id2.to_string()] },
    )
    .await;
    assert_eq!(reply.lines().count(), 2, "{reply}");
    assert!(reply.contains(&format!("task {id1} removed from the queue")), "{reply}");
    assert!(reply.contains(&format!("task {id2} removed from the queue")), "{reply}");
    assert_eq!(state.queue.len(), 0);
}

#[tokio::test]
async fn requeue_refuses_a_healthy_task_and_clears_a_failed_one() {
    let dir = tempdir().unwrap();
    let state = state_with(dir.path());
    let id = state
        .queue
        .append(ltoarc_core::WorkItem::new(
            0,
            TaskKind::Inventory { folder: "/data".to_string() },
            SystemTime::UNIX_EPOCH,
        ))
        .unwrap();

    let reply = handle(&state, Command::Requeue { task_ids: vec![id.to_string()] }).await;
    assert!(reply.contains("has not failed"), "{reply}");

    state.queue.set_error(id, "boom".to_string()).unwrap();
    let reply = handle(&state, Command::Requeue { task_ids: vec![id.to_string()] }).await;
    assert!(reply.contains("requeued"), "{reply}");
    let item = state.queue.snapshot().into_iter().find(|i| i.id == id).unwrap();
    assert!(item.is_healthy());
}

#[tokio::test]
async fn deleteable_reports_archived_records_whose_source_still_exists() {
    let dir = tempdir().unwrap();
    let source = dir.path().join("orig");
    std::fs::create_dir(&source).unwrap();
    let state = state_with(dir.path());
    let source_str = source.to_string_lossy().into_owned();
    state.catalog.create_entry(&source_str, "desc").unwrap();
    state.catalog.set_prepared(&source_str, 10, false).unwrap();
    state.catalog.set_archiving_queued(&source_str, "AAK123").unwrap();
    state.catalog.set_archiving(&source_str, "orig").unwrap();
    state.catalog.set_archived(&source_str, Some(10)).unwrap();

    let reply = handle(&state, Command::Deleteable { ignore: vec![] }).await;
    assert!(reply.contains(&source_str), "{reply}");
    assert!(reply.contains("deletable"), "{reply}");
}

#[tokio::test]
async fn deleteable_skips_ignored_prefixes() {
    let dir = tempdir().unwrap();
    let source = dir.path().join("scratch/orig");
    std::fs::create_dir_all(&source).unwrap();
    let state = state_with(dir.path());
    let source_str = source.to_string_lossy().into_owned();
    state.catalog.create_entry(&source_str, "desc").unwrap();
    state.catalog.set_prepared(&source_str, 10, false).unwrap();
    state.catalog.set_archiving_queued(&source_str, "AAK123").unwrap();
    state.catalog.set_archiving(&source_str, "orig").unwrap();
    state.catalog.set_archived(&source_str, Some(10)).unwrap();

    let ignore_prefix = dir.path().join("scratch").to_string_lossy().into_owned();
    let reply = handle(&state, Command::Deleteable { ignore: vec![ignore_prefix] }).await;
    assert_eq!(reply, "nothing deletable");
}

#[tokio::test]
async fn queue_lists_failed_tasks_before_healthy_ones() {
    let dir = tempdir().unwrap();
    let state = state_with(dir.path());
    let healthy = state
        .queue
        .append(ltoarc_core::WorkItem::new(
            5,
            TaskKind::Inventory { folder: "/a".to_string() },
            SystemTime::UNIX_EPOCH,
        ))
        .unwrap();
    let failed = state
        .queue
        .append(ltoarc_core::WorkItem::new(
            1,
            TaskKind::Inventory { folder: "/b".to_string() },
            SystemTime::UNIX_EPOCH,
        ))
        .unwrap();
    state.queue.set_error(failed, "boom".to_string()).unwrap();

    let reply = handle(&state, Command::Queue).await;
    let failed_pos = reply.find(&failed.to_string()).unwrap();
    let healthy_pos = reply.find(&healthy.to_string()).unwrap();
    assert!(failed_pos < healthy_pos, "{reply}");
}
