use super::*;
use ltoarc_core::{Clock, FixedClock, NullProgressSink};
use ltoarc_storage::Catalog;
use std::sync::Arc;
use std::time::SystemTime;
use tempfile::tempdir;

fn context() -> TaskContext {
    let dir = tempdir().unwrap();
    let clock: Arc<dyn Clock> = Arc::new(FixedClock(SystemTime::UNIX_EPOCH));
    let catalog = Catalog::load(&dir.path().join("catalog.json"), clock.clone()).unwrap();
    TaskContext {
        catalog: Arc::new(catalog),
        library: Arc::new(ltoarc_adapters::Library::new("/dev/nst0", "/dev/sch0")),
        clock,
        exclude_folders: Vec::new(),
        tape_max_size_kb: 17_000_000,
        nfs_export_options: "rw,sync,no_subtree_check".to_string(),
        nfs_export_target: "*".to_string(),
        smtp: None,
    }
}

#[tokio::test]
async fn prepare_on_an_unknown_folder_surfaces_a_catalog_error() {
    let ctx = context();
    let abort = AbortSignal::new();
    let kind = TaskKind::Prepare {
        folder: "/no/such/folder".to_string(),
        compress: false,
    };
    let err = dispatch(&ctx, &kind, &NullProgressSink, &abort).await.unwrap_err();
    // `du` fails before the catalog is ever consulted, since `prepare` only
    // looks the record up implicitly through `set_prepared` at the end.
    assert!(matches!(err, TaskError::Subprocess(_)));
}

#[tokio::test]
async fn inventory_on_an_unknown_folder_is_an_io_error() {
    let ctx = context();
    let abort = AbortSignal::new();
    let kind = TaskKind::Inventory {
        folder: "/no/such/folder".to_string(),
    };
    let err = dispatch(&ctx, &kind, &NullProgressSink, &abort).await.unwrap_err();
    assert!(matches!(err, TaskError::Io(_)));
}
