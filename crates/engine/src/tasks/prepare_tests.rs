use super::*;
use ltoarc_core::{ArchiveState, Clock, FixedClock, NullProgressSink};
use ltoarc_storage::Catalog;
use std::fs;
use std::sync::Arc;
use std::time::SystemTime;
use tempfile::tempdir;

fn fixed_clock() -> Arc<dyn Clock> {
    Arc::new(FixedClock(SystemTime::UNIX_EPOCH))
}

fn new_catalog() -> (tempfile::TempDir, Catalog) {
    let dir = tempdir().unwrap();
    let path = dir.path().join("catalog.json");
    let catalog = Catalog::load(&path, fixed_clock()).unwrap();
    (dir, catalog)
}

fn context_for(catalog: Catalog) -> TaskContext {
    TaskContext {
        catalog: Arc::new(catalog),
        library: Arc::new(ltoarc_adapters::Library::new("/dev/nst0", "/dev/sch0")),
        clock: fixed_clock(),
        exclude_folders: Vec::new(),
        tape_max_size_kb: 17_000_000,
        nfs_export_options: "rw,sync,no_subtree_check".to_string(),
        nfs_export_target: "*".to_string(),
        smtp: None,
    }
}

#[tokio::test]
async fn prepares_a_small_uncompressed_directory() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("a.txt"), b"hello world").unwrap();
    let folder = dir.path().to_str().unwrap().to_string();

    let (_catalog_dir, catalog) = new_catalog();
    catalog.create_entry(&folder, "a test folder").unwrap();
    let ctx = context_for(catalog);

    let abort = AbortSignal::new();
    let result = run(&ctx, &folder, false, &NullProgressSink, &abort)
        .await
        .unwrap();
    assert!(result.contains("Prepared"));

    let record = ctx.catalog.get(&folder).unwrap();
    assert_eq!(record.state, ArchiveState::Prepared);
    assert_eq!(record.compressed, Some(false));
    assert!(record.size.unwrap() > 0);
}

#[tokio::test]
async fn explicit_compress_flag_tars_the_directory() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("a.txt"), b"hello world").unwrap();
    let folder = dir.path().to_str().unwrap().to_string();

    let (_catalog_dir, catalog) = new_catalog();
    catalog.create_entry(&folder, "a test folder").unwrap();
    let ctx = context_for(catalog);

    let abort = AbortSignal::new();
    run(&ctx, &folder, true, &NullProgressSink, &abort)
        .await
        .unwrap();

    let record = ctx.catalog.get(&folder).unwrap();
    assert_eq!(record.compressed, Some(true));
    let archive_path = format!("{folder}.tar.gz");
    assert!(std::path::Path::new(&archive_path).exists());
    fs::remove_file(&archive_path).ok();
}

#[test]
fn parses_the_leading_size_field() {
    assert_eq!(parse_du_output("1234\t/some/folder\n").unwrap(), 1234);
}

#[test]
fn rejects_unparseable_output() {
    assert!(parse_du_output("").is_err());
}
