use super::*;

const SAMPLE_STATUS: &str = "  Storage Changer /dev/sg3:1 Drives, 16 Slots ( 1 Import/Export )
Data Transfer Element 0:Empty
Storage Element 1:Full :VolumeTag=AAK123L9
Storage Element 2:Full :VolumeTag=AAK124L9
Storage Element 3:Empty
";

#[test]
fn parses_storage_elements_and_empty_drive() {
    let slots = parse_status(SAMPLE_STATUS).unwrap();
    assert_eq!(slots.len(), 4);
    assert_eq!(slots[&0].status, "Empty");
    assert_eq!(slots[&0].kind, ElementKind::DataTransferElement);
    assert_eq!(slots[&1].volume_tag.as_deref(), Some("AAK123L9"));
    assert_eq!(slots[&3].status, "Empty");
}

#[test]
fn parses_a_loaded_drive() {
    let status = "Data Transfer Element 0:Full (Storage Element 1 Loaded):VolumeTag = AAK123L9\nStorage Element 1:Empty\n";
    let slots = parse_status(status).unwrap();
    assert_eq!(slots[&0].status, "Full");
    assert_eq!(slots[&0].volume_tag.as_deref(), Some("AAK123L9"));
}

#[test]
fn unparseable_data_transfer_line_is_an_error() {
    let status = "Data Transfer Element garbage\n";
    assert!(matches!(
        parse_status(status),
        Err(LibraryError::UnparseableStatus(_))
    ));
}

#[test]
fn get_available_tapes_only_returns_full_storage_slots_with_a_tag() {
    let slots = parse_status(SAMPLE_STATUS).unwrap();
    let available: Vec<_> = slots
        .into_iter()
        .filter_map(|(slot, info)| {
            if info.is_full() {
                info.volume_tag.map(|t| (slot, t))
            } else {
                None
            }
        })
        .collect();
    assert_eq!(available.len(), 2);
    assert!(available.contains(&(1, "AAK123L9".to_string())));
}

#[test]
fn find_tape_locates_the_matching_slot() {
    let slots = parse_status(SAMPLE_STATUS).unwrap();
    let found = slots
        .iter()
        .find(|(_, info)| info.volume_tag.as_deref() == Some("AAK124L9"))
        .map(|(slot, _)| *slot);
    assert_eq!(found, Some(2));
}

#[test]
fn drive_empty_reports_true_when_slot_zero_is_empty() {
    let slots = parse_status(SAMPLE_STATUS).unwrap();
    assert!(slots.get(&0).map(SlotStatus::is_empty).unwrap_or(true));
}

#[test]
fn check_tape_consistency_matches_catalog_against_mount_point() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::create_dir(dir.path().join("project-a")).unwrap();
    let library = Library::new("/dev/sg3", "mock-device");
    let on_tape = vec![TapeContent {
        path_on_tape: "project-a".to_string(),
        archived: true,
    }];
    library
        .check_tape_consistency("AAK123L9", &on_tape, dir.path().to_str().unwrap())
        .unwrap();
}

#[test]
fn check_tape_consistency_rejects_a_path_on_tape_containing_a_subpath() {
    let dir = tempfile::tempdir().unwrap();
    let library = Library::new("/dev/sg3", "mock-device");
    let on_tape = vec![TapeContent {
        path_on_tape: "project-a/nested".to_string(),
        archived: true,
    }];
    let err = library
        .check_tape_consistency("AAK123L9", &on_tape, dir.path().to_str().unwrap())
        .unwrap_err();
    assert!(matches!(err, LibraryError::SubpathNotSupported(ref p) if p == "project-a/nested"));
}
