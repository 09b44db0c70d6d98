use super::*;

#[test]
fn new_record_starts_in_preparing_with_no_derived_fields() {
    let rec = ArchiveRecord::new("/data/foo", "foo project");
    assert_eq!(rec.state, ArchiveState::Preparing);
    assert!(rec.size.is_none());
    assert!(rec.tape.is_none());
    assert!(rec.path_on_tape.is_none());
    assert!(rec.archived.is_none());
}

#[test]
fn state_chain_advances_without_skipping() {
    let mut s = ArchiveState::Preparing;
    let mut seen = vec![s];
    while let Some(next) = s.next() {
        s = next;
        seen.push(s);
    }
    assert_eq!(
        seen,
        vec![
            ArchiveState::Preparing,
            ArchiveState::Prepared,
            ArchiveState::ArchivingQueued,
            ArchiveState::Archiving,
            ArchiveState::Archived,
        ]
    );
}

#[test]
fn archived_is_terminal() {
    assert_eq!(ArchiveState::Archived.next(), None);
}

#[test]
fn display_matches_serde_rename() {
    assert_eq!(ArchiveState::ArchivingQueued.to_string(), "archiving_queued");
    let json = serde_json::to_string(&ArchiveState::ArchivingQueued).unwrap();
    assert_eq!(json, "\"archiving_queued\"");
}
