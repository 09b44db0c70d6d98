use super::*;

#[test]
fn generated_ids_round_trip_through_display() {
    let id = TaskId::generate();
    let rendered = id.to_string();
    assert_eq!(rendered.len(), 8);
    assert_eq!(TaskId::parse(&rendered), Some(id));
}

#[test]
fn successive_ids_are_distinct() {
    let a = TaskId::generate();
    let b = TaskId::generate();
    assert_ne!(a, b);
}

#[test]
fn parse_rejects_non_hex() {
    assert_eq!(TaskId::parse("not-hex!"), None);
}
