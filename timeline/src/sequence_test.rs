use super::*;

#[test]
fn tickets_increase_per_class() {
    let seq = RequestSequencer::new();
    let a = seq.issue(RequestClass::Rows);
    let b = seq.issue(RequestClass::Rows);
    assert_eq!(a.seq, 1);
    assert_eq!(b.seq, 2);
    assert_eq!(seq.latest(RequestClass::Rows), 2);
}

#[test]
fn newer_ticket_supersedes_older() {
    let seq = RequestSequencer::new();
    let first = seq.issue(RequestClass::Rows);
    assert!(seq.is_current(first));

    let second = seq.issue(RequestClass::Rows);
    assert!(!seq.is_current(first));
    assert!(seq.is_current(second));
}

#[test]
fn classes_are_independent() {
    let seq = RequestSequencer::new();
    let rows = seq.issue(RequestClass::Rows);
    let tree = seq.issue(RequestClass::Tree);
    seq.issue(RequestClass::Styles);

    assert!(seq.is_current(rows));
    assert!(seq.is_current(tree));
    assert_eq!(seq.latest(RequestClass::Search), 0);
}
