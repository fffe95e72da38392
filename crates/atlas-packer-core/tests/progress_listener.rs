use atlas_packer_core::progress::{CancelHandle, ProgressListener, ProgressSink};
use std::cell::RefCell;
use std::rc::Rc;

fn recording() -> (ProgressListener<'static>, Rc<RefCell<Vec<f32>>>) {
    let values = Rc::new(RefCell::new(Vec::new()));
    let sink = values.clone();
    let listener = ProgressListener::with_sink(move |v: f32| sink.borrow_mut().push(v));
    (listener, values)
}

#[test]
fn root_scope_reports_percent_directly() {
    let (mut p, values) = recording();
    p.update(0.25);
    p.update(1.0);
    assert_eq!(*values.borrow(), vec![0.25, 1.0]);
    assert_eq!(p.value(), 1.0);
}

#[test]
fn nested_scopes_scale_into_parent_range() {
    let (mut p, values) = recording();
    p.start(0.5);
    p.update(1.0);
    p.end();
    p.start(0.5);
    p.update(0.5);
    p.start(0.5);
    assert_eq!(p.depth(), 2);
    p.update(1.0);
    p.end();
    p.end();
    assert_eq!(p.depth(), 0);
    assert_eq!(*values.borrow(), vec![0.5, 0.5, 0.75, 1.0, 1.0, 1.0]);
}

#[test]
fn end_reports_scope_end_point() {
    let (mut p, values) = recording();
    p.start(0.25);
    p.update(0.1);
    p.end();
    // The next scope starts from the reported end point.
    p.start(0.5);
    p.update(0.5);
    p.end();
    let v = values.borrow();
    assert!((v[1] - 0.25).abs() < 1e-6);
    assert!((v[2] - 0.5).abs() < 1e-6);
    assert!((v[3] - 0.75).abs() < 1e-6);
}

#[test]
fn scoped_closes_its_scope() {
    let (mut p, values) = recording();
    let out = p.scoped(0.5, |p| {
        p.update(0.5);
        p.depth()
    });
    assert_eq!(out, 1);
    assert_eq!(p.depth(), 0);
    assert_eq!(*values.borrow(), vec![0.25, 0.5]);
}

#[test]
fn update_count_computes_ratio() {
    let (mut p, values) = recording();
    assert!(!p.update_count(3, 4));
    assert!(!p.update_count(3, 0));
    assert_eq!((p.count(), p.total()), (3, 0));
    assert_eq!(*values.borrow(), vec![0.75, 0.0]);
}

#[test]
#[should_panic(expected = "portion cannot be 0")]
fn zero_portion_is_rejected() {
    let mut p = ProgressListener::new();
    p.start(0.0);
}

#[test]
#[should_panic(expected = "without a matching start")]
fn unmatched_end_panics() {
    let mut p = ProgressListener::new();
    p.end();
}

#[test]
fn reset_clears_scopes_and_reports_zero() {
    let (mut p, values) = recording();
    p.set_message("packing");
    p.start(0.5);
    p.update_count(1, 2);
    p.reset();
    assert_eq!(p.depth(), 0);
    assert_eq!(p.message(), "");
    assert_eq!((p.count(), p.total()), (0, 0));
    assert_eq!(values.borrow().last().copied(), Some(0.0));
    // Back to identity scale.
    p.update(0.5);
    assert_eq!(p.value(), 0.5);
}

#[test]
fn cancellation_is_sticky_until_cleared() {
    let mut p = ProgressListener::new();
    assert!(!p.update_count(1, 10));
    p.cancel();
    assert!(p.is_canceled());
    assert!(p.update_count(2, 10));
    p.reset();
    assert!(p.is_canceled());
    p.clear_canceled();
    assert!(!p.update_count(3, 10));
}

#[test]
fn cancel_handle_works_across_threads() {
    let handle = CancelHandle::default();
    let mut p = ProgressListener::new().with_cancel_handle(handle.clone());
    let remote = p.cancel_handle();
    std::thread::spawn(move || remote.cancel())
        .join()
        .expect("cancel thread");
    assert!(handle.is_canceled());
    assert!(p.update_count(1, 1));
}

struct Recorder {
    messages: Rc<RefCell<Vec<String>>>,
}

impl ProgressSink for Recorder {
    fn progress(&mut self, _value: f32) {}

    fn message(&mut self, message: &str) {
        self.messages.borrow_mut().push(message.to_string());
    }
}

#[test]
fn messages_reach_the_sink() {
    let messages = Rc::new(RefCell::new(Vec::new()));
    let mut p = ProgressListener::with_sink(Recorder {
        messages: messages.clone(),
    });
    p.set_message("searching page width");
    p.set_message("packing");
    assert_eq!(p.message(), "packing");
    assert_eq!(*messages.borrow(), vec!["searching page width", "packing"]);
}

#[test]
fn size_search_announces_each_dimension() {
    use atlas_packer_core::PackerConfig;
    use atlas_packer_core::search::smallest_page_size;

    let messages = Rc::new(RefCell::new(Vec::new()));
    let mut p = ProgressListener::with_sink(Recorder {
        messages: messages.clone(),
    });
    let cfg = PackerConfig::builder()
        .with_max_dimensions(64, 64)
        .with_min_dimensions(1, 1)
        .build();
    smallest_page_size(&cfg, |w, h| w >= 20 && h >= 20, Some(&mut p));
    assert_eq!(
        *messages.borrow(),
        vec!["searching page width", "searching page height"]
    );
}
