// Clipboard capture pipeline: classification rules and self-copy suppression.
mod common;

use std::sync::{Arc, Mutex};

use base64::Engine;
use base64::engine::general_purpose;

use clipdesk::clipboard::{
    ClipboardMonitor, ClipboardSink, ClipboardSnapshot, ClipboardSource, ClipboardWriter, ContentClassifier,
    ItemKind, SuppressionGate, path_to_file_uri,
};
use clipdesk::error::AppError;
use clipdesk::image_handler::ImageConfig;

use common::{Route, TestServer, png_bytes};

fn classifier() -> ContentClassifier {
    ContentClassifier::new(ImageConfig::default()).expect("classifier init failed")
}

fn text(value: &str) -> ClipboardSnapshot {
    ClipboardSnapshot::Text(value.to_string())
}

#[test]
fn valid_base64_image_becomes_image_item() {
    let encoded = general_purpose::STANDARD.encode(png_bytes(3, 2));
    let item = classifier()
        .classify(&text(&format!("data:image/png;base64,{}", encoded)))
        .expect("should classify");

    assert_eq!(item.kind(), &ItemKind::Image);
    let image = item.as_image().expect("image payload");
    assert_eq!((image.width, image.height), (3, 2));
}

#[test]
fn invalid_base64_payload_falls_back_to_text() {
    let raw = "data:image/png;base64,@@@not-base64@@@";
    let item = classifier().classify(&text(raw)).expect("should classify");

    assert_eq!(item.kind(), &ItemKind::Text);
    assert_eq!(item.as_text(), Some(raw));
}

#[test]
fn base64_of_non_image_bytes_falls_back_to_text() {
    let encoded = general_purpose::STANDARD.encode(b"just some plain words, not pixels");
    let raw = format!("data:image/png;base64,{}", encoded);
    let item = classifier().classify(&text(&raw)).expect("should classify");

    assert_eq!(item.as_text(), Some(raw.as_str()));
}

#[test]
fn file_uri_to_document_keeps_base_name_and_category() {
    let dir = tempfile::tempdir().expect("tempdir failed");
    let path = dir.path().join("quarterly report.pdf");
    std::fs::write(&path, b"%PDF-1.4").expect("write failed");

    let item = classifier()
        .classify(&text(&path_to_file_uri(&path)))
        .expect("should classify");

    assert_eq!(item.kind(), &ItemKind::File("application".to_string()));
    assert_eq!(item.display_name(), "quarterly report.pdf");
    assert_eq!(item.as_file(), Some(path.as_path()));
}

#[test]
fn file_uri_to_image_loads_pixels() {
    let dir = tempfile::tempdir().expect("tempdir failed");
    let path = dir.path().join("shot.png");
    std::fs::write(&path, png_bytes(5, 4)).expect("write failed");

    let item = classifier()
        .classify(&text(&path_to_file_uri(&path)))
        .expect("should classify");

    let image = item.as_image().expect("image payload");
    assert_eq!((image.width, image.height), (5, 4));
}

#[test]
fn file_uri_to_vector_image_is_kept_as_file() {
    let dir = tempfile::tempdir().expect("tempdir failed");
    let path = dir.path().join("diagram.svg");
    std::fs::write(&path, br#"<svg xmlns="http://www.w3.org/2000/svg" width="4" height="4"/>"#)
        .expect("write failed");

    let item = classifier()
        .classify(&text(&path_to_file_uri(&path)))
        .expect("svg should still produce an item");

    assert_eq!(item.kind(), &ItemKind::File("image".to_string()));
    assert_eq!(item.display_name(), "diagram.svg");
    assert_eq!(item.as_file(), Some(path.as_path()));
}

#[test]
fn file_uri_to_broken_image_produces_nothing() {
    let dir = tempfile::tempdir().expect("tempdir failed");
    let path = dir.path().join("broken.png");
    std::fs::write(&path, b"definitely not a png").expect("write failed");

    assert!(classifier().classify(&text(&path_to_file_uri(&path))).is_none());
}

#[test]
fn http_url_is_fetched_as_image() {
    let server = TestServer::start(vec![("/cat.png", Route::png(png_bytes(2, 2)))]);

    let item = classifier()
        .classify(&text(&server.url("/cat.png")))
        .expect("should classify");

    assert_eq!(item.kind(), &ItemKind::Image);
    assert_eq!(server.hits("/cat.png"), 1);
}

#[test]
fn failed_http_fetch_produces_nothing() {
    let server = TestServer::start(Vec::new());
    assert!(classifier().classify(&text(&server.url("/missing.png"))).is_none());
    assert_eq!(server.hits("/missing.png"), 1);
}

#[test]
fn raw_image_without_text_becomes_image_item() {
    let snapshot = ClipboardSnapshot::Image {
        width: 2,
        height: 2,
        rgba: vec![10; 16],
    };
    let item = classifier().classify(&snapshot).expect("should classify");
    assert_eq!(item.kind(), &ItemKind::Image);
}

/// In-memory clipboard usable as both read side and write side.
#[derive(Clone, Default)]
struct FakeClipboard {
    content: Arc<Mutex<Option<ClipboardSnapshot>>>,
}

impl FakeClipboard {
    fn external_copy(&self, value: &str) {
        *self.content.lock().expect("lock") = Some(text(value));
    }
}

impl ClipboardSource for FakeClipboard {
    fn read_snapshot(&mut self) -> Result<ClipboardSnapshot, AppError> {
        Ok(self.content.lock().expect("lock").clone().unwrap_or(ClipboardSnapshot::Empty))
    }
}

impl ClipboardSink for FakeClipboard {
    fn write_text(&mut self, value: &str) -> Result<(), AppError> {
        self.external_copy(value);
        Ok(())
    }

    fn write_image(&mut self, width: u32, height: u32, rgba: Vec<u8>) -> Result<(), AppError> {
        *self.content.lock().expect("lock") = Some(ClipboardSnapshot::Image { width, height, rgba });
        Ok(())
    }
}

#[test]
fn self_copy_is_suppressed_for_exactly_one_notification() {
    let gate = SuppressionGate::new();
    let monitor = ClipboardMonitor::new(Arc::clone(&gate), classifier());
    let mut clipboard = FakeClipboard::default();
    let mut writer = ClipboardWriter::new(Arc::clone(&gate), clipboard.clone());

    clipboard.external_copy("first external copy");
    let captured = monitor.on_change(&mut clipboard).expect("external copy captured");

    // app copies the item back: the resulting notification must not produce an item
    writer.copy_item(&captured).expect("copy back failed");
    assert!(monitor.on_change(&mut clipboard).is_none());

    clipboard.external_copy("second external copy");
    let next = monitor.on_change(&mut clipboard).expect("independent change captured");
    assert_eq!(next.as_text(), Some("second external copy"));
}
