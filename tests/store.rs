//! Scratch store tests.

use std::fs;

use image::{DynamicImage, RgbImage, RgbaImage};
use slidegen::{DOCUMENT_FILE_NAME, Frame, FrameFormat, ScratchStore};

fn frame(index: u64) -> Frame {
    let image = RgbImage::from_fn(40, 30, |x, y| image::Rgb([x as u8 * 6, y as u8 * 8, 90]));
    Frame::new(index, DynamicImage::ImageRgb8(image))
}

// ── Directory naming ───────────────────────────────────────────────

#[test]
fn first_run_uses_suffix_zero() {
    let base = tempfile::tempdir().expect("Failed to create temp dir");
    let store = ScratchStore::next_available(base.path(), "output");
    assert_eq!(store.directory(), base.path().join("output0"));
}

#[test]
fn existing_directories_are_skipped() {
    let base = tempfile::tempdir().expect("Failed to create temp dir");
    fs::create_dir(base.path().join("output0")).unwrap();
    fs::create_dir(base.path().join("output1")).unwrap();

    let store = ScratchStore::next_available(base.path(), "output");
    assert_eq!(store.directory(), base.path().join("output2"));
}

#[test]
fn gaps_are_reused() {
    let base = tempfile::tempdir().expect("Failed to create temp dir");
    fs::create_dir(base.path().join("output0")).unwrap();
    fs::create_dir(base.path().join("output2")).unwrap();

    let store = ScratchStore::next_available(base.path(), "output");
    assert_eq!(store.directory(), base.path().join("output1"));
}

#[test]
fn plain_files_also_occupy_a_name() {
    let base = tempfile::tempdir().expect("Failed to create temp dir");
    fs::write(base.path().join("deck0"), b"not a directory").unwrap();

    let store = ScratchStore::next_available(base.path(), "deck");
    assert_eq!(store.directory(), base.path().join("deck1"));
}

#[test]
fn document_lives_inside_the_store() {
    let store = ScratchStore::at("somewhere/output3");
    assert_eq!(
        store.document_path(),
        std::path::Path::new("somewhere/output3").join(DOCUMENT_FILE_NAME)
    );
}

// ── Persisting ─────────────────────────────────────────────────────

#[test]
fn directory_is_created_lazily() {
    let base = tempfile::tempdir().expect("Failed to create temp dir");
    let mut store = ScratchStore::next_available(base.path(), "output");
    assert!(!store.directory().exists());

    store.persist(frame(0)).unwrap();
    assert!(store.directory().is_dir());
}

#[test]
fn frames_are_numbered_by_retention_order() {
    let base = tempfile::tempdir().expect("Failed to create temp dir");
    let mut store = ScratchStore::next_available(base.path(), "output");

    let first = store.persist(frame(0)).unwrap();
    let second = store.persist(frame(90)).unwrap();

    assert_eq!(first, store.directory().join("0.jpg"));
    assert_eq!(second, store.directory().join("1.jpg"));
    assert_eq!(store.persisted(), 2);
}

#[test]
fn persisted_frames_decode_at_source_size() {
    let base = tempfile::tempdir().expect("Failed to create temp dir");
    let mut store = ScratchStore::next_available(base.path(), "output");
    let path = store.persist(frame(0)).unwrap();

    let decoded = image::open(&path).unwrap();
    assert_eq!((decoded.width(), decoded.height()), (40, 30));
}

#[test]
fn png_format_uses_png_extension() {
    let base = tempfile::tempdir().expect("Failed to create temp dir");
    let mut store =
        ScratchStore::next_available(base.path(), "output").with_format(FrameFormat::Png);
    let path = store.persist(frame(0)).unwrap();

    assert_eq!(path.extension().and_then(|ext| ext.to_str()), Some("png"));
    assert_eq!(
        image::ImageFormat::from_path(&path).unwrap(),
        image::ImageFormat::Png
    );
}

#[test]
fn alpha_frames_persist_as_jpeg() {
    let base = tempfile::tempdir().expect("Failed to create temp dir");
    let mut store = ScratchStore::next_available(base.path(), "output");
    let rgba = DynamicImage::ImageRgba8(RgbaImage::new(16, 16));

    let path = store.persist(Frame::new(0, rgba)).unwrap();
    assert!(image::open(path).is_ok());
}

// ── Reading back ───────────────────────────────────────────────────

#[test]
fn frame_paths_sort_numerically() {
    let base = tempfile::tempdir().expect("Failed to create temp dir");
    let mut store = ScratchStore::next_available(base.path(), "output");
    for index in 0..12 {
        store.persist(frame(index * 30)).unwrap();
    }

    let names: Vec<String> = store
        .frame_paths()
        .unwrap()
        .iter()
        .map(|path| path.file_name().unwrap().to_string_lossy().into_owned())
        .collect();

    let expected: Vec<String> = (0..12).map(|sequence| format!("{sequence}.jpg")).collect();
    assert_eq!(names, expected);
}

#[test]
fn frame_paths_ignore_unrelated_entries() {
    let base = tempfile::tempdir().expect("Failed to create temp dir");
    let mut store = ScratchStore::next_available(base.path(), "output");
    store.persist(frame(0)).unwrap();
    store.persist(frame(30)).unwrap();

    let directory = store.directory();
    fs::write(store.document_path(), b"%PDF-1.5").unwrap();
    fs::write(directory.join("notes.jpg"), b"").unwrap();
    fs::write(directory.join("2.png"), b"").unwrap();
    fs::create_dir(directory.join("3.jpg")).unwrap();

    let paths = store.frame_paths().unwrap();
    assert_eq!(paths, vec![directory.join("0.jpg"), directory.join("1.jpg")]);
}

#[test]
fn frame_paths_of_missing_directory_is_empty() {
    let base = tempfile::tempdir().expect("Failed to create temp dir");
    let store = ScratchStore::next_available(base.path(), "output");
    assert!(store.frame_paths().unwrap().is_empty());
}

#[test]
fn reopened_store_reads_earlier_run() {
    let base = tempfile::tempdir().expect("Failed to create temp dir");
    let mut store = ScratchStore::next_available(base.path(), "output");
    store.persist(frame(0)).unwrap();
    store.persist(frame(60)).unwrap();

    let reopened = ScratchStore::at(store.directory());
    assert_eq!(reopened.frame_paths().unwrap().len(), 2);
    assert_eq!(reopened.persisted(), 0);
}
