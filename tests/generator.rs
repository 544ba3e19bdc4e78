//! End-to-end generation tests.
//!
//! Synthetic runs use an in-memory frame source. Tests against a real video
//! require fixture files from `tests/fixtures/generate_fixtures.sh`.

use std::path::Path;

use image::{DynamicImage, RgbImage};
use lopdf::Document;
use slidegen::{
    ComparisonSize, DocumentOptions, FrameFormat, FrameSource, ScratchStore, SlideError,
    SlideGenerator, SlideOptions, generate_from_file,
};

fn sample_video_path() -> &'static str {
    "tests/fixtures/sample_video.mp4"
}

/// Three slides of 40 frames each, with colour bars that move between
/// slides.
struct SlideShow {
    position: u64,
    frames: u64,
}

impl SlideShow {
    fn new(frames: u64) -> Self {
        Self {
            position: 0,
            frames,
        }
    }
}

impl FrameSource for SlideShow {
    fn frame_count_hint(&self) -> Option<u64> {
        Some(self.frames)
    }

    fn read_frame(&mut self) -> Result<Option<DynamicImage>, SlideError> {
        if self.position >= self.frames {
            return Ok(None);
        }
        let bar = (self.position / 40) as u32 * 24 + 8;
        self.position += 1;
        Ok(Some(DynamicImage::ImageRgb8(RgbImage::from_fn(
            96,
            64,
            |x, _| {
                if x >= bar && x < bar + 16 {
                    image::Rgb([240, 240, 240])
                } else {
                    image::Rgb([20, 40, 80])
                }
            },
        ))))
    }
}

fn options() -> SlideOptions {
    SlideOptions::new()
        .with_threshold(5.0)
        .with_skip_rate(10)
        .with_comparison_size(ComparisonSize::new(96, 64))
}

fn page_count(path: &Path) -> usize {
    Document::load(path)
        .expect("Failed to load PDF")
        .get_pages()
        .len()
}

// ── Synthetic source ───────────────────────────────────────────────

#[test]
fn writes_frames_and_document() {
    let base = tempfile::tempdir().expect("Failed to create temp dir");
    let store = ScratchStore::next_available(base.path(), "output");
    let mut source = SlideShow::new(120);

    let report = SlideGenerator::new(options())
        .run(&mut source, store)
        .unwrap();

    assert_eq!(report.directory, base.path().join("output0"));
    assert_eq!(report.retained, vec![0, 40, 80]);
    assert_eq!(report.decoded_frames, 120);
    assert_eq!(report.sampled_frames, 12);
    assert_eq!((report.page_width, report.page_height), (96, 64));

    for sequence in 0..3 {
        assert!(report.directory.join(format!("{sequence}.jpg")).is_file());
    }
    assert!(!report.directory.join("3.jpg").exists());
    assert_eq!(page_count(&report.document), 3);
}

#[test]
fn second_run_uses_next_directory() {
    let base = tempfile::tempdir().expect("Failed to create temp dir");
    let generator = SlideGenerator::new(options());

    let first = generator
        .run(
            &mut SlideShow::new(40),
            ScratchStore::next_available(base.path(), "output"),
        )
        .unwrap();
    let second = generator
        .run(
            &mut SlideShow::new(40),
            ScratchStore::next_available(base.path(), "output"),
        )
        .unwrap();

    assert_eq!(first.directory, base.path().join("output0"));
    assert_eq!(second.directory, base.path().join("output1"));
    assert!(first.document.is_file());
}

#[test]
fn header_option_reaches_document() {
    let base = tempfile::tempdir().expect("Failed to create temp dir");
    let options = options().with_document(DocumentOptions::new().with_header("Lecture 1"));

    let report = SlideGenerator::new(options)
        .run(
            &mut SlideShow::new(120),
            ScratchStore::next_available(base.path(), "output"),
        )
        .unwrap();

    assert_eq!(report.page_height, 64 + 40);
}

#[test]
fn png_store_writes_png_frames() {
    let base = tempfile::tempdir().expect("Failed to create temp dir");
    let store = ScratchStore::next_available(base.path(), "output").with_format(FrameFormat::Png);

    let report = SlideGenerator::new(options())
        .run(&mut SlideShow::new(80), store)
        .unwrap();

    assert!(report.directory.join("0.png").is_file());
    assert!(report.directory.join("1.png").is_file());
    assert_eq!(page_count(&report.document), 2);
}

#[test]
fn empty_source_is_an_error_and_leaves_no_directory() {
    let base = tempfile::tempdir().expect("Failed to create temp dir");
    let store = ScratchStore::next_available(base.path(), "output");
    let directory = store.directory().to_path_buf();

    let result = SlideGenerator::new(options()).run(&mut SlideShow::new(0), store);

    assert!(matches!(result, Err(SlideError::EmptySelection)));
    assert!(!directory.exists());
}

#[test]
fn invalid_threshold_fails_before_decoding() {
    let base = tempfile::tempdir().expect("Failed to create temp dir");
    let mut source = SlideShow::new(40);

    let result = SlideGenerator::new(options().with_threshold(150.0)).run(
        &mut source,
        ScratchStore::next_available(base.path(), "output"),
    );

    assert!(matches!(result, Err(SlideError::InvalidThreshold(_))));
    assert_eq!(source.position, 0);
}

#[test]
fn comparison_size_below_window_fails_before_writing() {
    for frames in [1, 40] {
        let base = tempfile::tempdir().expect("Failed to create temp dir");
        let store = ScratchStore::next_available(base.path(), "output");
        let directory = store.directory().to_path_buf();
        let mut source = SlideShow::new(frames);

        let result = SlideGenerator::new(
            options()
                .with_skip_rate(1)
                .with_comparison_size(ComparisonSize::new(4, 4)),
        )
        .run(&mut source, store);

        assert!(matches!(result, Err(SlideError::InvalidComparison(_))));
        assert!(!directory.exists());
        assert_eq!(source.position, 0);
    }
}

// ── Video files ────────────────────────────────────────────────────

#[test]
fn missing_video_is_a_file_open_error() {
    let base = tempfile::tempdir().expect("Failed to create temp dir");
    let result = generate_from_file("this_file_does_not_exist.mp4", base.path(), &options());

    let error = result.unwrap_err();
    assert!(matches!(error, SlideError::FileOpen { .. }));
    assert!(
        error.to_string().contains("Failed to open video file"),
        "Error message should mention file open failure: {error}",
    );
    assert!(!base.path().join("output0").exists());
}

#[test]
fn generates_deck_from_fixture() {
    let path = sample_video_path();
    if !Path::new(path).exists() {
        return;
    }

    let base = tempfile::tempdir().expect("Failed to create temp dir");
    let options = SlideOptions::new().with_threshold(5.0).with_skip_rate(30);
    let report = generate_from_file(path, base.path(), &options).expect("Failed to generate");

    assert!(!report.retained.is_empty());
    assert_eq!(report.retained[0], 0);
    assert!(report.retained.iter().all(|index| index % 30 == 0));
    assert_eq!(page_count(&report.document), report.retained.len());
}
