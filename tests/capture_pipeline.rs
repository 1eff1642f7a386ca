//! Integration tests for the selection → capture → OCR → delivery flow.
//!
//! Capture and OCR engines are replaced by in-process fakes so the tests run
//! without a display or a recognition engine.

use image::DynamicImage;
use kimeno_lib::capture::{CaptureError, CaptureProvider};
use kimeno_lib::delivery::{DeliveryError, DeliverySink, HistorySink};
use kimeno_lib::geometry::{CapturePixels, Point, Rect};
use kimeno_lib::history::CaptureHistory;
use kimeno_lib::ocr::{OcrError, OcrProvider, OcrRequest, ReadingMode, TextObservation};
use kimeno_lib::selection::{PointerUpOutcome, SelectionMachine, SurfaceDescriptor, SurfaceId};
use kimeno_lib::{CapturePipeline, PipelineError, Settings};
use std::sync::{Arc, Mutex};

// ── Fakes ───────────────────────────────────────────────────────────

/// Returns a blank bitmap of the requested size and remembers the request.
#[derive(Default)]
struct FakeCapture {
    requests: Mutex<Vec<(SurfaceId, Rect<CapturePixels>)>>,
    fail: bool,
}

impl CaptureProvider for FakeCapture {
    fn capture(
        &self,
        surface: &SurfaceDescriptor,
        region: Rect<CapturePixels>,
    ) -> Result<DynamicImage, CaptureError> {
        self.requests.lock().unwrap().push((surface.id, region));
        if self.fail {
            return Err(CaptureError::PermissionDenied);
        }
        Ok(DynamicImage::new_rgba8(
            region.width.ceil() as u32,
            region.height.ceil() as u32,
        ))
    }
}

/// Returns canned observations and remembers the request it got.
struct FakeOcr {
    observations: Vec<TextObservation>,
    seen: Mutex<Option<(u32, u32, OcrRequest)>>,
}

impl FakeOcr {
    fn new(observations: Vec<TextObservation>) -> Self {
        Self {
            observations,
            seen: Mutex::new(None),
        }
    }
}

impl OcrProvider for FakeOcr {
    fn recognize(
        &self,
        image: &DynamicImage,
        request: &OcrRequest,
    ) -> Result<Vec<TextObservation>, OcrError> {
        *self.seen.lock().unwrap() = Some((image.width(), image.height(), request.clone()));
        Ok(self.observations.clone())
    }
}

/// Collects everything delivered to it.
#[derive(Default)]
struct Collector(Mutex<Vec<Option<String>>>);

impl DeliverySink for Collector {
    fn name(&self) -> &'static str {
        "collector"
    }

    fn deliver(&self, text: Option<&str>) -> Result<(), DeliveryError> {
        self.0.lock().unwrap().push(text.map(str::to_string));
        Ok(())
    }
}

struct BrokenSink;

impl DeliverySink for BrokenSink {
    fn name(&self) -> &'static str {
        "broken"
    }

    fn deliver(&self, _text: Option<&str>) -> Result<(), DeliveryError> {
        Err(DeliveryError::Clipboard("no pasteboard".to_string()))
    }
}

// ── Helpers ─────────────────────────────────────────────────────────

fn hello_world() -> Vec<TextObservation> {
    vec![
        TextObservation::from_edges("World", 0.5, 0.8, 0.9, 0.9),
        TextObservation::from_edges("Hello", 0.0, 0.8, 0.4, 0.9),
        TextObservation::from_edges("Line2", 0.0, 0.3, 0.4, 0.4),
    ]
}

fn fast_settings() -> Settings {
    Settings {
        settle_delay_ms: 0,
        ..Settings::default()
    }
}

/// Retina panel at the origin, external display to its right.
fn displays() -> Vec<SurfaceDescriptor> {
    vec![
        SurfaceDescriptor::new(1, Rect::new(0.0, 0.0, 1440.0, 900.0), 2.0),
        SurfaceDescriptor::new(7, Rect::new(1440.0, 0.0, 1920.0, 1080.0), 1.0),
    ]
}

// ── Tests ───────────────────────────────────────────────────────────

#[tokio::test]
async fn drag_on_retina_display_yields_reading_order_text() {
    let capture = Arc::new(FakeCapture::default());
    let ocr = Arc::new(FakeOcr::new(hello_world()));
    let collector = Arc::new(Collector::default());
    let pipeline = CapturePipeline::new(capture.clone(), ocr.clone(), fast_settings())
        .with_sink(collector.clone());

    let mut machine = SelectionMachine::new();
    machine.begin(displays()).unwrap();
    machine.pointer_down(Point::new(40.0, 860.0)).unwrap();
    machine.pointer_move(Point::new(10.0, 820.0)).unwrap();
    let rect = match machine.pointer_up().unwrap() {
        PointerUpOutcome::Completed(rect) => rect,
        other => panic!("expected completion, got {:?}", other),
    };
    let surfaces = machine.teardown().unwrap();

    let outcome = pipeline.process_selection(rect, &surfaces).await.unwrap();

    assert_eq!(outcome.surface, SurfaceId(1));
    // Local (10, 820, 30, 40) on a 900-high frame at 2x
    assert_eq!(outcome.capture_rect, Rect::new(20.0, 80.0, 60.0, 80.0));
    assert_eq!(outcome.text.as_deref(), Some("Hello World\nLine2"));
    assert_eq!(outcome.lines, 2);

    let (w, h, request) = ocr.seen.lock().unwrap().clone().unwrap();
    assert_eq!((w, h), (60, 80));
    assert_eq!(request.language, "en-US");

    assert_eq!(
        *collector.0.lock().unwrap(),
        vec![Some("Hello World\nLine2".to_string())]
    );
}

#[tokio::test]
async fn selection_on_second_display_targets_it() {
    let capture = Arc::new(FakeCapture::default());
    let pipeline = CapturePipeline::new(
        capture.clone(),
        Arc::new(FakeOcr::new(hello_world())),
        fast_settings(),
    );
    let surfaces = kimeno_lib::selection::SurfaceRegistry::new(displays());

    let rect = Rect::new(1500.0, 1000.0, 100.0, 50.0);
    let outcome = pipeline.process_selection(rect, &surfaces).await.unwrap();

    assert_eq!(outcome.surface, SurfaceId(7));
    let requests = capture.requests.lock().unwrap();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0], (SurfaceId(7), Rect::new(60.0, 30.0, 100.0, 50.0)));
}

#[tokio::test]
async fn raw_order_mode_keeps_engine_order() {
    let settings = Settings {
        reading_mode: ReadingMode::RawOrder,
        ..fast_settings()
    };
    let pipeline = CapturePipeline::new(
        Arc::new(FakeCapture::default()),
        Arc::new(FakeOcr::new(hello_world())),
        settings,
    );
    let surfaces = kimeno_lib::selection::SurfaceRegistry::new(displays());

    let outcome = pipeline
        .process_selection(Rect::new(100.0, 100.0, 200.0, 100.0), &surfaces)
        .await
        .unwrap();
    assert_eq!(outcome.text.as_deref(), Some("World\nHello\nLine2"));
    assert_eq!(outcome.lines, 3);
}

#[tokio::test]
async fn no_text_is_delivered_as_none() {
    let history = Arc::new(Mutex::new(CaptureHistory::new(10)));
    let collector = Arc::new(Collector::default());
    let pipeline = CapturePipeline::new(
        Arc::new(FakeCapture::default()),
        Arc::new(FakeOcr::new(Vec::new())),
        fast_settings(),
    )
    .with_sink(collector.clone())
    .with_sink(Arc::new(HistorySink::new(history.clone())));
    let surfaces = kimeno_lib::selection::SurfaceRegistry::new(displays());

    let outcome = pipeline
        .process_selection(Rect::new(100.0, 100.0, 200.0, 100.0), &surfaces)
        .await
        .unwrap();

    assert_eq!(outcome.text, None);
    assert_eq!(outcome.lines, 0);
    assert_eq!(*collector.0.lock().unwrap(), vec![None]);
    assert!(history.lock().unwrap().is_empty());
}

#[tokio::test]
async fn capture_failure_is_returned_and_nothing_is_delivered() {
    let capture = Arc::new(FakeCapture {
        fail: true,
        ..FakeCapture::default()
    });
    let collector = Arc::new(Collector::default());
    let pipeline = CapturePipeline::new(
        capture,
        Arc::new(FakeOcr::new(hello_world())),
        fast_settings(),
    )
    .with_sink(collector.clone());
    let surfaces = kimeno_lib::selection::SurfaceRegistry::new(displays());

    let err = pipeline
        .process_selection(Rect::new(100.0, 100.0, 200.0, 100.0), &surfaces)
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        PipelineError::Capture(CaptureError::PermissionDenied)
    ));
    assert!(collector.0.lock().unwrap().is_empty());
}

#[tokio::test]
async fn failing_sink_does_not_fail_the_capture() {
    let history = Arc::new(Mutex::new(CaptureHistory::new(10)));
    let pipeline = CapturePipeline::new(
        Arc::new(FakeCapture::default()),
        Arc::new(FakeOcr::new(hello_world())),
        fast_settings(),
    )
    .with_sinks([
        Arc::new(BrokenSink) as Arc<dyn DeliverySink>,
        Arc::new(HistorySink::new(history.clone())),
    ]);
    let surfaces = kimeno_lib::selection::SurfaceRegistry::new(displays());

    let outcome = pipeline
        .process_selection(Rect::new(100.0, 100.0, 200.0, 100.0), &surfaces)
        .await
        .unwrap();

    assert!(outcome.text.is_some());
    let history = history.lock().unwrap();
    assert_eq!(history.entries()[0].title, "Hello World");
}

#[tokio::test]
async fn selection_in_display_gap_falls_back_to_first_surface() {
    let capture = Arc::new(FakeCapture::default());
    let pipeline = CapturePipeline::new(
        capture.clone(),
        Arc::new(FakeOcr::new(hello_world())),
        fast_settings(),
    );
    // Center (1430, 950) is above the 900-high panel and left of the external display
    let surfaces = kimeno_lib::selection::SurfaceRegistry::new(displays());
    let err = pipeline
        .process_selection(Rect::new(1420.0, 920.0, 20.0, 60.0), &surfaces)
        .await
        .unwrap_err();

    // The fallback surface does not overlap the selection at all
    assert!(matches!(err, PipelineError::Capture(CaptureError::NoSurface)));
    assert!(capture.requests.lock().unwrap().is_empty());
}

#[tokio::test]
async fn settle_delay_is_honoured() {
    let settings = Settings {
        settle_delay_ms: 30,
        ..Settings::default()
    };
    let pipeline = CapturePipeline::new(
        Arc::new(FakeCapture::default()),
        Arc::new(FakeOcr::new(hello_world())),
        settings,
    );
    let surfaces = kimeno_lib::selection::SurfaceRegistry::new(displays());

    let start = std::time::Instant::now();
    pipeline
        .process_selection(Rect::new(100.0, 100.0, 200.0, 100.0), &surfaces)
        .await
        .unwrap();
    assert!(start.elapsed() >= std::time::Duration::from_millis(30));
}
