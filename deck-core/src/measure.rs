//! Measuring rendered layouts.
//!
//! The engine does not own a rendering surface. A host implements
//! [`RenderSurface`] to report where it actually drew each region, and the
//! [`LayoutMeasurer`] turns those pixel rectangles back into normalized
//! coordinates, retrying frame by frame until every region the template
//! expects has been drawn.
//!
//! ```text
//!   template ──► host renders ──► RenderSurface ──► measure_attempt
//!                                      ▲                 │
//!                                      └── next frame ◄──┘ (partial)
//!                                                        │
//!                                       LayoutObserver ◄─┘ (complete)
//! ```

use std::time::Duration;

use async_trait::async_trait;
use tokio::time::Instant;

use crate::geometry::PixelRect;
use crate::region::RegionKey;
use crate::slide::RegionMap;
use crate::template::LayoutTemplate;

/// Normalized region rectangles measured from a rendered slide.
pub type MeasuredLayout = RegionMap;

/// A surface a slide has been rendered onto.
pub trait RenderSurface {
    /// Bounding rectangle of the slide's layout container, if rendered.
    fn container_rect(&self, slide_index: usize) -> Option<PixelRect>;

    /// Bounding rectangle of one rendered region, if present.
    fn region_rect(&self, slide_index: usize, key: &RegionKey) -> Option<PixelRect>;
}

/// Receives measurement results from rendering hosts.
///
/// Implementations must keep the first report per key and ignore repeats.
pub trait LayoutObserver: Send + Sync {
    /// A slide's layout has been fully measured.
    fn on_layout_measured(&self, slide_index: usize, layout: MeasuredLayout);

    /// A content block on a slide settled on a scale factor.
    fn on_scale_report(&self, slide_index: usize, block: RegionKey, scale: f64);
}

/// Yields control until the host has had a chance to draw another frame.
#[async_trait]
pub trait FrameTicker: Send {
    /// Wait for the next frame.
    async fn next_frame(&mut self);
}

/// A [`FrameTicker`] that sleeps a fixed interval per frame.
#[derive(Debug, Clone, Copy)]
pub struct IntervalTicker {
    interval: Duration,
}

impl IntervalTicker {
    /// Create a ticker with the given frame interval.
    #[must_use]
    pub fn new(interval: Duration) -> Self {
        Self { interval }
    }
}

impl Default for IntervalTicker {
    fn default() -> Self {
        Self::new(ConvergencePolicy::default().frame_interval)
    }
}

#[async_trait]
impl FrameTicker for IntervalTicker {
    async fn next_frame(&mut self) {
        tokio::time::sleep(self.interval).await;
    }
}

/// Bounds on the measurement retry loop.
#[derive(Debug, Clone)]
pub struct ConvergencePolicy {
    /// Frame interval used by the default ticker.
    pub frame_interval: Duration,
    /// Give up after this many attempts. `None` retries until the idle
    /// timeout or forever; readiness is then left to the session's safety
    /// timeout.
    pub max_attempts: Option<u32>,
    /// Give up once this much time has passed without converging.
    pub idle_timeout: Option<Duration>,
}

impl Default for ConvergencePolicy {
    fn default() -> Self {
        Self {
            frame_interval: Duration::from_millis(16),
            max_attempts: None,
            idle_timeout: None,
        }
    }
}

impl ConvergencePolicy {
    /// Limit the number of attempts.
    #[must_use]
    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = Some(max_attempts);
        self
    }

    /// Limit the time spent retrying.
    #[must_use]
    pub fn with_idle_timeout(mut self, timeout: Duration) -> Self {
        self.idle_timeout = Some(timeout);
        self
    }
}

/// Result of one measurement pass.
#[derive(Debug, Clone, PartialEq)]
pub enum MeasureAttempt {
    /// The container is missing or has no size yet.
    SurfaceNotReady,
    /// Some expected regions are not drawn yet.
    Partial {
        /// Regions measured so far.
        measured: usize,
        /// Regions the template expects.
        expected: usize,
    },
    /// Every expected region was measured.
    Complete(MeasuredLayout),
}

/// Final result of [`LayoutMeasurer::converge`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MeasureOutcome {
    /// The layout was measured and reported.
    Converged {
        /// Attempts taken, including the successful one.
        attempts: u32,
    },
    /// The attempt budget ran out.
    Exhausted {
        /// Attempts made.
        attempts: u32,
        /// Regions measured on the last attempt.
        measured: usize,
    },
    /// The idle timeout elapsed.
    TimedOut {
        /// Attempts made.
        attempts: u32,
    },
}

impl MeasureOutcome {
    /// Whether the layout was reported.
    #[must_use]
    pub fn is_converged(&self) -> bool {
        matches!(self, Self::Converged { .. })
    }
}

/// Measure the regions of `template` once on `surface`.
pub fn measure_attempt<S>(surface: &S, slide_index: usize, template: &LayoutTemplate) -> MeasureAttempt
where
    S: RenderSurface + ?Sized,
{
    let Some(container) = surface
        .container_rect(slide_index)
        .filter(PixelRect::has_area)
    else {
        return MeasureAttempt::SurfaceNotReady;
    };

    let measured: MeasuredLayout = template
        .keys()
        .filter_map(|key| {
            let rect = surface
                .region_rect(slide_index, key)
                .filter(PixelRect::has_area)?;
            rect.normalize_within(&container).map(|norm| (*key, norm))
        })
        .collect();

    let expected = template.expected_count();
    if measured.len() >= expected {
        MeasureAttempt::Complete(measured)
    } else {
        MeasureAttempt::Partial {
            measured: measured.len(),
            expected,
        }
    }
}

/// Drives measurement of rendered slides until they converge.
#[derive(Debug, Clone)]
pub struct LayoutMeasurer<S> {
    surface: S,
    policy: ConvergencePolicy,
}

impl<S> LayoutMeasurer<S>
where
    S: RenderSurface + Sync,
{
    /// Create a measurer over `surface`.
    #[must_use]
    pub fn new(surface: S, policy: ConvergencePolicy) -> Self {
        Self { surface, policy }
    }

    /// The rendering surface.
    pub fn surface(&self) -> &S {
        &self.surface
    }

    /// The retry policy.
    pub fn policy(&self) -> &ConvergencePolicy {
        &self.policy
    }

    /// Measure `slide_index` until every expected region is present, waiting
    /// one frame between attempts, then report the layout to `observer`.
    pub async fn converge<T, O>(
        &self,
        slide_index: usize,
        template: &LayoutTemplate,
        ticker: &mut T,
        observer: &O,
    ) -> MeasureOutcome
    where
        T: FrameTicker + ?Sized,
        O: LayoutObserver + ?Sized,
    {
        let started = Instant::now();
        let mut attempts = 0u32;
        let mut last_measured = 0usize;

        loop {
            attempts += 1;
            match measure_attempt(&self.surface, slide_index, template) {
                MeasureAttempt::Complete(layout) => {
                    tracing::debug!(
                        "Slide {} layout measured after {} attempt(s): {} regions",
                        slide_index,
                        attempts,
                        layout.len()
                    );
                    observer.on_layout_measured(slide_index, layout);
                    return MeasureOutcome::Converged { attempts };
                }
                MeasureAttempt::Partial { measured, expected } => {
                    tracing::trace!(
                        "Slide {} has {}/{} regions, retrying",
                        slide_index,
                        measured,
                        expected
                    );
                    last_measured = measured;
                }
                MeasureAttempt::SurfaceNotReady => {
                    tracing::trace!("Slide {} container not laid out yet", slide_index);
                }
            }

            if self.policy.max_attempts.is_some_and(|max| attempts >= max) {
                tracing::warn!(
                    "Slide {} layout did not converge after {} attempts",
                    slide_index,
                    attempts
                );
                return MeasureOutcome::Exhausted {
                    attempts,
                    measured: last_measured,
                };
            }

            if self
                .policy
                .idle_timeout
                .is_some_and(|timeout| started.elapsed() >= timeout)
            {
                tracing::warn!("Slide {} layout measurement timed out", slide_index);
                return MeasureOutcome::TimedOut { attempts };
            }

            ticker.next_frame().await;
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};

    use super::*;
    use crate::classifier::LayoutChoice;
    use crate::template::generate;

    /// Surface that draws one more region per frame.
    struct ProgressiveSurface {
        frame: Arc<AtomicUsize>,
        container: PixelRect,
        rects: Vec<(RegionKey, PixelRect)>,
    }

    impl RenderSurface for ProgressiveSurface {
        fn container_rect(&self, _slide_index: usize) -> Option<PixelRect> {
            Some(self.container)
        }

        fn region_rect(&self, _slide_index: usize, key: &RegionKey) -> Option<PixelRect> {
            let drawn = self.frame.load(Ordering::SeqCst) + 1;
            self.rects
                .iter()
                .take(drawn)
                .find(|(k, _)| k == key)
                .map(|(_, r)| *r)
        }
    }

    struct CountingTicker(Arc<AtomicUsize>);

    #[async_trait]
    impl FrameTicker for CountingTicker {
        async fn next_frame(&mut self) {
            self.0.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[derive(Default)]
    struct Recorder {
        layouts: Mutex<HashMap<usize, MeasuredLayout>>,
    }

    impl LayoutObserver for Recorder {
        fn on_layout_measured(&self, slide_index: usize, layout: MeasuredLayout) {
            self.layouts
                .lock()
                .unwrap()
                .entry(slide_index)
                .or_insert(layout);
        }

        fn on_scale_report(&self, _slide_index: usize, _block: RegionKey, _scale: f64) {}
    }

    fn split_surface(frame: Arc<AtomicUsize>) -> ProgressiveSurface {
        ProgressiveSurface {
            frame,
            container: PixelRect::new(0.0, 0.0, 1000.0, 500.0),
            rects: vec![
                (RegionKey::Title, PixelRect::new(520.0, 50.0, 430.0, 75.0)),
                (RegionKey::Content, PixelRect::new(520.0, 140.0, 430.0, 310.0)),
                (RegionKey::Image, PixelRect::new(50.0, 75.0, 430.0, 350.0)),
            ],
        }
    }

    #[test]
    fn test_measure_attempt_partial_then_complete() {
        let frame = Arc::new(AtomicUsize::new(0));
        let surface = split_surface(frame.clone());
        let template = generate(&LayoutChoice::AlternatingSplit {
            is_image_left: true,
        });

        assert_eq!(
            measure_attempt(&surface, 0, &template),
            MeasureAttempt::Partial {
                measured: 1,
                expected: 3
            }
        );

        frame.store(2, Ordering::SeqCst);
        let MeasureAttempt::Complete(layout) = measure_attempt(&surface, 0, &template) else {
            panic!("expected a complete measurement");
        };
        let image = layout[&RegionKey::Image];
        assert!((image.x - 0.05).abs() < 1e-9);
        assert!((image.h - 0.7).abs() < 1e-9);
    }

    #[test]
    fn test_zero_width_container_is_not_ready() {
        let mut surface = split_surface(Arc::new(AtomicUsize::new(5)));
        surface.container = PixelRect::new(0.0, 0.0, 0.0, 500.0);
        let template = generate(&LayoutChoice::CompactList);
        assert_eq!(
            measure_attempt(&surface, 0, &template),
            MeasureAttempt::SurfaceNotReady
        );
    }

    #[test]
    fn test_zero_sized_region_does_not_count() {
        let mut surface = split_surface(Arc::new(AtomicUsize::new(5)));
        surface.rects[1].1 = PixelRect::new(520.0, 140.0, 430.0, 0.0);
        let template = generate(&LayoutChoice::AlternatingSplit {
            is_image_left: true,
        });
        assert_eq!(
            measure_attempt(&surface, 0, &template),
            MeasureAttempt::Partial {
                measured: 2,
                expected: 3
            }
        );
    }

    #[tokio::test]
    async fn test_converge_retries_until_all_regions_drawn() {
        let frame = Arc::new(AtomicUsize::new(0));
        let measurer = LayoutMeasurer::new(split_surface(frame.clone()), ConvergencePolicy::default());
        let template = generate(&LayoutChoice::AlternatingSplit {
            is_image_left: true,
        });
        let recorder = Recorder::default();
        let mut ticker = CountingTicker(frame);

        let outcome = measurer.converge(4, &template, &mut ticker, &recorder).await;

        assert_eq!(outcome, MeasureOutcome::Converged { attempts: 3 });
        let layouts = recorder.layouts.lock().unwrap();
        assert_eq!(layouts[&4].len(), 3);
    }

    #[tokio::test]
    async fn test_converge_gives_up_after_max_attempts() {
        let frame = Arc::new(AtomicUsize::new(0));
        let mut surface = split_surface(frame.clone());
        surface.rects.truncate(2);
        let measurer = LayoutMeasurer::new(surface, ConvergencePolicy::default().with_max_attempts(5));
        let template = generate(&LayoutChoice::AlternatingSplit {
            is_image_left: false,
        });
        let recorder = Recorder::default();
        let mut ticker = CountingTicker(frame);

        let outcome = measurer.converge(0, &template, &mut ticker, &recorder).await;

        assert_eq!(
            outcome,
            MeasureOutcome::Exhausted {
                attempts: 5,
                measured: 2
            }
        );
        assert!(recorder.layouts.lock().unwrap().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_converge_times_out_on_blank_surface() {
        let mut surface = split_surface(Arc::new(AtomicUsize::new(0)));
        surface.container = PixelRect::new(0.0, 0.0, 0.0, 0.0);
        let policy = ConvergencePolicy::default().with_idle_timeout(Duration::from_millis(100));
        let measurer = LayoutMeasurer::new(surface, policy);
        let template = generate(&LayoutChoice::CompactList);
        let recorder = Recorder::default();
        let mut ticker = IntervalTicker::new(Duration::from_millis(16));

        let outcome = measurer.converge(0, &template, &mut ticker, &recorder).await;

        assert!(matches!(outcome, MeasureOutcome::TimedOut { attempts } if attempts >= 7));
        assert!(recorder.layouts.lock().unwrap().is_empty());
    }
}
