//! Adaptive, shrink-only content scaling.
//!
//! Each content block is rendered at its natural size; if it overflows its
//! container it is scaled down to fit, never below [`MIN_SCALE`]. The
//! smallest factor across the deck becomes the uniform export scale.

use std::time::Duration;

use crate::geometry::Size;
use crate::measure::{FrameTicker, LayoutObserver};
use crate::region::RegionKey;

/// Smallest scale any block is shrunk to.
pub const MIN_SCALE: f64 = 0.4;

/// Delay before the first measurement of a freshly rendered block.
pub const DEFAULT_SETTLE_DELAY: Duration = Duration::from_millis(150);

/// Natural content size of a block and the size of the box it must fit in.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BlockMetrics {
    /// Size the content wants at scale 1.
    pub content: Size,
    /// Size available to it.
    pub container: Size,
}

/// Scale factor that makes `content` fit inside `container`.
///
/// Returns `None` when the container has no size (nothing rendered yet).
/// Content that already fits keeps scale 1.
#[must_use]
pub fn fit_scale(content: Size, container: Size) -> Option<f64> {
    if !container.is_positive() {
        return None;
    }
    if !content.is_positive() {
        return Some(1.0);
    }
    if content.width <= container.width && content.height <= container.height {
        return Some(1.0);
    }
    let scale = f64::min(
        container.width / content.width,
        container.height / content.height,
    );
    Some(scale.clamp(MIN_SCALE, 1.0))
}

/// Minimum of the given scale factors, or 1 when there are none.
#[must_use]
pub fn global_scale<I>(scales: I) -> f64
where
    I: IntoIterator<Item = f64>,
{
    scales
        .into_iter()
        .filter(|s| s.is_finite())
        .fold(None, |acc: Option<f64>, s| Some(acc.map_or(s, |a| a.min(s))))
        .unwrap_or(1.0)
}

/// Measures the natural size of rendered content blocks.
pub trait ScaleProbe {
    /// Render the block at scale 1 so its natural size can be read.
    fn reset(&self, slide_index: usize, block: &RegionKey);

    /// Current metrics of the block, if it is rendered.
    fn measure(&self, slide_index: usize, block: &RegionKey) -> Option<BlockMetrics>;
}

/// Computes and reports per-block scale factors.
#[derive(Debug, Clone)]
pub struct AdaptiveScaler {
    settle_delay: Duration,
}

impl Default for AdaptiveScaler {
    fn default() -> Self {
        Self::new(DEFAULT_SETTLE_DELAY)
    }
}

impl AdaptiveScaler {
    /// Create a scaler that waits `settle_delay` before measuring.
    #[must_use]
    pub fn new(settle_delay: Duration) -> Self {
        Self { settle_delay }
    }

    /// Reset `block` to scale 1, let it render, measure it and report the
    /// resulting factor to `observer`.
    ///
    /// Returns the factor, or `None` if the block could not be measured.
    pub async fn measure_block<P, T, O>(
        &self,
        probe: &P,
        slide_index: usize,
        block: RegionKey,
        ticker: &mut T,
        observer: &O,
    ) -> Option<f64>
    where
        P: ScaleProbe + Sync + ?Sized,
        T: FrameTicker + ?Sized,
        O: LayoutObserver + ?Sized,
    {
        probe.reset(slide_index, &block);
        if !self.settle_delay.is_zero() {
            tokio::time::sleep(self.settle_delay).await;
        }
        ticker.next_frame().await;
        self.report(probe, slide_index, block, observer)
    }

    /// Measure again after the container was resized.
    pub async fn remeasure<P, T, O>(
        &self,
        probe: &P,
        slide_index: usize,
        block: RegionKey,
        ticker: &mut T,
        observer: &O,
    ) -> Option<f64>
    where
        P: ScaleProbe + Sync + ?Sized,
        T: FrameTicker + ?Sized,
        O: LayoutObserver + ?Sized,
    {
        probe.reset(slide_index, &block);
        ticker.next_frame().await;
        self.report(probe, slide_index, block, observer)
    }

    #[allow(clippy::unused_self)]
    fn report<P, O>(&self, probe: &P, slide_index: usize, block: RegionKey, observer: &O) -> Option<f64>
    where
        P: ScaleProbe + ?Sized,
        O: LayoutObserver + ?Sized,
    {
        let metrics = probe.measure(slide_index, &block)?;
        let scale = fit_scale(metrics.content, metrics.container)?;
        tracing::debug!("Slide {} block {} scale {:.3}", slide_index, block, scale);
        observer.on_scale_report(slide_index, block, scale);
        Some(scale)
    }
}
