//! Headless rendering host.
//!
//! Without a browser there is no real layout engine to measure, so this
//! host "renders" each slide exactly where its template puts the regions
//! and estimates how tall the body text would set at full size. Both feed
//! the same measurement, scaling and readiness protocol a live host uses,
//! so the exported deck goes through the identical pipeline.

use std::path::{Path, PathBuf};
use std::time::Duration;

use deck_core::content::parse_content;
use deck_core::scale::DEFAULT_SETTLE_DELAY;
use deck_core::{
    AdaptiveScaler, BlockMetrics, ContentItem, ConvergencePolicy, IntervalTicker, LayoutMeasurer,
    LayoutSession, LayoutTemplate, MeasuredLayout, PixelRect, Readiness, RegionKey, RenderSurface,
    ScaleProbe, Size, Slide, Theme, DEFAULT_SAFETY_TIMEOUT,
};
use deck_export::{DeckExporter, ExportFormat, ExportResult, FontSizes, TextRole};
use futures::future::join_all;
use tracing::{debug, info, warn};

/// Points per document unit (inch).
const POINTS_PER_UNIT: f64 = 72.0;
/// Document units across a page.
const PAGE_UNITS: f64 = 10.0;
/// Bullet column width in document units.
const BULLET_UNITS: f64 = 0.25;
/// Average glyph advance as a fraction of the font size.
const GLYPH_ADVANCE: f64 = 0.5;
/// Line box height as a multiple of the font size.
const LINE_HEIGHT: f64 = 1.5;
/// Space between items as a multiple of the font size.
const ITEM_GAP: f64 = 0.5;

/// Headless host configuration.
#[derive(Debug, Clone)]
pub struct HostConfig {
    /// Pixel size of the virtual slide.
    pub surface: Size,
    /// Measurement retry bounds.
    pub policy: ConvergencePolicy,
    /// Delay before a block is measured.
    pub settle_delay: Duration,
    /// How long to wait before exporting whatever was measured.
    pub safety_timeout: Duration,
}

impl Default for HostConfig {
    fn default() -> Self {
        Self {
            surface: Size::new(1280.0, 720.0),
            policy: ConvergencePolicy::default().with_max_attempts(60),
            settle_delay: DEFAULT_SETTLE_DELAY,
            safety_timeout: DEFAULT_SAFETY_TIMEOUT,
        }
    }
}

/// Virtual surface that draws every slide at the origin with its regions at
/// their template positions.
#[derive(Debug, Clone)]
pub struct TemplateSurface {
    session: LayoutSession,
    container: PixelRect,
}

impl TemplateSurface {
    /// Create a surface of `size` for the slides planned in `session`.
    #[must_use]
    pub fn new(session: LayoutSession, size: Size) -> Self {
        Self {
            session,
            container: PixelRect::new(0.0, 0.0, size.width, size.height),
        }
    }

    fn to_pixels(&self, template: &LayoutTemplate, key: &RegionKey) -> Option<PixelRect> {
        let rect = template.get(key)?;
        Some(PixelRect::new(
            self.container.left + rect.x * self.container.width,
            self.container.top + rect.y * self.container.height,
            rect.w * self.container.width,
            rect.h * self.container.height,
        ))
    }
}

impl RenderSurface for TemplateSurface {
    fn container_rect(&self, slide_index: usize) -> Option<PixelRect> {
        (slide_index < self.session.slide_count()).then_some(self.container)
    }

    fn region_rect(&self, slide_index: usize, key: &RegionKey) -> Option<PixelRect> {
        let plan = self.session.plan(slide_index)?;
        self.to_pixels(&plan.template, key)
    }
}

/// Estimates the natural height of body text from character counts.
#[derive(Debug, Clone)]
pub struct EstimatingProbe {
    surface: TemplateSurface,
    items: Vec<Vec<ContentItem>>,
    font_sizes: FontSizes,
}

impl EstimatingProbe {
    /// Create a probe for `slides` drawn on `surface`.
    #[must_use]
    pub fn new(slides: &[Slide], surface: TemplateSurface, font_sizes: FontSizes) -> Self {
        Self {
            surface,
            items: slides
                .iter()
                .map(|slide| parse_content(slide.content.as_deref()).items)
                .collect(),
            font_sizes,
        }
    }

    fn pixels_per_unit(&self) -> f64 {
        self.surface.container.width / PAGE_UNITS
    }

    /// Items a block displays, split across content blocks the same way the
    /// exporter splits them.
    fn block_items<'a>(items: &'a [ContentItem], template: &LayoutTemplate, block: &RegionKey) -> &'a [ContentItem] {
        if let RegionKey::ItemText(n) = block {
            return match items.get(*n) {
                Some(item) => std::slice::from_ref(item),
                None => &[],
            };
        }
        let blocks: Vec<&RegionKey> = template.keys().filter(|k| k.is_content_block()).collect();
        let Some(position) = blocks.iter().position(|k| *k == block) else {
            return &[];
        };
        if items.is_empty() {
            return &[];
        }
        let per_block = items.len().div_ceil(blocks.len());
        items.chunks(per_block).nth(position).unwrap_or(&[])
    }

    /// Height of `items` set at `font_px` in a column `width` pixels wide.
    #[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    fn text_height(items: &[ContentItem], width: f64, font_px: f64) -> f64 {
        let per_line = ((width / (font_px * GLYPH_ADVANCE)).floor() as usize).max(1);
        let lines: usize = items
            .iter()
            .map(|item| {
                // "title: description" on titled items with a description
                let chars = item.char_count() + if item.has_title { 2 } else { 0 };
                chars.div_ceil(per_line).max(1)
            })
            .sum();
        let gaps = items.len().saturating_sub(1) as f64;
        lines as f64 * font_px * LINE_HEIGHT + gaps * font_px * ITEM_GAP
    }
}

impl ScaleProbe for EstimatingProbe {
    fn reset(&self, slide_index: usize, block: &RegionKey) {
        debug!("Resetting block {} on slide {} to full size", block, slide_index);
    }

    fn measure(&self, slide_index: usize, block: &RegionKey) -> Option<BlockMetrics> {
        let plan = self.surface.session.plan(slide_index)?;
        let region = self.surface.to_pixels(&plan.template, block)?;
        let items = Self::block_items(self.items.get(slide_index)?, &plan.template, block);

        let role = if block.is_item_text() {
            TextRole::ContentTimeline
        } else {
            TextRole::ContentNormal
        };
        let ppu = self.pixels_per_unit();
        let font_px = self.font_sizes.base(role) / POINTS_PER_UNIT * ppu;
        let text_width = (region.width - BULLET_UNITS * ppu).max(font_px);

        Some(BlockMetrics {
            content: Size::new(text_width, Self::text_height(items, text_width, font_px)),
            container: region.size(),
        })
    }
}

/// What the headless host measured.
#[derive(Debug, Clone)]
pub struct HeadlessReport {
    /// Measured layouts in slide order.
    pub layouts: Vec<Option<MeasuredLayout>>,
    /// Smallest reported scale, `None` when no block reported.
    pub scale: Option<f64>,
    /// Whether everything converged or the safety timeout fired.
    pub readiness: Readiness,
}

/// Runs the measurement protocol over a deck without a display.
#[derive(Debug, Clone, Default)]
pub struct HeadlessHost {
    config: HostConfig,
}

impl HeadlessHost {
    /// Create a host.
    #[must_use]
    pub fn new(config: HostConfig) -> Self {
        Self { config }
    }

    /// Measure every slide and collect scale reports.
    pub async fn measure(&self, slides: &[Slide], font_sizes: FontSizes) -> HeadlessReport {
        let session = LayoutSession::new(slides);
        let surface = TemplateSurface::new(session.clone(), self.config.surface);
        let probe = EstimatingProbe::new(slides, surface.clone(), font_sizes);
        let measurer = LayoutMeasurer::new(surface, self.config.policy.clone());
        let scaler = AdaptiveScaler::new(self.config.settle_delay);
        let frame_interval = self.config.policy.frame_interval;

        let runs = (0..slides.len()).map(|index| {
            let session = &session;
            let measurer = &measurer;
            let scaler = &scaler;
            let probe = &probe;
            async move {
                let Some(plan) = session.plan(index) else {
                    return;
                };
                let mut ticker = IntervalTicker::new(frame_interval);
                let outcome = measurer.converge(index, &plan.template, &mut ticker, session).await;
                if !outcome.is_converged() {
                    warn!("Slide {} layout did not converge: {:?}", index, outcome);
                    return;
                }
                for block in plan.scaled_blocks() {
                    scaler.measure_block(probe, index, block, &mut ticker, session).await;
                }
            }
        });

        let readiness = tokio::select! {
            readiness = session.wait_until_ready(self.config.safety_timeout) => readiness,
            _ = join_all(runs) => {
                // Nothing else will report; don't sit out the timeout.
                session.wait_until_ready(Duration::ZERO).await
            }
        };

        let report = HeadlessReport {
            layouts: session.measured_layouts(),
            scale: session.reported_scale(),
            readiness,
        };
        info!(
            "Measured {}/{} slides ({:?}), global scale {:?}",
            report.layouts.iter().filter(|l| l.is_some()).count(),
            slides.len(),
            report.readiness,
            report.scale
        );
        report
    }

    /// Measure `slides` and export them to `path`.
    ///
    /// # Errors
    ///
    /// Returns an error if no slide could be exported or the file cannot be
    /// written.
    pub async fn export(
        &self,
        slides: &[Slide],
        theme: &Theme,
        exporter: &DeckExporter,
        format: ExportFormat,
        path: &Path,
    ) -> ExportResult<PathBuf> {
        let report = self.measure(slides, exporter.config().font_sizes).await;
        let deck = exporter.build(slides, theme, &report.layouts, report.scale);
        exporter.export_to_path(&deck, format, path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use deck_core::SlideType;

    fn fast_host() -> HeadlessHost {
        HeadlessHost::new(HostConfig {
            settle_delay: Duration::ZERO,
            policy: ConvergencePolicy {
                frame_interval: Duration::from_millis(1),
                ..ConvergencePolicy::default().with_max_attempts(3)
            },
            ..HostConfig::default()
        })
    }

    fn bullets(n: usize, words: usize) -> String {
        let body = vec!["word"; words].join(" ");
        (0..n)
            .map(|i| format!("- **Point {i}**: {body}"))
            .collect::<Vec<_>>()
            .join("\n")
    }

    #[test]
    fn test_surface_draws_template_regions() {
        let slides = vec![Slide::new(SlideType::ContentSlide, "T").with_content(bullets(2, 3))];
        let session = LayoutSession::new(&slides);
        let surface = TemplateSurface::new(session.clone(), Size::new(1280.0, 720.0));
        let template = session.plan(0).unwrap().template;
        let rect = template.get(&RegionKey::Title).unwrap();
        let px = surface.region_rect(0, &RegionKey::Title).unwrap();
        assert!((px.left - rect.x * 1280.0).abs() < 1e-9);
        assert!((px.height - rect.h * 720.0).abs() < 1e-9);
        assert!(surface.container_rect(1).is_none());
    }

    #[test]
    fn test_block_items_split_like_export() {
        let items: Vec<ContentItem> = parse_content(Some(&bullets(5, 1))).items;
        let slides = vec![Slide::new(SlideType::ContentSlide, "T").with_content(bullets(5, 1))];
        let template = LayoutSession::new(&slides).plan(0).unwrap().template;
        // five items lay out as a timeline, one text block per item
        let blocks: Vec<RegionKey> = template.keys().filter(|k| k.carries_body_text()).copied().collect();
        assert_eq!(blocks.len(), 5);
        let total: usize = blocks
            .iter()
            .map(|b| EstimatingProbe::block_items(&items, &template, b).len())
            .sum();
        assert_eq!(total, 5);
        assert_eq!(
            EstimatingProbe::block_items(&items, &template, &RegionKey::ItemText(1)).len(),
            1
        );
        assert!(EstimatingProbe::block_items(&items, &template, &RegionKey::ItemText(9)).is_empty());
    }

    #[test]
    fn test_text_height_wraps() {
        let items = parse_content(Some("- **A**: bbbbbbbbbb")).items;
        let one_line = EstimatingProbe::text_height(&items, 1000.0, 10.0);
        let wrapped = EstimatingProbe::text_height(&items, 50.0, 10.0);
        assert!((one_line - 15.0).abs() < 1e-9);
        assert!(wrapped > one_line);
    }

    #[tokio::test]
    async fn test_short_deck_keeps_full_size() {
        let slides = vec![
            Slide::new(SlideType::TitleSlide, "Hello").with_number(1),
            Slide::new(SlideType::ContentSlide, "Plan")
                .with_number(2)
                .with_content(bullets(2, 3)),
        ];
        let report = fast_host().measure(&slides, FontSizes::default()).await;
        assert_eq!(report.readiness, Readiness::Converged);
        assert!(report.layouts.iter().all(Option::is_some));
        assert!((report.scale.unwrap() - 1.0).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_overflowing_deck_shrinks() {
        let slides = vec![Slide::new(SlideType::ContentSlide, "Dense")
            .with_number(1)
            .with_content(bullets(6, 60))];
        let report = fast_host().measure(&slides, FontSizes::default()).await;
        let scale = report.scale.unwrap();
        assert!(scale < 1.0);
        assert!(scale >= deck_core::MIN_SCALE);
    }
}
