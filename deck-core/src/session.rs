//! Per-presentation measurement state shared between rendering hosts.
//!
//! A [`LayoutSession`] collects measured layouts and scale factors reported
//! by any number of concurrently running per-slide pipelines. Every slot is
//! written at most once; later reports for the same slide (or slide/block
//! pair) are ignored. Readiness is an aggregate predicate over what has been
//! collected, optionally forced open by a safety timeout.

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};
use std::time::Duration;

use tokio::sync::Notify;
use tokio::time::Instant;

use crate::measure::{LayoutObserver, MeasuredLayout};
use crate::region::RegionKey;
use crate::scale::{global_scale, MIN_SCALE};
use crate::slide::Slide;
use crate::template::{template_for_slide, LayoutTemplate};

/// How long hosts wait for convergence before forcing readiness.
pub const DEFAULT_SAFETY_TIMEOUT: Duration = Duration::from_secs(8);

/// What a session expects from one slide.
#[derive(Debug, Clone, PartialEq)]
pub struct SlidePlan {
    /// Region template the slide is rendered with.
    pub template: LayoutTemplate,
    /// Whether the slide has body text in a scaled block and must report a scale.
    pub content_bearing: bool,
}

impl SlidePlan {
    /// Plan for the slide at `index`.
    #[must_use]
    pub fn for_slide(slide: &Slide, index: usize) -> Self {
        let template = template_for_slide(slide, index);
        let content_bearing =
            slide.has_content() && template.keys().any(RegionKey::carries_body_text);
        Self {
            template,
            content_bearing,
        }
    }

    /// Blocks of the template whose text size is scaled.
    pub fn scaled_blocks(&self) -> impl Iterator<Item = RegionKey> + '_ {
        self.template
            .keys()
            .filter(|k| k.carries_body_text())
            .copied()
    }
}

/// How [`LayoutSession::wait_until_ready`] finished.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Readiness {
    /// Every slide reported naturally.
    Converged,
    /// The gate was forced open; some measurements may be missing.
    Forced,
}

#[derive(Debug, Default)]
struct SessionState {
    plans: Vec<SlidePlan>,
    layouts: HashMap<usize, MeasuredLayout>,
    scales: HashMap<(usize, RegionKey), f64>,
    forced: bool,
}

impl SessionState {
    fn layouts_ready(&self) -> bool {
        self.plans.iter().enumerate().all(|(index, plan)| {
            self.layouts
                .get(&index)
                .is_some_and(|layout| layout.len() >= plan.template.expected_count())
        })
    }

    fn scales_ready(&self) -> bool {
        self.plans
            .iter()
            .enumerate()
            .filter(|(_, plan)| plan.content_bearing)
            .all(|(index, _)| self.scales.keys().any(|(slide, _)| *slide == index))
    }

    fn slide_scale(&self, index: usize) -> Option<f64> {
        self.scales
            .iter()
            .filter(|((slide, _), _)| *slide == index)
            .map(|(_, scale)| *scale)
            .reduce(f64::min)
    }
}

/// Thread-safe measurement state for one presentation.
#[derive(Debug, Clone)]
pub struct LayoutSession {
    state: Arc<RwLock<SessionState>>,
    changed: Arc<Notify>,
}

impl LayoutSession {
    /// Create a session for `slides`, planning each slide's template.
    #[must_use]
    pub fn new(slides: &[Slide]) -> Self {
        Self::from_plans(
            slides
                .iter()
                .enumerate()
                .map(|(index, slide)| SlidePlan::for_slide(slide, index))
                .collect(),
        )
    }

    /// Create a session from explicit plans.
    #[must_use]
    pub fn from_plans(plans: Vec<SlidePlan>) -> Self {
        Self {
            state: Arc::new(RwLock::new(SessionState {
                plans,
                ..SessionState::default()
            })),
            changed: Arc::new(Notify::new()),
        }
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, SessionState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, SessionState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Number of slides in the session.
    #[must_use]
    pub fn slide_count(&self) -> usize {
        self.read().plans.len()
    }

    /// Plan of one slide.
    #[must_use]
    pub fn plan(&self, index: usize) -> Option<SlidePlan> {
        self.read().plans.get(index).cloned()
    }

    /// Store a measured layout unless one is already recorded for the slide.
    ///
    /// Returns whether the layout was stored.
    pub fn record_layout(&self, index: usize, layout: MeasuredLayout) -> bool {
        let stored = {
            let mut state = self.write();
            if index >= state.plans.len() {
                tracing::warn!("Ignoring layout for unknown slide {}", index);
                return false;
            }
            if state.layouts.contains_key(&index) {
                tracing::debug!("Slide {} layout already measured, ignoring repeat", index);
                false
            } else {
                state.layouts.insert(index, layout);
                true
            }
        };
        if stored {
            self.changed.notify_waiters();
        }
        stored
    }

    /// Store a block's scale factor unless one is already recorded.
    ///
    /// Factors are clamped to the shrink-only range. Returns whether the
    /// factor was stored.
    pub fn record_scale(&self, index: usize, block: RegionKey, scale: f64) -> bool {
        if !scale.is_finite() {
            tracing::warn!("Ignoring non-finite scale for slide {} block {}", index, block);
            return false;
        }
        let stored = {
            let mut state = self.write();
            if index >= state.plans.len() {
                tracing::warn!("Ignoring scale for unknown slide {}", index);
                return false;
            }
            if state.scales.contains_key(&(index, block)) {
                tracing::debug!("Slide {} block {} scale already set, ignoring repeat", index, block);
                false
            } else {
                state
                    .scales
                    .insert((index, block), scale.clamp(MIN_SCALE, 1.0));
                true
            }
        };
        if stored {
            self.changed.notify_waiters();
        }
        stored
    }

    /// Every slide has a layout with at least the expected number of regions.
    #[must_use]
    pub fn layouts_ready(&self) -> bool {
        let state = self.read();
        state.forced || state.layouts_ready()
    }

    /// Every content-bearing slide has reported at least one scale.
    #[must_use]
    pub fn scales_ready(&self) -> bool {
        let state = self.read();
        state.forced || state.scales_ready()
    }

    /// Both gates are open.
    #[must_use]
    pub fn is_ready(&self) -> bool {
        let state = self.read();
        state.forced || (state.layouts_ready() && state.scales_ready())
    }

    /// Whether readiness was forced.
    #[must_use]
    pub fn is_forced(&self) -> bool {
        self.read().forced
    }

    /// Open both gates regardless of what has been measured.
    ///
    /// Missing measurements stay missing.
    pub fn force_ready(&self) {
        {
            let mut state = self.write();
            if state.forced {
                return;
            }
            state.forced = true;
            tracing::warn!(
                "Forcing layout readiness with {}/{} slides measured",
                state.layouts.len(),
                state.plans.len()
            );
        }
        self.changed.notify_waiters();
    }

    /// Wait until the session is ready, forcing it open after `timeout`.
    pub async fn wait_until_ready(&self, timeout: Duration) -> Readiness {
        let deadline = Instant::now() + timeout;
        loop {
            let mut notified = std::pin::pin!(self.changed.notified());
            notified.as_mut().enable();

            {
                let state = self.read();
                if state.forced {
                    return Readiness::Forced;
                }
                if state.layouts_ready() && state.scales_ready() {
                    return Readiness::Converged;
                }
            }

            if tokio::time::timeout_at(deadline, notified.as_mut())
                .await
                .is_err()
            {
                self.force_ready();
                return Readiness::Forced;
            }
        }
    }

    /// Measured layout of one slide.
    #[must_use]
    pub fn layout(&self, index: usize) -> Option<MeasuredLayout> {
        self.read().layouts.get(&index).cloned()
    }

    /// Measured layouts in slide order, `None` where a slide never reported.
    #[must_use]
    pub fn measured_layouts(&self) -> Vec<Option<MeasuredLayout>> {
        let state = self.read();
        (0..state.plans.len())
            .map(|index| state.layouts.get(&index).cloned())
            .collect()
    }

    /// Smallest block scale reported for a slide.
    #[must_use]
    pub fn slide_scale(&self, index: usize) -> Option<f64> {
        self.read().slide_scale(index)
    }

    /// Smallest scale across all slides, or `None` if no block reported.
    #[must_use]
    pub fn reported_scale(&self) -> Option<f64> {
        let state = self.read();
        if state.scales.is_empty() {
            None
        } else {
            Some(global_scale(
                (0..state.plans.len()).filter_map(|index| state.slide_scale(index)),
            ))
        }
    }

    /// Smallest scale across all slides, 1 when none reported.
    #[must_use]
    pub fn global_scale(&self) -> f64 {
        let state = self.read();
        global_scale((0..state.plans.len()).filter_map(|index| state.slide_scale(index)))
    }
}

impl LayoutObserver for LayoutSession {
    fn on_layout_measured(&self, slide_index: usize, layout: MeasuredLayout) {
        self.record_layout(slide_index, layout);
    }

    fn on_scale_report(&self, slide_index: usize, block: RegionKey, scale: f64) {
        self.record_scale(slide_index, block, scale);
    }
}
