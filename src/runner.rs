//! Tracking and detection control loops.
//!
//! [`TrackLoop`] alternates between detector-driven calibration and per-frame color tracking:
//! it acquires the target by polling a [`RegionDetector`], hands it to a
//! [`crate::tracker::ColorTracker`], and recalibrates whenever the track is lost or a caller asks
//! for it. [`DetectLoop`] runs detection alone, narrowing the search area around the last hit.
//!
//! Both loops block the calling thread until they are stopped and are steered from the outside
//! through cloneable control handles.

use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

use anyhow::bail;

use crate::{
    detector::{search_region, Detection, RegionDetector},
    image::{Image, Rect, RotatedRect},
    timer::FpsCounter,
    tracker::{ColorTracker, TrackerConfig},
    video::FrameSource,
};

/// Steers a [`TrackLoop`] from other threads or from within its own result callback.
///
/// Requests are plain flags: the loop observes them at its next iteration boundary, and any
/// number of requests raised between two iterations coalesce into one.
#[derive(Clone, Default)]
pub struct TrackControl {
    stop: Arc<AtomicBool>,
    recalibrate: Arc<AtomicBool>,
}

impl TrackControl {
    /// Asks the loop to finish its current iteration and shut down.
    pub fn stop(&self) {
        self.stop.store(true, Ordering::SeqCst);
    }

    /// Asks the loop to re-run detection and recalibrate the tracker before its next frame.
    pub fn recalibrate(&self) {
        self.recalibrate.store(true, Ordering::SeqCst);
    }

    /// Returns whether [`TrackControl::stop`] has been called.
    pub fn stop_requested(&self) -> bool {
        self.stop.load(Ordering::Relaxed)
    }

    fn take_recalibrate(&self) -> bool {
        self.recalibrate.swap(false, Ordering::Relaxed)
    }
}

/// The blocking face tracking control loop.
///
/// One loop owns its frame source, detector and tracker for a whole run. The per-frame callback
/// gets the tracker mutably, so interactive front ends can retune
/// [`TrackerConfig`][crate::tracker::TrackerConfig] fields between frames.
pub struct TrackLoop<S, D> {
    source: S,
    detector: D,
    tracker: ColorTracker,
    control: TrackControl,
    fps: FpsCounter,
}

impl<S: FrameSource, D: RegionDetector> TrackLoop<S, D> {
    pub fn new(source: S, detector: D, config: TrackerConfig) -> Self {
        Self {
            source,
            detector,
            tracker: ColorTracker::new(config),
            control: TrackControl::default(),
            fps: FpsCounter::new("track loop"),
        }
    }

    /// Returns a control handle for this loop.
    pub fn control(&self) -> TrackControl {
        self.control.clone()
    }

    /// Returns the tracker driven by this loop.
    pub fn tracker(&self) -> &ColorTracker {
        &self.tracker
    }

    /// Runs the loop until it is stopped or the frame source ends.
    ///
    /// The loop starts in an acquisition phase, polling the detector over full frames until the
    /// target shows up for the first time. There is no acquisition timeout;
    /// [`TrackControl::stop`] is the way out. Once calibrated, every frame is tracked and
    /// reported to `callback` along with whether the result counts as found. A lost track never
    /// ends the loop: it schedules a recalibration for the next frame instead.
    ///
    /// Returns `Ok(())` after a stop request; a frame source that ends on its own is an error.
    /// The source is released in either case.
    pub fn run(
        &mut self,
        mut callback: impl FnMut(&mut ColorTracker, &Image, RotatedRect, bool),
    ) -> anyhow::Result<()> {
        match self.acquire()? {
            Some((frame, seed)) => self.tracker.calibrate(&frame, seed),
            None => {
                self.source.close();
                return Ok(());
            }
        }

        while !self.control.stop_requested() {
            let Some(frame) = self.source.read() else {
                self.source.close();
                bail!("frame source ended while tracking");
            };

            if self.control.take_recalibrate() {
                self.recalibrate(&frame);
            }

            let tracked = self.tracker.track(&frame);
            let found = tracked.bounding_rect().area() > 1;
            callback(&mut self.tracker, &frame, tracked, found);
            if !found {
                self.control.recalibrate();
            }
            self.fps.tick_with(self.tracker.timers());
        }

        self.source.close();
        Ok(())
    }

    /// Polls the detector on every new frame until it finds the target.
    ///
    /// Returns `None` when the loop is stopped before anything was found.
    fn acquire(&mut self) -> anyhow::Result<Option<(Image, Rect)>> {
        loop {
            if self.control.stop_requested() {
                return Ok(None);
            }
            let Some(frame) = self.source.read() else {
                self.source.close();
                bail!("frame source ended during acquisition");
            };

            let detection = self.detector.detect(&frame, frame.rect());
            match detection.region {
                Some(region) => {
                    log::debug!("target acquired at {region:?} in {:?}", detection.elapsed);
                    return Ok(Some((frame, region)));
                }
                None => log::trace!("nothing detected in {:?}, still looking", detection.elapsed),
            }
        }
    }

    /// One recalibration pass: full-frame detection, recalibrating only on a hit.
    fn recalibrate(&mut self, frame: &Image) {
        let detection = self.detector.detect(frame, frame.rect());
        match detection.region {
            Some(region) => {
                log::info!("recalibrating from {region:?} ({:?})", detection.elapsed);
                self.tracker.calibrate(frame, region);
            }
            None => log::warn!("recalibration came up empty, keeping the previous color model"),
        }
    }
}

/// Steers a [`DetectLoop`].
#[derive(Clone, Default)]
pub struct DetectControl {
    stop: Arc<AtomicBool>,
}

impl DetectControl {
    /// Asks the loop to finish its current iteration and shut down.
    pub fn stop(&self) {
        self.stop.store(true, Ordering::SeqCst);
    }

    /// Returns whether [`DetectControl::stop`] has been called.
    pub fn stop_requested(&self) -> bool {
        self.stop.load(Ordering::Relaxed)
    }
}

/// Tunable parameters of a [`DetectLoop`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DetectLoopConfig {
    /// Margin added around the last hit to form the next search area, in pixels.
    pub search_margin: u32,
    /// Region updates where every coordinate moves less than this are ignored as jitter, in
    /// pixels. Zero disables the stabilization.
    pub move_tolerance: u32,
}

impl Default for DetectLoopConfig {
    fn default() -> Self {
        Self {
            search_margin: 32,
            move_tolerance: 16,
        }
    }
}

/// A detection-only control loop.
///
/// No color model is involved: the detector runs on every frame, over a search area grown around
/// wherever it last found the object. A miss resets the search back to the whole frame.
pub struct DetectLoop<S, D> {
    source: S,
    detector: D,
    config: DetectLoopConfig,
    control: DetectControl,
    region: Option<Rect>,
    fps: FpsCounter,
}

impl<S: FrameSource, D: RegionDetector> DetectLoop<S, D> {
    pub fn new(source: S, detector: D, config: DetectLoopConfig) -> Self {
        Self {
            source,
            detector,
            config,
            control: DetectControl::default(),
            region: None,
            fps: FpsCounter::new("detect loop"),
        }
    }

    /// Returns a control handle for this loop.
    pub fn control(&self) -> DetectControl {
        self.control.clone()
    }

    /// Runs the loop until it is stopped; a frame source that ends on its own is an error. The
    /// source is released in either case.
    ///
    /// `callback` receives every frame along with the raw detector outcome and the loop's
    /// stabilized region estimate (degenerate while the object is missing).
    pub fn run(
        &mut self,
        mut callback: impl FnMut(&Image, Detection, Rect),
    ) -> anyhow::Result<()> {
        while !self.control.stop_requested() {
            let Some(frame) = self.source.read() else {
                self.source.close();
                bail!("frame source ended while detecting");
            };

            let search = search_region(self.region, frame.rect(), self.config.search_margin);
            let detection = self.detector.detect(&frame, search);
            log::debug!(
                "detector ran over {search:?} in {:?}: {:?}",
                detection.elapsed,
                detection.region
            );
            if self.ignores_move(detection.region) {
                log::trace!("ignoring jitter move to {:?}", detection.region);
            } else {
                self.region = detection.region;
            }

            callback(&frame, detection, self.region.unwrap_or(Rect::EMPTY));
            self.fps.tick();
        }

        self.source.close();
        Ok(())
    }

    /// Whether a fresh detection is close enough to the held region to count as jitter.
    fn ignores_move(&self, new: Option<Rect>) -> bool {
        let tolerance = i64::from(self.config.move_tolerance);
        if tolerance == 0 {
            return false;
        }
        let (Some(old), Some(new)) = (self.region, new) else {
            return false;
        };

        (i64::from(old.x()) - i64::from(new.x())).abs() < tolerance
            && (i64::from(old.y()) - i64::from(new.y())).abs() < tolerance
            && (i64::from(old.width()) - i64::from(new.width())).abs() < tolerance
            && (i64::from(old.height()) - i64::from(new.height())).abs() < tolerance
    }
}
