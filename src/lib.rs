//! Color-histogram object tracking for video streams.
//!
//! The crate follows a target (a face, and optionally a hand next to it) through consecutive
//! frames: a detector hit seeds a hue histogram, and an iterative mode search chases the matching
//! pixel mass from frame to frame. [`runner::TrackLoop`] ties the pieces together. It acquires
//! the target through a [`detector::RegionDetector`], keeps a [`tracker::ColorTracker`] locked on
//! it, recovers from losses by recalibrating, and reports every frame to a caller-supplied
//! callback. [`hand::HandTracker`] finds the second object in the same back-projection after
//! blanking out the first.
//!
//! Frame capture, the detector internals and the sign classifier are deliberately not part of
//! this crate; they plug in through the [`video::FrameSource`], [`detector::RegionDetector`] and
//! [`sign::SignPredictor`] traits.

use log::LevelFilter;

pub mod camshift;
pub mod detector;
pub mod hand;
pub mod histogram;
pub mod image;
pub mod keys;
pub mod runner;
pub mod sign;
pub mod timer;
pub mod tracker;
pub mod video;

#[doc(hidden)]
pub fn init_logger(calling_crate: &'static str) {
    env_logger::Builder::new()
        .filter(Some(calling_crate), LevelFilter::Debug)
        .filter(Some(env!("CARGO_PKG_NAME")), LevelFilter::Debug)
        .parse_default_env()
        .try_init()
        .ok();
}

/// Initializes logging to *stderr*.
///
/// The calling crate and this library log at *debug* level by default; everything else follows
/// the `RUST_LOG` environment variable. If a global logger is already registered, this macro does
/// nothing.
#[macro_export]
macro_rules! init_logger {
    () => {
        $crate::init_logger(env!("CARGO_CRATE_NAME"))
    };
}
