//! Tracks a bouncing colored square through a synthetic clip.
//!
//! The stand-ins for everything the library leaves external are local to this demo: a naive
//! color blob "detector", a prerecorded frame queue for the camera, and a scripted key feed for
//! the user.

use std::{cell::Cell, rc::Rc, time::Instant};

use anyhow::Result;
use hueshift::{
    detector::Detection,
    image::{Image, Rect},
    keys::KeyBindings,
    runner::TrackLoop,
    tracker::TrackerConfig,
    video::FrameQueue,
};

const WIDTH: u32 = 320;
const HEIGHT: u32 = 240;
const SIDE: u32 = 48;
const RED: [u8; 3] = [210, 40, 50];
const BACKGROUND: [u8; 3] = [24, 24, 24];

fn main() -> Result<()> {
    hueshift::init_logger!();

    let frames = FrameQueue::new(synthetic_clip(400));
    let mut track_loop = TrackLoop::new(frames, detect_red_blob, TrackerConfig::default());
    let control = track_loop.control();

    let show_mass = Rc::new(Cell::new(false));
    let mut keys = KeyBindings::new();
    {
        let control = control.clone();
        keys.bind('$', move |key| {
            log::info!("key '{key}': stopping");
            control.stop();
        });
    }
    {
        let control = control.clone();
        keys.bind('!', move |key| {
            log::info!("key '{key}': recalibrating");
            control.recalibrate();
        });
    }
    {
        let show_mass = Rc::clone(&show_mass);
        keys.bind('*', move |key| {
            log::info!("key '{key}': toggling back-projection stats");
            show_mass.set(!show_mass.get());
        });
    }

    let mut frame_count = 0u32;
    track_loop.run(move |tracker, _frame, tracked, found| {
        frame_count += 1;
        // A scripted stand-in for interactive key presses.
        match frame_count {
            50 => {
                keys.dispatch('*');
            }
            150 => {
                keys.dispatch('!');
            }
            200 => {
                log::info!("tightening the saturation gate");
                tracker.config_mut().sat_min = 48;
            }
            350 => {
                keys.dispatch('$');
            }
            _ => {}
        }

        if found {
            let (cx, cy) = tracked.center();
            log::debug!(
                "frame {frame_count}: target at ({cx:.1}, {cy:.1}), {:.0}x{:.0}",
                tracked.width(),
                tracked.height(),
            );
        } else {
            log::info!("frame {frame_count}: target lost");
        }
        if show_mass.get() {
            let mass = tracker
                .back_projection()
                .pixels()
                .filter(|p| p.0[0] != 0)
                .count();
            log::debug!("back-projection mass: {mass} px");
        }
    })?;

    Ok(())
}

/// Finds the bounding box of saturated red pixels within `search`. A stand-in for a real face
/// detector with the same contract.
fn detect_red_blob(frame: &Image, search: Rect) -> Detection {
    let begin = Instant::now();
    let mut bounds: Option<(i64, i64, i64, i64)> = None;
    if let Some(search) = search.intersection(&frame.rect()) {
        for (x, y) in search.iter_coords() {
            let [r, g, b] = frame.get(x as u32, y as u32);
            if r > 150 && g < 100 && b < 100 {
                let (x0, y0, x1, y1) = bounds.unwrap_or((x, y, x, y));
                bounds = Some((x0.min(x), y0.min(y), x1.max(x), y1.max(y)));
            }
        }
    }

    Detection {
        region: bounds.map(|(x0, y0, x1, y1)| {
            Rect::from_top_left(
                x0 as i32,
                y0 as i32,
                (x1 - x0 + 1) as u32,
                (y1 - y0 + 1) as u32,
            )
        }),
        elapsed: begin.elapsed(),
    }
}

/// Renders a clip of a red square bouncing horizontally over a dark background.
fn synthetic_clip(frames: usize) -> Vec<Image> {
    let span = (WIDTH - SIDE) as i64;
    (0..frames as i64)
        .map(|i| {
            let phase = i * 3 % (2 * span);
            let x = if phase < span { phase } else { 2 * span - phase };
            let blob = Rect::from_top_left(x as i32, ((HEIGHT - SIDE) / 2) as i32, SIDE, SIDE);
            Image::from_fn(WIDTH, HEIGHT, |px, py| {
                if blob.contains(px.into(), py.into()) {
                    RED
                } else {
                    BACKGROUND
                }
            })
        })
        .collect()
}
