//! Face-and-hand tracking with letter prediction over the hand shape.
//!
//! Runs the full pipeline on a synthetic clip: the face is tracked by color, the hand is found
//! next to it in the shared back-projection, and every hand crop is classified by a stand-in
//! predictor. As in the face demo, the camera, detector and classifier are all scripted here.

use std::{cell::Cell, rc::Rc, time::Instant};

use anyhow::Result;
use hueshift::{
    detector::Detection,
    hand::{HandTracker, HandTrackerConfig},
    image::{Image, Rect},
    keys::KeyBindings,
    runner::TrackLoop,
    sign::{hand_input, Prediction, SignPredictor},
    tracker::TrackerConfig,
    video::FrameQueue,
};

const WIDTH: u32 = 320;
const HEIGHT: u32 = 240;
const SKIN: [u8; 3] = [224, 93, 73];
const BACKGROUND: [u8; 3] = [24, 24, 24];

/// Stand-in for the letter classifier: guesses by how much of the input is lit.
struct ActiveAreaPredictor;

impl SignPredictor for ActiveAreaPredictor {
    fn predict(&mut self, input: &[f32]) -> Prediction {
        let active = input.iter().filter(|&&v| v > 0.5).count();
        Prediction {
            letter: (b'a' + (active % 26) as u8) as char,
            confidence: active as f32 / input.len() as f32,
        }
    }
}

fn main() -> Result<()> {
    hueshift::init_logger!();

    let frames = FrameQueue::new(synthetic_clip(300));
    let mut track_loop = TrackLoop::new(frames, detect_face, TrackerConfig::default());
    let control = track_loop.control();

    let capture = Rc::new(Cell::new(false));
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
        let capture = Rc::clone(&capture);
        keys.bind(':', move |key| {
            log::info!("key '{key}': toggling input capture");
            capture.set(!capture.get());
        });
    }

    let mut hand_tracker = HandTracker::new(HandTrackerConfig::default());
    let mut predictor = ActiveAreaPredictor;
    let mut frame_count = 0u32;
    track_loop.run(move |tracker, _frame, tracked, found| {
        frame_count += 1;
        match frame_count {
            40 => {
                keys.dispatch(':');
            }
            120 => {
                keys.dispatch('!');
            }
            260 => {
                keys.dispatch('$');
            }
            _ => {}
        }

        if !found {
            log::info!("frame {frame_count}: face lost");
            return;
        }

        let face = tracked.bounding_rect();
        let hand = hand_tracker.track(tracker.back_projection(), face);
        let hand_rect = hand.bounding_rect();
        if hand_rect.area() <= 1 {
            log::debug!("frame {frame_count}: face at {face:?}, no hand");
            return;
        }

        let Some(input) = hand_input(tracker.back_projection(), hand_rect) else {
            log::debug!("frame {frame_count}: hand {hand_rect:?} yields no usable crop");
            return;
        };
        if capture.get() {
            let mean = input.iter().sum::<f32>() / input.len() as f32;
            log::debug!("captured input with mean activation {mean:.2}");
        }

        let prediction = predictor.predict(&input);
        if prediction.confidence > 0.5 {
            log::info!(
                "frame {frame_count}: letter '{}' ({:.0}%)",
                prediction.letter,
                prediction.confidence * 100.0,
            );
        } else {
            log::debug!(
                "frame {frame_count}: no confident letter (best '{}' at {:.0}%)",
                prediction.letter,
                prediction.confidence * 100.0,
            );
        }
    })?;

    Ok(())
}

/// Finds the bounding box of skin-toned pixels in the upper half of the frame. A stand-in for a
/// real face detector, which would not fire on hands either.
fn detect_face(frame: &Image, search: Rect) -> Detection {
    let begin = Instant::now();
    let upper_half = Rect::from_top_left(0, 0, frame.width(), frame.height() / 2);
    let mut bounds: Option<(i64, i64, i64, i64)> = None;
    if let Some(search) = search.intersection(&upper_half) {
        for (x, y) in search.iter_coords() {
            let [r, g, b] = frame.get(x as u32, y as u32);
            if r > 150 && g < 130 && b < 120 {
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

/// Renders a clip with a still face in the upper half and a slowly waving hand at the lower
/// left, both in the same skin tone.
fn synthetic_clip(frames: usize) -> Vec<Image> {
    (0..frames as i64)
        .map(|i| {
            let face = Rect::from_top_left(132, 30, 56, 56);
            let bob = {
                let phase = i * 2 % 60;
                if phase < 30 {
                    phase
                } else {
                    60 - phase
                }
            };
            let hand = Rect::from_top_left(30, 140 + bob as i32, 36, 48);
            Image::from_fn(WIDTH, HEIGHT, |px, py| {
                if face.contains(px.into(), py.into()) || hand.contains(px.into(), py.into()) {
                    SKIN
                } else {
                    BACKGROUND
                }
            })
        })
        .collect()
}
