//! Video frame sources.

use crate::image::Image;

/// A stream of frames feeding a control loop.
///
/// Capture devices live outside of this crate; anything that can produce frames in order (a
/// camera wrapper, a video decoder, a directory of stills) plugs in here.
pub trait FrameSource {
    /// Reads the next frame, blocking until one is available.
    ///
    /// Returns [`None`] once the stream has ended or was closed. The control loops treat that as
    /// a hard stop: a camera that stops delivering is not a recoverable condition.
    fn read(&mut self) -> Option<Image>;

    /// Releases the stream. Subsequent [`FrameSource::read`] calls return [`None`].
    ///
    /// Closing an already closed source has no effect.
    fn close(&mut self);
}

/// A [`FrameSource`] backed by a prerecorded list of frames, for tests and demos.
pub struct FrameQueue {
    frames: Vec<Image>,
    pos: usize,
    looping: bool,
    closed: bool,
}

impl FrameQueue {
    /// Creates a source that plays `frames` once and then ends.
    pub fn new(frames: Vec<Image>) -> Self {
        Self {
            frames,
            pos: 0,
            looping: false,
            closed: false,
        }
    }

    /// Creates a source that plays `frames` in an endless cycle.
    ///
    /// A cycle of zero frames ends immediately.
    pub fn cycle(frames: Vec<Image>) -> Self {
        Self {
            looping: true,
            ..Self::new(frames)
        }
    }
}

impl FrameSource for FrameQueue {
    fn read(&mut self) -> Option<Image> {
        if self.closed || self.frames.is_empty() {
            return None;
        }
        if self.pos == self.frames.len() {
            if !self.looping {
                return None;
            }
            self.pos = 0;
        }

        let frame = self.frames[self.pos].clone();
        self.pos += 1;
        Some(frame)
    }

    fn close(&mut self) {
        self.closed = true;
        self.frames.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plays_once() {
        let mut queue = FrameQueue::new(vec![Image::new(2, 2), Image::new(4, 4)]);
        assert_eq!(queue.read().map(|f| f.width()), Some(2));
        assert_eq!(queue.read().map(|f| f.width()), Some(4));
        assert!(queue.read().is_none());
        assert!(queue.read().is_none());
    }

    #[test]
    fn test_cycles() {
        let mut queue = FrameQueue::cycle(vec![Image::new(2, 2), Image::new(4, 4)]);
        for _ in 0..3 {
            assert_eq!(queue.read().map(|f| f.width()), Some(2));
            assert_eq!(queue.read().map(|f| f.width()), Some(4));
        }
    }

    #[test]
    fn test_close_ends_the_stream() {
        let mut queue = FrameQueue::cycle(vec![Image::new(2, 2)]);
        assert!(queue.read().is_some());
        queue.close();
        assert!(queue.read().is_none());

        assert!(FrameQueue::new(Vec::new()).read().is_none());
    }
}
