use std::num::NonZeroUsize;

use ora_types::FrameNumber;

/// Read-path cursor over a fixed provider list.
///
/// Entering a new frame jumps to `frame mod n`; within a frame the cursor
/// stays on the last provider that answered. `advance` walks forward on
/// failure and reports exhaustion once it wraps back to the last working
/// provider.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RotationCursor {
    len: NonZeroUsize,
    current: usize,
    last_working: usize,
    frame: Option<FrameNumber>,
}

impl RotationCursor {
    /// Cursor over `len` providers.
    pub fn new(len: NonZeroUsize) -> Self {
        Self {
            len,
            current: 0,
            last_working: 0,
            frame: None,
        }
    }

    /// Switch to `frame`. Returns `true` if the frame changed and the cursor
    /// was repositioned.
    pub fn enter_frame(&mut self, frame: FrameNumber) -> bool {
        if self.frame == Some(frame) {
            return false;
        }
        self.frame = Some(frame);
        self.current = frame.rotation_index(self.len);
        self.last_working = self.current;
        true
    }

    /// Move to the next provider, or `None` once every provider has been
    /// tried since the last success.
    pub fn advance(&mut self) -> Option<usize> {
        self.current = (self.current + 1) % self.len.get();
        (self.current != self.last_working).then_some(self.current)
    }

    /// Record that the current provider answered.
    pub fn commit(&mut self) {
        self.last_working = self.current;
    }

    pub fn current(&self) -> usize {
        self.current
    }

    pub fn last_working(&self) -> usize {
        self.last_working
    }

    pub fn frame(&self) -> Option<FrameNumber> {
        self.frame
    }

    pub fn len(&self) -> NonZeroUsize {
        self.len
    }
}
