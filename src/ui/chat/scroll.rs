//! Keeps the transcript viewport glued to the newest message.
//!
//! The synchronizer subscribes to the store's revision counter rather than to
//! a render hook: the history widget reports the laid-out line count together
//! with the current revision after each draw, so the scroll target is only
//! ever computed from a view that already contains the new message. The
//! offset then eases toward the target one step per tick, giving the smooth
//! transition a browser `scrollIntoView` would.

/// Fraction of the remaining distance covered per tick.
const EASE_DIVISOR: usize = 3;

#[derive(Debug, Clone)]
pub struct ScrollSync {
    last_revision: u64,
    offset: usize,
    target: usize,
    max_offset: usize,
    follow_bottom: bool,
}

impl ScrollSync {
    pub fn new() -> Self {
        Self {
            last_revision: 0,
            offset: 0,
            target: 0,
            max_offset: 0,
            follow_bottom: true,
        }
    }

    /// React to the transcript layout measured during the last draw.
    ///
    /// A revision that was already seen leaves the target alone, so repeated
    /// observations without a new message are no-ops.
    pub fn observe(&mut self, revision: u64, total_lines: usize, viewport_height: usize) {
        self.max_offset = total_lines.saturating_sub(viewport_height);

        if revision != self.last_revision {
            self.last_revision = revision;
            self.follow_bottom = true;
            self.target = self.max_offset;
            return;
        }

        if self.follow_bottom {
            self.target = self.max_offset;
        } else {
            // Resize can shrink the scrollable range under a paused viewport.
            self.target = self.target.min(self.max_offset);
            self.offset = self.offset.min(self.max_offset);
        }
    }

    /// Advance the easing animation one step. Returns true while moving.
    pub fn tick(&mut self) -> bool {
        if self.offset == self.target {
            return false;
        }
        let distance = self.offset.abs_diff(self.target);
        let step = (distance / EASE_DIVISOR).max(1);
        if self.offset < self.target {
            self.offset += step.min(distance);
        } else {
            self.offset -= step.min(distance);
        }
        true
    }

    /// Manual scroll pauses follow mode.
    pub fn scroll_up(&mut self, lines: usize) {
        self.offset = self.offset.saturating_sub(lines);
        self.target = self.offset;
        self.follow_bottom = false;
    }

    /// Scrolling back to the tail resumes follow mode.
    pub fn scroll_down(&mut self, lines: usize) {
        self.offset = (self.offset + lines).min(self.max_offset);
        self.target = self.offset;
        self.follow_bottom = self.offset == self.max_offset;
    }

    /// First visible transcript line.
    pub fn offset(&self) -> usize {
        self.offset
    }

    pub fn is_following(&self) -> bool {
        self.follow_bottom
    }
}

impl Default for ScrollSync {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_revision_targets_the_bottom() {
        let mut scroll = ScrollSync::new();
        scroll.observe(1, 50, 10);
        assert_eq!(scroll.offset(), 0);

        while scroll.tick() {}
        assert_eq!(scroll.offset(), 40);
    }

    #[test]
    fn repeated_observation_of_the_same_revision_is_a_noop() {
        let mut scroll = ScrollSync::new();
        scroll.observe(1, 50, 10);
        while scroll.tick() {}

        scroll.observe(1, 50, 10);
        assert!(!scroll.tick());
        assert_eq!(scroll.offset(), 40);
    }

    #[test]
    fn manual_scroll_pauses_follow_until_the_next_append() {
        let mut scroll = ScrollSync::new();
        scroll.observe(1, 50, 10);
        while scroll.tick() {}

        scroll.scroll_up(15);
        assert!(!scroll.is_following());
        assert_eq!(scroll.offset(), 25);

        // Growth without follow keeps the viewport parked.
        scroll.observe(1, 50, 10);
        assert!(!scroll.tick());

        // A new message snaps follow mode back on.
        scroll.observe(2, 55, 10);
        while scroll.tick() {}
        assert_eq!(scroll.offset(), 45);
        assert!(scroll.is_following());
    }

    #[test]
    fn scrolling_back_to_the_tail_resumes_follow() {
        let mut scroll = ScrollSync::new();
        scroll.observe(1, 30, 10);
        while scroll.tick() {}

        scroll.scroll_up(5);
        assert!(!scroll.is_following());

        scroll.scroll_down(5);
        assert!(scroll.is_following());
    }

    #[test]
    fn short_transcripts_never_scroll() {
        let mut scroll = ScrollSync::new();
        scroll.observe(1, 5, 10);
        assert!(!scroll.tick());
        assert_eq!(scroll.offset(), 0);
    }
}
