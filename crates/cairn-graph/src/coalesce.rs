use tokio::time::{Duration, Instant};

/// Rate-limits live text updates.
///
/// The first update of a window goes out immediately; later ones replace
/// each other until the window elapses. Updates carry the accumulated text,
/// so dropping intermediate ones never loses content as long as the last
/// one is flushed.
pub struct DeltaCoalescer {
    window: Duration,
    last_emit: Option<Instant>,
    pending: Option<(usize, String)>,
}

impl DeltaCoalescer {
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            last_emit: None,
            pending: None,
        }
    }

    /// Offer the accumulated text of `block`; returns the updates due now
    pub fn push(&mut self, block: usize, text: String) -> Vec<(usize, String)> {
        let mut due = Vec::new();

        if let Some((pending_block, _)) = &self.pending {
            if *pending_block != block {
                due.extend(self.take_pending());
            }
        }

        let now = Instant::now();
        let window_open = self
            .last_emit
            .map_or(true, |last| now.duration_since(last) >= self.window);

        if window_open || self.window.is_zero() {
            self.pending = None;
            self.last_emit = Some(now);
            due.push((block, text));
        } else {
            self.pending = Some((block, text));
        }

        due
    }

    /// Take whatever is held back, regardless of the window
    pub fn flush(&mut self) -> Option<(usize, String)> {
        self.take_pending()
    }

    /// Flush only if the held update belongs to `block`
    pub fn flush_block(&mut self, block: usize) -> Option<(usize, String)> {
        match &self.pending {
            Some((pending_block, _)) if *pending_block == block => self.take_pending(),
            _ => None,
        }
    }

    /// When the held update becomes due, if there is one
    pub fn deadline(&self) -> Option<Instant> {
        self.pending.as_ref()?;
        Some(match self.last_emit {
            Some(last) => last + self.window,
            None => Instant::now(),
        })
    }

    pub fn has_pending(&self) -> bool {
        self.pending.is_some()
    }

    fn take_pending(&mut self) -> Option<(usize, String)> {
        let pending = self.pending.take();
        if pending.is_some() {
            self.last_emit = Some(Instant::now());
        }
        pending
    }
}
