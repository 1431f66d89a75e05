//! Sliding-window accumulators over per-vehicle bucket series.
//!
//! All three accumulators sit on a fixed-capacity circular buffer so the
//! partial-window warm-up and lag-null rules stay explicit:
//! - [`RollingSum`] emits from the first bucket (partial windows allowed)
//! - [`RollingMean`] averages the present values in the window, `None` if none
//! - [`LagDiff`] is `None` until the lagged value exists

/// Window length, in buckets, for every rolling feature.
pub const ROLLING_WINDOW_BUCKETS: usize = 15;

/// Fixed-capacity circular buffer. Once full, each push overwrites the oldest slot.
#[derive(Debug, Clone)]
pub struct RingBuffer<T: Copy> {
    slots: Vec<T>,
    capacity: usize,
    head: usize,
}

impl<T: Copy> RingBuffer<T> {
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "ring buffer capacity must be positive");
        Self {
            slots: Vec::with_capacity(capacity),
            capacity,
            head: 0,
        }
    }

    /// Push a value, returning the evicted oldest value when the buffer was full.
    pub fn push(&mut self, value: T) -> Option<T> {
        if self.slots.len() < self.capacity {
            self.slots.push(value);
            return None;
        }
        let evicted = std::mem::replace(&mut self.slots[self.head], value);
        self.head = (self.head + 1) % self.capacity;
        Some(evicted)
    }

    /// Oldest retained value.
    pub fn oldest(&self) -> Option<T> {
        if self.slots.len() < self.capacity {
            self.slots.first().copied()
        } else {
            Some(self.slots[self.head])
        }
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.slots.len() == self.capacity
    }

    /// Retained values, oldest first.
    pub fn iter(&self) -> impl Iterator<Item = T> + '_ {
        let (newer, older) = self.slots.split_at(self.head);
        older.iter().chain(newer.iter()).copied()
    }
}

/// Sum over the last `window` values; partial windows emit.
#[derive(Debug, Clone)]
pub struct RollingSum {
    buffer: RingBuffer<f64>,
}

impl RollingSum {
    pub fn new(window: usize) -> Self {
        Self {
            buffer: RingBuffer::new(window),
        }
    }

    pub fn push(&mut self, value: f64) -> f64 {
        self.buffer.push(value);
        self.buffer.iter().sum()
    }
}

/// Mean over the present values among the last `window` slots.
#[derive(Debug, Clone)]
pub struct RollingMean {
    buffer: RingBuffer<Option<f64>>,
}

impl RollingMean {
    pub fn new(window: usize) -> Self {
        Self {
            buffer: RingBuffer::new(window),
        }
    }

    pub fn push(&mut self, value: Option<f64>) -> Option<f64> {
        self.buffer.push(value);
        let (sum, count) = self
            .buffer
            .iter()
            .flatten()
            .fold((0.0, 0usize), |(s, c), v| (s + v, c + 1));
        (count > 0).then(|| sum / count as f64)
    }
}

/// `x[i] - x[i - lag]`, `None` while `i < lag` or when either side is absent.
#[derive(Debug, Clone)]
pub struct LagDiff {
    buffer: RingBuffer<Option<f64>>,
}

impl LagDiff {
    pub fn new(lag: usize) -> Self {
        Self {
            buffer: RingBuffer::new(lag),
        }
    }

    pub fn push(&mut self, value: Option<f64>) -> Option<f64> {
        let lagged = if self.buffer.is_full() {
            self.buffer.oldest().flatten()
        } else {
            None
        };
        self.buffer.push(value);
        Some(value? - lagged?)
    }
}
