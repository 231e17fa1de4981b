use foundation::time::Time;

/// Frame metadata for the globe loop.
///
/// The loop advances rotation by fixed per-frame increments, so the frame
/// index is the authoritative clock. `time` is the host timestamp (seconds)
/// the frame was scheduled at and only drives marker animations.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Frame {
    /// 0-based frame index.
    pub index: u64,
    /// Host time at the start of the frame (seconds).
    pub time: Time,
}

impl Frame {
    pub fn new(index: u64, time: Time) -> Self {
        Self { index, time }
    }

    pub fn first(time: Time) -> Self {
        Self::new(0, time)
    }

    /// The following frame, scheduled at `time`.
    ///
    /// Host clocks can jitter backwards slightly; time never decreases.
    pub fn next(self, time: Time) -> Self {
        let time = if time.0 < self.time.0 { self.time } else { time };
        Self::new(self.index + 1, time)
    }

    /// Seconds between this frame and `previous`.
    pub fn dt_since(self, previous: Frame) -> f64 {
        self.time.since(previous.time)
    }
}

#[cfg(test)]
mod tests {
    use super::Frame;
    use foundation::time::Time;

    #[test]
    fn next_advances_index_and_time() {
        let f0 = Frame::first(Time(1.0));
        let f1 = f0.next(Time(1.5));
        assert_eq!(f1.index, 1);
        assert_eq!(f1.time, Time(1.5));
        assert_eq!(f1.dt_since(f0), 0.5);
    }

    #[test]
    fn time_is_monotonic() {
        let f0 = Frame::first(Time(2.0));
        let f1 = f0.next(Time(1.9));
        assert_eq!(f1.time, Time(2.0));
        assert_eq!(f1.dt_since(f0), 0.0);
    }
}
