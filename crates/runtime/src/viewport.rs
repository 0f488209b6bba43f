use tracing::trace;

/// One emitted altitude sample.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct AltitudeSample {
    /// Monotone emission counter, starting at 0.
    pub seq: u64,
    pub altitude: f64,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SubscriptionId(u64);

type Callback = Box<dyn FnMut(AltitudeSample) + Send>;

/// Turns the renderer's continuous camera-distance signal into discrete samples.
///
/// The renderer pushes the current altitude through [`ViewportObserver::sample`]
/// at least once per render interval. A sample is emitted when it differs from
/// the last *emitted* altitude by at least `epsilon`, so slow drift accumulates
/// until it crosses the threshold instead of being suppressed forever.
///
/// Subscribers registered with [`ViewportObserver::on_altitude_sample`] receive
/// every emitted sample in subscription order.
pub struct ViewportObserver {
    epsilon: f64,
    last_emitted: Option<f64>,
    next_seq: u64,
    next_subscription: u64,
    subscribers: Vec<(SubscriptionId, Callback)>,
}

impl std::fmt::Debug for ViewportObserver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ViewportObserver")
            .field("epsilon", &self.epsilon)
            .field("last_emitted", &self.last_emitted)
            .field("next_seq", &self.next_seq)
            .field("subscribers", &self.subscribers.len())
            .finish()
    }
}

impl ViewportObserver {
    /// Non-finite or negative `epsilon` is treated as 0 (emit on every change).
    pub fn new(epsilon: f64) -> Self {
        let epsilon = if epsilon.is_finite() { epsilon.max(0.0) } else { 0.0 };
        Self {
            epsilon,
            last_emitted: None,
            next_seq: 0,
            next_subscription: 0,
            subscribers: Vec::new(),
        }
    }

    pub fn on_altitude_sample(
        &mut self,
        callback: impl FnMut(AltitudeSample) + Send + 'static,
    ) -> SubscriptionId {
        let id = SubscriptionId(self.next_subscription);
        self.next_subscription += 1;
        self.subscribers.push((id, Box::new(callback)));
        id
    }

    /// Returns `true` if the subscription existed.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.subscribers.len();
        self.subscribers.retain(|(sid, _)| *sid != id);
        self.subscribers.len() != before
    }

    /// Feeds one raw altitude reading.
    ///
    /// Non-finite readings are ignored; negative readings clamp to 0.
    pub fn sample(&mut self, altitude: f64) -> Option<AltitudeSample> {
        if !altitude.is_finite() {
            trace!(altitude, "ignoring non-finite altitude");
            return None;
        }
        let altitude = altitude.max(0.0);

        if let Some(last) = self.last_emitted
            && (altitude - last).abs() < self.epsilon
        {
            return None;
        }

        Some(self.emit(altitude))
    }

    /// Re-emits the last altitude regardless of epsilon.
    ///
    /// Returns `None` if nothing has been sampled yet.
    pub fn force(&mut self) -> Option<AltitudeSample> {
        let altitude = self.last_emitted?;
        Some(self.emit(altitude))
    }

    fn emit(&mut self, altitude: f64) -> AltitudeSample {
        let sample = AltitudeSample {
            seq: self.next_seq,
            altitude,
        };
        self.next_seq += 1;
        self.last_emitted = Some(altitude);
        for (_, cb) in &mut self.subscribers {
            cb(sample);
        }
        sample
    }
}

#[cfg(test)]
mod tests {
    use super::ViewportObserver;
    use std::sync::{Arc, Mutex};

    #[test]
    fn first_sample_always_emits() {
        let mut obs = ViewportObserver::new(0.5);
        let s = obs.sample(2.0).expect("first sample");
        assert_eq!(s.seq, 0);
        assert_eq!(s.altitude, 2.0);
    }

    #[test]
    fn suppresses_changes_below_epsilon() {
        let mut obs = ViewportObserver::new(0.1);
        obs.sample(1.0).unwrap();
        assert!(obs.sample(1.05).is_none());
        assert!(obs.sample(0.95).is_none());
        let s = obs.sample(1.2).expect("above epsilon");
        assert_eq!(s.seq, 1);
    }

    #[test]
    fn slow_drift_converges() {
        let mut obs = ViewportObserver::new(0.1);
        obs.sample(1.0).unwrap();
        let mut emitted = Vec::new();
        for step in 1..=10 {
            if let Some(s) = obs.sample(1.0 + step as f64 * 0.04) {
                emitted.push(s.altitude);
            }
        }
        // 1.12 is the first reading at least 0.1 away from 1.0, then 1.24, 1.36.
        assert_eq!(emitted.len(), 3);
        assert!((emitted[0] - 1.12).abs() < 1e-9);
    }

    #[test]
    fn ignores_non_finite_and_clamps_negative() {
        let mut obs = ViewportObserver::new(0.0);
        assert!(obs.sample(f64::NAN).is_none());
        assert!(obs.sample(f64::INFINITY).is_none());
        let s = obs.sample(-3.0).unwrap();
        assert_eq!(s.altitude, 0.0);
    }

    #[test]
    fn subscribers_receive_emitted_samples_in_order() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let mut obs = ViewportObserver::new(0.5);

        let a = Arc::clone(&seen);
        obs.on_altitude_sample(move |s| a.lock().unwrap().push(("a", s.seq)));
        let b = Arc::clone(&seen);
        let id_b = obs.on_altitude_sample(move |s| b.lock().unwrap().push(("b", s.seq)));

        obs.sample(1.0);
        obs.sample(1.1);
        assert!(obs.unsubscribe(id_b));
        assert!(!obs.unsubscribe(id_b));
        obs.sample(3.0);

        assert_eq!(*seen.lock().unwrap(), vec![("a", 0), ("b", 0), ("a", 1)]);
    }

    #[test]
    fn force_re_emits_last_altitude() {
        let mut obs = ViewportObserver::new(1.0);
        assert!(obs.force().is_none());
        obs.sample(2.0);
        let s = obs.force().unwrap();
        assert_eq!(s.altitude, 2.0);
        assert_eq!(s.seq, 1);
    }
}
