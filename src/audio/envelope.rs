// Gain automation timeline for a single voice.
//
// Times are seconds relative to the voice anchor (t0). Events are kept in
// time order; an event scheduled at the same time as an existing one goes
// after it.

const DEFAULT_GAIN: f32 = 1.0;

#[derive(Clone, Copy, Debug, PartialEq)]
enum GainEvent {
    Set { time: f64, value: f32 },
    LinearRamp { time: f64, value: f32 },
}

impl GainEvent {
    fn time(&self) -> f64 {
        match *self {
            GainEvent::Set { time, .. } | GainEvent::LinearRamp { time, .. } => time,
        }
    }

    fn value(&self) -> f32 {
        match *self {
            GainEvent::Set { value, .. } | GainEvent::LinearRamp { value, .. } => value,
        }
    }
}

#[derive(Clone, Debug, Default)]
pub struct GainEnvelope {
    events: Vec<GainEvent>,
}

impl GainEnvelope {
    pub fn new() -> Self {
        Self { events: Vec::with_capacity(4) }
    }

    pub fn set_value_at_time(&mut self, value: f32, time: f64) {
        self.insert(GainEvent::Set { time, value });
    }

    pub fn linear_ramp_to_value_at_time(&mut self, value: f32, time: f64) {
        self.insert(GainEvent::LinearRamp { time, value });
    }

    fn insert(&mut self, event: GainEvent) {
        let at = self.events.partition_point(|e| e.time() <= event.time());
        self.events.insert(at, event);
    }

    pub fn value_at(&self, t: f64) -> f32 {
        // index of the first event strictly after t
        let next = self.events.partition_point(|e| e.time() <= t);

        if let Some(GainEvent::LinearRamp { time: end_t, value: end_v }) = self.events.get(next).copied() {
            let (start_t, start_v) = match next.checked_sub(1).map(|i| self.events[i]) {
                Some(prev) => (prev.time(), prev.value()),
                None => (t, DEFAULT_GAIN), // ramp with nothing before it starts now
            };
            let span = end_t - start_t;
            if span <= 0.0 {
                return end_v;
            }
            let frac = ((t - start_t) / span) as f32;
            return start_v + (end_v - start_v) * frac;
        }

        match next.checked_sub(1) {
            Some(i) => self.events[i].value(),
            None => DEFAULT_GAIN,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f32, b: f32) -> bool {
        (a - b).abs() < 1e-4
    }

    #[test]
    fn default_gain_without_events() {
        let env = GainEnvelope::new();
        assert_eq!(env.value_at(0.0), 1.0);
        assert_eq!(env.value_at(10.0), 1.0);
    }

    #[test]
    fn fade_in_plateau_fade_out() {
        let mut env = GainEnvelope::new();
        env.set_value_at_time(0.0, 0.0);
        env.linear_ramp_to_value_at_time(1.0, 0.4);
        env.set_value_at_time(1.0, 1.6);
        env.linear_ramp_to_value_at_time(0.0, 2.0);

        assert!(close(env.value_at(0.0), 0.0));
        assert!(close(env.value_at(0.2), 0.5));
        assert!(close(env.value_at(0.4), 1.0));
        assert!(close(env.value_at(1.0), 1.0));
        assert!(close(env.value_at(1.6), 1.0));
        assert!(close(env.value_at(1.8), 0.5));
        assert!(close(env.value_at(2.0), 0.0));
        assert!(close(env.value_at(3.0), 0.0));
    }

    #[test]
    fn out_of_order_inserts_are_sorted() {
        let mut env = GainEnvelope::new();
        env.linear_ramp_to_value_at_time(0.0, 2.0);
        env.set_value_at_time(0.5, 0.0);
        assert!(close(env.value_at(1.0), 0.25));
    }

    #[test]
    fn same_time_events_keep_insertion_order() {
        let mut env = GainEnvelope::new();
        env.set_value_at_time(0.2, 1.0);
        env.set_value_at_time(0.7, 1.0);
        assert!(close(env.value_at(1.0), 0.7));
    }
}
