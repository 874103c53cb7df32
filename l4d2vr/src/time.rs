use std::time::Duration;

#[derive(Clone, Debug, Default)]
pub struct Time {
    pub elapsed: Duration,
    pub total: Duration,
}

impl Time {
    pub fn advance(&mut self, elapsed: Duration) {
        self.elapsed = elapsed;
        self.total += elapsed;
    }

    /// Frame delta in milliseconds, the unit turning rates are expressed in
    pub fn delta_ms(&self) -> f32 {
        self.elapsed.as_secs_f32() * 1000.0
    }
}
