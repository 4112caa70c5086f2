/// Time primitives
#[derive(Copy, Clone, Debug, Default, PartialEq, PartialOrd)]
pub struct Time(pub f64); // seconds

impl Time {
    pub const ZERO: Time = Time(0.0);

    pub fn seconds(self) -> f64 {
        self.0
    }

    /// Seconds elapsed since `earlier`, never negative.
    pub fn since(self, earlier: Time) -> f64 {
        (self.0 - earlier.0).max(0.0)
    }

    pub fn add_seconds(self, dt_s: f64) -> Time {
        Time(self.0 + dt_s)
    }
}

#[cfg(test)]
mod tests {
    use super::Time;

    #[test]
    fn since_clamps_to_zero() {
        assert_eq!(Time(3.0).since(Time(1.0)), 2.0);
        assert_eq!(Time(1.0).since(Time(3.0)), 0.0);
    }

    #[test]
    fn add_seconds_advances() {
        assert_eq!(Time::ZERO.add_seconds(0.5), Time(0.5));
    }
}
