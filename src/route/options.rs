/// Tuning parameters for the kinematic route driver.
///
/// Immutable once constructed; derive a modified copy with the `with_*`
/// methods when a test or session needs different limits.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReplayRouteOptions {
    /// Cruise speed on straight runs, meters per second.
    pub max_speed_mps: f64,
    /// Target speed through a 90 degree turn.
    pub turn_speed_mps: f64,
    /// Target speed through a turn of 150 degrees or more.
    pub u_turn_speed_mps: f64,
    /// Acceleration limit, meters per second squared. Positive.
    pub max_acceleration_mps2: f64,
    /// Braking limit, meters per second squared. Negative.
    pub min_acceleration_mps2: f64,
}

impl Default for ReplayRouteOptions {
    fn default() -> Self {
        Self {
            max_speed_mps: 30.0,
            turn_speed_mps: 3.0,
            u_turn_speed_mps: 1.0,
            max_acceleration_mps2: 4.0,
            min_acceleration_mps2: -4.0,
        }
    }
}

impl ReplayRouteOptions {
    pub fn with_max_speed_mps(mut self, value: f64) -> Self {
        self.max_speed_mps = value;
        self
    }

    pub fn with_turn_speed_mps(mut self, value: f64) -> Self {
        self.turn_speed_mps = value;
        self
    }

    pub fn with_u_turn_speed_mps(mut self, value: f64) -> Self {
        self.u_turn_speed_mps = value;
        self
    }

    pub fn with_max_acceleration_mps2(mut self, value: f64) -> Self {
        self.max_acceleration_mps2 = value;
        self
    }

    pub fn with_min_acceleration_mps2(mut self, value: f64) -> Self {
        self.min_acceleration_mps2 = value;
        self
    }
}
