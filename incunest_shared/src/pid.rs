// PID controller driving the incubator heater

#[derive(Debug, Clone, PartialEq)]
pub struct PidController {
    /// PID parameters
    pub kp: f64,
    pub ki: f64,
    pub kd: f64,

    /// PID state
    pub integral: f64,
    pub last_error: f64,

    /// Optional symmetric anti-windup bound on the integral term
    pub integral_limit: Option<f64>,
}

impl PidController {
    pub fn new(kp: f64, ki: f64, kd: f64) -> Self {
        Self {
            kp,
            ki,
            kd,
            integral: 0.0,
            last_error: 0.0,
            integral_limit: None,
        }
    }

    pub fn with_integral_limit(mut self, limit: f64) -> Self {
        self.integral_limit = Some(limit.abs());
        self
    }

    /// Calculate the control output for `error` over an interval of `dt` seconds.
    ///
    /// The output is unbounded; callers decide how to map it onto an actuator.
    /// A zero-length interval contributes no derivative term.
    pub fn output(&mut self, error: f64, dt: f64) -> f64 {
        let dt = dt.max(0.0);
        self.integral += error * dt;
        if let Some(limit) = self.integral_limit {
            self.integral = self.integral.clamp(-limit, limit);
        }
        let derivative = if dt > 0.0 {
            (error - self.last_error) / dt
        } else {
            0.0
        };
        self.last_error = error;
        self.kp * error + self.ki * self.integral + self.kd * derivative
    }

    /// Reset PID accumulators
    pub fn reset(&mut self) {
        self.integral = 0.0;
        self.last_error = 0.0;
    }
}
