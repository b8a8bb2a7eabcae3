// Visual mapping - Beat phase to on-screen geometry
// Pure functions and a small latch; no drawing happens here

/// Dot scale before playback starts
pub const IDLE_SCALE: f64 = 1.0;
/// Dot scale outside the zoom arc
pub const REST_SCALE: f64 = 0.7;
/// Dot scale at the top of the cycle
pub const PEAK_SCALE: f64 = 0.9;

/// Position in percentage units of the face's bounding box
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DotPosition {
    pub x: f64,
    pub y: f64,
}

/// Point on the circle for a phase in degrees, 0° at the top, clockwise
pub fn circle_position(phase_degrees: f64) -> DotPosition {
    let theta = phase_degrees.to_radians();
    DotPosition {
        x: 50.0 + 50.0 * theta.sin(),
        y: 50.0 - 50.0 * theta.cos(),
    }
}

/// Tip of the pendulum arm, pivot at the bottom centre of the face
pub fn pendulum_tip(angle_degrees: f64, arm_length: f64) -> DotPosition {
    let theta = angle_degrees.to_radians();
    DotPosition {
        x: 50.0 + arm_length * theta.sin(),
        y: 100.0 - arm_length * theta.cos(),
    }
}

/// Zoom scale for the dot around the top of the cycle
///
/// The zoom only kicks in after the phase has reached 270° once since play
/// start, so the first beat after pressing play does not pulse.
#[derive(Debug, Clone, Default)]
pub struct ZoomLatch {
    playing: bool,
    reached_three_quarters: bool,
}

impl ZoomLatch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Arm the latch for a new play session
    pub fn start(&mut self) {
        self.playing = true;
        self.reached_three_quarters = false;
    }

    pub fn stop(&mut self) {
        self.playing = false;
        self.reached_three_quarters = false;
    }

    pub fn is_latched(&self) -> bool {
        self.reached_three_quarters
    }

    /// Feed the phase of the current frame and return the scale to draw with
    pub fn update(&mut self, phase_degrees: f64) -> f64 {
        if self.playing && phase_degrees >= 270.0 {
            self.reached_three_quarters = true;
        }
        self.scale(phase_degrees)
    }

    pub fn scale(&self, phase_degrees: f64) -> f64 {
        if !self.playing {
            return IDLE_SCALE;
        }
        if !self.reached_three_quarters {
            return REST_SCALE;
        }

        let span = PEAK_SCALE - REST_SCALE;
        if phase_degrees >= 270.0 {
            REST_SCALE + span * (phase_degrees - 270.0) / 90.0
        } else if phase_degrees <= 90.0 {
            PEAK_SCALE - span * phase_degrees / 90.0
        } else {
            REST_SCALE
        }
    }
}
