// Hold ramp - Press-and-hold tempo acceleration
// A single polled state machine shared by the increase and decrease controls

/// Window during which a second activation does not apply its immediate step
pub const FIRST_STEP_DEBOUNCE_MS: f64 = 100.0;

/// Which way a tempo control moves the BPM
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    Increase,
    Decrease,
}

impl Direction {
    /// BPM change applied per step
    pub fn step(&self) -> i32 {
        match self {
            Direction::Increase => 1,
            Direction::Decrease => -1,
        }
    }
}

/// Repeat-rate tier of a held control
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RampTier {
    Normal,
    Fast,
    Fastest,
}

impl RampTier {
    /// Interval between repeated steps
    pub fn interval_ms(&self) -> f64 {
        match self {
            RampTier::Normal => 500.0,
            RampTier::Fast => 300.0,
            RampTier::Fastest => 200.0,
        }
    }

    /// Hold time after which this tier takes over
    pub fn starts_after_ms(&self) -> f64 {
        match self {
            RampTier::Normal => 0.0,
            RampTier::Fast => 3000.0,
            RampTier::Fastest => 5000.0,
        }
    }

    pub fn next(&self) -> Option<RampTier> {
        match self {
            RampTier::Normal => Some(RampTier::Fast),
            RampTier::Fast => Some(RampTier::Fastest),
            RampTier::Fastest => None,
        }
    }
}

/// Input device currently driving a control
///
/// Touch platforms emit a synthetic pointer event after each touch; whichever
/// source pressed first owns the control until it releases it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InputSource {
    #[default]
    None,
    Touch,
    Pointer,
}

#[derive(Debug, Clone, Copy)]
struct ActiveHold {
    pressed_at: f64,
    tier: RampTier,
    next_step_at: f64,
}

/// Press-and-hold state machine for one tempo control
#[derive(Debug, Clone)]
pub struct HoldRamp {
    direction: Direction,
    source: InputSource,
    hold: Option<ActiveHold>,
    last_first_step_at: Option<f64>,
}

impl HoldRamp {
    pub fn new(direction: Direction) -> Self {
        Self {
            direction,
            source: InputSource::None,
            hold: None,
            last_first_step_at: None,
        }
    }

    pub fn source(&self) -> InputSource {
        self.source
    }

    pub fn is_held(&self) -> bool {
        self.hold.is_some()
    }

    pub fn tier(&self) -> Option<RampTier> {
        self.hold.map(|hold| hold.tier)
    }

    /// Start holding the control
    /// Returns the number of immediate steps to apply (0 or 1)
    pub fn press(&mut self, now: f64, source: InputSource) -> u32 {
        if source == InputSource::None {
            return 0;
        }
        if self.source != InputSource::None && self.source != source {
            log::trace!(
                "{:?} press on {:?} ignored, control owned by {:?}",
                source,
                self.direction,
                self.source
            );
            return 0;
        }
        if self.hold.is_some() {
            return 0;
        }

        self.source = source;
        self.hold = Some(ActiveHold {
            pressed_at: now,
            tier: RampTier::Normal,
            next_step_at: now + RampTier::Normal.interval_ms(),
        });

        if self
            .last_first_step_at
            .is_some_and(|at| now - at < FIRST_STEP_DEBOUNCE_MS)
        {
            return 0;
        }
        self.last_first_step_at = Some(now);
        1
    }

    /// Advance the ramp to `now`
    /// Returns the timestamps of every step that became due, in order
    pub fn poll(&mut self, now: f64) -> Vec<f64> {
        let mut steps = Vec::new();
        let Some(hold) = self.hold.as_mut() else {
            return steps;
        };

        loop {
            let switch = hold
                .tier
                .next()
                .map(|tier| (tier, hold.pressed_at + tier.starts_after_ms()));

            match switch {
                // A tier switch fires its own step; a repeat landing on the same instant is absorbed
                Some((tier, at)) if at <= hold.next_step_at && at <= now => {
                    hold.tier = tier;
                    hold.next_step_at = at + tier.interval_ms();
                    steps.push(at);
                }
                _ if hold.next_step_at <= now => {
                    steps.push(hold.next_step_at);
                    hold.next_step_at += hold.tier.interval_ms();
                }
                _ => break,
            }
        }

        steps
    }

    /// Stop holding; only the owning source can release
    /// Returns true if the hold ended
    pub fn release(&mut self, source: InputSource) -> bool {
        if source != self.source {
            return false;
        }
        let was_held = self.hold.is_some();
        self.cancel();
        was_held
    }

    /// Drop the hold and ownership unconditionally
    pub fn cancel(&mut self) {
        self.hold = None;
        self.source = InputSource::None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hold_steps(ramp: &mut HoldRamp, until: f64) -> Vec<f64> {
        let mut steps = Vec::new();
        let mut now = 0.0;
        while now <= until {
            steps.extend(ramp.poll(now));
            now += 1.0;
        }
        steps
    }

    #[test]
    fn test_press_applies_immediate_step() {
        let mut ramp = HoldRamp::new(Direction::Increase);
        assert_eq!(ramp.press(0.0, InputSource::Pointer), 1);
        assert!(ramp.is_held());
        assert_eq!(ramp.tier(), Some(RampTier::Normal));
    }

    #[test]
    fn test_tier_schedule() {
        let mut ramp = HoldRamp::new(Direction::Increase);
        ramp.press(0.0, InputSource::Pointer);
        let steps = hold_steps(&mut ramp, 6000.0);

        let expected: Vec<f64> = vec![
            500.0, 1000.0, 1500.0, 2000.0, 2500.0, 3000.0, // normal, switch at 3000
            3300.0, 3600.0, 3900.0, 4200.0, 4500.0, 4800.0, // fast
            5000.0, 5200.0, 5400.0, 5600.0, 5800.0, 6000.0, // switch at 5000, fastest
        ];
        assert_eq!(steps, expected);
        assert_eq!(ramp.tier(), Some(RampTier::Fastest));
    }

    #[test]
    fn test_single_poll_catches_up() {
        let mut ramp = HoldRamp::new(Direction::Decrease);
        ramp.press(1000.0, InputSource::Touch);
        let steps = ramp.poll(4400.0);
        assert_eq!(steps, vec![1500.0, 2000.0, 2500.0, 3000.0, 3500.0, 4000.0, 4300.0]);
        assert_eq!(ramp.tier(), Some(RampTier::Fast));
    }

    #[test]
    fn test_release_stops_steps() {
        let mut ramp = HoldRamp::new(Direction::Increase);
        ramp.press(0.0, InputSource::Pointer);
        assert_eq!(ramp.poll(600.0).len(), 1);
        assert!(ramp.release(InputSource::Pointer));
        assert!(ramp.poll(10_000.0).is_empty());
        assert!(!ramp.is_held());
    }

    #[test]
    fn test_touch_suppresses_pointer() {
        let mut ramp = HoldRamp::new(Direction::Increase);
        assert_eq!(ramp.press(0.0, InputSource::Touch), 1);
        // Synthetic pointer duplicate of the same touch
        assert_eq!(ramp.press(5.0, InputSource::Pointer), 0);
        assert!(!ramp.release(InputSource::Pointer));
        assert!(ramp.is_held());
        assert!(ramp.release(InputSource::Touch));
        assert_eq!(ramp.source(), InputSource::None);
    }

    #[test]
    fn test_first_step_debounce() {
        let mut ramp = HoldRamp::new(Direction::Increase);
        assert_eq!(ramp.press(0.0, InputSource::Pointer), 1);
        ramp.release(InputSource::Pointer);

        // Rapid re-press inside the debounce window: hold starts, no immediate step
        assert_eq!(ramp.press(60.0, InputSource::Pointer), 0);
        assert!(ramp.is_held());
        ramp.release(InputSource::Pointer);

        assert_eq!(ramp.press(200.0, InputSource::Pointer), 1);
    }

    #[test]
    fn test_none_source_ignored() {
        let mut ramp = HoldRamp::new(Direction::Increase);
        assert_eq!(ramp.press(0.0, InputSource::None), 0);
        assert!(!ramp.is_held());
    }

    #[test]
    fn test_direction_step() {
        assert_eq!(Direction::Increase.step(), 1);
        assert_eq!(Direction::Decrease.step(), -1);
    }
}
