//! State machine definition
//!
//! LED, motor and display behavior is a function of the current state; the
//! transition is a function of the state and what was observed this
//! iteration.

use crate::config::Thresholds;
use crate::reading::SensorReading;
use crate::traits::Indicator;

/// Controller states
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ControlState {
    /// Motor off, sensors ignored, waiting for the button
    #[default]
    Disabled,
    /// Monitoring, motor off
    Idle,
    /// Motor on
    Running,
    /// Water too low; outputs off until it recovers
    Error,
}

/// What the controller saw during one loop iteration
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Observation {
    /// Fresh sensor values; `None` in states that do not sample
    pub reading: Option<SensorReading>,
    /// Debounced button press
    pub button: bool,
}

impl Observation {
    /// Button-only observation (Disabled)
    pub fn button(pressed: bool) -> Self {
        Self {
            reading: None,
            button: pressed,
        }
    }

    /// Full observation
    pub fn with_reading(reading: SensorReading, pressed: bool) -> Self {
        Self {
            reading: Some(reading),
            button: pressed,
        }
    }
}

impl ControlState {
    /// Every state, in code order
    pub const ALL: [ControlState; 4] = [
        ControlState::Disabled,
        ControlState::Idle,
        ControlState::Running,
        ControlState::Error,
    ];

    /// Decode a stored state code
    ///
    /// Unknown codes fall back to [`ControlState::Disabled`].
    pub fn from_code(code: u8) -> Self {
        match code {
            b'I' => ControlState::Idle,
            b'R' => ControlState::Running,
            b'E' => ControlState::Error,
            _ => ControlState::Disabled,
        }
    }

    /// One-letter state code
    pub fn code(self) -> u8 {
        match self {
            ControlState::Disabled => b'D',
            ControlState::Idle => b'I',
            ControlState::Running => b'R',
            ControlState::Error => b'E',
        }
    }

    /// Status LED lit while in this state
    pub fn indicator(self) -> Indicator {
        match self {
            ControlState::Disabled => Indicator::Yellow,
            ControlState::Idle => Indicator::Green,
            ControlState::Running => Indicator::Blue,
            ControlState::Error => Indicator::Red,
        }
    }

    /// Check if the motor runs in this state
    pub fn motor_on(self) -> bool {
        matches!(self, ControlState::Running)
    }

    /// Check if this state samples the sensors and refreshes the display
    pub fn samples_sensors(self) -> bool {
        !matches!(self, ControlState::Disabled)
    }

    /// Check if the display carries the error overlay
    pub fn shows_error(self) -> bool {
        matches!(self, ControlState::Error)
    }

    /// Evaluate the transition guards
    ///
    /// Guards are checked in order and the first true one wins. The button
    /// is always the last guard. A missing temperature makes the
    /// temperature guards false.
    pub fn transition(self, observation: &Observation, thresholds: &Thresholds) -> Self {
        use ControlState::*;

        let water = observation.reading.map(|r| r.water_level);
        let temperature = observation.reading.and_then(|r| r.temperature_c);

        let water_low = water.is_some_and(|w| thresholds.water_low(w));
        let water_recovered = water.is_some_and(|w| thresholds.water_recovered(w));
        let too_hot = temperature.is_some_and(|t| thresholds.too_hot(t));
        let cooled = temperature.is_some_and(|t| thresholds.cooled(t));

        match self {
            Disabled if observation.button => Idle,
            Disabled => Disabled,

            Idle if water_low => Error,
            Idle if too_hot => Running,
            Idle if observation.button => Disabled,
            Idle => Idle,

            Running if water_low => Error,
            Running if cooled => Idle,
            Running if observation.button => Disabled,
            Running => Running,

            Error if water_recovered => Idle,
            Error if observation.button => Disabled,
            Error => Error,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn seen(temperature: f32, water: u16, button: bool) -> Observation {
        Observation::with_reading(SensorReading::new(Some(temperature), water), button)
    }

    #[test]
    fn test_codes() {
        for state in ControlState::ALL {
            assert_eq!(ControlState::from_code(state.code()), state);
        }
        assert_eq!(ControlState::from_code(b'X'), ControlState::Disabled);
        assert_eq!(ControlState::from_code(0), ControlState::Disabled);
        assert_eq!(ControlState::default(), ControlState::Disabled);
    }

    #[test]
    fn test_disabled_only_leaves_on_button() {
        let t = Thresholds::default();
        let s = ControlState::Disabled;

        assert_eq!(s.transition(&Observation::button(false), &t), s);
        assert_eq!(s.transition(&seen(40.0, 0, false), &t), s);
        assert_eq!(
            s.transition(&Observation::button(true), &t),
            ControlState::Idle
        );
    }

    #[test]
    fn test_idle_guards() {
        let t = Thresholds::default();
        let s = ControlState::Idle;

        assert_eq!(s.transition(&seen(18.0, 300, false), &t), ControlState::Idle);
        assert_eq!(
            s.transition(&seen(25.0, 300, false), &t),
            ControlState::Running
        );
        assert_eq!(
            s.transition(&seen(18.0, 300, true), &t),
            ControlState::Disabled
        );
        // Water fault beats everything else
        assert_eq!(s.transition(&seen(25.0, 100, true), &t), ControlState::Error);
        // Hot beats the button
        assert_eq!(
            s.transition(&seen(25.0, 300, true), &t),
            ControlState::Running
        );
    }

    #[test]
    fn test_running_guards() {
        let t = Thresholds::default();
        let s = ControlState::Running;

        assert_eq!(
            s.transition(&seen(25.0, 300, false), &t),
            ControlState::Running
        );
        assert_eq!(s.transition(&seen(20.0, 300, false), &t), ControlState::Idle);
        // Low water is the fault in Running too
        assert_eq!(s.transition(&seen(25.0, 100, false), &t), ControlState::Error);
        assert_eq!(
            s.transition(&seen(25.0, 300, true), &t),
            ControlState::Disabled
        );
    }

    #[test]
    fn test_error_guards() {
        let t = Thresholds::default();
        let s = ControlState::Error;

        assert_eq!(s.transition(&seen(25.0, 100, false), &t), ControlState::Error);
        assert_eq!(s.transition(&seen(25.0, 170, false), &t), ControlState::Idle);
        assert_eq!(s.transition(&seen(25.0, 200, true), &t), ControlState::Idle);
        assert_eq!(
            s.transition(&seen(25.0, 100, true), &t),
            ControlState::Disabled
        );
    }

    #[test]
    fn test_missing_temperature_disables_temperature_guards() {
        let t = Thresholds::default();
        let reading = SensorReading::new(None, 300);

        assert_eq!(
            ControlState::Idle.transition(&Observation::with_reading(reading, false), &t),
            ControlState::Idle
        );
        assert_eq!(
            ControlState::Running.transition(&Observation::with_reading(reading, false), &t),
            ControlState::Running
        );
        assert_eq!(
            ControlState::Running.transition(&Observation::with_reading(reading, true), &t),
            ControlState::Disabled
        );
    }

    #[test]
    fn test_running_exit_hysteresis() {
        let t = Thresholds::with_hysteresis(20.0, 170, 2.0, 0).unwrap();

        assert_eq!(
            ControlState::Running.transition(&seen(19.0, 300, false), &t),
            ControlState::Running
        );
        assert_eq!(
            ControlState::Running.transition(&seen(18.0, 300, false), &t),
            ControlState::Idle
        );
    }

    #[test]
    fn test_one_indicator_per_state() {
        for (i, a) in ControlState::ALL.iter().enumerate() {
            for b in &ControlState::ALL[i + 1..] {
                assert_ne!(a.indicator(), b.indicator());
            }
        }
        assert!(ControlState::Running.motor_on());
        assert!(!ControlState::Error.motor_on());
        assert!(!ControlState::Disabled.samples_sensors());
    }

    proptest! {
        #[test]
        fn prop_dispatch_is_total(
            code in any::<u8>(),
            temperature in proptest::option::of(-40.0f32..80.0),
            water in 0u16..=1023,
            button in any::<bool>(),
        ) {
            let state = ControlState::from_code(code);
            if !b"DIRE".contains(&code) {
                prop_assert_eq!(state, ControlState::Disabled);
            }

            let observation = Observation::with_reading(SensorReading::new(temperature, water), button);
            let next = state.transition(&observation, &Thresholds::default());
            prop_assert!(ControlState::ALL.contains(&next));
        }

        #[test]
        fn prop_low_water_always_faults(
            code in prop::sample::select(b"IR".to_vec()),
            temperature in -40.0f32..80.0,
            water in 0u16..170,
            button in any::<bool>(),
        ) {
            let next = ControlState::from_code(code)
                .transition(&seen(temperature, water, button), &Thresholds::default());
            prop_assert_eq!(next, ControlState::Error);
        }
    }
}
