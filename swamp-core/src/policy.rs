//! Control policy
//!
//! Runs the four-state machine against the controller I/O. One call to
//! [`ControlPolicy::step`] is one iteration of the active state's loop:
//!
//! 1. On the first iteration of a state, run its entry actions.
//! 2. Run the loop body: Disabled polls only the button; every other state
//!    samples both sensors, redraws the display and polls the button.
//! 3. Evaluate the transition guards on what was just observed.
//! 4. On a transition, run the exit actions of the old state, then the
//!    entry actions of the new one.
//!
//! | State | Entry | Exit |
//! |---|---|---|
//! | Disabled | yellow LED on | yellow LED off |
//! | Idle | green LED on | green LED off |
//! | Running | blue LED and motor on, log "motor turned on" | blue LED and motor off, log "motor turned off" |
//! | Error | red LED on, draw the `error` overlay | red LED off |

use core::fmt::Write;

use heapless::String;

use crate::config::Settings;
use crate::display::DisplayFrame;
use crate::reading::SensorReading;
use crate::state::{ControlState, MotorEvent, Observation};
use crate::traits::{Clock, ControllerIo, LogSink};

/// Longest motor event log line
pub const LOG_LINE_LEN: usize = 64;

/// Text logged in place of the timestamp when the clock cannot be read
pub const TIME_UNAVAILABLE: &str = "time unavailable";

/// The controller's state machine bound to its collaborators
pub struct ControlPolicy<IO, C, L> {
    io: IO,
    clock: C,
    log: L,
    settings: Settings,
    state: ControlState,
    /// Entry actions of `state` have run
    entered: bool,
    last_reading: Option<SensorReading>,
}

impl<IO, C, L> ControlPolicy<IO, C, L>
where
    IO: ControllerIo,
    C: Clock,
    L: LogSink,
{
    /// Create a policy starting in Disabled
    ///
    /// Nothing is driven until the first [`step`](Self::step).
    pub fn new(io: IO, clock: C, log: L, settings: Settings) -> Self {
        Self {
            io,
            clock,
            log,
            settings,
            state: ControlState::Disabled,
            entered: false,
            last_reading: None,
        }
    }

    /// Start from a stored state code instead (unknown codes mean Disabled)
    pub fn starting_from(mut self, code: u8) -> Self {
        self.state = ControlState::from_code(code);
        self.entered = false;
        self
    }

    /// Current state
    pub fn state(&self) -> ControlState {
        self.state
    }

    /// Reading taken by the most recent sampling iteration
    pub fn last_reading(&self) -> Option<SensorReading> {
        self.last_reading
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn io(&self) -> &IO {
        &self.io
    }

    pub fn io_mut(&mut self) -> &mut IO {
        &mut self.io
    }

    pub fn clock_mut(&mut self) -> &mut C {
        &mut self.clock
    }

    pub fn log(&self) -> &L {
        &self.log
    }

    /// Run one loop iteration and return the state for the next one
    pub fn step(&mut self) -> ControlState {
        if !self.entered {
            self.enter(self.state);
            self.entered = true;
        }

        let observation = self.observe();
        let next = self
            .state
            .transition(&observation, &self.settings.thresholds);

        if next != self.state {
            log_info!("state {:?} -> {:?}", self.state, next);
            self.exit(self.state);
            self.state = next;
            self.enter(next);
        }

        next
    }

    /// Run forever
    pub fn run(&mut self) -> ! {
        loop {
            self.step();
        }
    }

    fn observe(&mut self) -> Observation {
        if !self.state.samples_sensors() {
            return Observation::button(self.io.button_pressed());
        }

        let water_level = self.io.read_water();
        let temperature_c = match self.io.read_temperature() {
            Ok(t) => Some(t),
            Err(e) => {
                log_warn!("temperature read failed: {:?}", e);
                None
            }
        };
        let reading = SensorReading::new(temperature_c, water_level);
        self.last_reading = Some(reading);

        self.io
            .show(&DisplayFrame::compose(&reading, self.state.shows_error()));

        Observation::with_reading(reading, self.io.button_pressed())
    }

    fn enter(&mut self, state: ControlState) {
        self.io.set_indicator(state.indicator(), true);

        match state {
            ControlState::Running => {
                self.io.set_motor(true);
                self.log_motor(MotorEvent::On);
            }
            ControlState::Error => {
                if let Some(reading) = self.last_reading {
                    self.io.show(&DisplayFrame::compose(&reading, true));
                }
            }
            ControlState::Disabled | ControlState::Idle => {}
        }
    }

    fn exit(&mut self, state: ControlState) {
        self.io.set_indicator(state.indicator(), false);

        if state.motor_on() {
            self.io.set_motor(false);
            self.log_motor(MotorEvent::Off);
        }
    }

    fn log_motor(&mut self, event: MotorEvent) {
        let mut line: String<LOG_LINE_LEN> = String::new();

        let written = match self.clock.now() {
            Ok(utc) => write!(
                line,
                "{} {}",
                utc.to_local(self.settings.utc_offset_hours),
                event.message()
            ),
            Err(e) => {
                log_warn!("clock read failed: {:?}", e);
                write!(line, "{} {}", TIME_UNAVAILABLE, event.message())
            }
        };
        if written.is_err() {
            log_warn!("motor event line truncated to {} bytes", LOG_LINE_LEN);
        }

        log_debug!("motor event {:?}", event);
        self.log.log_line(&line);
    }
}
