//! End-to-end controller scenarios
//!
//! The policy runs on the real drivers against one simulated register file:
//! DHT11 on its single-wire line, water probe on ADC0, DS1307 behind the TWI
//! master, motor log on USART0 and the status screen on the LCD bus.

use swamp_core::{ControlPolicy, ControlState, DateTime, Settings};
use swamp_drivers::panel::{assemble, SwampPanel};
use swamp_drivers::rtc::ds1307::{encode, ADDRESS};
use swamp_drivers::twi::STANDARD_HZ;
use swamp_drivers::{Ds1307, Twi, Usart0};
use swamp_hal::sim::SimRegisters;
use swamp_hal::{LineMap, Register};

const YELLOW: u8 = 1 << 7;
const GREEN: u8 = 1 << 6;
const BLUE: u8 = 1 << 5;
const RED: u8 = 1 << 4;
const MOTOR: u8 = 1 << 0;

/// 18.0 °C, the initial DHT11 frame
const COOL: [u8; 5] = [40, 0, 18, 0, 58];
/// 25.0 °C
const HOT: [u8; 5] = [40, 0, 25, 0, 65];

type Policy<'a> = ControlPolicy<
    SwampPanel<&'a SimRegisters>,
    Ds1307<Twi<&'a SimRegisters>>,
    Usart0<&'a SimRegisters>,
>;

fn controller(sim: &SimRegisters) -> Policy<'_> {
    // 21:05:09 UTC, 1:05:09 pm at UTC-8
    let utc = DateTime::new(2023, 7, 4, 21, 5, 9).unwrap();
    controller_with_clock(sim, &encode(&utc).unwrap())
}

fn controller_with_clock<'a>(sim: &'a SimRegisters, clock_memory: &[u8]) -> Policy<'a> {
    let map = LineMap::MEGA2560;
    let settings = Settings::default();

    sim.attach_i2c_target(ADDRESS, clock_memory);
    sim.attach_single_wire_sensor(map.temperature_data, COOL);
    sim.set_analog(map.water_channel, 300);

    let panel = assemble(sim, map, &settings).unwrap();
    let clock = Ds1307::new(Twi::new(sim, STANDARD_HZ));
    let log = Usart0::new(sim, settings.serial_baud);

    ControlPolicy::new(panel, clock, log, settings)
}

fn leds(sim: &SimRegisters) -> u8 {
    sim.peek(Register::Porta) & (YELLOW | GREEN | BLUE | RED)
}

fn motor(sim: &SimRegisters) -> bool {
    sim.peek(Register::Portb) & MOTOR != 0
}

fn press(sim: &SimRegisters, pressed: bool) {
    let button = LineMap::MEGA2560.button;
    if pressed {
        sim.drive_input(button, false);
    } else {
        sim.release_input(button);
    }
}

/// Character cells as the LCD controller would hold them
///
/// Replays the PORTC trace: each falling Enable edge latches one nibble,
/// high nibble first.
fn glass(sim: &SimRegisters) -> [String; 2] {
    const E: u8 = 1 << 1;
    const RS: u8 = 1 << 0;

    let mut cells = [[b' '; 16]; 2];
    let mut address = 0u8;
    let mut prev = 0u8;
    let mut latched = 0u8;
    let mut pending: Option<u8> = None;

    for write in sim.writes_to(Register::Portc) {
        if prev & E != 0 && write.value & E == 0 {
            let nibble = latched >> 4;
            let data = latched & RS != 0;

            match pending.take() {
                None => pending = Some(nibble),
                Some(high) => {
                    let byte = (high << 4) | nibble;
                    if data {
                        let row = usize::from(address >= 0x40);
                        let col = usize::from(address & 0x3F);
                        if col < 16 {
                            cells[row][col] = byte;
                        }
                        address = address.wrapping_add(1);
                    } else if byte & 0x80 != 0 {
                        address = byte & 0x7F;
                    } else if byte == 0x01 {
                        cells = [[b' '; 16]; 2];
                        address = 0;
                    }
                }
            }
        }
        if write.value & E != 0 {
            latched = write.value;
        }
        prev = write.value;
    }

    cells.map(|row| String::from_utf8_lossy(&row).into_owned())
}

/// Drive the controller to Running with the log cleared
fn running(sim: &SimRegisters) -> Policy<'_> {
    let mut policy = controller(sim);
    press(sim, true);
    policy.step();
    press(sim, false);
    sim.set_single_wire_frame(HOT);
    policy.step();
    assert_eq!(policy.state(), ControlState::Running);
    sim.clear_serial();
    policy
}

#[test]
fn test_button_enables_controller() {
    let sim = SimRegisters::new();
    let mut policy = controller(&sim);

    assert_eq!(policy.step(), ControlState::Disabled);
    assert_eq!(leds(&sim), YELLOW);

    press(&sim, true);
    assert_eq!(policy.step(), ControlState::Idle);

    assert_eq!(leds(&sim), GREEN);
    assert!(!motor(&sim));
    assert!(sim.serial_text().is_empty());
}

#[test]
fn test_heat_starts_motor_and_logs() {
    let sim = SimRegisters::new();
    let mut policy = controller(&sim);
    press(&sim, true);
    policy.step();
    press(&sim, false);

    assert_eq!(policy.step(), ControlState::Idle);
    assert!(!motor(&sim));

    sim.set_single_wire_frame(HOT);
    assert_eq!(policy.step(), ControlState::Running);

    assert_eq!(leds(&sim), BLUE);
    assert!(motor(&sim));
    assert_eq!(
        sim.serial_text(),
        "Tuesday 7/4/2023 1:5:9 pm motor turned on\r\n"
    );

    let [top, bottom] = glass(&sim);
    assert_eq!(top, "wtr:  300       ");
    assert_eq!(bottom, "temp:25.0C      ");
}

#[test]
fn test_low_water_while_running_is_an_error() {
    let sim = SimRegisters::new();
    let mut policy = running(&sim);

    sim.set_analog(LineMap::MEGA2560.water_channel, 100);
    assert_eq!(policy.step(), ControlState::Error);

    assert_eq!(leds(&sim), RED);
    assert!(!motor(&sim));
    assert_eq!(
        sim.serial_text(),
        "Tuesday 7/4/2023 1:5:9 pm motor turned off\r\n"
    );

    let [top, bottom] = glass(&sim);
    assert_eq!(top, "wtr:  100  error");
    assert_eq!(bottom, "temp:25.0C      ");
}

#[test]
fn test_water_recovery_returns_to_idle() {
    let sim = SimRegisters::new();
    let mut policy = running(&sim);
    sim.set_analog(LineMap::MEGA2560.water_channel, 100);
    assert_eq!(policy.step(), ControlState::Error);
    // Leaving Running logged the motor stop
    sim.clear_serial();

    // Still low, stays in Error with the overlay
    assert_eq!(policy.step(), ControlState::Error);
    assert!(glass(&sim)[0].ends_with("error"));

    sim.set_analog(LineMap::MEGA2560.water_channel, 200);
    assert_eq!(policy.step(), ControlState::Idle);

    assert_eq!(leds(&sim), GREEN);
    assert!(!motor(&sim));
    // Only the motor writes to the log
    assert!(sim.serial_text().is_empty());
}

#[test]
fn test_missing_clock_still_logs_event() {
    let sim = SimRegisters::new();
    // Oscillator halted
    let mut policy = controller_with_clock(&sim, &[0x80]);

    press(&sim, true);
    policy.step();
    press(&sim, false);
    sim.set_single_wire_frame(HOT);

    assert_eq!(policy.step(), ControlState::Running);
    assert_eq!(sim.serial_text(), "time unavailable motor turned on\r\n");
}

#[test]
fn test_unplugged_sensor_keeps_idle() {
    let sim = SimRegisters::new();
    let map = LineMap::MEGA2560;
    sim.set_analog(map.water_channel, 300);
    let panel = assemble(&sim, map, &Settings::default()).unwrap();
    let clock = Ds1307::new(Twi::new(&sim, STANDARD_HZ));
    let log = Usart0::new(&sim, 9600);
    let mut policy =
        ControlPolicy::new(panel, clock, log, Settings::default()).starting_from(b'I');

    assert_eq!(policy.step(), ControlState::Idle);
    assert_eq!(policy.last_reading().unwrap().temperature_c, None);
    assert_eq!(glass(&sim)[1], "temp:--         ");
}
