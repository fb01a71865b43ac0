//! RTC Driver Tests
//!
//! Register block packing and full bus transactions for both modules.
//! Run with: cargo test --features std --test rtc_tests

use hwclock_firmware::drivers::rtc::{
    decode, encode, Chip, ExternalRtc, RtcError, BLOCK_LEN, DS3231, PCF8563,
};
use hwclock_firmware::hal::sim::{Access, ScriptedRegisters};
use hwclock_firmware::hal::twsi::{Error, Master, MasterConfig, Phase, WaitLimit};
use hwclock_firmware::types::{DateTime, DateTimeError};

fn example() -> DateTime {
    DateTime::new(2022, 4, 7, 8, 30, 0).unwrap()
}

fn master(statuses: &[u8]) -> Master<ScriptedRegisters> {
    Master::new(
        ScriptedRegisters::with_statuses(statuses),
        MasterConfig::default(),
    )
}

/// Pointer write, repeated START, seven-byte read
fn read_script() -> Vec<u8> {
    let mut statuses = vec![0x08, 0x18, 0x28, 0x10, 0x40];
    statuses.extend([0x50; 6]);
    statuses.push(0x58);
    statuses
}

/// Pointer plus seven registers, all acknowledged
fn write_script() -> Vec<u8> {
    let mut statuses = vec![0x08, 0x18];
    statuses.extend([0x28; 8]);
    statuses
}

// =============================================================================
// Layout Tests
// =============================================================================

#[test]
fn test_layout_addresses() {
    assert_eq!(PCF8563.address, 0x51);
    assert_eq!(PCF8563.first_register, 0x02);
    assert_eq!(DS3231.address, 0x68);
    assert_eq!(DS3231.first_register, 0x00);
}

#[test]
fn test_chip_layouts() {
    assert_eq!(Chip::Pcf8563.layout(), &PCF8563);
    assert_eq!(Chip::Ds3231.layout(), &DS3231);
    assert_eq!(Chip::Pcf8563.driver().layout().name, "MOD-RTC");
    assert_eq!(Chip::Ds3231.driver().layout().name, "MOD-RTC2");
}

#[test]
fn test_layout_offsets_cover_block() {
    for layout in [&PCF8563, &DS3231] {
        let mut offsets = [
            layout.second,
            layout.minute,
            layout.hour,
            layout.day,
            layout.weekday,
            layout.month,
            layout.year,
        ];
        offsets.sort_unstable();
        assert_eq!(offsets, [0, 1, 2, 3, 4, 5, 6], "{}", layout.name);
    }
}

// =============================================================================
// Encode / Decode Tests
// =============================================================================

#[test]
fn test_encode_pcf8563_order() {
    assert_eq!(
        encode(&PCF8563, &example()),
        [0x00, 0x30, 0x08, 0x07, 0x04, 0x04, 0x22]
    );
}

#[test]
fn test_encode_ds3231_swaps_day_and_weekday() {
    assert_eq!(
        encode(&DS3231, &example()),
        [0x00, 0x30, 0x08, 0x04, 0x07, 0x04, 0x22]
    );
}

#[test]
fn test_encode_weekday_sunday_is_zero() {
    let dt = DateTime::new(2023, 1, 1, 0, 0, 0).unwrap();
    assert_eq!(encode(&PCF8563, &dt)[PCF8563.weekday], 0);
}

#[test]
fn test_decode_inverts_encode() {
    let dt = DateTime::new(2031, 12, 25, 23, 59, 58).unwrap();
    for layout in [&PCF8563, &DS3231] {
        assert_eq!(decode(layout, &encode(layout, &dt)), Ok(dt));
    }
}

#[test]
fn test_decode_masks_control_bits() {
    // VL set in seconds, century set in month
    let block = [0xC5, 0x30, 0x08, 0x07, 0x04, 0x84, 0x22];
    let dt = decode(&PCF8563, &block).unwrap();
    assert_eq!(dt.second(), 45);
    assert_eq!(dt.month(), 4);
    assert_eq!(dt.year(), 2022);
}

#[test]
fn test_decode_ignores_chip_weekday() {
    let mut block = encode(&DS3231, &example());
    block[DS3231.weekday] = 0x06;
    assert_eq!(decode(&DS3231, &block), Ok(example()));
}

#[test]
fn test_year_outside_century_wraps() {
    let dt = DateTime::new(1999, 6, 1, 0, 0, 0).unwrap();
    let block = encode(&PCF8563, &dt);
    assert_eq!(block[PCF8563.year], 0x99);
    assert_eq!(decode(&PCF8563, &block).unwrap().year(), 2099);
}

#[test]
fn test_decode_rejects_garbage() {
    let block = [0x00, 0x00, 0x00, 0x01, 0x00, 0x13, 0x22];
    assert_eq!(
        decode(&PCF8563, &block),
        Err(RtcError::InvalidData(DateTimeError::Month))
    );
    let block = [0x00, 0x00, 0x00, 0x00, 0x01, 0x01, 0x22];
    assert_eq!(
        decode(&PCF8563, &block),
        Err(RtcError::InvalidData(DateTimeError::Day))
    );
}

// =============================================================================
// Bus Transaction Tests
// =============================================================================

#[test]
fn test_write_pcf8563() {
    let mut m = master(&write_script());
    let rtc = ExternalRtc::new(&PCF8563);
    rtc.write_registers(&mut m, &example()).unwrap();

    assert_eq!(
        m.registers().sent(),
        vec![0xA2, 0x02, 0x00, 0x30, 0x08, 0x07, 0x04, 0x04, 0x22]
    );
    assert_eq!(m.phase(), Phase::StopSent);
    assert!(!m.registers().flag_raised());
}

#[test]
fn test_write_ds3231() {
    let mut m = master(&write_script());
    Chip::Ds3231
        .driver()
        .write_registers(&mut m, &example())
        .unwrap();
    assert_eq!(
        m.registers().sent(),
        vec![0xD0, 0x00, 0x00, 0x30, 0x08, 0x04, 0x07, 0x04, 0x22]
    );
}

#[test]
fn test_every_call_reinitialises() {
    let mut m = master(&write_script());
    Chip::Pcf8563
        .driver()
        .write_registers(&mut m, &example())
        .unwrap();
    assert_eq!(m.registers().log()[0], Access::WriteControl(0));
    assert_eq!(m.registers().log()[1], Access::SoftwareReset);
}

#[test]
fn test_read_pcf8563() {
    let mut m = master(&read_script());
    m.registers()
        .push_rx(&[0x00, 0x30, 0x08, 0x07, 0x04, 0x04, 0x22]);
    let dt = Chip::Pcf8563.driver().read_registers(&mut m).unwrap();
    assert_eq!(dt, example());
    assert_eq!(m.registers().sent(), vec![0xA2, 0x02, 0xA3]);
    assert_eq!(m.registers().remaining(), 0);
    assert_eq!(m.phase(), Phase::StopSent);
}

#[test]
fn test_read_ds3231() {
    let mut m = master(&read_script());
    m.registers()
        .push_rx(&[0x00, 0x30, 0x08, 0x04, 0x07, 0x04, 0x22]);
    let dt = Chip::Ds3231.driver().read_registers(&mut m).unwrap();
    assert_eq!(dt, example());
    assert_eq!(m.registers().sent(), vec![0xD0, 0x00, 0xD1]);
}

#[test]
fn test_write_then_read_back() {
    let mut m = master(&write_script());
    let rtc = Chip::Ds3231.driver();
    rtc.write_registers(&mut m, &example()).unwrap();

    let written = encode(&DS3231, &example());
    m.registers().push_statuses(&read_script());
    m.registers().push_rx(&written);
    assert_eq!(rtc.read_registers(&mut m), Ok(example()));
}

#[test]
fn test_write_short_when_nacked() {
    let mut m = master(&[0x08, 0x18, 0x28, 0x28, 0x30]);
    let err = Chip::Pcf8563
        .driver()
        .write_registers(&mut m, &example())
        .unwrap_err();
    assert_eq!(
        err,
        RtcError::Short {
            expected: 1 + BLOCK_LEN,
            actual: 3
        }
    );
    assert_eq!(m.phase(), Phase::StopSent);
}

#[test]
fn test_read_absent_module() {
    let mut m = master(&[0x08, 0x20]);
    assert_eq!(
        Chip::Ds3231.driver().read_registers(&mut m),
        Err(RtcError::Bus(Error::BusStatus(0x20)))
    );
    assert_eq!(m.phase(), Phase::StopSent);
}

#[test]
fn test_read_stalled_bus_times_out() {
    let mut m = master(&[]);
    m.set_wait_limit(WaitLimit::Spins(5));
    assert_eq!(
        Chip::Pcf8563.driver().read_registers(&mut m),
        Err(RtcError::Bus(Error::TimedOut))
    );
}

#[test]
fn test_rtc_error_display() {
    let err = RtcError::Short {
        expected: 8,
        actual: 3,
    };
    assert_eq!(err.to_string(), "transferred 3 of 8 bytes");
}

// =============================================================================
// Oscillator Flag Tests
// =============================================================================

#[test]
fn test_pcf8563_voltage_low_flag() {
    let mut m = master(&[0x08, 0x18, 0x28, 0x10, 0x40, 0x58]);
    m.registers().push_rx(&[0x80 | 0x12]);
    assert_eq!(
        Chip::Pcf8563.driver().oscillator_stopped(&mut m),
        Ok(true)
    );
    assert_eq!(m.registers().sent(), vec![0xA2, 0x02, 0xA3]);
}

#[test]
fn test_ds3231_oscillator_running() {
    let mut m = master(&[0x08, 0x18, 0x28, 0x10, 0x40, 0x58]);
    m.registers().push_rx(&[0x08]);
    assert_eq!(Chip::Ds3231.driver().oscillator_stopped(&mut m), Ok(false));
    assert_eq!(m.registers().sent(), vec![0xD0, 0x0F, 0xD1]);
}
