//! I2C Abstraction Tests
//!
//! The embedded-hal adapter and the register-pointer helpers.
//! Run with: cargo test --features std --test i2c_tests

use embedded_hal::i2c::{Error as _, ErrorKind, I2c, NoAcknowledgeSource, Operation};
use hwclock_firmware::hal::i2c::MAX_BLOCK;
use hwclock_firmware::hal::sim::ScriptedRegisters;
use hwclock_firmware::hal::twsi::{Error, Master, MasterConfig, Phase};

fn master(statuses: &[u8]) -> Master<ScriptedRegisters> {
    let mut m = Master::new(
        ScriptedRegisters::with_statuses(statuses),
        MasterConfig::default(),
    );
    m.init(0, false).unwrap();
    m
}

fn write_script(bytes: usize) -> Vec<u8> {
    let mut statuses = vec![0x08, 0x18];
    statuses.extend(std::iter::repeat(0x28).take(bytes));
    statuses
}

// =============================================================================
// Error Kind Tests
// =============================================================================

#[test]
fn test_error_kinds() {
    assert_eq!(
        Error::BusStatus(0x20).kind(),
        ErrorKind::NoAcknowledge(NoAcknowledgeSource::Address)
    );
    assert_eq!(
        Error::BusStatus(0x48).kind(),
        ErrorKind::NoAcknowledge(NoAcknowledgeSource::Address)
    );
    assert_eq!(
        Error::BusStatus(0x30).kind(),
        ErrorKind::NoAcknowledge(NoAcknowledgeSource::Data)
    );
    assert_eq!(Error::BusStatus(0x38).kind(), ErrorKind::ArbitrationLoss);
    assert_eq!(Error::BusStatus(0x00).kind(), ErrorKind::Bus);
    assert_eq!(
        Error::ShortTransfer {
            expected: 4,
            actual: 2
        }
        .kind(),
        ErrorKind::NoAcknowledge(NoAcknowledgeSource::Data)
    );
    assert_eq!(Error::TimedOut.kind(), ErrorKind::Other);
    assert_eq!(Error::InvalidState.kind(), ErrorKind::Other);
}

// =============================================================================
// embedded-hal I2c Tests
// =============================================================================

#[test]
fn test_hal_write_releases_bus() {
    let mut m = master(&write_script(2));
    I2c::write(&mut m, 0x51, &[0x02, 0x45]).unwrap();
    assert_eq!(m.phase(), Phase::StopSent);
    assert_eq!(m.registers().sent(), vec![0xA2, 0x02, 0x45]);
}

#[test]
fn test_hal_write_read_uses_repeated_start() {
    let mut statuses = write_script(1);
    statuses.extend([0x10, 0x40, 0x50, 0x50, 0x58]);
    let mut m = master(&statuses);
    m.registers().push_rx(&[0x01, 0x02, 0x03]);

    let mut buf = [0u8; 3];
    I2c::write_read(&mut m, 0x68, &[0x00], &mut buf).unwrap();
    assert_eq!(buf, [0x01, 0x02, 0x03]);
    assert_eq!(m.registers().sent(), vec![0xD0, 0x00, 0xD1]);
    assert_eq!(m.registers().remaining(), 0);
    assert_eq!(m.phase(), Phase::StopSent);
}

#[test]
fn test_hal_read() {
    let mut m = master(&[0x08, 0x40, 0x50, 0x58]);
    m.registers().push_rx(&[0xAA, 0x55]);
    let mut buf = [0u8; 2];
    I2c::read(&mut m, 0x51, &mut buf).unwrap();
    assert_eq!(buf, [0xAA, 0x55]);
}

#[test]
fn test_hal_address_nack() {
    let mut m = master(&[0x08, 0x20]);
    let err = I2c::write(&mut m, 0x51, &[0x00]).unwrap_err();
    assert_eq!(
        err.kind(),
        ErrorKind::NoAcknowledge(NoAcknowledgeSource::Address)
    );
    // Bus released anyway
    assert_eq!(m.phase(), Phase::StopSent);
    assert!(!m.registers().flag_raised());
}

#[test]
fn test_hal_data_nack_is_short() {
    let mut m = master(&[0x08, 0x18, 0x28, 0x30]);
    let err = I2c::write(&mut m, 0x51, &[0x01, 0x02, 0x03]).unwrap_err();
    assert_eq!(
        err,
        Error::ShortTransfer {
            expected: 3,
            actual: 2
        }
    );
}

#[test]
fn test_hal_transaction_stops_at_first_failure() {
    let mut m = master(&[0x08, 0x20]);
    let mut buf = [0u8; 1];
    let mut ops = [Operation::Write(&[0x00]), Operation::Read(&mut buf)];
    assert!(m.transaction(0x51, &mut ops).is_err());
    // The read was never addressed
    assert_eq!(m.registers().sent(), vec![0xA2]);
}

#[test]
fn test_hal_adjacent_writes_share_one_address() {
    let mut m = master(&write_script(3));
    let mut ops = [Operation::Write(&[0x00]), Operation::Write(&[0x11, 0x22])];
    m.transaction(0x68, &mut ops).unwrap();
    assert_eq!(m.registers().sent(), vec![0xD0, 0x00, 0x11, 0x22]);
    assert_eq!(m.registers().remaining(), 0);
    assert_eq!(m.phase(), Phase::StopSent);
}

#[test]
fn test_hal_adjacent_reads_share_one_address() {
    let mut m = master(&[0x08, 0x40, 0x50, 0x50, 0x58]);
    m.registers().push_rx(&[0x01, 0x02, 0x03]);
    let mut head = [0u8; 2];
    let mut tail = [0u8; 1];
    let mut ops = [Operation::Read(&mut head), Operation::Read(&mut tail)];
    m.transaction(0x68, &mut ops).unwrap();
    assert_eq!(head, [0x01, 0x02]);
    assert_eq!(tail, [0x03]);
    assert_eq!(m.registers().sent(), vec![0xD1]);
    // Only the final byte of the run is NACKed: req, ACK, ACK, NACK
    let acks: Vec<bool> = m.registers().control_writes()[4..8]
        .iter()
        .map(|v| v & 0x04 != 0)
        .collect();
    assert_eq!(acks, vec![true, true, true, false]);
}

#[test]
fn test_hal_write_runs_split_by_read() {
    let mut statuses = write_script(2);
    statuses.extend([0x10, 0x40, 0x58]);
    let mut m = master(&statuses);
    m.registers().push_rx(&[0x7E]);
    let mut buf = [0u8; 1];
    let mut ops = [
        Operation::Write(&[0x0E]),
        Operation::Write(&[0x1C]),
        Operation::Read(&mut buf),
    ];
    m.transaction(0x68, &mut ops).unwrap();
    assert_eq!(buf, [0x7E]);
    assert_eq!(m.registers().sent(), vec![0xD0, 0x0E, 0x1C, 0xD1]);
}

#[test]
fn test_hal_nack_across_merged_writes_is_short() {
    let mut m = master(&[0x08, 0x18, 0x28, 0x30]);
    let mut ops = [Operation::Write(&[0x01, 0x02]), Operation::Write(&[0x03])];
    assert_eq!(
        m.transaction(0x51, &mut ops),
        Err(Error::ShortTransfer {
            expected: 3,
            actual: 2
        })
    );
    assert_eq!(m.phase(), Phase::StopSent);
}

#[test]
fn test_hal_empty_write_detects_device() {
    let mut m = master(&[0x08, 0x18]);
    I2c::write(&mut m, 0x68, &[]).unwrap();
    assert_eq!(m.registers().sent(), vec![0xD0]);
    assert_eq!(m.phase(), Phase::StopSent);
}

#[test]
fn test_hal_empty_write_reports_absent_device() {
    let mut m = master(&[0x08, 0x20]);
    let err = I2c::write(&mut m, 0x68, &[]).unwrap_err();
    assert_eq!(err, Error::BusStatus(0x20));
    assert_eq!(
        err.kind(),
        ErrorKind::NoAcknowledge(NoAcknowledgeSource::Address)
    );
}

#[test]
fn test_hal_rejects_out_of_range_address() {
    let mut m = master(&[]);
    assert_eq!(
        I2c::write(&mut m, 0x80, &[0x00]),
        Err(Error::InvalidTargetAddress)
    );
    assert!(m.registers().sent().is_empty());
}

// =============================================================================
// Register Helper Tests
// =============================================================================

#[test]
fn test_write_reg() {
    let mut m = master(&write_script(2));
    m.write_reg(0x51, 0x0D, 0x83).unwrap();
    assert_eq!(m.registers().sent(), vec![0xA2, 0x0D, 0x83]);
    assert_eq!(m.phase(), Phase::StopSent);
}

#[test]
fn test_write_regs_single_block() {
    let mut m = master(&write_script(4));
    m.write_regs(0x68, 0x00, &[0x10, 0x20, 0x30]).unwrap();
    assert_eq!(m.registers().sent(), vec![0xD0, 0x00, 0x10, 0x20, 0x30]);
}

#[test]
fn test_write_regs_long_run_splits() {
    let values: Vec<u8> = (0..=MAX_BLOCK as u8).collect();
    let mut statuses = Vec::new();
    for _ in &values {
        statuses.extend(write_script(2));
    }
    let mut m = master(&statuses);
    m.write_regs(0x68, 0x40, &values).unwrap();

    let sent = m.registers().sent();
    assert_eq!(sent.len(), values.len() * 3);
    assert_eq!(&sent[..3], &[0xD0, 0x40, 0x00]);
    assert_eq!(&sent[sent.len() - 3..], &[0xD0, 0x50, MAX_BLOCK as u8]);
    assert_eq!(m.registers().remaining(), 0);
}

#[test]
fn test_write_regs_refuses_run_past_last_register() {
    let mut m = master(&write_script(2));
    assert_eq!(
        m.write_regs(0x68, 0xF8, &[0; 17]),
        Err(Error::ShortTransfer {
            expected: 17,
            actual: 8
        })
    );
    assert!(m.registers().sent().is_empty());
    assert_eq!(m.registers().remaining(), 4);
}

#[test]
fn test_write_regs_fills_to_last_register() {
    let mut m = master(&write_script(3));
    m.write_regs(0x68, 0xFE, &[0xAA, 0xBB]).unwrap();
    assert_eq!(m.registers().sent(), vec![0xD0, 0xFE, 0xAA, 0xBB]);
}

#[test]
fn test_write_regs_reports_short_block() {
    let mut m = master(&[0x08, 0x18, 0x28, 0x30]);
    assert_eq!(
        m.write_regs(0x51, 0x02, &[1, 2, 3]),
        Err(Error::ShortTransfer {
            expected: 4,
            actual: 2
        })
    );
    assert_eq!(m.phase(), Phase::StopSent);
}

#[test]
fn test_read_regs() {
    let mut statuses = write_script(1);
    statuses.extend([0x10, 0x40, 0x50, 0x58]);
    let mut m = master(&statuses);
    m.registers().push_rx(&[0x59, 0x23]);

    let mut buf = [0u8; 2];
    m.read_regs(0x51, 0x03, &mut buf).unwrap();
    assert_eq!(buf, [0x59, 0x23]);
    assert_eq!(m.registers().sent(), vec![0xA2, 0x03, 0xA3]);
}

#[test]
fn test_read_regs_pointer_nack_skips_read() {
    let mut m = master(&[0x08, 0x20]);
    let mut buf = [0u8; 7];
    assert_eq!(
        m.read_regs(0x51, 0x02, &mut buf),
        Err(Error::BusStatus(0x20))
    );
    assert_eq!(m.registers().sent(), vec![0xA2]);
    assert_eq!(m.phase(), Phase::StopSent);
}

#[test]
fn test_read_reg() {
    let mut m = master(&[0x08, 0x18, 0x28, 0x10, 0x40, 0x58]);
    m.registers().push_rx(&[0x80]);
    assert_eq!(m.read_reg(0x68, 0x0F), Ok(0x80));
}
