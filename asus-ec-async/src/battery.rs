//! Parsing of the EC battery info block.
//!
//! The dock battery is reported through a 32-byte dockram block of
//! little-endian 16-bit fields at fixed offsets, in smart-battery units.

/// Size of the battery info block.
pub const BATTERY_INFO_SIZE: usize = 32;

const PROP_STATUS: usize = 1;
const PROP_TEMPERATURE: usize = 7;
const PROP_VOLTAGE: usize = 9;
const PROP_CURRENT: usize = 11;
const PROP_CAPACITY: usize = 13;
const PROP_REMAINING_CAPACITY: usize = 15;
const PROP_AVG_TIME_TO_EMPTY: usize = 17;
const PROP_AVG_TIME_TO_FULL: usize = 19;

const STATUS_CHARGING: u16 = 0x40;
const STATUS_FULL_CHARGED: u16 = 0x20;
const STATUS_FULL_DISCHARGED: u16 = 0x10;

/// The charge state reported in the battery status word.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChargeState {
    /// Fully charged.
    Full,
    /// Charging.
    Charging,
    /// Fully discharged.
    Discharging,
    /// On battery, neither full nor empty.
    NotCharging,
}

impl ChargeState {
    fn from_status(status: u16) -> Self {
        if status & STATUS_FULL_CHARGED != 0 {
            ChargeState::Full
        } else if status & STATUS_CHARGING != 0 {
            ChargeState::Charging
        } else if status & STATUS_FULL_DISCHARGED != 0 {
            ChargeState::Discharging
        } else {
            ChargeState::NotCharging
        }
    }
}

/// A parsed snapshot of the battery info block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatteryReport {
    /// The charge state.
    pub state: ChargeState,
    /// Temperature in tenths of a degree Celsius.
    pub temperature_deci_celsius: i32,
    /// Battery voltage in millivolts.
    pub voltage_mv: u16,
    /// Battery current in milliamperes, negative while discharging.
    pub current_ma: i16,
    /// Corrected capacity, 0 to 100 percent.
    pub capacity_percent: u8,
    /// Remaining capacity in milliampere-hours.
    pub remaining_capacity_mah: u16,
    /// Average time to empty in minutes.
    pub avg_time_to_empty_min: u16,
    /// Average time to full in minutes.
    pub avg_time_to_full_min: u16,
}

impl BatteryReport {
    /// Parses a battery info block.
    pub fn parse(data: &[u8; BATTERY_INFO_SIZE]) -> Self {
        let status = word(data, PROP_STATUS);
        Self {
            state: ChargeState::from_status(status),
            // The EC reports tenths of a Kelvin.
            temperature_deci_celsius: word(data, PROP_TEMPERATURE) as i32 - 2731,
            voltage_mv: word(data, PROP_VOLTAGE),
            current_ma: word(data, PROP_CURRENT) as i16,
            capacity_percent: corrected_capacity(word(data, PROP_CAPACITY)),
            remaining_capacity_mah: word(data, PROP_REMAINING_CAPACITY),
            avg_time_to_empty_min: word(data, PROP_AVG_TIME_TO_EMPTY),
            avg_time_to_full_min: word(data, PROP_AVG_TIME_TO_FULL),
        }
    }

    /// Whether external power is online, derived from the charge state.
    pub fn ac_online(&self) -> bool {
        matches!(self.state, ChargeState::Full | ChargeState::Charging)
    }
}

fn word(data: &[u8; BATTERY_INFO_SIZE], offset: usize) -> u16 {
    u16::from_le_bytes([data[offset], data[offset + 1]])
}

/// Corrects the raw capacity reading.
///
/// This is what the vendor firmware does, probably to ensure the computer
/// has enough time to shut down on low battery. The thresholds are
/// preserved as observed; do not simplify.
pub fn corrected_capacity(raw: u16) -> u8 {
    let mut cap = raw.min(100) as i16;
    for threshold in [100, 80, 70, 60, 50, 30] {
        if cap < threshold {
            cap -= 1;
        }
    }
    cap.max(0) as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    fn block_with_word(offset: usize, value: u16) -> [u8; BATTERY_INFO_SIZE] {
        let mut data = [0u8; BATTERY_INFO_SIZE];
        data[offset..offset + 2].copy_from_slice(&value.to_le_bytes());
        data
    }

    #[test]
    fn corrected_capacity_thresholds() {
        assert_eq!(corrected_capacity(83), 82);
        assert_eq!(corrected_capacity(45), 40);
        assert_eq!(corrected_capacity(101), 100);
        assert_eq!(corrected_capacity(2), 0);
        assert_eq!(corrected_capacity(100), 100);
        assert_eq!(corrected_capacity(0), 0);
    }

    #[test]
    fn capacity_is_read_little_endian() {
        let report = BatteryReport::parse(&block_with_word(13, 83));
        assert_eq!(report.capacity_percent, 82);
    }

    #[test]
    fn charge_state_precedence() {
        assert_eq!(ChargeState::from_status(0x60), ChargeState::Full);
        assert_eq!(ChargeState::from_status(0x40), ChargeState::Charging);
        assert_eq!(ChargeState::from_status(0x10), ChargeState::Discharging);
        assert_eq!(ChargeState::from_status(0x00), ChargeState::NotCharging);
    }

    #[test]
    fn fixed_offsets() {
        let mut data = [0u8; BATTERY_INFO_SIZE];
        data[1..3].copy_from_slice(&0x0040u16.to_le_bytes()); // charging
        data[7..9].copy_from_slice(&3031u16.to_le_bytes()); // 30.0 C
        data[9..11].copy_from_slice(&7400u16.to_le_bytes());
        data[11..13].copy_from_slice(&(-250i16 as u16).to_le_bytes());
        data[13..15].copy_from_slice(&45u16.to_le_bytes());
        data[15..17].copy_from_slice(&1200u16.to_le_bytes());
        data[17..19].copy_from_slice(&90u16.to_le_bytes());
        data[19..21].copy_from_slice(&35u16.to_le_bytes());

        let report = BatteryReport::parse(&data);
        assert_eq!(report.state, ChargeState::Charging);
        assert!(report.ac_online());
        assert_eq!(report.temperature_deci_celsius, 300);
        assert_eq!(report.voltage_mv, 7400);
        assert_eq!(report.current_ma, -250);
        assert_eq!(report.capacity_percent, 40);
        assert_eq!(report.remaining_capacity_mah, 1200);
        assert_eq!(report.avg_time_to_empty_min, 90);
        assert_eq!(report.avg_time_to_full_min, 35);
    }

    #[test]
    fn discharged_battery_is_not_on_ac() {
        let report = BatteryReport::parse(&block_with_word(1, 0x10));
        assert!(!report.ac_online());
    }
}
