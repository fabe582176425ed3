//! Wire-format constants and the status vector read on every EC notification.

/// Register for the 8-byte status vector (block read).
pub const REG_STATUS: u8 = 0x6A;
/// Register for command words (word write, low byte first).
pub const REG_COMMAND: u8 = 0x64;

/// Dockram register holding the model name string.
pub const DOCKRAM_MODEL_NAME: u8 = 0x01;
/// Dockram register holding the EC firmware version string.
pub const DOCKRAM_FW_VERSION: u8 = 0x02;
/// Dockram register holding the EC config format string.
pub const DOCKRAM_CONFIG_FORMAT: u8 = 0x03;
/// Dockram register holding the PID/PCBA version string.
pub const DOCKRAM_PCBA_VERSION: u8 = 0x04;
/// Dockram register holding the dock control block.
pub const DOCKRAM_DOCK_CTRL: u8 = 0x0A;
/// Dockram register holding the battery info block.
pub const DOCKRAM_BATTERY_INFO: u8 = 0x14;

/// Size of a dockram block read.
pub const DOCKRAM_BLOCK_SIZE: usize = 32;

/// Notification flag bits of status-vector byte 1.
pub mod flags {
    /// Output buffer full; data is ready to read.
    pub const OBF: u8 = 0x01;
    /// Keyboard scancode notification.
    pub const KEY: u8 = 0x04;
    /// Keypad controller acknowledgment.
    pub const KBC: u8 = 0x08;
    /// Aux (pointer) acknowledgment.
    pub const AUX: u8 = 0x20;
    /// Function-key (SCI) notification.
    pub const SCI: u8 = 0x40;
    /// System-management notification.
    pub const SMI: u8 = 0x80;
}

/// SMI sub-code: the EC requests a handshake after waking by itself.
pub const SMI_HANDSHAKE: u8 = 0x50;
/// SMI sub-code: the EC has reset.
pub const SMI_RESET: u8 = 0x5F;
/// Sub-code acknowledging a keypad/touchpad command (PS/2 ACK).
pub const PS2_ACK: u8 = 0xFA;

/// Command word: disable the touchpad.
pub const CMD_TOUCHPAD_DISABLE: u16 = 0xF5D4;
/// Command word: disable the keypad.
pub const CMD_KEYPAD_DISABLE: u16 = 0xF500;
/// Command word: enable the keypad.
pub const CMD_KEYPAD_ENABLE: u16 = 0xF400;

/// The 8-byte snapshot read from the EC on each notification.
///
/// Byte 1 carries the [`flags`] bitmask and byte 2 a sub-code: the SMI
/// reason, a command acknowledgment, or the start of the scancode stream.
/// A vector is read fresh for every notification and never cached.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusVector(pub [u8; 8]);

impl StatusVector {
    /// The notification flag byte.
    pub fn flags(&self) -> u8 {
        self.0[1]
    }

    /// Whether all bits of `mask` are set in the flag byte.
    pub fn is_set(&self, mask: u8) -> bool {
        self.0[1] & mask == mask
    }

    /// The sub-code byte.
    pub fn code(&self) -> u8 {
        self.0[2]
    }

    /// Raw byte at `index`.
    pub fn byte(&self, index: usize) -> u8 {
        self.0[index]
    }
}
