//! Core implementation of the EC controller driver.

use core::fmt::Debug;

use embassy_time::{Duration, Timer};
use embedded_hal::digital::{InputPin, OutputPin};
use embedded_hal_async::i2c::{I2c, SevenBitAddress};
use heapless::{String, Vec};

use crate::battery::{BatteryReport, BATTERY_INFO_SIZE};
use crate::dispatch::{classify, EcEvent};
use crate::err::{BusError, EcError, PinError};
use crate::keyboard::{decode_f_key, decode_key, KeyEvent};
use crate::status::{
    flags, StatusVector, CMD_KEYPAD_DISABLE, CMD_KEYPAD_ENABLE, CMD_TOUCHPAD_DISABLE,
    DOCKRAM_BLOCK_SIZE, DOCKRAM_BATTERY_INFO, DOCKRAM_CONFIG_FORMAT, DOCKRAM_DOCK_CTRL,
    DOCKRAM_FW_VERSION, DOCKRAM_MODEL_NAME, DOCKRAM_PCBA_VERSION, PS2_ACK, REG_COMMAND,
    REG_STATUS,
};

/// Stale notifications drained per buffer clear.
const DRAIN_READS: usize = 8;
/// Zero-command probes before the EC is declared unresponsive.
const PROBE_ATTEMPTS: usize = 10;
/// Backoff between failed probes.
const PROBE_BACKOFF_MS: u64 = 300;
/// Status polls per acknowledgment wait.
const ACK_POLLS: usize = 3;
/// Delay between acknowledgment polls.
const ACK_POLL_DELAY_MS: u64 = 10;
/// Settle delay for spurious or detached-controller notifications.
const SETTLE_MS: u64 = 25;
/// Settle delay after the dock detect line asserts.
const DOCK_SETTLE_MS: u64 = 200;
/// Hardware settle after reading the dock control block.
const DOCK_CTRL_SETTLE_MS: u64 = 750;

/// Identity strings captured from dockram during chip init.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct EcInfo {
    /// Model name.
    pub model_name: String<32>,
    /// EC firmware version.
    pub firmware_version: String<32>,
    /// EC config format.
    pub config_format: String<32>,
    /// PID/PCBA version.
    pub pcba_version: String<32>,
}

/// The outcome of a dock presence recheck.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DockEvent {
    /// The dock appeared and was initialized.
    Attached,
    /// The dock went away.
    Detached,
    /// The presence line matched the current state.
    NoChange,
}

/// A driver for the Transformer pad/dock embedded controller.
///
/// The controller owns two logical I2C clients on the same bus: the EC
/// command/status client and the dockram identity store. When other
/// devices share the bus, hand in a serialized device such as
/// `shared_bus_async::i2c::MutexI2cDevice`. All methods take `&mut self`,
/// so command issuance, initialization and notification handling on one
/// controller are inherently serialized; callers running them from
/// separate tasks share the controller behind a mutex.
pub struct EcController<
    I2cType: I2c<SevenBitAddress, Error = TI2CERR>,
    TI2CERR: embedded_hal_async::i2c::Error,
    TREQ,
    TDETECT,
> {
    i2c: I2cType,
    ec_addr: u8,
    dockram_addr: u8,
    request_pin: TREQ,
    detect_pin: Option<TDETECT>,
    has_keyboard: bool,
    present: bool,
    keyboard_enabled: bool,
    battery_enabled: bool,
    last_dock_error: Option<&'static str>,
    info: EcInfo,
}

impl<I2cType, TI2CERR, TREQ, TDETECT, TPINERR> EcController<I2cType, TI2CERR, TREQ, TDETECT>
where
    I2cType: I2c<SevenBitAddress, Error = TI2CERR>,
    TI2CERR: embedded_hal_async::i2c::Error,
    TREQ: OutputPin<Error = TPINERR>,
    TDETECT: InputPin<Error = TPINERR>,
    TPINERR: Debug,
{
    /// Creates a new `EcController`.
    ///
    /// # Arguments
    ///
    /// * `i2c` - An I2C device implementing `embedded-hal-async::i2c::I2c`.
    /// * `ec_addr` - Address of the EC command/status client.
    /// * `dockram_addr` - Address of the dockram identity store.
    /// * `request_pin` - Output asserted high to wake the EC.
    /// * `detect_pin` - Dock presence input; `None` for a non-removable EC.
    /// * `has_keyboard` - Whether a keypad/touchpad hangs off this EC.
    pub fn new(
        i2c: I2cType,
        ec_addr: u8,
        dockram_addr: u8,
        request_pin: TREQ,
        detect_pin: Option<TDETECT>,
        has_keyboard: bool,
    ) -> Self {
        Self {
            i2c,
            ec_addr,
            dockram_addr,
            request_pin,
            detect_pin,
            has_keyboard,
            present: false,
            keyboard_enabled: false,
            battery_enabled: false,
            last_dock_error: None,
            info: EcInfo::default(),
        }
    }

    /// Whether this controller sits on a removable dock.
    pub fn is_dock(&self) -> bool {
        self.detect_pin.is_some()
    }

    /// Whether the EC is currently attached and initialized.
    pub fn present(&self) -> bool {
        self.present
    }

    /// Whether decoded key events are being reported.
    pub fn keyboard_enabled(&self) -> bool {
        self.keyboard_enabled
    }

    /// Whether battery reports are being served.
    pub fn battery_enabled(&self) -> bool {
        self.battery_enabled
    }

    /// The diagnostic recorded by the most recent failed hotplug attempt.
    pub fn last_dock_error(&self) -> Option<&'static str> {
        self.last_dock_error
    }

    /// Identity strings captured during the last successful chip init.
    pub fn info(&self) -> &EcInfo {
        &self.info
    }

    /// Brings the controller up once at construction time.
    ///
    /// A removable dock is initialized through a presence recheck and may
    /// legitimately come up absent. A non-removable EC is initialized in
    /// place and stays present for the lifetime of the device.
    pub async fn init(&mut self) -> Result<(), EcError<TI2CERR, TPINERR>> {
        if self.is_dock() {
            self.check_dock().await?;
            Ok(())
        } else {
            self.chip_init(true).await?;
            self.present = true;
            if self.has_keyboard {
                self.keyboard_enabled = true;
            }
            self.battery_enabled = true;
            Ok(())
        }
    }

    async fn read_status(&mut self) -> Result<StatusVector, EcError<TI2CERR, TPINERR>> {
        let mut data = [0u8; 8];
        self.i2c
            .write_read(self.ec_addr, &[REG_STATUS], &mut data)
            .await
            .map_err(BusError::Read)?;
        Ok(StatusVector(data))
    }

    async fn write_command(&mut self, command: u16) -> Result<(), EcError<TI2CERR, TPINERR>> {
        // SMBus word order: low byte first.
        let [lo, hi] = command.to_le_bytes();
        self.i2c
            .write(self.ec_addr, &[REG_COMMAND, lo, hi])
            .await
            .map_err(BusError::Write)?;
        Ok(())
    }

    async fn read_dockram(
        &mut self,
        reg: u8,
    ) -> Result<[u8; DOCKRAM_BLOCK_SIZE], EcError<TI2CERR, TPINERR>> {
        let mut data = [0u8; DOCKRAM_BLOCK_SIZE];
        self.i2c
            .write_read(self.dockram_addr, &[reg], &mut data)
            .await
            .map_err(BusError::Read)?;
        Ok(data)
    }

    async fn write_dockram(
        &mut self,
        reg: u8,
        data: &[u8],
    ) -> Result<(), EcError<TI2CERR, TPINERR>> {
        debug_assert!(data.len() <= DOCKRAM_BLOCK_SIZE);
        let mut buf: Vec<u8, { DOCKRAM_BLOCK_SIZE + 1 }> = Vec::new();
        let _ = buf.push(reg);
        let _ = buf.extend_from_slice(data);
        self.i2c
            .write(self.dockram_addr, &buf)
            .await
            .map_err(BusError::Write)?;
        Ok(())
    }

    /// Pulses the request line to wake a sleeping EC.
    async fn request_ec(&mut self) -> Result<(), EcError<TI2CERR, TPINERR>> {
        self.request_pin.set_high().map_err(PinError::Output)?;
        Timer::after(Duration::from_millis(50)).await;
        self.request_pin.set_low().map_err(PinError::Output)?;
        Timer::after(Duration::from_millis(100)).await;
        Ok(())
    }

    /// Drains stale status vectors buffered during a wake or reset.
    async fn clear_buffer(&mut self) {
        for _ in 0..DRAIN_READS {
            if let Err(err) = self.read_status().await {
                log::warn!("error draining stale status: {err:?}");
            }
        }
    }

    /// Polls for a command acknowledgment: OBF, the expected flag and the
    /// PS/2 ACK sub-code all present in one status vector.
    async fn get_response(
        &mut self,
        irq_mask: u8,
        response: u8,
    ) -> Result<(), EcError<TI2CERR, TPINERR>> {
        for _ in 0..ACK_POLLS {
            match self.read_status().await {
                Ok(status) => {
                    if status.is_set(flags::OBF)
                        && status.is_set(irq_mask)
                        && status.code() == response
                    {
                        return Ok(());
                    }
                }
                Err(err) => log::warn!("status read failed while awaiting ack: {err:?}"),
            }
            Timer::after(Duration::from_millis(ACK_POLL_DELAY_MS)).await;
        }
        Err(EcError::AckTimeout)
    }

    /// Issues a command word and waits for its acknowledgment.
    ///
    /// The outer loop re-sends a command the EC may have dropped; the inner
    /// poll in [`Self::get_response`] waits out a slow response. The two
    /// budgets are deliberately independent.
    pub async fn acked_command(
        &mut self,
        command: u16,
        irq_mask: u8,
        attempts: usize,
        delay_ms: u64,
    ) -> Result<(), EcError<TI2CERR, TPINERR>> {
        for _ in 0..attempts {
            self.write_command(command).await?;
            Timer::after(Duration::from_millis(delay_ms)).await;
            if self.get_response(irq_mask, PS2_ACK).await.is_ok() {
                return Ok(());
            }
        }
        log::error!("EC never acknowledged command {command:#06x}");
        Err(EcError::AckTimeout)
    }

    /// Disables the touchpad.
    pub async fn disable_touchpad(&mut self) -> Result<(), EcError<TI2CERR, TPINERR>> {
        self.acked_command(CMD_TOUCHPAD_DISABLE, flags::AUX, 5, 500).await
    }

    /// Disables the keypad.
    pub async fn disable_keypad(&mut self) -> Result<(), EcError<TI2CERR, TPINERR>> {
        self.acked_command(CMD_KEYPAD_DISABLE, flags::KBC, 3, 0).await
    }

    /// Enables the keypad.
    pub async fn enable_keypad(&mut self) -> Result<(), EcError<TI2CERR, TPINERR>> {
        self.acked_command(CMD_KEYPAD_ENABLE, flags::KBC, 3, 0).await
    }

    /// Switches the EC out of manufacturing mode into normal reporting.
    async fn enter_normal_mode(&mut self) -> Result<(), EcError<TI2CERR, TPINERR>> {
        let mut data = self.read_dockram(DOCKRAM_DOCK_CTRL).await?;
        data[0] = 8;
        data[5] &= 0xBF;
        self.write_dockram(DOCKRAM_DOCK_CTRL, &data[..9]).await
    }

    async fn read_identity(&mut self) -> Result<(), EcError<TI2CERR, TPINERR>> {
        let block = self.read_dockram(DOCKRAM_MODEL_NAME).await?;
        self.info.model_name = block_text(&block);
        log::info!("model name: {}", self.info.model_name);

        let block = self.read_dockram(DOCKRAM_FW_VERSION).await?;
        self.info.firmware_version = block_text(&block);
        log::info!("EC firmware version: {}", self.info.firmware_version);

        let block = self.read_dockram(DOCKRAM_CONFIG_FORMAT).await?;
        self.info.config_format = block_text(&block);
        log::info!("EC config format: {}", self.info.config_format);

        let block = self.read_dockram(DOCKRAM_PCBA_VERSION).await?;
        self.info.pcba_version = block_text(&block);
        log::info!("PID/PCBA version: {}", self.info.pcba_version);
        Ok(())
    }

    /// Runs the chip initialization exchange.
    ///
    /// With `send_request` the EC is woken over the request line (used when
    /// this side initiates contact); without it the bus is probed with a
    /// zero command word instead (used when answering an EC handshake).
    /// Keyboard-capable controllers then go through the touchpad/keypad
    /// disable-settle-enable dance; skipping either half leaves the keypad
    /// unresponsive or double-reporting. Controllers without a keyboard are
    /// switched into normal reporting mode instead.
    pub async fn chip_init(&mut self, send_request: bool) -> Result<(), EcError<TI2CERR, TPINERR>> {
        log::info!("chip init, send_request: {send_request}");
        if send_request {
            self.request_ec().await?;
        } else {
            let mut responsive = false;
            for _ in 0..PROBE_ATTEMPTS {
                match self.write_command(0).await {
                    Ok(()) => {
                        responsive = true;
                        break;
                    }
                    Err(err) => {
                        log::warn!("EC probe failed: {err:?}");
                        Timer::after(Duration::from_millis(PROBE_BACKOFF_MS)).await;
                    }
                }
            }
            if !responsive {
                log::error!("EC is not responding");
                return Err(EcError::NoResponse);
            }
        }

        self.clear_buffer().await;
        self.read_identity().await?;

        if self.has_keyboard {
            let _dock_ctrl = self.read_dockram(DOCKRAM_DOCK_CTRL).await?;
            Timer::after(Duration::from_millis(DOCK_CTRL_SETTLE_MS)).await;
            self.clear_buffer().await;
            self.disable_touchpad().await?;
            self.disable_keypad().await?;
            self.clear_buffer().await;
            self.enable_keypad().await?;
            self.clear_buffer().await;
        } else {
            self.enter_normal_mode().await?;
        }
        Ok(())
    }

    /// Rechecks the dock presence line and drives attach/detach.
    ///
    /// Idempotent: a level matching the current state is a no-op, so the
    /// line may be polled redundantly on every interrupt. A failed
    /// initialization leaves the dock absent with a diagnostic recorded;
    /// the next presence edge or reset notification retries.
    pub async fn check_dock(&mut self) -> Result<DockEvent, EcError<TI2CERR, TPINERR>> {
        let level = match self.detect_pin.as_mut() {
            Some(pin) => pin.is_high().map_err(PinError::Input),
            None => return Ok(DockEvent::NoChange),
        };
        let docked = match level {
            Ok(docked) => docked,
            Err(err) => {
                log::error!("failed to read the dock detect line");
                self.last_dock_error = Some("failed to read the dock detect line");
                return Err(err.into());
            }
        };

        if docked {
            if self.present {
                return Ok(DockEvent::NoChange);
            }
            Timer::after(Duration::from_millis(DOCK_SETTLE_MS)).await;
            match self.chip_init(true).await {
                Ok(()) => {
                    log::info!("dock in");
                    self.present = true;
                    self.last_dock_error = None;
                    if self.has_keyboard {
                        self.keyboard_enabled = true;
                    }
                    self.battery_enabled = true;
                    Ok(DockEvent::Attached)
                }
                Err(err) => {
                    log::error!("chip init failed during dock attach: {err:?}");
                    self.last_dock_error = Some("chip init failed during dock attach");
                    Err(err)
                }
            }
        } else if self.present {
            log::info!("dock out");
            self.present = false;
            self.keyboard_enabled = false;
            self.battery_enabled = false;
            Ok(DockEvent::Detached)
        } else {
            Ok(DockEvent::NoChange)
        }
    }

    /// Services one asynchronous EC notification.
    ///
    /// Reads a fresh status vector, classifies it and performs the side
    /// effects: re-initialization on handshake/reset, presence recheck for
    /// removable docks, scancode decoding. The returned batch of key events
    /// is the synchronization boundary for the input sink; it is empty for
    /// anything that is not a key notification.
    pub async fn handle_notification(
        &mut self,
    ) -> Result<Vec<KeyEvent, 4>, EcError<TI2CERR, TPINERR>> {
        let mut events: Vec<KeyEvent, 4> = Vec::new();

        // Notifications from a detached peripheral must not drive state.
        if !self.present {
            Timer::after(Duration::from_millis(SETTLE_MS)).await;
            return Ok(events);
        }

        let status = self.read_status().await?;
        match classify(self.present, self.has_keyboard, &status) {
            EcEvent::NotPresent | EcEvent::Spurious => {
                Timer::after(Duration::from_millis(SETTLE_MS)).await;
            }
            EcEvent::Handshake => {
                log::info!("EC handshake request");
                self.chip_init(false).await?;
            }
            EcEvent::Reset => {
                log::info!("EC reset");
                if self.is_dock() {
                    self.check_dock().await?;
                } else {
                    self.chip_init(true).await?;
                }
            }
            EcEvent::UnknownSmi(code) => {
                log::info!("unknown SMI {code:#04x}, doing nothing");
            }
            EcEvent::PointerAck => {
                log::info!("AUX ack not implemented");
            }
            EcEvent::KeypadAck => {
                log::info!("KBC ack not implemented");
            }
            EcEvent::FunctionKey => {
                if let Some(code) = decode_f_key(&status) {
                    // The hardware sends no up-event for the function row.
                    let _ = events.push(KeyEvent { code, down: true });
                    let _ = events.push(KeyEvent { code, down: false });
                }
            }
            EcEvent::Key => {
                if let Some(event) = decode_key(&status) {
                    let _ = events.push(event);
                }
            }
            EcEvent::Ignored => {}
        }
        Ok(events)
    }

    /// Reads the raw battery info block.
    pub async fn read_battery_info(
        &mut self,
    ) -> Result<[u8; BATTERY_INFO_SIZE], EcError<TI2CERR, TPINERR>> {
        self.read_dockram(DOCKRAM_BATTERY_INFO).await
    }

    /// Reads and parses a battery report.
    ///
    /// Returns `Ok(None)` while the EC is detached or battery reporting is
    /// disabled; that is a routine condition, not a fault.
    pub async fn battery_report(
        &mut self,
    ) -> Result<Option<BatteryReport>, EcError<TI2CERR, TPINERR>> {
        if !self.present || !self.battery_enabled {
            return Ok(None);
        }
        let data = self.read_battery_info().await?;
        Ok(Some(BatteryReport::parse(&data)))
    }
}

/// Extracts the printable prefix of a NUL-terminated dockram string block.
fn block_text(block: &[u8; DOCKRAM_BLOCK_SIZE]) -> String<32> {
    let mut text = String::new();
    for &byte in block.iter() {
        if byte == 0 {
            break;
        }
        if byte.is_ascii_graphic() || byte == b' ' {
            let _ = text.push(byte as char);
        }
    }
    text
}
