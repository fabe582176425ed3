//! An asynchronous, `no_std` driver for the ASUS Transformer pad/dock
//! embedded controller.
//!
//! The EC is a black-box peripheral on a shared I2C bus exposing a dock
//! keyboard, dock presence and battery/AC telemetry. This driver provides an
//! [`EcController`] that issues acknowledged commands, runs the multi-step
//! chip initialization exchange, drives dock hotplug, and decodes the EC's
//! scancode stream into logical key events.
//!
//! # Usage
//!
//! You need an I2C peripheral implementation satisfying the
//! `embedded-hal-async::i2c::I2c` trait, an output pin for the EC request
//! line and, for a removable dock, an input pin for the presence line. Wire
//! the EC notification interrupt and the presence-line interrupt to
//! [`EcController::handle_notification`] and [`EcController::check_dock`]
//! respectively.
//!
//! ```ignore
//! use asus_ec_async::EcController;
//!
//! // Addresses of the EC and dockram clients, from the board's device tree.
//! let mut ec = EcController::new(i2c, 0x19, 0x1B, request_pin, Some(detect_pin), true);
//! ec.init().await?;
//!
//! loop {
//!     ec_irq.wait_for_low().await;
//!     for event in ec.handle_notification().await? {
//!         log::info!("key {} {}", event.code, if event.down { "down" } else { "up" });
//!     }
//! }
//! ```
//!
//! When the notification handler and the presence recheck run on separate
//! tasks, share the controller behind an `embassy_sync::mutex::Mutex` so
//! concurrent re-initialization attempts collapse into one, and put other
//! traffic on the same bus behind `shared_bus_async::i2c::MutexI2cDevice`.

#![cfg_attr(not(test), no_std)]

pub mod battery;
pub mod dispatch;
pub mod ec;
pub mod err;
pub mod keyboard;
pub mod status;

pub use battery::{BatteryReport, ChargeState};
pub use ec::{DockEvent, EcController, EcInfo};
pub use err::EcError;
pub use keyboard::KeyEvent;
pub use status::StatusVector;
