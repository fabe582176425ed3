#![cfg_attr(not(test), no_std)]
#![doc = "Asynchronous mutex-based shared bus implementations for embedded-hal."]

// Note: a hand-rolled shared bus is carried here to keep the workspace on a
// single embedded-hal-async version.
//
// For the official Embassy implementation, see:
// - https://github.com/embassy-rs/embassy/tree/main/embassy-embedded-hal/src/shared_bus

pub mod i2c;
