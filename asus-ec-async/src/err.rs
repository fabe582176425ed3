//! Error types for the EC driver.

use core::fmt::{self, Debug};

/// An error related to I2C bus communication.
pub enum BusError<TI2CERR> {
    /// An error occurred during a read transaction.
    Read(TI2CERR),
    /// An error occurred during a write transaction.
    Write(TI2CERR),
}

impl<TI2CERR: Debug> Debug for BusError<TI2CERR> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Read(err) => write!(f, "Read({err:?})"),
            Self::Write(err) => write!(f, "Write({err:?})"),
        }
    }
}

/// An error related to GPIO pin operations.
pub enum PinError<TPINERR> {
    /// An error occurred on an output pin.
    Output(TPINERR),
    /// An error occurred on an input pin.
    Input(TPINERR),
}

impl<TPINERR: Debug> Debug for PinError<TPINERR> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Output(err) => write!(f, "Output({err:?})"),
            Self::Input(err) => write!(f, "Input({err:?})"),
        }
    }
}

/// The main error type for the EC driver.
pub enum EcError<TI2CERR, TPINERR> {
    /// A bus-related error.
    Bus(BusError<TI2CERR>),
    /// A pin-related error.
    Pin(PinError<TPINERR>),
    /// A command was sent but never acknowledged within the retry budget.
    AckTimeout,
    /// The EC did not respond to the bus-responsiveness probe during init.
    NoResponse,
}

impl<TI2CERR: Debug, TPINERR: Debug> Debug for EcError<TI2CERR, TPINERR> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bus(err) => write!(f, "Bus({err:?})"),
            Self::Pin(err) => write!(f, "Pin({err:?})"),
            Self::AckTimeout => write!(f, "AckTimeout"),
            Self::NoResponse => write!(f, "NoResponse"),
        }
    }
}

impl<TI2CERR, TPINERR> From<BusError<TI2CERR>> for EcError<TI2CERR, TPINERR> {
    fn from(bus_err: BusError<TI2CERR>) -> Self {
        EcError::Bus(bus_err)
    }
}

impl<TI2CERR, TPINERR> From<PinError<TPINERR>> for EcError<TI2CERR, TPINERR> {
    fn from(pin_err: PinError<TPINERR>) -> Self {
        EcError::Pin(pin_err)
    }
}
