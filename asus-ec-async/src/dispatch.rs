//! Pure classification of EC notifications.
//!
//! The interrupt handler reads a fresh [`StatusVector`] and feeds it through
//! [`classify`]; all bus traffic and state changes happen in the caller.
//! Keeping this step a pure function of (controller state, status vector)
//! makes the dispatch table testable without a bus.

use crate::status::{flags, StatusVector, SMI_HANDSHAKE, SMI_RESET};

/// What an EC notification turned out to be.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EcEvent {
    /// The controller is detached; the signal carries no meaning.
    NotPresent,
    /// OBF clear: noise on the line, nothing to read.
    Spurious,
    /// The EC initiated contact and wants a re-init without a request pulse.
    Handshake,
    /// The EC has reset; presence must be rechecked or the chip re-inited.
    Reset,
    /// An SMI with a sub-code this driver does not know.
    UnknownSmi(u8),
    /// Acknowledgment for a pointer (touchpad) command.
    PointerAck,
    /// Acknowledgment for a keypad controller command.
    KeypadAck,
    /// A function-row key notification.
    FunctionKey,
    /// A keyboard scancode notification.
    Key,
    /// A notification with nothing for this controller to do.
    Ignored,
}

/// Classifies a status vector.
///
/// Branch priority is SMI > AUX > KBC > SCI > KEY. The AUX and KBC branches
/// are reserved acknowledgment paths; they must never fall through to
/// keyboard decoding.
///
/// The driver's notification handler short-circuits on absence before it
/// reads a vector, so [`EcEvent::NotPresent`] fires only for callers
/// classifying a vector they captured themselves.
pub fn classify(present: bool, has_keyboard: bool, status: &StatusVector) -> EcEvent {
    if !present {
        return EcEvent::NotPresent;
    }
    if !status.is_set(flags::OBF) {
        return EcEvent::Spurious;
    }
    if status.is_set(flags::SMI) {
        return match status.code() {
            SMI_HANDSHAKE => EcEvent::Handshake,
            SMI_RESET => EcEvent::Reset,
            code => EcEvent::UnknownSmi(code),
        };
    }
    if status.is_set(flags::AUX) {
        return EcEvent::PointerAck;
    }
    if status.is_set(flags::KBC) {
        return EcEvent::KeypadAck;
    }
    if status.is_set(flags::SCI) {
        return EcEvent::FunctionKey;
    }
    if status.is_set(flags::KEY) {
        if has_keyboard {
            return EcEvent::Key;
        }
        return EcEvent::Ignored;
    }
    EcEvent::Ignored
}

#[cfg(test)]
mod tests {
    use super::*;

    fn status(flag_byte: u8, code: u8) -> StatusVector {
        StatusVector([0, flag_byte, code, 0, 0, 0, 0, 0])
    }

    #[test]
    fn detached_controller_discards_everything() {
        let s = status(flags::OBF | flags::KEY, 0x29);
        assert_eq!(classify(false, true, &s), EcEvent::NotPresent);
    }

    #[test]
    fn obf_clear_is_spurious() {
        assert_eq!(
            classify(true, true, &status(flags::SMI, SMI_RESET)),
            EcEvent::Spurious
        );
    }

    #[test]
    fn smi_sub_codes() {
        let smi = flags::OBF | flags::SMI;
        assert_eq!(classify(true, true, &status(smi, SMI_HANDSHAKE)), EcEvent::Handshake);
        assert_eq!(classify(true, true, &status(smi, SMI_RESET)), EcEvent::Reset);
        assert_eq!(classify(true, true, &status(smi, 0x42)), EcEvent::UnknownSmi(0x42));
    }

    #[test]
    fn acks_do_not_fall_through_to_decoding() {
        // AUX and KBC acks can carry scancode-looking bytes; they must be
        // routed to the reserved branches.
        let aux = status(flags::OBF | flags::AUX | flags::KEY, 0x29);
        assert_eq!(classify(true, true, &aux), EcEvent::PointerAck);
        let kbc = status(flags::OBF | flags::KBC | flags::KEY, 0x29);
        assert_eq!(classify(true, true, &kbc), EcEvent::KeypadAck);
    }

    #[test]
    fn smi_outranks_every_other_flag() {
        let all = flags::OBF | flags::SMI | flags::AUX | flags::KBC | flags::SCI | flags::KEY;
        assert_eq!(classify(true, true, &status(all, SMI_RESET)), EcEvent::Reset);
    }

    #[test]
    fn keyboard_paths() {
        let sci = status(flags::OBF | flags::SCI, 0x02);
        assert_eq!(classify(true, true, &sci), EcEvent::FunctionKey);
        let key = status(flags::OBF | flags::KEY, 0x29);
        assert_eq!(classify(true, true, &key), EcEvent::Key);
        assert_eq!(classify(true, false, &key), EcEvent::Ignored);
    }

    #[test]
    fn bare_obf_is_ignored() {
        assert_eq!(classify(true, true, &status(flags::OBF, 0)), EcEvent::Ignored);
    }
}
