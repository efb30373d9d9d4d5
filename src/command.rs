//! The command set carried in ACK payloads and the node-side interpreter.
//!
//! Wire format: one opcode byte, followed by operands for opcodes that take
//! them. `RGB_SET` carries three little-endian `u16` words (red, green, blue),
//! either packed right after the opcode (7 bytes, as [`Command::encode()`]
//! writes it) or word-aligned behind a pad byte (8 bytes, words at offsets 2,
//! 4 and 6).
use core::fmt::{Display, Formatter, Result as FmtResult};

use heapless::spsc::{Consumer, Producer};

use crate::{
    diagnostics::{Anomaly, Diagnostics},
    types::Payload,
};

/// Command opcodes.
pub mod opcodes {
    pub const LED_ON: u8 = 0xA1;
    pub const LED_OFF: u8 = 0xA2;
    pub const RGB_SET: u8 = 0xA3;
    /// Staged by the master at start-up; carries no action.
    pub const HELLO: u8 = 0xA5;
}

/// Three PWM duty values, in channel order.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Rgb {
    pub red: u16,
    pub green: u16,
    pub blue: u16,
}

impl Rgb {
    const ENCODED_LEN: usize = 6;
    /// Operand length of the word-aligned form: a pad byte, then the words.
    const ALIGNED_LEN: usize = 7;

    fn from_le_bytes(bytes: &[u8]) -> Option<Self> {
        if bytes.len() < Self::ENCODED_LEN {
            return None;
        }
        Some(Self {
            red: u16::from_le_bytes([bytes[0], bytes[1]]),
            green: u16::from_le_bytes([bytes[2], bytes[3]]),
            blue: u16::from_le_bytes([bytes[4], bytes[5]]),
        })
    }
}

/// A decoded command.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Command {
    LedOn,
    LedOff,
    RgbSet(Rgb),
    Hello,
}

/// Why a payload could not be decoded into a [`Command`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DecodeError {
    Empty,
    UnknownOpcode(u8),
    /// The opcode's operands were cut short.
    Truncated,
}

impl Display for DecodeError {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            DecodeError::Empty => write!(f, "empty payload"),
            DecodeError::UnknownOpcode(op) => write!(f, "unknown opcode {op:#04X}"),
            DecodeError::Truncated => write!(f, "truncated operands"),
        }
    }
}

/// What a command asks the node's hardware to do.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Actuation {
    Led(bool),
    Rgb(Rgb),
}

/// The node's output hardware (an LED pin, PWM channels).
///
/// [`Actuator::actuate()`] may be called from interrupt context and must not block.
pub trait Actuator {
    fn actuate(&mut self, action: Actuation);
}

impl Command {
    pub const fn opcode(&self) -> u8 {
        match self {
            Command::LedOn => opcodes::LED_ON,
            Command::LedOff => opcodes::LED_OFF,
            Command::RgbSet(_) => opcodes::RGB_SET,
            Command::Hello => opcodes::HELLO,
        }
    }

    /// Decode a received payload. Bytes past the command's operands are ignored.
    ///
    /// An `RGB_SET` payload of 8 bytes or more is taken to be word-aligned,
    /// so its first operand byte is skipped.
    pub fn decode(payload: &[u8]) -> Result<Self, DecodeError> {
        let (&opcode, operands) = payload.split_first().ok_or(DecodeError::Empty)?;
        match opcode {
            opcodes::LED_ON => Ok(Command::LedOn),
            opcodes::LED_OFF => Ok(Command::LedOff),
            opcodes::RGB_SET => {
                let words = if operands.len() >= Rgb::ALIGNED_LEN {
                    &operands[1..]
                } else {
                    operands
                };
                Rgb::from_le_bytes(words)
                    .map(Command::RgbSet)
                    .ok_or(DecodeError::Truncated)
            }
            opcodes::HELLO => Ok(Command::Hello),
            other => Err(DecodeError::UnknownOpcode(other)),
        }
    }

    /// Build the ACK payload carrying this command.
    pub fn encode(&self) -> Payload {
        let mut payload = Payload::new();
        // capacity is 32; a command is at most 7 bytes
        let _ = payload.push(self.opcode());
        if let Command::RgbSet(rgb) = self {
            for word in [rgb.red, rgb.green, rgb.blue] {
                let _ = payload.extend_from_slice(&word.to_le_bytes());
            }
        }
        payload
    }

    /// The hardware action this command asks for, if any.
    pub const fn actuation(&self) -> Option<Actuation> {
        match self {
            Command::LedOn => Some(Actuation::Led(true)),
            Command::LedOff => Some(Actuation::Led(false)),
            Command::RgbSet(rgb) => Some(Actuation::Rgb(*rgb)),
            Command::Hello => None,
        }
    }
}

/// Decode `payload` and forward its action to `actuator`.
///
/// Payloads that do not decode are dropped (nothing is actuated) and
/// counted in `diagnostics`.
pub fn interpret<A: Actuator>(
    payload: &[u8],
    actuator: &mut A,
    diagnostics: &Diagnostics,
) -> Option<Command> {
    match Command::decode(payload) {
        Ok(command) => {
            debug!("command {}", command);
            if let Some(action) = command.actuation() {
                actuator.actuate(action);
            }
            Some(command)
        }
        Err(DecodeError::UnknownOpcode(_)) => {
            diagnostics.record(Anomaly::UnknownOpcode);
            None
        }
        Err(DecodeError::Truncated | DecodeError::Empty) => {
            diagnostics.record(Anomaly::TruncatedCommand);
            None
        }
    }
}

/// The storage for deferred actuations.
///
/// Split it once; give the [`Deferred`] producer to the interrupt side and
/// [`drain()`] the consumer from the foreground loop. Holds `N - 1` actions.
pub type ActuationQueue<const N: usize> = heapless::spsc::Queue<Actuation, N>;

/// An [`Actuator`] that only enqueues, for use in interrupt context.
pub struct Deferred<'q, 'd, const N: usize> {
    producer: Producer<'q, Actuation, N>,
    diagnostics: &'d Diagnostics,
}

impl<'q, 'd, const N: usize> Deferred<'q, 'd, N> {
    pub fn new(producer: Producer<'q, Actuation, N>, diagnostics: &'d Diagnostics) -> Self {
        Self {
            producer,
            diagnostics,
        }
    }
}

impl<const N: usize> Actuator for Deferred<'_, '_, N> {
    fn actuate(&mut self, action: Actuation) {
        if self.producer.enqueue(action).is_err() {
            self.diagnostics.record(Anomaly::ActuationDropped);
        }
    }
}

/// Apply every queued action to `actuator`, oldest first.
///
/// Returns the number of actions applied.
pub fn drain<A: Actuator, const N: usize>(
    consumer: &mut Consumer<'_, Actuation, N>,
    actuator: &mut A,
) -> usize {
    let mut applied = 0;
    while let Some(action) = consumer.dequeue() {
        actuator.actuate(action);
        applied += 1;
    }
    applied
}

#[cfg(test)]
pub(crate) mod test {
    extern crate std;
    use super::{
        drain, interpret, opcodes, ActuationQueue, Actuation, Actuator, Command, DecodeError,
        Deferred, Rgb,
    };
    use crate::diagnostics::{Anomaly, Diagnostics};
    use std::{format, vec::Vec};

    /// Records every action it is given.
    #[derive(Default)]
    pub struct RecordingActuator(pub Vec<Actuation>);

    impl Actuator for RecordingActuator {
        fn actuate(&mut self, action: Actuation) {
            self.0.push(action);
        }
    }

    #[test]
    fn decode_led_commands() {
        assert_eq!(Command::decode(&[opcodes::LED_ON]), Ok(Command::LedOn));
        assert_eq!(Command::decode(&[opcodes::LED_OFF, 0]), Ok(Command::LedOff));
        assert_eq!(Command::decode(&[opcodes::HELLO]), Ok(Command::Hello));
        assert_eq!(Command::decode(&[]), Err(DecodeError::Empty));
        assert_eq!(
            Command::decode(&[0x99]),
            Err(DecodeError::UnknownOpcode(0x99))
        );
        assert_eq!(
            format!("{}", DecodeError::UnknownOpcode(0x99)),
            "unknown opcode 0x99"
        );
    }

    #[test]
    fn decode_rgb_little_endian() {
        let payload = [opcodes::RGB_SET, 0x34, 0x12, 0x56, 0x00, 0xFF, 0xFF];
        let expected = Rgb {
            red: 0x1234,
            green: 0x0056,
            blue: 0xFFFF,
        };
        assert_eq!(Command::decode(&payload), Ok(Command::RgbSet(expected)));
        assert_eq!(Command::RgbSet(expected).encode().as_slice(), &payload);
        assert_eq!(
            Command::decode(&payload[..6]),
            Err(DecodeError::Truncated)
        );
    }

    #[test]
    fn decode_word_aligned_rgb() {
        let payload = [opcodes::RGB_SET, 0x00, 0x34, 0x12, 0x56, 0x00, 0xFF, 0xFF];
        assert_eq!(
            Command::decode(&payload),
            Ok(Command::RgbSet(Rgb {
                red: 0x1234,
                green: 0x0056,
                blue: 0xFFFF,
            }))
        );
        // the pad byte's value does not matter
        let mut padded = payload;
        padded[1] = 0xEE;
        assert_eq!(Command::decode(&padded), Command::decode(&payload));
    }

    #[test]
    fn interpret_rgb_actuates_in_order() {
        let diagnostics = Diagnostics::new();
        let mut actuator = RecordingActuator::default();
        let payload = [opcodes::RGB_SET, 0x34, 0x12, 0x56, 0x00, 0xFF, 0xFF];
        let command = interpret(&payload, &mut actuator, &diagnostics);
        let rgb = Rgb {
            red: 0x1234,
            green: 0x0056,
            blue: 0xFFFF,
        };
        assert_eq!(command, Some(Command::RgbSet(rgb)));
        assert_eq!(actuator.0, [Actuation::Rgb(rgb)]);
        assert_eq!(diagnostics.snapshot().total(), 0);
    }

    #[test]
    fn interpret_rejects_bad_payloads() {
        let diagnostics = Diagnostics::new();
        let mut actuator = RecordingActuator::default();
        assert_eq!(interpret(&[0x99], &mut actuator, &diagnostics), None);
        assert_eq!(
            interpret(&[opcodes::RGB_SET, 1, 2], &mut actuator, &diagnostics),
            None
        );
        assert_eq!(
            interpret(&[opcodes::HELLO], &mut actuator, &diagnostics),
            Some(Command::Hello)
        );
        assert!(actuator.0.is_empty());
        assert_eq!(diagnostics.count(Anomaly::UnknownOpcode), 1);
        assert_eq!(diagnostics.count(Anomaly::TruncatedCommand), 1);
    }

    #[test]
    fn deferred_actuation() {
        let diagnostics = Diagnostics::new();
        let mut queue = ActuationQueue::<3>::new();
        let (producer, mut consumer) = queue.split();
        let mut deferred = Deferred::new(producer, &diagnostics);
        interpret(&[opcodes::LED_ON], &mut deferred, &diagnostics);
        interpret(&[opcodes::LED_OFF], &mut deferred, &diagnostics);
        // the queue holds 2 actions; the third is dropped
        interpret(&[opcodes::LED_ON], &mut deferred, &diagnostics);
        assert_eq!(diagnostics.count(Anomaly::ActuationDropped), 1);

        let mut actuator = RecordingActuator::default();
        assert_eq!(drain(&mut consumer, &mut actuator), 2);
        assert_eq!(actuator.0, [Actuation::Led(true), Actuation::Led(false)]);
        assert_eq!(drain(&mut consumer, &mut actuator), 0);
    }
}
