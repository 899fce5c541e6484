//! Indirect PIB addressing
//!
//! Some PIB registers sit behind an engine instead of being directly
//! addressable. An access to one is flagged by bit 0 of the address (MSB0
//! numbering, as everywhere on this bus) and goes through a fixed window:
//! the requester writes a command word carrying the in-engine address (and,
//! for a write, the data), then polls the window until the engine reports
//! completion. The poll is a bounded busy-wait with no sleeping; callers get
//! a transaction-count bound, never an elapsed-time bound.
//!
//! Addresses with the top-nibble selector bit set use the form 1 encoding,
//! which this library does not implement.

use bitfield::bitfield;

use crate::bus::PibBus;
use crate::error::{Error, IndirectTransferError};

/// Maximum number of status polls before an access is abandoned.
const MAX_RETRIES: usize = 10;

/// Window the command word is written to and the status polled from: the
/// request address masked to its low 31 bits.
const WINDOW_MASK: u64 = 0x7fff_ffff;

// Field positions below are the LSB0 equivalents of the bus documentation's
// MSB0 bit numbers: read flag bit 0, address bits 12-31, data bits 48-63,
// completion bit 32, error bits 33-35.

bitfield! {
    /// Command word written to the indirect access window.
    struct IndirectCommand(u64);
    impl Debug;
    read_request, set_read_request: 63;
    u32, address, set_address: 51, 32;
    u16, data, set_data: 15, 0;
}

bitfield! {
    /// Status word read back from the indirect access window.
    struct IndirectStatus(u64);
    impl Debug;
    complete, _: 31;
    u8, error, _: 30, 28;
    u16, data, _: 15, 0;
}

impl From<u64> for IndirectStatus {
    fn from(raw: u64) -> Self {
        IndirectStatus(raw)
    }
}

impl From<IndirectCommand> for u64 {
    fn from(command: IndirectCommand) -> Self {
        command.0
    }
}

/// Whether `addr` selects an indirect register (MSB0 bit 0).
pub(crate) fn is_indirect(addr: u64) -> bool {
    addr & (1 << 63) != 0
}

/// Whether `addr` uses the unimplemented form 1 encoding.
fn is_form_1(addr: u64) -> bool {
    (addr >> 60) & 1 != 0
}

/// Command word carrying the address field of `addr`, nothing else set.
fn command_for(addr: u64) -> IndirectCommand {
    let mut command = IndirectCommand(0);
    command.set_address(IndirectCommand(addr).address());
    command
}

/// Read an indirect register through the access window.
pub(crate) fn read(pib: &mut dyn PibBus, addr: u64) -> Result<u64, Error> {
    if is_form_1(addr) {
        return Err(Error::UnsupportedIndirectForm);
    }

    let window = addr & WINDOW_MASK;
    let mut command = command_for(addr);
    command.set_read_request(true);
    pib.write(window, command.into())?;

    poll(pib, window).map(|status| u64::from(status.data()))
}

/// Write an indirect register through the access window.
pub(crate) fn write(pib: &mut dyn PibBus, addr: u64, data: u64) -> Result<(), Error> {
    if is_form_1(addr) {
        return Err(Error::UnsupportedIndirectForm);
    }

    let window = addr & WINDOW_MASK;
    let mut command = command_for(addr);
    command.set_data(data as u16);
    pib.write(window, command.into())?;

    poll(pib, window).map(|_| ())
}

/// Poll the window until the engine reports completion.
///
/// Backend failures abort immediately. Completion with the error field set
/// fails without further polls; running out of the retry budget fails with
/// the budget size.
fn poll(pib: &mut dyn PibBus, window: u64) -> Result<IndirectStatus, Error> {
    for retry in 0..MAX_RETRIES {
        let status = IndirectStatus::from(pib.read(window)?);

        if status.complete() {
            if status.error() == 0 {
                return Ok(status);
            }
            return Err(IndirectTransferError {
                status: status.error(),
            }
            .into());
        }

        tracing::trace!(
            "indirect access not complete, retries remaining {}",
            MAX_RETRIES - retry - 1
        );
    }

    Err(Error::IndirectRetriesExhausted {
        retries: MAX_RETRIES,
    })
}
