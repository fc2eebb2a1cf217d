use mars_core::{MemoryBuffer, MemoryError};
use mars_events::EventQueue;
use num_derive::FromPrimitive;
use num_traits::FromPrimitive;

use crate::trace;

/// Event type codes as guest code sees them.
#[repr(i32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, FromPrimitive, strum::Display)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum EventType {
    Close = 1,
    KeyPressed = 2,
    KeyReleased = 3,
    PointerPressed = 8,
    PointerReleased = 9,
    PointerDragged = 10,
    FocusLost = 13,
    FocusGained = 14,
}

/// One entry of the event queue. On the guest side it is three little-endian words:
/// type, field1, field2. Pointer events carry x/y, key events carry the key code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Event {
    pub event_type: i32,
    pub field1: i32,
    pub field2: i32,
}

impl Event {
    pub const WIRE_SIZE: usize = 12;

    pub fn new(ty: EventType, field1: i32, field2: i32) -> Self {
        Self { event_type: ty as i32, field1, field2 }
    }

    pub fn close() -> Self {
        Self::new(EventType::Close, 0, 0)
    }

    pub fn pointer(ty: EventType, x: i32, y: i32) -> Self {
        Self::new(ty, x, y)
    }

    pub fn key(ty: EventType, code: i32) -> Self {
        Self::new(ty, code, 0)
    }

    /// `None` for a code outside [`EventType`].
    pub fn kind(&self) -> Option<EventType> {
        EventType::from_i32(self.event_type)
    }

    pub fn write_to(&self, memory: &mut MemoryBuffer, offset: usize) -> Result<(), MemoryError> {
        memory.check_range(offset, Self::WIRE_SIZE)?;
        memory.write::<i32>(offset, self.event_type)?;
        memory.write::<i32>(offset + 4, self.field1)?;
        memory.write::<i32>(offset + 8, self.field2)?;
        Ok(())
    }

    pub fn read_from(memory: &MemoryBuffer, offset: usize) -> Result<Self, MemoryError> {
        memory.check_range(offset, Self::WIRE_SIZE)?;
        Ok(Self {
            event_type: memory.read::<i32>(offset)?,
            field1: memory.read::<i32>(offset + 4)?,
            field2: memory.read::<i32>(offset + 8)?,
        })
    }
}

/// Pop the oldest event into guest memory at `addr`.
///
/// Returns `Ok(false)` when the queue is empty. A destination that cannot hold the
/// event leaves the queue untouched.
pub fn poll_into(
    events: &EventQueue<Event>,
    memory: &mut MemoryBuffer,
    addr: i32,
) -> Result<bool, MemoryError> {
    let offset = MemoryBuffer::guest_offset(addr)?;
    match events.poll_with(|ev| ev.write_to(memory, offset).map(|()| *ev)) {
        None => Ok(false),
        Some(Ok(ev)) => {
            trace::event(format_args!("delivered {:?} at {:#x}", ev, offset));
            Ok(true)
        }
        Some(Err(e)) => Err(e),
    }
}
