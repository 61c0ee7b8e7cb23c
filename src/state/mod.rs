// Sealgate — State Module
//
// The sealed-buffer store and last-error register: process-wide slots
// for each category of sealed material, an explicit context object, and
// the load / save / seal lifecycle operations over them.

mod gateway;
mod slots;

pub use gateway::GatewayState;
pub use slots::{LastError, SealedSlot, SlotKind};
