//! Background loops for continuous processing.

pub mod cleanup_loop;
pub mod hotspot_loop;
