//! Domain event contract shared by the event-sourced crates.

pub mod event;

pub use event::Event;
