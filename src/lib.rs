//! Schedule-parsing, status-derivation, and edit-session core for
//! dispenser-style smart-home devices (pet feeders and the like).
//!
//! The device exposes its daily dispensing schedule as an opaque encoded
//! string; this crate turns that into ordered [`schedule::model::ScheduleEntry`]
//! values, derives the status actually shown to a user from wall-clock time
//! and the schedule's master switch, and drives the add/edit/save/cancel
//! lifecycle of a single draft entry, emitting fire-and-forget commands
//! through a [`card::CommandSink`].

pub mod card;
pub mod config;
pub mod device;
pub mod schedule;

pub use card::{CommandSink, ScheduleCard};
pub use config::{CardConfig, ConfigError, load_card_config, parse_card_config_text};
pub use device::{DeviceLimits, DeviceProfile};
pub use schedule::model::{EditScheduleEntry, EntryStatus, ScheduleEntry};
pub use schedule::resolver::SwitchState;
