//! Static, read-only lookup tables.
//!
//! ```text
//! tag byte      ──→ tags::lookup        ──→ DecodeRule
//! attribute     ──→ addresses::lookup   ──→ AddressRule (register + scaling)
//! model code    ──→ models::model_name  ──→ "AN-303"
//! ```
//!
//! All tables are plain `static` slices sorted by key; nothing here is
//! mutated at runtime.

pub mod addresses;
pub mod models;
pub mod tags;

pub use addresses::{register, AddressRule, CONTROL_BASE};
pub use models::model_name;
pub use tags::{DecodeRule, EventTrigger, Interpretation, WidthClass};
