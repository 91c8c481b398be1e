//! Inbound objection handling.
//!
//! | Piece | Role |
//! |-------|------|
//! | [`ObjectionDetector`] | Highest-confidence match against the pattern bank |
//! | [`GraduationTracker`] | Per-contact ladder position per objection type |
//! | [`ResponseComposer`] | Template variant plus market-data interpolation |
//! | [`ObjectionEngine`] | The three wired together, owning its own state |

mod composer;
mod detector;
mod engine;
mod graduation;
pub mod templates;

pub use composer::{interpolate, ResponseComposer};
pub use detector::ObjectionDetector;
pub use engine::ObjectionEngine;
pub use graduation::GraduationTracker;
