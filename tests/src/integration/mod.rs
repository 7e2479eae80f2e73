//! Integration scenarios.

mod lifecycle;
mod node;
mod race;
