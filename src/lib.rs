//! Space Escape: a one- or two-player meteor shooter with a three-part boss.
//!
//! The simulation (`compute`, `collision`, `boss`, `spawner`) is pure and
//! deterministic under a seeded RNG. Terminal I/O lives in the binary.

pub mod assets;
pub mod boss;
pub mod collision;
pub mod compute;
pub mod constants;
pub mod controls;
pub mod entities;
pub mod highscores;
pub mod persistence;
pub mod spawner;
