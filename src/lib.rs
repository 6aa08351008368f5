//! # Quizboard
//!
//! This library provides the game logic for a party quiz played on a
//! category board. It generates boards from a question catalog, keeps the
//! roster and scores, sequences question reveals and their countdown, and
//! keeps two surfaces in sync over a broadcast channel: the admin panel the
//! operator drives and the board display the audience watches.
//!
//! Rendering is left to the embedder. Surfaces expose view models and are
//! driven by calling their methods from an event loop.

#![cfg_attr(all(coverage_nightly, test), feature(coverage_attribute))]
#![deny(missing_docs)]
#![deny(rustdoc::missing_crate_level_docs)]
#![warn(clippy::pedantic)]
#![allow(clippy::similar_names)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::struct_field_names)]
#![allow(clippy::doc_markdown)]
#![allow(clippy::module_name_repetitions)]

pub mod constants;

pub mod admin;
pub mod app;
pub mod audio;
pub mod board;
pub mod buzzer;
pub mod catalog;
pub mod channel;
pub mod display;
pub mod game;
pub mod roster;
pub mod timer;

#[cfg(test)]
mod testing;
