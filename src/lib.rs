//! Meteor Dodge Library
//!
//! Game state, voice control and the terminal frontend behind the
//! `meteor-dodge` binary.

pub mod app;
pub mod asr;
pub mod audio;
pub mod config;
pub mod error;
pub mod frontend;
pub mod game;
pub mod score;
pub mod screens;
pub mod sfx;
pub mod voice;
