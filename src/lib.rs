#![allow(clippy::len_zero)]
// src/lib.rs

pub mod cli;
pub mod core;
pub mod payment;
pub mod service;
pub mod stellar;
