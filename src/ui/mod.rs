//! UI rendering module for Spotpris
//!
//! This module contains the rendering logic for the terminal user
//! interface, using the ratatui library for TUI components.

pub mod price_board;
pub mod widgets;

pub use price_board::render_price_board;
