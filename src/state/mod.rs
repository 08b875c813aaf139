/// State management module
///
/// This module handles all application state, including:
/// - Shared data structures (data.rs)
/// - VIN extraction and validation rules (vin.rs)
/// - The ordered review queue and its cursor (queue.rs)
/// - The spreadsheet-backed VIN ledger snapshot (ledger.rs)
/// - Progress numbers for the header (progress.rs)
/// - Backend effects and their completions (effect.rs)
/// - The duplicate VIN challenge (resolution.rs)
/// - The tagging session state machine (session.rs)

pub mod data;
pub mod vin;
pub mod queue;
pub mod ledger;
pub mod progress;
pub mod effect;
pub mod resolution;
pub mod session;
