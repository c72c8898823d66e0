//! pitchedge — edge detection and risk-managed Kelly staking for soccer
//! betting markets.
//!
//! The engine is a deterministic decision layer: it turns candidate
//! (probability, price) pairs into a bounded, risk-safe set of stakes.
//! Fetching odds, estimating probabilities, and writing reports are the
//! caller's business.

pub mod bankroll;
pub mod backtest;
pub mod config;
pub mod strategy;
pub mod types;
