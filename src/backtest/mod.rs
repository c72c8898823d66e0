//! Historical replay of resolved fixtures through the staking pipeline.

pub mod runner;

pub use runner::{BacktestReport, BacktestTrade, Backtester, ResolvedFixture};
