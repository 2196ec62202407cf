/// Logs at a level chosen at run time
macro_rules! log_at {
    ($level:expr, $($arg:tt)+) => {{
	let level: tracing::Level = $level;
	if level == tracing::Level::ERROR {
	    tracing::error!( $($arg)+ )
	} else if level == tracing::Level::WARN {
	    tracing::warn!( $($arg)+ )
	} else if level == tracing::Level::INFO {
	    tracing::info!( $($arg)+ )
	} else if level == tracing::Level::DEBUG {
	    tracing::debug!( $($arg)+ )
	} else {
	    tracing::trace!( $($arg)+ )
	}
    }};
}

pub mod data;
pub mod error;
pub mod io;
pub mod miner;
pub mod pruning;

pub use data::{Count, Database, Item, Itemvec, MissingProfitPolicy, Profit, ProfitTable, Utility};
pub use error::{MiningError, Result};
pub use miner::{mine, Algorithm, Miner, MinerConfig, MiningResult, Pattern, SearchContext};

/// Objects that can be recorded in the log
pub trait Loggable {
    fn log( &self, message: &str, level: tracing::Level );
}
