use thiserror::Error;

use crate::data::{Item, Profit};

/// Failures that can be reported to the caller of a mining run.
/// Pruning never produces one of these; only malformed input does.
#[derive( Debug, Error, Clone, PartialEq )]
pub enum MiningError {
    #[error( "minimum utility must lie in (0, 1], got {0}" )]
    InvalidMinUtil( f64 ),

    #[error( "minimum correlation must lie in [0, 1], got {0}" )]
    InvalidMinCor( f64 ),

    #[error( "maximum itemset length must be at least 1, got {0}" )]
    InvalidMaxLen( usize ),

    #[error( "candidate cap per level must be at least 1" )]
    InvalidCandidateCap,

    #[error( "no profit for item {0}" )]
    MissingProfit( Item ),

    #[error( "profit of item {item} must be positive, got {profit}" )]
    InvalidProfit { item: Item, profit: Profit },

    #[error( "profit range [{min}, {max}] must be non-empty and positive" )]
    InvalidProfitRange { min: Profit, max: Profit },

    #[error( "i/o error: {0}" )]
    Io( String ),

    #[error( "cannot parse line {line}: {content:?}" )]
    Parse { line: usize, content: String },

    #[error( "serialization error: {0}" )]
    Serialization( String ),
}

pub type Result<T> = std::result::Result<T, MiningError>;

impl From<std::io::Error> for MiningError {
    fn from( err: std::io::Error ) -> MiningError {
	MiningError::Io( err.to_string() )
    }
}

impl From<serde_json::Error> for MiningError {
    fn from( err: serde_json::Error ) -> MiningError {
	MiningError::Serialization( err.to_string() )
    }
}
