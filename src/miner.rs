use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use tracing::{info, info_span, Level};

use crate::*;
use crate::data::CorrelationIndex;
use crate::pruning::PruningOracle;

mod cohui;
mod coium;
mod coupm;
mod levelwise;
mod serialize; // pretty printing of results
#[cfg(test)]
mod reference;

pub use cohui::CoHuiMiner;
pub use coium::CoIum;
pub use coupm::CoUpm;
pub use serialize::ResultFormatter;

/// Searches the itemset lattice for correlated high-utility itemsets.
pub trait Miner {
    fn algorithm( &self ) -> Algorithm;

    /// Runs the search. Pruning ends branches, it never fails.
    fn mine( &self, context: &SearchContext ) -> MiningResult;
}

#[derive( Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize )]
pub enum Algorithm {
    /// prefix projection with look-ahead pruning
    CoHui,
    /// TWU-ranked candidates with capped pairwise extension
    CoIum,
    /// revised utility lists
    CoUpm,
}

/// Parameters of a mining run
#[derive( Debug, Clone, PartialEq, Serialize, Deserialize )]
#[serde( default )]
pub struct MinerConfig {
    /// fraction of the total transaction utility, in (0, 1]
    pub min_util: f64,
    /// in [0, 1], only applies to itemsets with at least two items
    pub min_cor: f64,
    pub max_len: usize,
    /// join attempts per level of the level-wise miners, None searches exhaustively
    pub max_candidates_per_level: Option<usize>,
    pub missing_profit: MissingProfitPolicy,
    /// fan out independent branches over the rayon pool
    pub parallel: bool,
}

/// Cooperative cancellation, consulted between levels and branches.
#[derive( Debug, Clone, Default )]
pub struct Interrupt {
    flag: Arc<AtomicBool>,
    deadline: Option<Instant>,
}

#[derive( Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize )]
pub struct SearchStats {
    /// itemsets whose utility was evaluated
    pub nodes: u64,
    /// utility list joins performed
    pub joins: u64,
    pub pruned_twu: u64,
    pub pruned_correlation: u64,
    pub pruned_upper_bound: u64,
    pub pruned_look_ahead: u64,
    /// the per-level candidate cap cut the search short, results may be incomplete
    pub truncated: bool,
    /// the run was interrupted, results are partial
    pub interrupted: bool,
}

/// A correlated high-utility itemset
#[derive( Debug, Clone, PartialEq, Serialize, Deserialize )]
pub struct Pattern {
    /// ascending item ids
    pub itemset: Itemvec,
    pub utility: Utility,
    pub correlation: f64,
}

#[derive( Debug, Clone, Serialize, Deserialize )]
pub struct MiningResult {
    pub algorithm: Algorithm,
    /// absolute utility threshold used
    pub min_util: f64,
    /// in discovery order
    pub patterns: Vec<Pattern>,
    pub stats: SearchStats,
}

#[derive( Debug, Clone, PartialEq, Serialize, Deserialize )]
pub struct PatternSummary {
    pub patterns: usize,
    pub avg_len: f64,
    pub top_utility: Utility,
    pub avg_correlation: f64,
}

/// Everything shared read-only by the miners of one run: computed once per database and configuration.
pub struct SearchContext<'a> {
    pub database: &'a Database,
    pub index: CorrelationIndex,
    pub oracle: PruningOracle,
    pub config: MinerConfig,
    pub interrupt: Interrupt,
}

impl Default for MinerConfig {
    fn default() -> MinerConfig {
	MinerConfig{
	    min_util: 0.01,
	    min_cor: 0.5,
	    max_len: 5,
	    max_candidates_per_level: Some( 100 ),
	    missing_profit: MissingProfitPolicy::default(),
	    parallel: false,
	}
    }
}

impl MinerConfig {

    pub fn new( min_util: f64, min_cor: f64, max_len: usize ) -> MinerConfig {
	MinerConfig{ min_util, min_cor, max_len, ..MinerConfig::default() }
    }

    pub fn with_candidate_cap( mut self, cap: Option<usize> ) -> MinerConfig {
	self.max_candidates_per_level = cap;
	self
    }

    pub fn with_missing_profit( mut self, policy: MissingProfitPolicy ) -> MinerConfig {
	self.missing_profit = policy;
	self
    }

    pub fn with_parallel( mut self, parallel: bool ) -> MinerConfig {
	self.parallel = parallel;
	self
    }

    /// Rejects parameters that would make the search meaningless
    pub fn validate( &self ) -> Result<()> {
	if !( self.min_util > 0.0 && self.min_util <= 1.0 ) {
	    return Err( MiningError::InvalidMinUtil( self.min_util ));
	}
	if !( 0.0 ..= 1.0 ).contains( &self.min_cor ) {
	    return Err( MiningError::InvalidMinCor( self.min_cor ));
	}
	if self.max_len < 1 {
	    return Err( MiningError::InvalidMaxLen( self.max_len ));
	}
	if self.max_candidates_per_level == Some( 0 ) {
	    return Err( MiningError::InvalidCandidateCap );
	}
	Ok( () )
    }
}

impl Interrupt {

    pub fn new() -> Interrupt {
	Interrupt::default()
    }

    /// Triggers on its own once the timeout has elapsed
    pub fn with_timeout( timeout: Duration ) -> Interrupt {
	Interrupt{ flag: Arc::new( AtomicBool::new( false )), deadline: Some( Instant::now() + timeout ) }
    }

    /// Asks every search holding a clone of this interrupt to stop
    pub fn cancel( &self ) {
	self.flag.store( true, Ordering::Relaxed );
    }

    pub fn is_triggered( &self ) -> bool {
	self.flag.load( Ordering::Relaxed ) || self.deadline.map_or( false, |deadline| Instant::now() >= deadline )
    }
}

impl SearchStats {
    pub fn merge( &mut self, other: &SearchStats ) {
	self.nodes += other.nodes;
	self.joins += other.joins;
	self.pruned_twu += other.pruned_twu;
	self.pruned_correlation += other.pruned_correlation;
	self.pruned_upper_bound += other.pruned_upper_bound;
	self.pruned_look_ahead += other.pruned_look_ahead;
	self.truncated |= other.truncated;
	self.interrupted |= other.interrupted;
    }
}

impl Pattern {

    /// Canonicalizes the itemset to ascending order
    pub fn new( mut itemset: Itemvec, utility: Utility, correlation: f64 ) -> Pattern {
	itemset.sort_unstable();
	Pattern{ itemset, utility, correlation }
    }

    pub fn len( &self ) -> usize { self.itemset.len() }

    pub fn is_empty( &self ) -> bool { self.itemset.is_empty() }
}

impl Loggable for Pattern {
    fn log( &self, message: &str, level: Level ) {
	log_at!( level, "{message} {:?} utility {} correlation {:.3}", self.itemset, self.utility, self.correlation );
    }
}

impl MiningResult {

    pub fn new( algorithm: Algorithm, min_util: f64 ) -> MiningResult {
	MiningResult{ algorithm, min_util, patterns: Vec::new(), stats: SearchStats::default() }
    }

    pub fn summary( &self ) -> PatternSummary {
	let n = self.patterns.len();
	if n == 0 {
	    return PatternSummary{ patterns: 0, avg_len: 0.0, top_utility: 0, avg_correlation: 0.0 };
	}
	let total_len: usize = self.patterns.iter().map( |p| p.len() ).sum();
	let total_correlation: f64 = self.patterns.iter().map( |p| p.correlation ).sum();
	PatternSummary{
	    patterns: n,
	    avg_len: total_len as f64 / n as f64,
	    top_utility: self.patterns.iter().map( |p| p.utility ).max().unwrap_or( 0 ),
	    avg_correlation: total_correlation / n as f64,
	}
    }

    /// Highest utility first, ties by itemset
    pub fn sort_by_utility( &mut self ) {
	self.patterns.sort_by( |left, right| {
	    right.utility.cmp( &left.utility ).then_with( || left.itemset.cmp( &right.itemset ))
	});
    }

    /// Strongest correlation first, ties by itemset
    pub fn sort_by_correlation( &mut self ) {
	self.patterns.sort_by( |left, right| {
	    right.correlation.total_cmp( &left.correlation ).then_with( || left.itemset.cmp( &right.itemset ))
	});
    }
}

impl Loggable for MiningResult {
    fn log( &self, message: &str, level: Level ) {
	let summary = self.summary();
	log_at!( level, "{message} {}: {} patterns, avg length {:.2}, top utility {}, avg correlation {:.3}, {:?}",
		 self.algorithm, summary.patterns, summary.avg_len, summary.top_utility, summary.avg_correlation, self.stats );
    }
}

impl fmt::Display for Algorithm {
    fn fmt( &self, f: &mut fmt::Formatter<'_> ) -> fmt::Result {
	let name = match self {
	    Algorithm::CoHui => "CoHUI-Miner",
	    Algorithm::CoIum => "CoIUM",
	    Algorithm::CoUpm => "CoUPM",
	};
	write!( f, "{name}" )
    }
}

impl Algorithm {
    pub fn all() -> [Algorithm; 3] {
	[Algorithm::CoIum, Algorithm::CoUpm, Algorithm::CoHui]
    }

    pub fn miner( &self ) -> Box<dyn Miner + Send + Sync> {
	match self {
	    Algorithm::CoHui => Box::new( CoHuiMiner ),
	    Algorithm::CoIum => Box::new( CoIum ),
	    Algorithm::CoUpm => Box::new( CoUpm ),
	}
    }
}

impl<'a> SearchContext<'a> {

    /// Validates the configuration, derives the absolute threshold and builds the correlation index.
    pub fn new( database: &'a Database, config: &MinerConfig ) -> Result<SearchContext<'a>> {
	config.validate()?;
	let min_util = database.min_util_abs( config.min_util );
	let index = CorrelationIndex::build( database.transactions(), config.max_len );
	info!( "threshold {min_util:.3} of total utility {}, {} indexed combinations",
	       database.total_utility(), index.len() );
	Ok( SearchContext{
	    database,
	    index,
	    oracle: PruningOracle::new( min_util, config.min_cor ),
	    config: config.clone(),
	    interrupt: Interrupt::new(),
	})
    }

    pub fn with_interrupt( mut self, interrupt: Interrupt ) -> SearchContext<'a> {
	self.interrupt = interrupt;
	self
    }

    pub fn result( &self, algorithm: Algorithm ) -> MiningResult {
	MiningResult::new( algorithm, self.oracle.min_util() )
    }

    /// Builds the pattern record. Correlation is evaluated here so it does not depend on the search order.
    pub fn pattern( &self, itemset: &[Item], utility: Utility ) -> Pattern {
	let correlation = self.index.correlation( itemset );
	Pattern::new( itemset.to_vec(), utility, correlation )
    }
}

/// Runs one algorithm over raw transactions and profits.
/// An empty dataset yields no patterns; invalid parameters are reported before anything is mined.
pub fn mine( transactions: Vec<Itemvec>, profits: &ProfitTable, config: &MinerConfig, algorithm: Algorithm ) -> Result<MiningResult> {
    config.validate()?;
    let database = Database::new( transactions, profits, config.missing_profit )?;
    mine_database( &database, config, algorithm )
}

pub fn mine_database( database: &Database, config: &MinerConfig, algorithm: Algorithm ) -> Result<MiningResult> {
    config.validate()?;
    if database.is_empty() {
	return Ok( MiningResult::new( algorithm, 0.0 ));
    }
    let context = SearchContext::new( database, config )?;
    let span = info_span!( "mine", algorithm = %algorithm );
    let _guard = span.enter();
    let result = algorithm.miner().mine( &context );
    result.log( "finished", Level::INFO );
    Ok( result )
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::data::profit_table;

    fn golden() -> (Vec<Itemvec>, ProfitTable) {
	let data = vec!(
	    vec!( 1, 2, 3 ),
	    vec!( 1, 2 ),
	    vec!( 2, 3 ),
	    vec!( 1, 3 ),
	);
	(data, profit_table( [(1, 2), (2, 3), (3, 1)] ))
    }

    #[test]
    fn test_validation() {
	assert!( MinerConfig::default().validate().is_ok() );
	assert_eq!( MinerConfig::new( 0.0, 0.5, 3 ).validate(), Err( MiningError::InvalidMinUtil( 0.0 )));
	assert_eq!( MinerConfig::new( 1.5, 0.5, 3 ).validate(), Err( MiningError::InvalidMinUtil( 1.5 )));
	assert!( MinerConfig::new( 1.0, 0.5, 3 ).validate().is_ok() );
	assert_eq!( MinerConfig::new( 0.1, -0.1, 3 ).validate(), Err( MiningError::InvalidMinCor( -0.1 )));
	assert_eq!( MinerConfig::new( 0.1, 0.5, 0 ).validate(), Err( MiningError::InvalidMaxLen( 0 )));
	let capped = MinerConfig::new( 0.1, 0.5, 3 ).with_candidate_cap( Some( 0 ));
	assert_eq!( capped.validate(), Err( MiningError::InvalidCandidateCap ));
	assert!( MinerConfig::new( f64::NAN, 0.5, 3 ).validate().is_err() );
    }

    #[test]
    fn test_config_from_partial_json() {
	let config: MinerConfig = serde_json::from_str( r#"{ "min_util": 0.2, "max_candidates_per_level": null }"# ).unwrap();
	assert_eq!( config.min_util, 0.2 );
	assert_eq!( config.max_candidates_per_level, None );
	assert_eq!( config.max_len, 5 );
	assert_eq!( config.missing_profit, MissingProfitPolicy::Substitute( 1 ));
    }

    #[test]
    fn test_invalid_config_reported_before_mining() {
	let (data, profits) = golden();
	let result = mine( data, &profits, &MinerConfig::new( 0.1, 2.0, 2 ), Algorithm::CoIum );
	assert_eq!( result.unwrap_err(), MiningError::InvalidMinCor( 2.0 ));
    }

    #[test]
    fn test_empty_dataset() {
	for algorithm in Algorithm::all() {
	    let result = mine( vec!(), &ProfitTable::default(), &MinerConfig::default(), algorithm ).unwrap();
	    assert!( result.patterns.is_empty() );
	}
    }

    #[test]
    fn test_interrupt() {
	let interrupt = Interrupt::new();
	let clone = interrupt.clone();
	assert!( !interrupt.is_triggered() );
	clone.cancel();
	assert!( interrupt.is_triggered() );

	let expired = Interrupt::with_timeout( Duration::ZERO );
	assert!( expired.is_triggered() );
    }

    #[test]
    fn test_cancelled_run_is_flagged() {
	let (data, profits) = golden();
	let database = Database::new( data, &profits, MissingProfitPolicy::Fail ).unwrap();
	let config = MinerConfig::new( 0.1, 0.5, 3 );
	let interrupt = Interrupt::new();
	interrupt.cancel();
	for algorithm in Algorithm::all() {
	    let context = SearchContext::new( &database, &config ).unwrap().with_interrupt( interrupt.clone() );
	    let result = algorithm.miner().mine( &context );
	    assert!( result.stats.interrupted, "{algorithm} ignored the interrupt" );
	}
    }

    #[test]
    fn test_pattern_is_canonical() {
	let pattern = Pattern::new( vec!( 3, 1, 2 ), 5, 0.5 );
	assert_eq!( pattern.itemset, vec!( 1, 2, 3 ));
    }

    #[test]
    fn test_summary_and_sorting() {
	let mut result = MiningResult::new( Algorithm::CoIum, 1.0 );
	result.patterns.push( Pattern::new( vec!( 1 ), 4, 1.0 ));
	result.patterns.push( Pattern::new( vec!( 1, 2 ), 9, 0.5 ));
	result.patterns.push( Pattern::new( vec!( 2, 3 ), 9, 0.7 ));

	let summary = result.summary();
	assert_eq!( summary.patterns, 3 );
	assert_eq!( summary.top_utility, 9 );
	assert!( (summary.avg_len - 5.0 / 3.0).abs() < 1e-9 );
	assert!( (summary.avg_correlation - 2.2 / 3.0).abs() < 1e-9 );

	result.sort_by_utility();
	let order: Vec<Itemvec> = result.patterns.iter().map( |p| p.itemset.clone() ).collect();
	assert_eq!( order, vec!( vec!( 1, 2 ), vec!( 2, 3 ), vec!( 1 )));

	result.sort_by_correlation();
	let order: Vec<Itemvec> = result.patterns.iter().map( |p| p.itemset.clone() ).collect();
	assert_eq!( order, vec!( vec!( 1 ), vec!( 2, 3 ), vec!( 1, 2 )));
    }

    #[test]
    fn test_empty_summary() {
	let result = MiningResult::new( Algorithm::CoHui, 0.0 );
	assert_eq!( result.summary().patterns, 0 );
	assert_eq!( result.summary().avg_len, 0.0 );
    }
}
