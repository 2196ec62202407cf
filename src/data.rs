use std::iter::IntoIterator;

use bit_set::BitSet;
use rand::prelude::*;
use rand::rngs::StdRng;
use rustc_hash::{FxHashMap, FxHashSet};
use serde::{Deserialize, Serialize};
use statrs::distribution::DiscreteUniform;
use tracing::{debug, warn};

use crate::*;

pub mod support_index;
pub mod utility_list;

pub use support_index::CorrelationIndex;
pub use utility_list::{Element, RemainingUtility, UtilityList};

pub type Item = usize;
/// Position of a transaction in the database
pub type Tid = usize;
pub type Count = u64;
pub type Profit = u64;
pub type Utility = u64;
/// A sorted vector of items
pub type Itemvec = Vec<Item>;
/// Bitset view of a transaction for fast subset checks
pub type Transaction = BitSet;
/// Weight of every item for the duration of a run
pub type ProfitTable = FxHashMap<Item, Profit>;

/// What to do with items that have no entry in the profit table.
#[derive( Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize )]
pub enum MissingProfitPolicy {
    /// Give the item this weight and log a warning
    Substitute( Profit ),
    /// Refuse to mine
    Fail,
}

impl Default for MissingProfitPolicy {
    fn default() -> MissingProfitPolicy {
	MissingProfitPolicy::Substitute( 1 )
    }
}

/// Supplies item weights for a dataset. Implementations own any caching or persistence.
pub trait ProfitSource {
    fn profits( &self, transactions: &[Itemvec], items: &[Item] ) -> Result<ProfitTable>;
}

/// Weights handed over as-is
pub struct FixedProfits {
    table: ProfitTable,
}

/// Draws a weight uniformly from [min, max] for every item. The same seed yields the same table.
#[derive( Debug, Clone, Copy )]
pub struct RandomProfits {
    min: Profit,
    max: Profit,
    seed: u64,
}

/// Transactions together with everything derived from the profit table that the miners need.
#[derive( Debug, Clone )]
pub struct Database {
    /// normalised transactions, items ascending and distinct
    transactions: Vec<Itemvec>,
    /// same transactions as bitsets
    bitsets: Vec<Transaction>,
    /// covers every item of the universe
    profits: ProfitTable,
    transaction_utility: Vec<Utility>,
    total_utility: Utility,
    universe: Itemvec,
}

impl ProfitSource for FixedProfits {
    fn profits( &self, _transactions: &[Itemvec], _items: &[Item] ) -> Result<ProfitTable> {
	Ok( self.table.clone() )
    }
}

impl FixedProfits {
    pub fn new( table: ProfitTable ) -> FixedProfits {
	FixedProfits{ table }
    }
}

impl ProfitSource for RandomProfits {
    fn profits( &self, _transactions: &[Itemvec], items: &[Item] ) -> Result<ProfitTable> {
	if self.min == 0 || self.max < self.min {
	    return Err( MiningError::InvalidProfitRange{ min: self.min, max: self.max });
	}
	let distribution = DiscreteUniform::new( self.min as i64, self.max as i64 )
	    .map_err( |_| MiningError::InvalidProfitRange{ min: self.min, max: self.max })?;
	let mut rng = StdRng::seed_from_u64( self.seed );

	// draw in ascending item order so the table only depends on the seed and the item set
	let mut ordered: Itemvec = items.to_vec();
	ordered.sort_unstable();
	ordered.dedup();
	let table = ordered.into_iter()
	    .map( |item| (item, distribution.sample( &mut rng ) as Profit) )
	    .collect();
	Ok( table )
    }
}

impl RandomProfits {
    pub fn new( min: Profit, max: Profit, seed: u64 ) -> RandomProfits {
	RandomProfits{ min, max, seed }
    }

    pub fn with_seed( seed: u64 ) -> RandomProfits {
	RandomProfits::new( 1, 5, seed )
    }
}

impl Database {

    /// Normalises the transactions and resolves a weight for every item according to the policy.
    pub fn new( transactions: Vec<Itemvec>, profits: &ProfitTable, policy: MissingProfitPolicy ) -> Result<Database> {
	let transactions: Vec<Itemvec> = transactions.into_iter().map( normalize ).collect();
	let universe = create_universe( &transactions );
	let profits = resolve_profits( &universe, profits, policy )?;

	let transaction_utility: Vec<Utility> = transactions.iter()
	    .map( |t| t.iter().map( |item| profits[ item ] ).sum() )
	    .collect();
	let total_utility = transaction_utility.iter().sum();
	let bitsets = transactions.iter().map( |t| to_bitset( t )).collect();

	debug!( "database with {} transactions over {} items, total utility {total_utility}",
		transactions.len(), universe.len() );

	Ok( Database{ transactions, bitsets, profits, transaction_utility, total_utility, universe })
    }

    /// Builds the database with weights from a profit source
    pub fn from_source<S: ProfitSource>( transactions: Vec<Itemvec>, source: &S, policy: MissingProfitPolicy ) -> Result<Database> {
	let transactions: Vec<Itemvec> = transactions.into_iter().map( normalize ).collect();
	let universe = create_universe( &transactions );
	let profits = source.profits( &transactions, &universe )?;
	Database::new( transactions, &profits, policy )
    }

    pub fn len( &self ) -> usize { self.transactions.len() }

    pub fn is_empty( &self ) -> bool { self.transactions.is_empty() }

    pub fn transactions( &self ) -> &[Itemvec] { &self.transactions }

    pub fn transaction( &self, tid: Tid ) -> &Itemvec { &self.transactions[ tid ] }

    pub fn bitset( &self, tid: Tid ) -> &Transaction { &self.bitsets[ tid ] }

    /// Sorted distinct items occurring in the database
    pub fn universe( &self ) -> &[Item] { &self.universe }

    pub fn profits( &self ) -> &ProfitTable { &self.profits }

    /// Weight of an item. Items outside the universe weigh nothing.
    pub fn profit( &self, item: Item ) -> Profit {
	self.profits.get( &item ).copied().unwrap_or( 0 )
    }

    pub fn transaction_utility( &self, tid: Tid ) -> Utility { self.transaction_utility[ tid ] }

    pub fn total_utility( &self ) -> Utility { self.total_utility }

    /// Absolute threshold for a relative minimum utility
    pub fn min_util_abs( &self, min_util: f64 ) -> f64 {
	min_util * self.total_utility as f64
    }

    /// Transaction-weighted utility of every item in one pass
    pub fn item_twus( &self ) -> FxHashMap<Item, Utility> {
	let mut twus: FxHashMap<Item, Utility> = FxHashMap::default();
	for (transaction, tu) in self.transactions.iter().zip( self.transaction_utility.iter() ) {
	    for item in transaction {
		*twus.entry( *item ).or_insert( 0 ) += *tu;
	    }
	}
	twus
    }

    /// Transactions containing every item of the itemset
    pub fn tids_containing( &self, itemset: &[Item] ) -> Vec<Tid> {
	let query = to_bitset( itemset );
	self.bitsets.iter().enumerate()
	    .filter( |(_, t)| t.is_superset( &query ))
	    .map( |(tid, _)| tid )
	    .collect()
    }

    /// Transaction-weighted utility of an itemset
    pub fn twu( &self, itemset: &[Item] ) -> Utility {
	self.tids_containing( itemset ).into_iter().map( |tid| self.transaction_utility[ tid ] ).sum()
    }

    /// Exact utility of an itemset by scanning the database
    pub fn utility( &self, itemset: &[Item] ) -> Utility {
	let per_transaction: Utility = itemset.iter().map( |item| self.profit( *item )).sum();
	per_transaction * self.tids_containing( itemset ).len() as Utility
    }
}

/// Sorts and removes repeated items
fn normalize( mut transaction: Itemvec ) -> Itemvec {
    transaction.sort_unstable();
    transaction.dedup();
    transaction
}

fn create_universe( transactions: &[Itemvec] ) -> Itemvec {
    let items: FxHashSet<Item> = transactions.iter().flat_map( |t| t.iter().copied() ).collect();
    let mut universe: Itemvec = items.into_iter().collect();
    universe.sort_unstable();
    universe
}

pub fn to_bitset<'a, I>( items: I ) -> Transaction where I: IntoIterator<Item = &'a Item> {
    let mut set = BitSet::new();
    for item in items {
	set.insert( *item );
    }
    set
}

/// Restricts the table to the universe, applying the policy to items without weight.
fn resolve_profits( universe: &[Item], profits: &ProfitTable, policy: MissingProfitPolicy ) -> Result<ProfitTable> {
    let mut resolved = ProfitTable::default();
    resolved.reserve( universe.len() );
    for item in universe {
	let profit = match (profits.get( item ), policy) {
	    (Some( profit ), _) => *profit,
	    (None, MissingProfitPolicy::Substitute( weight )) => {
		warn!( "item {item} has no profit, using {weight}" );
		weight
	    },
	    (None, MissingProfitPolicy::Fail) => return Err( MiningError::MissingProfit( *item )),
	};
	if profit == 0 {
	    return Err( MiningError::InvalidProfit{ item: *item, profit });
	}
	resolved.insert( *item, profit );
    }
    Ok( resolved )
}

/// Convenience for building profit tables from literals
pub fn profit_table<I>( pairs: I ) -> ProfitTable where I: IntoIterator<Item = (Item, Profit)> {
    pairs.into_iter().collect()
}

#[cfg(test)]
mod test {

    use super::*;

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
    fn test_transaction_utilities() {
	let (data, profits) = golden();
	let database = Database::new( data, &profits, MissingProfitPolicy::Fail ).unwrap();

	assert_eq!( database.transaction_utility( 0 ), 6 );
	assert_eq!( database.transaction_utility( 1 ), 5 );
	assert_eq!( database.transaction_utility( 2 ), 4 );
	assert_eq!( database.transaction_utility( 3 ), 3 );
	assert_eq!( database.total_utility(), 18 );
	assert!( (database.min_util_abs( 0.1 ) - 1.8).abs() < 1e-9 );
	assert_eq!( database.universe(), &[1, 2, 3] );
    }

    #[test]
    fn test_twu_and_utility() {
	let (data, profits) = golden();
	let database = Database::new( data, &profits, MissingProfitPolicy::Fail ).unwrap();
	let twus = database.item_twus();

	assert_eq!( twus[ &1 ], 14 );
	assert_eq!( twus[ &2 ], 15 );
	assert_eq!( twus[ &3 ], 13 );
	assert_eq!( database.twu( &[1, 2] ), 11 );
	assert_eq!( database.utility( &[2] ), 9 );
	assert_eq!( database.utility( &[1, 2] ), 10 );
	assert_eq!( database.tids_containing( &[1, 3] ), vec!( 0, 3 ));
    }

    #[test]
    fn test_normalization() {
	let data = vec!( vec!( 3, 1, 3, 2 ), vec!() );
	let profits = profit_table( [(1, 1), (2, 1), (3, 1)] );
	let database = Database::new( data, &profits, MissingProfitPolicy::Fail ).unwrap();

	assert_eq!( database.transaction( 0 ), &vec!( 1, 2, 3 ));
	// empty transactions keep their id
	assert_eq!( database.len(), 2 );
	assert_eq!( database.transaction_utility( 1 ), 0 );
    }

    #[test]
    fn test_missing_profit_policy() {
	let data = vec!( vec!( 1, 2 ) );
	let profits = profit_table( [(1, 4)] );

	let substituted = Database::new( data.clone(), &profits, MissingProfitPolicy::Substitute( 1 )).unwrap();
	assert_eq!( substituted.profit( 2 ), 1 );
	assert_eq!( substituted.total_utility(), 5 );

	let failed = Database::new( data, &profits, MissingProfitPolicy::Fail );
	assert_eq!( failed.unwrap_err(), MiningError::MissingProfit( 2 ));
    }

    #[test]
    fn test_zero_profit_rejected() {
	let data = vec!( vec!( 1 ) );
	let profits = profit_table( [(1, 0)] );
	let result = Database::new( data, &profits, MissingProfitPolicy::Fail );
	assert_eq!( result.unwrap_err(), MiningError::InvalidProfit{ item: 1, profit: 0 });
    }

    #[test]
    fn test_random_profits_are_reproducible() {
	let items = vec!( 0, 1, 2, 3, 4, 5, 6, 7 );
	let first = RandomProfits::with_seed( 17 ).profits( &[], &items ).unwrap();
	let second = RandomProfits::with_seed( 17 ).profits( &[], &items ).unwrap();

	assert_eq!( first, second );
	assert_eq!( first.len(), items.len() );
	assert!( first.values().all( |p| (1 ..= 5).contains( p )));
    }

    #[test]
    fn test_random_profits_reject_bad_range() {
	let result = RandomProfits::new( 0, 3, 1 ).profits( &[], &[1] );
	assert!( matches!( result, Err( MiningError::InvalidProfitRange{ .. } )));
    }

    #[test]
    fn test_from_source() {
	let (data, profits) = golden();
	let database = Database::from_source( data, &FixedProfits::new( profits ), MissingProfitPolicy::Fail ).unwrap();
	assert_eq!( database.total_utility(), 18 );
    }
}
