//! Exhaustive enumeration used to check that pruning never loses a pattern.

use rand::prelude::*;
use rand::rngs::StdRng;

use crate::*;
use crate::data::support_index::for_each_combination;
use crate::data::{ProfitSource, RandomProfits};

use super::{Algorithm, MinerConfig, Pattern, SearchContext};

/// Every itemset up to the length bound that meets both thresholds
pub fn brute_force( context: &SearchContext ) -> Vec<Pattern> {
    let database = context.database;
    let mut patterns = Vec::new();
    let mut buffer = Vec::new();
    for size in 1 ..= context.config.max_len {
	for_each_combination( database.universe(), size, &mut buffer, &mut |itemset: &[Item]| {
	    let utility = database.utility( itemset );
	    let correlated = size == 1 || context.oracle.passes_correlation_score( context.index.correlation( itemset ));
	    if context.oracle.is_high_utility( utility ) && correlated {
		patterns.push( context.pattern( itemset, utility ));
	    }
	});
    }
    canonical( patterns )
}

fn canonical( mut patterns: Vec<Pattern> ) -> Vec<Pattern> {
    patterns.sort_by( |left, right| left.itemset.cmp( &right.itemset ));
    patterns
}

/// Up to 8 items and 20 transactions with random weights
fn random_database( rng: &mut StdRng ) -> Database {
    let number_items: usize = rng.gen_range( 2 ..= 8 );
    let number_transactions: usize = rng.gen_range( 1 ..= 20 );
    let density: f64 = rng.gen_range( 0.2 .. 0.8 );
    let data: Vec<Itemvec> = (0 .. number_transactions)
	.map( |_| (0 .. number_items).filter( |_| rng.gen_bool( density )).collect() )
	.collect();
    let items: Itemvec = (0 .. number_items).collect();
    let profits = RandomProfits::new( 1, 9, rng.gen() ).profits( &data, &items ).unwrap();
    Database::new( data, &profits, MissingProfitPolicy::Fail ).unwrap()
}

#[cfg(test)]
mod test {
    use super::*;

    const MIN_UTILS: [f64; 4] = [0.02, 0.05, 0.15, 0.3];
    const MIN_CORS: [f64; 4] = [0.0, 0.3, 0.6, 0.9];

    fn check_against_brute_force( seed: u64, algorithm: Algorithm ) {
	let mut rng = StdRng::seed_from_u64( seed );
	for round in 0 .. 40 {
	    let database = random_database( &mut rng );
	    let config = MinerConfig::new( *MIN_UTILS.choose( &mut rng ).unwrap(), *MIN_CORS.choose( &mut rng ).unwrap(), rng.gen_range( 1 ..= 4 ))
		.with_candidate_cap( None );
	    let context = SearchContext::new( &database, &config ).unwrap();

	    let expected = brute_force( &context );
	    let result = algorithm.miner().mine( &context );
	    assert!( !result.stats.truncated );
	    let found = canonical( result.patterns );
	    assert_eq!( found, expected, "{algorithm} differs in round {round} with {config:?} on {:?}", database.transactions() );
	}
    }

    #[test]
    fn test_cohui_is_complete() {
	check_against_brute_force( 1, Algorithm::CoHui );
    }

    #[test]
    fn test_coium_is_complete() {
	check_against_brute_force( 2, Algorithm::CoIum );
    }

    #[test]
    fn test_coupm_is_complete() {
	check_against_brute_force( 3, Algorithm::CoUpm );
    }

    #[test]
    fn test_parallel_cohui_is_complete() {
	let mut rng = StdRng::seed_from_u64( 4 );
	for _ in 0 .. 10 {
	    let database = random_database( &mut rng );
	    let config = MinerConfig::new( 0.05, 0.3, 3 ).with_parallel( true );
	    let context = SearchContext::new( &database, &config ).unwrap();
	    let found = canonical( Algorithm::CoHui.miner().mine( &context ).patterns );
	    assert_eq!( found, brute_force( &context ));
	}
    }

    #[test]
    fn test_thresholds_hold() {
	let mut rng = StdRng::seed_from_u64( 5 );
	for _ in 0 .. 20 {
	    let database = random_database( &mut rng );
	    let config = MinerConfig::new( 0.1, 0.5, 3 );
	    let context = SearchContext::new( &database, &config ).unwrap();
	    for algorithm in Algorithm::all() {
		for pattern in algorithm.miner().mine( &context ).patterns {
		    assert!( pattern.utility as f64 >= 0.1 * database.total_utility() as f64 );
		    if pattern.len() == 1 {
			assert_eq!( pattern.correlation, 1.0 );
		    } else {
			assert!( pattern.correlation >= 0.5 );
		    }
		}
	    }
	}
    }

    #[test]
    fn test_no_duplicates_and_deterministic() {
	let mut rng = StdRng::seed_from_u64( 6 );
	for _ in 0 .. 10 {
	    let database = random_database( &mut rng );
	    let config = MinerConfig::new( 0.05, 0.2, 4 );
	    let context = SearchContext::new( &database, &config ).unwrap();
	    for algorithm in Algorithm::all() {
		let first = algorithm.miner().mine( &context ).patterns;
		let second = algorithm.miner().mine( &context ).patterns;
		assert_eq!( first, second );

		let mut itemsets: Vec<Itemvec> = first.iter().map( |p| p.itemset.clone() ).collect();
		itemsets.sort();
		let before = itemsets.len();
		itemsets.dedup();
		assert_eq!( before, itemsets.len(), "{algorithm} reported an itemset twice" );
	    }
	}
    }

    #[test]
    fn test_single_items_only() {
	let mut rng = StdRng::seed_from_u64( 7 );
	let database = random_database( &mut rng );
	let config = MinerConfig::new( 0.01, 1.0, 1 );
	let context = SearchContext::new( &database, &config ).unwrap();
	for algorithm in Algorithm::all() {
	    let result = algorithm.miner().mine( &context );
	    assert!( result.patterns.iter().all( |p| p.len() == 1 && p.correlation == 1.0 ));
	    assert_eq!( canonical( result.patterns ), brute_force( &context ));
	}
    }
}
