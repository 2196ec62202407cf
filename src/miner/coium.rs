use rustc_hash::FxHashMap;
use tracing::{debug, info_span};

use crate::*;
use crate::data::{RemainingUtility, UtilityList};

use super::{levelwise, Algorithm, Miner, MiningResult, SearchContext};

/// Ranks items by descending TWU, joins all surviving pairs and extends them level by level,
/// considering at most `max_candidates_per_level` sibling pairs per level.
#[derive( Debug, Clone, Copy, Default )]
pub struct CoIum;

impl Miner for CoIum {
    fn algorithm( &self ) -> Algorithm { Algorithm::CoIum }

    fn mine( &self, context: &SearchContext ) -> MiningResult {
	let span = info_span!( "coium" );
	let _guard = span.enter();
	let database = context.database;
	let mut result = context.result( Algorithm::CoIum );

	let twus = database.item_twus();
	let mut candidates: Itemvec = Vec::new();
	for item in database.universe() {
	    if context.oracle.passes_twu( twus[ item ] ) {
		candidates.push( *item );
	    } else {
		result.stats.pruned_twu += 1;
	    }
	}
	// stable, so equal TWU keeps ascending ids
	candidates.sort_by( |left, right| twus[ right ].cmp( &twus[ left ] ));
	debug!( "{} of {} items pass TWU", candidates.len(), database.universe().len() );

	// Remaining utility has to follow the ranking, because extensions append items in ranking order.
	let rank: FxHashMap<Item, usize> = candidates.iter().enumerate().map( |(r, item)| (*item, r) ).collect();
	let ranked = rank_transactions( database.transactions(), &rank );
	let singles = UtilityList::construct_all( &ranked, database.profits(), RemainingUtility::Suffix, |_| true );

	levelwise::single_level( &candidates, &singles, context, &mut result );
	if context.config.max_len < 2 {
	    return result;
	}
	if context.interrupt.is_triggered() {
	    result.stats.interrupted = true;
	    return result;
	}
	let pairs = levelwise::pair_level( &candidates, &singles, context, &mut result );
	levelwise::extend( pairs, &singles, context, &mut result );
	result
    }
}

/// Reorders every transaction by rank, dropping unranked items.
fn rank_transactions( transactions: &[Itemvec], rank: &FxHashMap<Item, usize> ) -> Vec<Itemvec> {
    transactions.iter()
	.map( |transaction| {
	    let mut ranked: Itemvec = transaction.iter().copied().filter( |item| rank.contains_key( item )).collect();
	    ranked.sort_by_key( |item| rank[ item ] );
	    ranked
	})
	.collect()
}
