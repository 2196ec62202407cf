use tracing::{debug, info_span};

use crate::*;
use crate::data::{RemainingUtility, UtilityList};

use super::{levelwise, Algorithm, Miner, MiningResult, SearchContext};

/// Level-wise search over revised utility lists, whose remaining utility spans the whole transaction.
///
/// The revised bound is never smaller than the suffix bound of CoIUM, so at equal thresholds this
/// miner cuts fewer branches. Both miners find the same patterns when the candidate cap is not hit.
#[derive( Debug, Clone, Copy, Default )]
pub struct CoUpm;

impl Miner for CoUpm {
    fn algorithm( &self ) -> Algorithm { Algorithm::CoUpm }

    fn mine( &self, context: &SearchContext ) -> MiningResult {
	let span = info_span!( "coupm" );
	let _guard = span.enter();
	let database = context.database;
	let mut result = context.result( Algorithm::CoUpm );

	let twus = database.item_twus();
	let mut candidates: Itemvec = Vec::new();
	for item in database.universe() {
	    if context.oracle.passes_twu( twus[ item ] ) {
		candidates.push( *item );
	    } else {
		result.stats.pruned_twu += 1;
	    }
	}
	debug!( "{} of {} items pass TWU", candidates.len(), database.universe().len() );

	let singles = UtilityList::construct_all( database.transactions(), database.profits(), RemainingUtility::Revised,
						  |item| context.oracle.passes_twu( twus[ &item ] ));

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
