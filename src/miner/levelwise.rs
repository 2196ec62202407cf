//! Level-by-level pairwise extension shared by CoIUM and CoUPM.
//!
//! Every level holds itemsets of equal length grouped by their prefix, each group ordered by the
//! last item's position in the miner's item order. Joining an itemset with a later sibling from
//! its group yields the next level, again grouped by prefix.

use rustc_hash::FxHashMap;
use tracing::{debug, debug_span, warn};

use crate::*;
use crate::data::UtilityList;

use super::{MiningResult, SearchContext};

/// An itemset on the current level
pub(super) struct Candidate {
    list: UtilityList,
    /// passed the utility upper bound, so extensions may still qualify
    expandable: bool,
}

impl Candidate {
    fn itemset( &self ) -> &[Item] { self.list.itemset() }
}

/// Emits the single items that are high-utility on their own.
pub(super) fn single_level( items: &[Item], singles: &FxHashMap<Item, UtilityList>, context: &SearchContext, result: &mut MiningResult ) {
    for item in items {
	if let Some( list ) = singles.get( item ) {
	    result.stats.nodes += 1;
	    if context.oracle.is_high_utility( list.total_utility() ) {
		result.patterns.push( context.pattern( list.itemset(), list.total_utility() ));
	    }
	}
    }
}

/// Joins every pair of candidate items, in the given order, into the second level.
/// Pairs failing the correlation bound or never occurring together are dropped.
/// Pairs failing the upper bound stay on the level as join partners but are not extended themselves.
pub(super) fn pair_level( items: &[Item], singles: &FxHashMap<Item, UtilityList>, context: &SearchContext, result: &mut MiningResult ) -> Vec<Candidate> {
    let span = debug_span!( "level", length = 2 );
    let _guard = span.enter();

    let mut level = Vec::new();
    for (i, a) in items.iter().enumerate() {
	let Some( left ) = singles.get( a ) else { continue };
	for b in &items[ i + 1 .. ] {
	    if !context.oracle.passes_correlation( &[*a, *b], &context.index ) {
		result.stats.pruned_correlation += 1;
		continue;
	    }
	    let Some( right ) = singles.get( b ) else { continue };
	    if let Some( list ) = left.join( right ) {
		result.stats.joins += 1;
		level.push( evaluate( list, context, result ));
	    }
	}
    }
    debug!( "{} candidates of length 2", level.len() );
    level
}

/// Grows the level until the length bound, no survivor, or an interrupt.
/// At most `max_candidates_per_level` sibling pairs are considered per level; hitting the cap marks the result truncated.
pub(super) fn extend( mut level: Vec<Candidate>, singles: &FxHashMap<Item, UtilityList>, context: &SearchContext, result: &mut MiningResult ) {
    while let Some( first ) = level.first() {
	let length = first.itemset().len();
	if length >= context.config.max_len {
	    break;
	}
	if context.interrupt.is_triggered() {
	    result.stats.interrupted = true;
	    break;
	}
	let span = debug_span!( "level", length = length + 1 );
	let _guard = span.enter();

	let n = level.len();
	let cap = context.config.max_candidates_per_level.map( |cap| cap.min( n * (n - 1) / 2 ));
	let mut considered: usize = 0;
	let mut next = Vec::new();

	'pairs: for (i, x) in level.iter().enumerate() {
	    if !x.expandable {
		continue;
	    }
	    let prefix = &x.itemset()[ .. length - 1 ];
	    let siblings = level[ i + 1 .. ].iter().take_while( |y| &y.itemset()[ .. length - 1 ] == prefix );
	    for y in siblings {
		if let Some( cap ) = cap {
		    if considered >= cap {
			warn!( "candidate cap of {cap} reached at length {}, results may be incomplete", length + 1 );
			result.stats.truncated = true;
			break 'pairs;
		    }
		}
		considered += 1;

		let Some( last ) = y.itemset().last().copied() else { continue };
		let mut itemset = x.itemset().to_vec();
		itemset.push( last );
		if !context.oracle.passes_correlation( &itemset, &context.index ) {
		    result.stats.pruned_correlation += 1;
		    continue;
		}
		// the singleton carries exactly the utility the extension adds
		let Some( single ) = singles.get( &last ) else { continue };
		if let Some( list ) = x.list.join( single ) {
		    result.stats.joins += 1;
		    next.push( evaluate( list, context, result ));
		}
	    }
	}
	debug!( "{considered} pairs considered, {} candidates of length {}", next.len(), length + 1 );
	level = next;
    }
}

/// Emits the itemset if it qualifies and decides whether it may be extended.
fn evaluate( list: UtilityList, context: &SearchContext, result: &mut MiningResult ) -> Candidate {
    result.stats.nodes += 1;
    let utility = list.total_utility();
    if context.oracle.is_high_utility( utility ) {
	result.patterns.push( context.pattern( list.itemset(), utility ));
    }
    let expandable = context.oracle.passes_upper_bound( &list );
    if !expandable {
	result.stats.pruned_upper_bound += 1;
    }
    Candidate{ list, expandable }
}
