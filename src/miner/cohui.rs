use bit_set::BitSet;
use rayon::prelude::*;
use tracing::{debug, info_span, trace};

use crate::*;
use crate::data::Tid;

use super::{Algorithm, Miner, MiningResult, Pattern, SearchContext, SearchStats};

/// Depth-first prefix projection with look-ahead pruning.
///
/// A prefix is only extended with items after its last one, so every itemset is visited once.
/// Top-level branches share nothing mutable and run on the rayon pool when the configuration asks for it.
#[derive( Debug, Clone, Copy, Default )]
pub struct CoHuiMiner;

/// Search state of one top-level branch
struct Projection<'c, 'a> {
    context: &'c SearchContext<'a>,
    patterns: Vec<Pattern>,
    stats: SearchStats,
}

impl Miner for CoHuiMiner {
    fn algorithm( &self ) -> Algorithm { Algorithm::CoHui }

    fn mine( &self, context: &SearchContext ) -> MiningResult {
	let span = info_span!( "cohui" );
	let _guard = span.enter();
	let database = context.database;
	let mut result = context.result( Algorithm::CoHui );

	let twus = database.item_twus();
	let mut roots: Itemvec = Vec::new();
	for item in database.universe() {
	    if context.oracle.passes_twu( twus[ item ] ) {
		roots.push( *item );
	    } else {
		result.stats.pruned_twu += 1;
	    }
	}
	debug!( "{} of {} items pass TWU", roots.len(), database.universe().len() );

	let branches: Vec<(Vec<Pattern>, SearchStats)> = if context.config.parallel {
	    roots.par_iter().map( |item| Projection::explore( context, *item )).collect()
	} else {
	    roots.iter().map( |item| Projection::explore( context, *item )).collect()
	};

	// gathered in item order, so the parallel run reports the same sequence
	for (patterns, stats) in branches {
	    result.patterns.extend( patterns );
	    result.stats.merge( &stats );
	}
	result
    }
}

impl<'c, 'a> Projection<'c, 'a> {

    /// Searches every itemset starting with `item`
    fn explore( context: &'c SearchContext<'a>, item: Item ) -> (Vec<Pattern>, SearchStats) {
	let mut projection = Projection{ context, patterns: Vec::new(), stats: SearchStats::default() };
	if context.interrupt.is_triggered() {
	    projection.stats.interrupted = true;
	    return (projection.patterns, projection.stats);
	}
	let span = info_span!( "branch", item );
	let _guard = span.enter();

	let mut prefix: Itemvec = vec!( item );
	let mut prefix_bits = BitSet::new();
	prefix_bits.insert( item );
	let projected: Vec<Tid> = (0 .. context.database.len())
	    .filter( |tid| context.database.bitset( *tid ).contains( item ))
	    .collect();
	projection.grow( &mut prefix, &mut prefix_bits, &projected );
	(projection.patterns, projection.stats)
    }

    /// Evaluates the prefix over its projected transactions, then recurses into its extensions.
    /// Pre: every projected transaction contains the prefix.
    fn grow( &mut self, prefix: &mut Itemvec, prefix_bits: &mut BitSet, projected: &[Tid] ) {
	let context = self.context;
	let database = context.database;
	if context.interrupt.is_triggered() {
	    self.stats.interrupted = true;
	    return;
	}
	self.stats.nodes += 1;

	// correlation only drops as the prefix grows
	if !context.oracle.passes_correlation( prefix, &context.index ) {
	    self.stats.pruned_correlation += 1;
	    return;
	}

	let prefix_profit: Utility = prefix.iter().map( |item| database.profit( *item )).sum();
	let utility = prefix_profit * projected.len() as Utility;
	if context.oracle.is_high_utility( utility ) {
	    trace!( "pattern {prefix:?} utility {utility}" );
	    self.patterns.push( context.pattern( prefix, utility ));
	}

	if prefix.len() >= context.config.max_len {
	    return;
	}

	let Some( last ) = prefix.last().copied() else { return };
	let mut extensions: Itemvec = projected.iter()
	    .flat_map( |tid| {
		let transaction = database.transaction( *tid );
		let start = transaction.partition_point( |item| *item <= last );
		transaction[ start .. ].iter().copied()
	    })
	    .collect();
	extensions.sort_unstable();
	extensions.dedup();

	for item in extensions {
	    prefix_bits.insert( item );
	    let extended: Vec<Tid> = projected.iter().copied()
		.filter( |tid| database.bitset( *tid ).is_superset( prefix_bits ))
		.collect();

	    let upper_bound: Utility = extended.iter().map( |tid| database.transaction_utility( *tid )).sum();
	    if context.oracle.passes_look_ahead( upper_bound ) {
		prefix.push( item );
		self.grow( prefix, prefix_bits, &extended );
		prefix.pop();
	    } else {
		self.stats.pruned_look_ahead += 1;
	    }
	    prefix_bits.remove( item );
	}
    }
}
