use rustc_hash::FxHashMap;

use super::{Count, Item, Itemvec};

/// Occurrence counts of item combinations up to a length bound. Read-only once built.
#[derive( Debug, Clone )]
pub struct CorrelationIndex {
    /// keys are sorted combinations
    supports: FxHashMap<Itemvec, Count>,
    max_len: usize,
}

impl CorrelationIndex {

    /// Counts every sub-combination of size 1 ..= min(|t|, max_len) of every transaction.
    /// Pre: transactions hold sorted, distinct items.
    pub fn build( transactions: &[Itemvec], max_len: usize ) -> CorrelationIndex {
	let mut supports: FxHashMap<Itemvec, Count> = FxHashMap::default();
	let mut buffer: Itemvec = Vec::with_capacity( max_len );
	for transaction in transactions {
	    let depth = transaction.len().min( max_len );
	    for size in 1 ..= depth {
		for_each_combination( transaction, size, &mut buffer, &mut |combination: &[Item]| {
		    *supports.entry( combination.to_vec() ).or_insert( 0 ) += 1;
		});
	    }
	}
	CorrelationIndex{ supports, max_len }
    }

    /// Number of transactions containing the combination. Combinations longer than the bound count as 0.
    pub fn support( &self, items: &[Item] ) -> Count {
	if is_sorted( items ) {
	    self.supports.get( items ).copied().unwrap_or( 0 )
	} else {
	    let mut key = items.to_vec();
	    key.sort_unstable();
	    self.supports.get( &key ).copied().unwrap_or( 0 )
	}
    }

    pub fn max_len( &self ) -> usize { self.max_len }

    /// Number of distinct combinations held
    pub fn len( &self ) -> usize { self.supports.len() }

    pub fn is_empty( &self ) -> bool { self.supports.is_empty() }

    /// Kulczynski measure of a pair: the mean of both conditional supports.
    pub fn kulczynski( &self, a: Item, b: Item ) -> f64 {
	// fixed argument order keeps the float result independent of the call order
	let (a, b) = if a <= b { (a, b) } else { (b, a) };
	let support_a = self.support( &[a] );
	let support_b = self.support( &[b] );
	if support_a == 0 || support_b == 0 {
	    return 0.0;
	}
	let support_ab = self.support( &[a, b] ) as f64;
	0.5 * (support_ab / support_a as f64 + support_ab / support_b as f64)
    }

    /// Correlation of an itemset: its weakest pair. Single items are fully correlated.
    pub fn correlation( &self, itemset: &[Item] ) -> f64 {
	let mut weakest = 1.0;
	for (i, a) in itemset.iter().enumerate() {
	    for b in &itemset[ i + 1 .. ] {
		let kulc = self.kulczynski( *a, *b );
		if kulc < weakest {
		    weakest = kulc;
		}
	    }
	}
	weakest
    }
}

/// Calls `visit` with every combination of `size` items from `items`, preserving their order.
pub fn for_each_combination<F>( items: &[Item], size: usize, buffer: &mut Itemvec, visit: &mut F ) where
    F: FnMut( &[Item] ),
{
    if buffer.len() == size {
	visit( buffer.as_slice() );
	return;
    }
    let needed = size - buffer.len();
    if items.len() < needed {
	return;
    }
    for (i, item) in items.iter().enumerate() {
	if items.len() - i < needed {
	    break;
	}
	buffer.push( *item );
	for_each_combination( &items[ i + 1 .. ], size, buffer, visit );
	buffer.pop();
    }
}

fn is_sorted( items: &[Item] ) -> bool {
    items.windows( 2 ).all( |w| w[ 0 ] <= w[ 1 ] )
}
