use std::cmp::Ordering;

use rustc_hash::FxHashMap;

use super::{Item, Itemvec, ProfitTable, Tid, Utility};

/// How the remaining utility of a singleton is measured within a transaction.
#[derive( Debug, Clone, Copy, PartialEq, Eq )]
pub enum RemainingUtility {
    /// Profits of the items after the item in the transaction's order
    Suffix,
    /// Profits of every other item in the transaction (revised utility list)
    Revised,
}

/// One transaction's entry in a utility list
#[derive( Debug, Clone, Copy, PartialEq, Eq )]
pub struct Element {
    pub tid: Tid,
    /// summed profit of the itemset's items in the transaction
    pub iutil: Utility,
    /// bound on what extensions can still add in the transaction
    pub rutil: Utility,
}

/// Utility list of an itemset, elements ordered by transaction id.
#[derive( Debug, Clone, PartialEq, Eq )]
pub struct UtilityList {
    itemset: Itemvec,
    elements: Vec<Element>,
    // aggregates are kept in step with every push
    total_utility: Utility,
    total_remaining: Utility,
}

impl UtilityList {

    pub fn new( itemset: Itemvec ) -> UtilityList {
	UtilityList{
	    itemset,
	    elements: Vec::new(),
	    total_utility: 0,
	    total_remaining: 0,
	}
    }

    /// Builds the list of a single item by scanning the transactions.
    /// Pre: items of every transaction follow one global order.
    pub fn construct( item: Item, transactions: &[Itemvec], profits: &ProfitTable, remaining: RemainingUtility ) -> UtilityList {
	let mut list = UtilityList::new( vec!( item ));
	for (tid, transaction) in transactions.iter().enumerate() {
	    if let Some( position ) = transaction.iter().position( |i| *i == item ) {
		let iutil = profit_of( profits, item );
		let rutil: Utility = match remaining {
		    RemainingUtility::Suffix => transaction[ position + 1 .. ].iter().map( |i| profit_of( profits, *i )).sum(),
		    RemainingUtility::Revised => transaction.iter()
			.filter( |i| **i != item )
			.map( |i| profit_of( profits, *i ))
			.sum(),
		};
		list.push( tid, iutil, rutil );
	    }
	}
	list
    }

    /// Builds the lists of all items accepted by `keep` in a single pass over the transactions.
    /// Yields the same lists as calling `construct` for every kept item.
    pub fn construct_all<F>( transactions: &[Itemvec], profits: &ProfitTable, remaining: RemainingUtility, keep: F ) -> FxHashMap<Item, UtilityList> where
	F: Fn( Item ) -> bool,
    {
	let mut lists: FxHashMap<Item, UtilityList> = FxHashMap::default();
	for (tid, transaction) in transactions.iter().enumerate() {
	    let transaction_utility: Utility = transaction.iter().map( |i| profit_of( profits, *i )).sum();
	    // walk backwards so the suffix sum is at hand
	    let mut suffix: Utility = 0;
	    for item in transaction.iter().rev() {
		let iutil = profit_of( profits, *item );
		if keep( *item ) {
		    let rutil = match remaining {
			RemainingUtility::Suffix => suffix,
			RemainingUtility::Revised => transaction_utility - iutil,
		    };
		    lists.entry( *item )
			.or_insert_with( || UtilityList::new( vec!( *item )))
			.push( tid, iutil, rutil );
		}
		suffix += iutil;
	    }
	}
	lists
    }

    /// Appends an element. Pre: tid is greater than every tid already in the list.
    pub fn push( &mut self, tid: Tid, iutil: Utility, rutil: Utility ) {
	debug_assert!( self.elements.last().map_or( true, |e| e.tid < tid ));
	self.elements.push( Element{ tid, iutil, rutil });
	self.total_utility += iutil;
	self.total_remaining += rutil;
    }

    /// Joins the lists of two disjoint itemsets where `other` contributes its last item.
    /// Utilities add up over the common transactions, the remaining utility is taken from `other`.
    /// Returns None if the itemsets never occur together.
    pub fn join( &self, other: &UtilityList ) -> Option<UtilityList> {
	let last = *other.itemset.last()?;
	let mut itemset = self.itemset.clone();
	itemset.push( last );
	let mut joined = UtilityList::new( itemset );

	// both lists are sorted by tid, so a merge finds the intersection
	let (mut left, mut right) = (0, 0);
	while left < self.elements.len() && right < other.elements.len() {
	    let x = &self.elements[ left ];
	    let y = &other.elements[ right ];
	    match x.tid.cmp( &y.tid ) {
		Ordering::Less => left += 1,
		Ordering::Greater => right += 1,
		Ordering::Equal => {
		    joined.push( x.tid, x.iutil + y.iutil, y.rutil );
		    left += 1;
		    right += 1;
		},
	    }
	}

	if joined.elements.is_empty() {
	    None
	} else {
	    Some( joined )
	}
    }

    pub fn itemset( &self ) -> &[Item] { &self.itemset }

    pub fn elements( &self ) -> &[Element] { &self.elements }

    pub fn len( &self ) -> usize { self.elements.len() }

    pub fn is_empty( &self ) -> bool { self.elements.is_empty() }

    pub fn total_utility( &self ) -> Utility { self.total_utility }

    pub fn total_remaining_utility( &self ) -> Utility { self.total_remaining }

    pub fn transaction_ids( &self ) -> Vec<Tid> {
	self.elements.iter().map( |e| e.tid ).collect()
    }
}

fn profit_of( profits: &ProfitTable, item: Item ) -> Utility {
    profits.get( &item ).copied().unwrap_or( 0 )
}
