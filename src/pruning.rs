use crate::data::{CorrelationIndex, Item, UtilityList, Utility};

/// Predicates deciding whether a branch of the search can still hold a pattern.
/// All bounds are admissible: a rejected node has no qualifying superset reachable from it.
#[derive( Debug, Clone, Copy, PartialEq )]
pub struct PruningOracle {
    /// absolute utility threshold
    min_util: f64,
    min_cor: f64,
}

impl PruningOracle {

    pub fn new( min_util: f64, min_cor: f64 ) -> PruningOracle {
	PruningOracle{ min_util, min_cor }
    }

    pub fn min_util( &self ) -> f64 { self.min_util }

    pub fn min_cor( &self ) -> f64 { self.min_cor }

    /// Transaction-weighted utility bounds the utility of every superset
    pub fn passes_twu( &self, twu: Utility ) -> bool {
	twu as f64 >= self.min_util
    }

    /// Correlation only drops as items are added, so single items always pass.
    pub fn passes_correlation( &self, itemset: &[Item], index: &CorrelationIndex ) -> bool {
	itemset.len() < 2 || self.passes_correlation_score( index.correlation( itemset ))
    }

    pub fn passes_correlation_score( &self, correlation: f64 ) -> bool {
	correlation >= self.min_cor
    }

    /// Utility plus remaining utility bounds the itemset and its extensions
    pub fn passes_upper_bound( &self, list: &UtilityList ) -> bool {
	(list.total_utility() + list.total_remaining_utility()) as f64 >= self.min_util
    }

    /// Summed transaction utility of a projected database bounds every prefix grown inside it
    pub fn passes_look_ahead( &self, projected_utility: Utility ) -> bool {
	projected_utility as f64 >= self.min_util
    }

    pub fn is_high_utility( &self, utility: Utility ) -> bool {
	utility as f64 >= self.min_util
    }
}
