use crate::io::{produce_fimi, PrettyFormatter};

use super::{MiningResult, Pattern};

/// Renders the best patterns of a result, one per line.
pub struct ResultFormatter {
    show_stats: bool,
    /// patterns shown, all if None
    limit: Option<usize>,
}

impl PrettyFormatter<MiningResult> for ResultFormatter {

    fn format_pretty( &self, result: &MiningResult ) -> String {
	let summary = result.summary();
	let mut output = format!( "{}: {} patterns (threshold {:.3}), avg length {:.2}, top utility {}, avg correlation {:.3}\n",
				  result.algorithm, summary.patterns, result.min_util, summary.avg_len,
				  summary.top_utility, summary.avg_correlation );
	if self.show_stats {
	    output.push_str( &format!( "  {:?}\n", result.stats ));
	}

	let mut ranked = result.clone();
	ranked.sort_by_utility();
	let shown = self.limit.unwrap_or( ranked.patterns.len() );
	ranked.patterns.iter()
	    .take( shown )
	    .map( format_pattern )
	    .fold( output, join_lines )
    }
}

fn format_pattern( pattern: &Pattern ) -> String {
    format!( "  {:>8}  {:.3}  {}", pattern.utility, pattern.correlation,
	     produce_fimi( pattern.itemset.iter().copied(), "{", " ", "}" ))
}

fn join_lines( mut accumulator: String, addition: String ) -> String {
    accumulator.push_str( addition.as_str() );
    accumulator.push( '\n' );
    accumulator
}

impl ResultFormatter {
    pub fn new() -> ResultFormatter {
	ResultFormatter{
	    show_stats: false,
	    limit: None,
	}
    }

    pub fn show_stats( &mut self ) { self.show_stats = true; }

    pub fn limit( &mut self, limit: usize ) { self.limit = Some( limit ); }
}

impl Default for ResultFormatter {
    fn default() -> ResultFormatter {
	ResultFormatter::new()
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::miner::Algorithm;

    #[test]
    fn test_format_top_patterns() {
	let mut result = MiningResult::new( Algorithm::CoUpm, 1.8 );
	result.patterns.push( Pattern::new( vec!( 1 ), 6, 1.0 ));
	result.patterns.push( Pattern::new( vec!( 1, 2 ), 10, 0.667 ));

	let mut formatter = ResultFormatter::new();
	formatter.limit( 1 );
	let text = formatter.format_pretty( &result );

	assert!( text.starts_with( "CoUPM: 2 patterns" ));
	assert!( text.contains( "{1 2}" ));
	assert!( !text.contains( "{1}" ));
	assert_eq!( text.lines().count(), 2 );
    }
}
