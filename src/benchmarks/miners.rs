use tracing::{info, debug};
use tracing_subscriber;

use rand::prelude::*;
use rand::rngs::StdRng;
use statrs::distribution::DiscreteUniform;

use std::time::*;

use comine::*;
use comine::data::{ProfitSource, RandomProfits};
use comine::miner::Interrupt;

fn main() -> std::result::Result<(), String> {
    prepare_logging();

    let data = generate_transactions( 2000, 40, 12, 7 )?;
    let items: Itemvec = (0 .. 40).collect();
    let profits = RandomProfits::with_seed( 7 ).profits( &data, &items ).map_err( |e| e.to_string() )?;
    let database = Database::new( data, &profits, MissingProfitPolicy::Fail ).map_err( |e| e.to_string() )?;
    info!( "{} transactions, total utility {}", database.len(), database.total_utility() );

    for max_len in [2, 3, 4] {
	let config = MinerConfig::new( 0.005, 0.3, max_len );
	benchmark_miners( &database, &config );
	benchmark_miners( &database, &config.clone().with_candidate_cap( None ));
    }
    let config = MinerConfig::new( 0.005, 0.3, 4 ).with_parallel( true );
    benchmark_miners( &database, &config );

    Ok( () )
}

fn benchmark_miners( database: &Database, config: &MinerConfig ) {
    info!( "Start benchmark: max length {}, cap {:?}, parallel {}", config.max_len, config.max_candidates_per_level, config.parallel );
    let context = match SearchContext::new( database, config ) {
	Ok( context ) => context.with_interrupt( Interrupt::with_timeout( Duration::from_secs( 60 ))),
	Err( err ) => {
	    info!( "skipped: {err}" );
	    return;
	},
    };
    for algorithm in Algorithm::all() {
	let start = Instant::now();
	let result = algorithm.miner().mine( &context );
	let time_spent = Instant::now().duration_since( start );
	info!( "Result: {algorithm} found {} patterns in {}ms", result.patterns.len(), time_spent.as_millis() );
	debug!( "{:?}", result.stats );
    }
}

/// Transactions with uniformly drawn lengths whose items favour low ids
fn generate_transactions( number: usize, universe: usize, max_length: usize, seed: u64 ) -> std::result::Result<Vec<Itemvec>, String> {
    let mut gen = StdRng::seed_from_u64( seed );
    let length_distribution = DiscreteUniform::new( 1, max_length as i64 ).map_err( |e| e.to_string() )?;
    let item_distribution = DiscreteUniform::new( 0, universe as i64 - 1 ).map_err( |e| e.to_string() )?;

    let transactions: Vec<Itemvec> = (0 .. number).map( |_| {
	let length = length_distribution.sample( &mut gen ) as usize;
	let mut transaction: Itemvec = (0 .. length)
	    .map( |_| {
		// the minimum of two draws skews towards frequent low items
		let a = item_distribution.sample( &mut gen ) as usize;
		let b = item_distribution.sample( &mut gen ) as usize;
		a.min( b )
	    })
	    .collect();
	transaction.sort();
	transaction.dedup();
	transaction
    }).collect();
    Ok( transactions )
}

fn prepare_logging() {
    let tracer = tracing_subscriber::fmt::fmt()
	.with_max_level( tracing_subscriber::filter::LevelFilter::INFO )
	.finish();
    tracing::subscriber::set_global_default( tracer ).unwrap();
}
