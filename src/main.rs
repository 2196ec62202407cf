use clap::{ArgAction, Parser, ValueEnum};
use tracing::{info, warn};
use tracing_subscriber::filter::LevelFilter;

use comine::*;
use comine::data::{ProfitSource, RandomProfits};
use comine::io::{self, PrettyFormatter};
use comine::miner::{ResultFormatter, mine_database};

#[derive( Parser, Debug )]
#[command( name = "miner", about = "Mines correlated high-utility itemsets from a transaction file" )]
struct Args {
    /// Transactions in FIMI format, or CSV with transactions in the first column
    #[arg( short, long )]
    data: String,

    /// File with `item profit` lines; random weights are drawn if missing
    #[arg( short, long )]
    profits: Option<String>,

    /// Seed for random weights
    #[arg( long, default_value_t = 0 )]
    seed: u64,

    /// Stores the weights used for this run
    #[arg( long )]
    save_profits: Option<String>,

    #[arg( short, long, value_enum, default_value_t = AlgorithmArg::All )]
    algorithm: AlgorithmArg,

    /// JSON file with a miner configuration; flags below override it
    #[arg( short, long )]
    config: Option<String>,

    #[arg( long )]
    min_util: Option<f64>,

    #[arg( long )]
    min_cor: Option<f64>,

    #[arg( long )]
    max_len: Option<usize>,

    /// Join attempts per level for the level-wise miners
    #[arg( long )]
    max_candidates: Option<usize>,

    /// Search the level-wise miners exhaustively
    #[arg( long, conflicts_with = "max_candidates" )]
    no_cap: bool,

    /// Abort when an item has no profit instead of substituting weight 1
    #[arg( long )]
    strict_profits: bool,

    #[arg( long )]
    parallel: bool,

    /// Writes all results as JSON
    #[arg( short, long )]
    output: Option<String>,

    /// Patterns printed per algorithm
    #[arg( long, default_value_t = 10 )]
    top: usize,

    #[arg( short, long, action = ArgAction::Count )]
    verbose: u8,
}

#[derive( ValueEnum, Clone, Copy, Debug, PartialEq, Eq )]
enum AlgorithmArg {
    Coium,
    Coupm,
    Cohui,
    All,
}

fn main() -> std::result::Result<(), String> {
    let args = Args::parse();
    prepare_logging( args.verbose );
    run( &args ).map_err( |err| err.to_string() )
}

fn run( args: &Args ) -> Result<()> {
    let config = build_config( args )?;
    config.validate()?;

    let transactions = io::read_transactions( &args.data )?;
    let profits = match &args.profits {
	Some( path ) => io::read_profits( path )?,
	None => {
	    let items: Itemvec = transactions.iter().flatten().copied().collect();
	    RandomProfits::with_seed( args.seed ).profits( &transactions, &items )?
	},
    };
    if let Some( path ) = &args.save_profits {
	io::write_profits( &profits, path )?;
	info!( "profits written to {path}" );
    }

    let database = Database::new( transactions, &profits, config.missing_profit )?;
    info!( "{} transactions, {} items, total utility {}", database.len(), database.universe().len(), database.total_utility() );
    if database.is_empty() {
	warn!( "no transactions in {}", args.data );
    }

    let mut formatter = ResultFormatter::new();
    formatter.limit( args.top );
    if args.verbose > 0 {
	formatter.show_stats();
    }

    let mut results: Vec<MiningResult> = Vec::new();
    for algorithm in selected( args.algorithm ) {
	let result = mine_database( &database, &config, algorithm )?;
	print!( "{}", formatter.format_pretty( &result ));
	if result.stats.truncated {
	    warn!( "{algorithm} hit the candidate cap, rerun with --no-cap for a complete result" );
	}
	results.push( result );
    }

    if let Some( path ) = &args.output {
	io::write_json( &results, path )?;
	info!( "results written to {path}" );
    }
    Ok( () )
}

fn build_config( args: &Args ) -> Result<MinerConfig> {
    let mut config: MinerConfig = match &args.config {
	Some( path ) => io::read_json( path )?,
	None => MinerConfig::default(),
    };
    if let Some( min_util ) = args.min_util { config.min_util = min_util; }
    if let Some( min_cor ) = args.min_cor { config.min_cor = min_cor; }
    if let Some( max_len ) = args.max_len { config.max_len = max_len; }
    if let Some( cap ) = args.max_candidates { config.max_candidates_per_level = Some( cap ); }
    if args.no_cap { config.max_candidates_per_level = None; }
    if args.strict_profits { config.missing_profit = MissingProfitPolicy::Fail; }
    if args.parallel { config.parallel = true; }
    Ok( config )
}

fn selected( choice: AlgorithmArg ) -> Vec<Algorithm> {
    match choice {
	AlgorithmArg::Coium => vec!( Algorithm::CoIum ),
	AlgorithmArg::Coupm => vec!( Algorithm::CoUpm ),
	AlgorithmArg::Cohui => vec!( Algorithm::CoHui ),
	AlgorithmArg::All => Algorithm::all().to_vec(),
    }
}

fn prepare_logging( verbosity: u8 ) {
    let level = match verbosity {
	0 => LevelFilter::INFO,
	1 => LevelFilter::DEBUG,
	_ => LevelFilter::TRACE,
    };
    let tracer = tracing_subscriber::fmt::fmt()
	.with_max_level( level )
	.with_writer( std::io::stderr )
	.finish();
    if tracing::subscriber::set_global_default( tracer ).is_err() {
	eprintln!( "logging was already initialised" );
    }
}
