//! File access for the binaries. The miners never touch the file system.

use std::fs::File;
use std::io::{BufRead, BufReader, Write};
use std::path::Path;

use serde_json as json;
use tracing::debug;

use crate::*;

/// Converts a structure into a string
pub trait PrettyFormatter<T> {
    fn format_pretty( &self, object: &T ) -> String;
}

/// Reads a file line by line. Lines the converter maps to None are skipped; conversion errors abort.
pub fn read_lines<T, F>( path: &str, converter: F ) -> Result<Vec<T>> where
    F: Fn( usize, &str ) -> Result<Option<T>>,
{
    let file = File::open( Path::new( path ))?;
    let reader = BufReader::new( file );
    let mut records = Vec::new();
    for (number, line) in reader.lines().enumerate() {
	if let Some( record ) = converter( number + 1, &line? )? {
	    records.push( record );
	}
    }
    debug!( "read {} records from {path}", records.len() );
    Ok( records )
}

/// Reads transactions in FIMI format, or from the first column of a CSV file.
pub fn read_transactions( path: &str ) -> Result<Vec<Itemvec>> {
    if path.ends_with( ".csv" ) {
	read_lines( path, |_, line| Ok( parse_fimi_to_vec( line.split( ',' ).next().unwrap_or( "" ))))
    } else {
	read_lines( path, |_, line| Ok( parse_fimi_to_vec( line )))
    }
}

/// Parses whitespace separated item ids. Tokens that are not ids are ignored, lines without ids yield None.
pub fn parse_fimi_to_vec( line: &str ) -> Option<Itemvec> {
    let items: Itemvec = line.split_whitespace()
	.filter_map( |chunk| chunk.parse::<Item>().ok() )
	.collect();
    if items.is_empty() {
	None
    } else {
	Some( items )
    }
}

/// Reads `item profit` lines
pub fn read_profits( path: &str ) -> Result<ProfitTable> {
    let pairs = read_lines( path, parse_profit_line )?;
    Ok( pairs.into_iter().collect() )
}

fn parse_profit_line( number: usize, line: &str ) -> Result<Option<(Item, Profit)>> {
    let mut chunks = line.split_whitespace();
    match (chunks.next(), chunks.next(), chunks.next()) {
	(None, _, _) => Ok( None ),
	(Some( item ), Some( profit ), None) => match (item.parse::<Item>(), profit.parse::<Profit>()) {
	    (Ok( item ), Ok( profit )) => Ok( Some( (item, profit) )),
	    _ => Err( MiningError::Parse{ line: number, content: line.to_string() }),
	},
	_ => Err( MiningError::Parse{ line: number, content: line.to_string() }),
    }
}

/// Writes `item profit` lines in ascending item order
pub fn write_profits( profits: &ProfitTable, path: &str ) -> Result<()> {
    let mut ordered: Vec<(&Item, &Profit)> = profits.iter().collect();
    ordered.sort();
    let mut file = File::create( Path::new( path ))?;
    for (item, profit) in ordered {
	writeln!( file, "{item} {profit}" )?;
    }
    Ok( () )
}

/// Creates a fimi string from an iterator over items
pub fn produce_fimi<I: Iterator<Item = Item>>( items: I, left_delimiter: &str, separator: &str, right_delimiter: &str ) -> String {
    let mut fimi = String::new();
    fimi.push_str( left_delimiter );
    let chunks: Vec<String> = items.map( |i| i.to_string() ).collect();
    fimi.push_str( chunks.join( separator ).as_str() );
    fimi.push_str( right_delimiter );
    fimi
}

/// Writes a serializable value to a file as JSON
pub fn write_json<M: serde::Serialize>( value: &M, path: &str ) -> Result<()> {
    let text = json::to_string_pretty( value )?;
    let mut file = File::create( Path::new( path ))?;
    write!( file, "{}", text )?;
    Ok( () )
}

/// Reads a JSON file into a deserializable value
pub fn read_json<M: serde::de::DeserializeOwned>( path: &str ) -> Result<M> {
    let file = File::open( Path::new( path ))?;
    Ok( json::from_reader( BufReader::new( file ))? )
}
