use std::path::Path;

use first_match::backend::lazy::LazyQuery;
use first_match::io::{read_stream_ipc, ColumnNames};

pub fn run(
    a_path: &Path,
    b_path: &Path,
    names: &ColumnNames,
    optimized: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let a = read_stream_ipc(a_path, names)?;
    let b = read_stream_ipc(b_path, names)?;
    let mut query = LazyQuery::new(&a, &b)?;
    if optimized {
        query = query.optimized();
    }
    print!("{}", query.explain());
    Ok(())
}
