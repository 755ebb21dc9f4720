//! Utilities related to the parsing of arguments.

use std::fmt;
use std::num::ParseIntError;
use std::str::FromStr;

use tracing::debug;

//===================//
// Number of Records //
//===================//

/// Utility enum to designate whether we are reviewing all records in the file
/// or just some of them.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NumberOfRecords {
    /// Designates that we should review _all_ of the records in the file.
    All,

    /// Designates that we should review _some_ of the records in the file. The
    /// exact count of records is stored in the `usize`.
    Some(usize),
}

impl From<Option<usize>> for NumberOfRecords {
    fn from(num_records: Option<usize>) -> Self {
        match num_records {
            Some(n) => {
                debug!("Reading a maximum of {} records.", n);
                NumberOfRecords::Some(n)
            }
            None => {
                debug!("Reading all available records.");
                NumberOfRecords::All
            }
        }
    }
}

impl FromStr for NumberOfRecords {
    type Err = ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.eq_ignore_ascii_case("all") {
            return Ok(NumberOfRecords::All);
        }

        s.parse::<usize>().map(NumberOfRecords::Some)
    }
}

impl fmt::Display for NumberOfRecords {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NumberOfRecords::All => write!(f, "all"),
            NumberOfRecords::Some(n) => write!(f, "{}", n),
        }
    }
}
