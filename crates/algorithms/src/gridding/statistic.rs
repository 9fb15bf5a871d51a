//! Statistic kinds and the set of statistics a grid produces

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use ptgrid_core::{Error, Result};
use serde::{Deserialize, Serialize};

/// A per-cell statistic that can be written as an output band.
///
/// The declaration order is the canonical band order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Statistic {
    /// Number of samples within radius of the cell center
    Count,
    /// Smallest sample value
    Min,
    /// Largest sample value
    Max,
    /// Arithmetic mean of sample values
    Mean,
    /// Inverse-distance-weighted value
    Idw,
    /// Population standard deviation of sample values
    #[serde(rename = "stdev")]
    StdDev,
}

impl Statistic {
    /// Every statistic, in band order
    pub const ALL: [Statistic; 6] = [
        Statistic::Count,
        Statistic::Min,
        Statistic::Max,
        Statistic::Mean,
        Statistic::Idw,
        Statistic::StdDev,
    ];

    /// Band name
    pub fn name(self) -> &'static str {
        match self {
            Statistic::Count => "count",
            Statistic::Min => "min",
            Statistic::Max => "max",
            Statistic::Mean => "mean",
            Statistic::Idw => "idw",
            Statistic::StdDev => "stdev",
        }
    }
}

impl fmt::Display for Statistic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Statistic {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "count" => Ok(Statistic::Count),
            "min" => Ok(Statistic::Min),
            "max" => Ok(Statistic::Max),
            "mean" => Ok(Statistic::Mean),
            "idw" => Ok(Statistic::Idw),
            "stdev" | "stddev" | "std" => Ok(Statistic::StdDev),
            _ => Err(Error::config(
                "output_type",
                s,
                "expected one of count, min, max, mean, idw, stdev",
            )),
        }
    }
}

/// The set of statistics a grid is asked to produce.
///
/// Mean is a dependency of the standard deviation: see [`OutputTypes::tracks_mean`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OutputTypes(BTreeSet<Statistic>);

impl OutputTypes {
    /// All six statistics
    pub fn all() -> Self {
        Self(Statistic::ALL.into_iter().collect())
    }

    pub fn contains(&self, stat: Statistic) -> bool {
        self.0.contains(&stat)
    }

    pub fn insert(&mut self, stat: Statistic) {
        self.0.insert(stat);
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Requested statistics in band order
    pub fn iter(&self) -> impl Iterator<Item = Statistic> + '_ {
        self.0.iter().copied()
    }

    /// Whether the running mean must be maintained. The standard deviation
    /// is computed around the mean, so requesting it implies tracking the mean
    /// even when the mean band itself is not exported.
    pub fn tracks_mean(&self) -> bool {
        self.contains(Statistic::Mean) || self.contains(Statistic::StdDev)
    }

    /// Parse a list of names. `"all"` expands to every statistic.
    pub fn parse_list<I, S>(names: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut set = OutputTypes::default();
        for name in names {
            let name = name.as_ref();
            if name.trim().eq_ignore_ascii_case("all") {
                return Ok(Self::all());
            }
            set.insert(name.parse()?);
        }
        Ok(set)
    }
}

impl FromIterator<Statistic> for OutputTypes {
    fn from_iter<I: IntoIterator<Item = Statistic>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}
