//! 🎭 Roles: which job this process was hired to do.
//!
//! The streaming harness launches the same binary as a mapper or a reducer over
//! partitioned input. The role decides how stdin is read, which extractor runs,
//! and where the output goes. Everything else is the same sequential pipeline.

use std::fmt;

use crate::backends::ReadMode;

/// 🗺️ Mapper roles: transform each record independently, write to a stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MapRole {
    /// `name \t id` lines whose id carries the marker
    Names,
    /// `id \t count` pass-through
    Counts,
    /// one JSON document on stdin, flattened into keyed interaction lines
    Interactions,
    /// `LongValueSum:<guid> \t 1` for every guid token
    Guids,
    /// `LongValueSum:<word> \t 1` for every word
    Words,
}

/// 🗄️ Reducer roles: persist each record to the remote attribute store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReduceRole {
    /// item = id, `{Count, Name: placeholder}`
    Counts,
    /// item = id, `{Name}`
    Names,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Map(MapRole),
    Reduce(ReduceRole),
}

impl Role {
    /// 📖 The JSON flattener needs the whole stream; everyone else is line by line.
    pub fn read_mode(&self) -> ReadMode {
        match self {
            Role::Map(MapRole::Interactions) => ReadMode::Whole,
            _ => ReadMode::Lines,
        }
    }

    pub fn is_reducer(&self) -> bool {
        matches!(self, Role::Reduce(_))
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Role::Map(MapRole::Names) => "map names",
            Role::Map(MapRole::Counts) => "map counts",
            Role::Map(MapRole::Interactions) => "map interactions",
            Role::Map(MapRole::Guids) => "map guids",
            Role::Map(MapRole::Words) => "map words",
            Role::Reduce(ReduceRole::Counts) => "reduce counts",
            Role::Reduce(ReduceRole::Names) => "reduce names",
        };
        f.write_str(label)
    }
}
