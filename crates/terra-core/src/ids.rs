//! Typed entity identifiers.
//!
//! Every row in the relational store is addressed by one of these newtypes
//! rather than a bare `i64`, so a `BlockId` can never be passed where a
//! `TableId` is expected.

use serde::{Deserialize, Serialize};
use std::fmt;

macro_rules! id_type {
    ($name:ident) => {
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(pub i64);

        impl $name {
            pub fn get(self) -> i64 {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<i64> for $name {
            fn from(v: i64) -> Self {
                Self(v)
            }
        }
    };
}

id_type!(DocumentId);
id_type!(VersionId);
id_type!(OutlineNodeId);
id_type!(BlockId);
id_type!(TableId);
id_type!(RunId);
id_type!(IssueId);
id_type!(CheckpointId);
id_type!(KbSourceId);
id_type!(KbChunkId);
