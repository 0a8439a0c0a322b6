//! Identity-modeling generations of the directory.

use std::fmt;

/// Which orientation the directory uses for the `identifier` relation
/// between `user` and `identity` objects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SchemaGeneration {
  /// `user --identifier--> identity`; the user is the tuple's subject.
  Legacy,
  /// `identity --identifier--> user`; the user is the tuple's object.
  Current,
  /// Not yet probed.
  Unknown,
}

impl fmt::Display for SchemaGeneration {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(match self {
      Self::Legacy => "legacy",
      Self::Current => "current",
      Self::Unknown => "unknown",
    })
  }
}
