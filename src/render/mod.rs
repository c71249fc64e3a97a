//! Result rendering for tabula.
//!
//! Normalizes cell values, lays them out as bordered text tables, and
//! produces the highlight directives and result files the editor consumes.

mod artifact;
mod border;
mod highlight;
mod normalize;
mod table;

pub use artifact::{artifact_path, artifact_path_at, write_lines, ArtifactKind};
pub use border::{BorderStyle, Glyphs};
pub use highlight::{directive_line, Highlight, ERROR_MARKER, ERROR_STYLE};
pub use normalize::{normalize, rune_len, NULL_DISPLAY};
pub use table::{pad, Header, Table, CELL_PADDING};
