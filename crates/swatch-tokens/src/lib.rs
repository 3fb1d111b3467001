//! Design-token model and the deterministic operations over it: color math,
//! categorization, the CSS codec, merge/diff/combine, levers and presets.

pub mod color;
pub mod css;
pub mod levers;
pub mod model;
pub mod ops;
pub mod presets;
pub mod variation;

pub use levers::{apply_levers, infer_levers, lever_by_id, LeverDef, LeverValues, ALL_LEVERS};
pub use model::{categorize, sort_tokens, Token, TokenCategory, TokenSet, TokenSource};
pub use ops::{combine, diff, merge, CombineRecipe, TokenDiffEntry, TokenDiffResult};
pub use variation::{IdGenerator, SequentialIds, TimestampIds, Variation};
