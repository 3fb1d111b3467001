//! AI-guided token transforms: prompt construction, the model round trip and
//! validation of whatever comes back.

pub mod prompt;
pub mod transformer;
pub mod validate;

pub use prompt::build_transform_prompt;
pub use transformer::{transform_tokens, TokenTransformer};
pub use validate::{ModelItem, Reconciled};
