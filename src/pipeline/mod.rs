//! Pipeline stages for turning child pages into descriptions.
//!
//! Each submodule implements exactly one step and is testable on its own
//! with stub collaborators.
//!
//! ## Data Flow
//!
//! ```text
//! discover ──▶ sanitize ──▶ cache ──▶ describe
//! (CQL query)  (file name)  (export)  (Gemini)
//! ```
//!
//! 1. [`discover`]: list the parent's children and classify strip components
//! 2. [`sanitize`]: map a title to a safe `<name>.pdf`
//! 3. [`cache`]   : reuse the file if present, otherwise export and persist it
//! 4. [`describe`]: send the PDF and the fixed prompt to the model
//!
//! [`input`] validates the operator-supplied path in direct mode, which
//! enters the flow at `describe`.

pub mod cache;
pub mod describe;
pub mod discover;
pub mod input;
pub mod sanitize;
