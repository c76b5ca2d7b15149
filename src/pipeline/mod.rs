//! Pipeline stages for dashboard generation and question answering.
//!
//! Each submodule implements exactly one transformation step so it can be
//! tested on its own and swapped without touching its neighbours.
//!
//! ## Data Flow
//!
//! ```text
//! input ──▶ extract ──▶ normalise ──▶ table ──▶ render ──▶ publish
//! (path/URL) (pdf-extract) (line ends)  (heuristic) (HTML)   (dashboard dir)
//!                               │
//!                               └──▶ llm (question answering)
//! ```
//!
//! 1. [`input`]     — read the stored PDF (or download it), check magic bytes
//! 2. [`extract`]   — PDF bytes → text in `spawn_blocking`
//! 3. [`normalise`] — line endings, page breaks, invisible characters
//! 4. [`table`]     — whitespace heuristic → headers + rows
//! 5. [`render`]    — self-contained HTML, everything escaped
//! 6. [`publish`]   — atomic write into the dashboard directory
//! 7. [`llm`]       — the only stage with network I/O besides URL inputs

pub mod extract;
pub mod input;
pub mod llm;
pub mod normalise;
pub mod publish;
pub mod render;
pub mod table;
