//! Pipeline stages for tile download and PDF compilation.
//!
//! Each submodule implements exactly one step, so each is independently
//! testable.
//!
//! ## Data Flow
//!
//! ```text
//! source ──▶ fetch ──▶ (disk) ◀── scan
//!                        │
//!            decode ──▶ normalize ──▶ encode ──▶ assemble
//!            (image)    (resize, RGB)  (JPEG)     (lopdf)
//! ```
//!
//! 1. [`source`]    — one GET per tile URL; the only stage with network I/O
//! 2. [`fetch`]     — the sequential loop and its consecutive-404 stop rule
//! 3. [`scan`]      — list tiles already on disk instead of downloading
//! 4. [`decode`]    — read a tile and sniff its format
//! 5. [`normalize`] — downscale to the size cap and flatten to opaque RGB
//! 6. [`encode`]    — lossy JPEG page buffer
//! 7. [`assemble`]  — one image XObject per page, written with `lopdf`

pub mod assemble;
pub mod decode;
pub mod encode;
pub mod fetch;
pub mod normalize;
pub mod scan;
pub mod source;
