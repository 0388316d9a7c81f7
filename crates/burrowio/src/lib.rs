//! `burrowio`: tiny "NIH" buffered socket IO.
//!
//! This crate intentionally avoids tokio-util's codecs and implements just what we need:
//! a fixed-size read cursor over one socket with peek/consume, literal matching, and
//! CRLF line extraction that tolerates lines split across socket fills.

pub mod cursor;

pub use cursor::ByteCursor;
