#![forbid(unsafe_code)]

//! A batched, structure-of-arrays RV32I instruction decoder and a
//! bounds-checked DRAM model.
//!
//! The decoder is split into [`decode::stage1`], which extracts every
//! architectural field and every immediate encoding for every lane of
//! a batch unconditionally, and [`decode::stage2`], which validates
//! and packs the accepted lanes into a growable [`decode::ValidatedBatch`].
//! [`decode::scalar`] offers a single-instruction convenience wrapper
//! for disassembly and debugging use cases. [`hart::memory`] provides
//! the little-endian, bounds-checked byte-addressable memory region
//! the decoded instructions would be fetched from.

pub mod decode;
pub mod hart;
pub mod utils;
