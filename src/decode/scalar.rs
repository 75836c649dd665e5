//! Single-instruction decode, for disassembly and debugging use cases
//! where the batched Stage-1/Stage-2 split is unnecessary overhead and
//! a typed rejection reason is wanted back directly instead of only a
//! diagnostic log line.

use super::op::Op;
use super::stage1::Stage1Batch;
use super::stage2::{classify, RejectReason};

/// Decode exactly one instruction word at `loc`.
///
/// This is a thin convenience wrapper around the batch machinery with
/// `N = 1`: it exists for callers (a disassembler, a REPL, an
/// interactive debugger) that want one word in, one verdict out,
/// together with the specific reason a word was rejected, rather than
/// accumulating into a [`super::stage2::ValidatedBatch`] and reading a
/// diagnostic log.
///
/// `loc` must be a multiple of 4; a misaligned `loc` is folded into
/// [`RejectReason::UnknownOpcode`] here since the scalar API has no
/// separate error channel for it.
pub fn decode_one(word: u32, loc: u32) -> Result<(Op, u16, i32), RejectReason> {
    let batch = Stage1Batch::<1>::decode(&[word], loc).map_err(|_| RejectReason::UnknownOpcode)?;
    classify(&batch, 0)
}
