//! Two-stage batched RV32I decoder: unconditional field extraction
//! (`stage1`) followed by validation and packing into the accepted
//! instruction columns (`stage2`), plus a single-instruction companion
//! API (`scalar`) for callers that do not want to build a batch.

pub mod op;
pub mod opcodes;
pub mod scalar;
pub mod stage1;
pub mod stage2;

pub use op::Op;
pub use scalar::decode_one;
pub use stage1::{Stage1Batch, Stage1Error};
pub use stage2::{RejectReason, Rejection, ValidatedBatch};
