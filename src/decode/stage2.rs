//! Stage-2: per-lane classification, rejection, and packing into the
//! validated, growable column store.

use tracing::debug;

use super::op::{pack_regs, Op};
use super::opcodes::*;
use super::stage1::Stage1Batch;

/// Which sub-field caused a lane to be rejected. Also used by the
/// scalar companion API ([`super::scalar::decode_one`]) as a typed
/// error, where `UnknownOpcode` additionally applies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectReason {
    UnknownOpcode,
    UnknownFunct3,
    UnknownFunct7,
    UnknownShamtHigh,
    UnknownImmediate,
    WritesToX0,
}

/// Diagnostic record for a lane the validator dropped.
///
/// `Copy` so it can be handed to a `tracing` event without allocating.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rejection {
    pub word: u32,
    pub lane: usize,
    pub opcode: u32,
    pub reason: RejectReason,
}

/// The validated, growable structure-of-arrays that accumulates
/// accepted instructions across one or more Stage-1 batches.
///
/// Column lengths are always equal; `loc` is strictly increasing
/// within any one `validate_and_pack` call because lanes are appended
/// in lane order.
#[derive(Debug, Clone, Default)]
pub struct ValidatedBatch {
    loc: Vec<u32>,
    op: Vec<Op>,
    regs: Vec<u16>,
    imm: Vec<i32>,
}

impl ValidatedBatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.loc.len()
    }

    pub fn is_empty(&self) -> bool {
        self.loc.is_empty()
    }

    pub fn loc(&self, k: usize) -> u32 {
        self.loc[k]
    }

    pub fn op(&self, k: usize) -> Op {
        self.op[k]
    }

    pub fn regs(&self, k: usize) -> u16 {
        self.regs[k]
    }

    pub fn imm(&self, k: usize) -> i32 {
        self.imm[k]
    }

    pub fn clear(&mut self) {
        self.loc.clear();
        self.op.clear();
        self.regs.clear();
        self.imm.clear();
    }

    fn accept(&mut self, loc: u32, op: Op, regs: u16, imm: i32) {
        self.loc.push(loc);
        self.op.push(op);
        self.regs.push(regs);
        self.imm.push(imm);
    }

    /// Classify every lane of `batch`, append accepted instructions in
    /// lane order, and emit a `tracing::debug!` record for each
    /// rejected lane. Never fails: the only way a lane contributes
    /// nothing is by being dropped.
    pub fn validate_and_pack<const N: usize>(&mut self, batch: &Stage1Batch<N>) {
        for i in 0..N {
            let loc = batch.base.wrapping_add(4 * i as u32);
            match classify(batch, i) {
                Ok((op, regs, imm)) => self.accept(loc, op, regs, imm),
                Err(reason) => {
                    let rejection = Rejection {
                        word: reconstruct_word(batch, i),
                        lane: i,
                        opcode: batch.opcode[i],
                        reason,
                    };
                    debug!(
                        word = format_args!("0x{:08x}", rejection.word),
                        lane = rejection.lane,
                        opcode = format_args!("0x{:02x}", rejection.opcode),
                        reason = ?rejection.reason,
                        "dropped illegal instruction encoding"
                    );
                }
            }
        }
    }
}

/// Rebuild the raw 32-bit word from Stage-1's extracted fields, purely
/// for inclusion in the rejection diagnostic (Stage-1's own SoA does
/// not retain the original words).
fn reconstruct_word<const N: usize>(batch: &Stage1Batch<N>, i: usize) -> u32 {
    batch.opcode[i]
        | (batch.rd[i] << 7)
        | (batch.funct3[i] << 12)
        | (batch.rs1[i] << 15)
        | (batch.rs2[i] << 20)
        | (batch.funct7[i] << 25)
}

/// Classify a single lane, returning the reason for rejection rather
/// than only logging it. Shared between the batch path (which only
/// needs to know accept/reject) and the scalar companion API (which
/// surfaces the reason to its caller).
pub(crate) fn classify<const N: usize>(
    batch: &Stage1Batch<N>,
    i: usize,
) -> Result<(Op, u16, i32), RejectReason> {
    let opcode = batch.opcode[i];
    let rd = batch.rd[i] as u8;
    let funct3 = batch.funct3[i];
    let rs1 = batch.rs1[i] as u8;
    let rs2 = batch.rs2[i] as u8;
    let funct7 = batch.funct7[i];

    match opcode {
        OP => classify_register_register(funct3, funct7, rd, rs1, rs2),
        OP_IMM => classify_register_immediate(funct3, rd, rs1, batch.imm_i[i]),
        OP_LOAD => classify_load(funct3, rd, rs1, batch.imm_i[i]),
        OP_STORE => classify_store(funct3, rs1, rs2, batch.imm_s[i]),
        OP_BRANCH => classify_branch(funct3, rs1, rs2, batch.imm_b[i]),
        OP_JALR => classify_jalr(funct3, rd, rs1, batch.imm_i[i]),
        OP_JAL => classify_jal(rd, batch.imm_j[i]),
        OP_LUI => classify_writing_u_or_j(Op::Lui, rd, batch.imm_u[i]),
        OP_AUIPC => classify_writing_u_or_j(Op::Auipc, rd, batch.imm_u[i]),
        OP_SYSTEM => classify_system(funct3, batch.imm_i[i]),
        _ => Err(RejectReason::UnknownOpcode),
    }
}

fn x0_write_filtered(rd: u8, op: Op, regs: u16, imm: i32) -> Result<(Op, u16, i32), RejectReason> {
    if rd == 0 {
        Err(RejectReason::WritesToX0)
    } else {
        Ok((op, regs, imm))
    }
}

fn classify_register_register(
    funct3: u32,
    funct7: u32,
    rd: u8,
    rs1: u8,
    rs2: u8,
) -> Result<(Op, u16, i32), RejectReason> {
    let op = match funct3 {
        FUNCT3_ADD_SUB => match funct7 {
            FUNCT7_ADD => Op::Add,
            FUNCT7_SUB => Op::Sub,
            _ => return Err(RejectReason::UnknownFunct7),
        },
        FUNCT3_SRL_SRA => match funct7 {
            FUNCT7_SRL => Op::Srl,
            FUNCT7_SRA => Op::Sra,
            _ => return Err(RejectReason::UnknownFunct7),
        },
        FUNCT3_SLL if funct7 == FUNCT7_ADD => Op::Sll,
        FUNCT3_SLT if funct7 == FUNCT7_ADD => Op::Slt,
        FUNCT3_SLTU if funct7 == FUNCT7_ADD => Op::Sltu,
        FUNCT3_XOR if funct7 == FUNCT7_ADD => Op::Xor,
        FUNCT3_OR if funct7 == FUNCT7_ADD => Op::Or,
        FUNCT3_AND if funct7 == FUNCT7_ADD => Op::And,
        FUNCT3_SLL | FUNCT3_SLT | FUNCT3_SLTU | FUNCT3_XOR | FUNCT3_OR | FUNCT3_AND => {
            return Err(RejectReason::UnknownFunct7)
        }
        _ => return Err(RejectReason::UnknownFunct3),
    };
    x0_write_filtered(rd, op, pack_regs(rd, rs1, rs2), 0)
}

fn classify_register_immediate(
    funct3: u32,
    rd: u8,
    rs1: u8,
    imm_i: i32,
) -> Result<(Op, u16, i32), RejectReason> {
    let op = match funct3 {
        FUNCT3_ADDI => Op::Addi,
        FUNCT3_SLTI => Op::Slti,
        FUNCT3_SLTIU => Op::Sltiu,
        FUNCT3_XORI => Op::Xori,
        FUNCT3_ORI => Op::Ori,
        FUNCT3_ANDI => Op::Andi,
        FUNCT3_SLLI => return classify_shift_immediate(Op::Slli, rd, rs1, imm_i),
        FUNCT3_SRLI_SRAI => {
            let shamt_high = (imm_i as u32 >> 5) & 0x7f;
            return match shamt_high {
                SHAMT_HIGH_LOGICAL => classify_shift_immediate(Op::Srli, rd, rs1, imm_i),
                SHAMT_HIGH_ARITHMETIC => classify_shift_immediate(Op::Srai, rd, rs1, imm_i),
                _ => Err(RejectReason::UnknownShamtHigh),
            };
        }
        _ => return Err(RejectReason::UnknownFunct3),
    };
    x0_write_filtered(rd, op, pack_regs(rd, rs1, 0), imm_i)
}

fn classify_shift_immediate(
    op: Op,
    rd: u8,
    rs1: u8,
    imm_i: i32,
) -> Result<(Op, u16, i32), RejectReason> {
    let shamt_high = (imm_i as u32 >> 5) & 0x7f;
    let expected = match op {
        Op::Srai => SHAMT_HIGH_ARITHMETIC,
        _ => SHAMT_HIGH_LOGICAL,
    };
    if shamt_high != expected {
        return Err(RejectReason::UnknownShamtHigh);
    }
    x0_write_filtered(rd, op, pack_regs(rd, rs1, 0), imm_i)
}

fn classify_load(
    funct3: u32,
    rd: u8,
    rs1: u8,
    imm_i: i32,
) -> Result<(Op, u16, i32), RejectReason> {
    let op = match funct3 {
        FUNCT3_LB => Op::Lb,
        FUNCT3_LH => Op::Lh,
        FUNCT3_LW => Op::Lw,
        FUNCT3_LBU => Op::Lbu,
        FUNCT3_LHU => Op::Lhu,
        _ => return Err(RejectReason::UnknownFunct3),
    };
    x0_write_filtered(rd, op, pack_regs(rd, rs1, 0), imm_i)
}

fn classify_store(
    funct3: u32,
    rs1: u8,
    rs2: u8,
    imm_s: i32,
) -> Result<(Op, u16, i32), RejectReason> {
    let op = match funct3 {
        FUNCT3_SB => Op::Sb,
        FUNCT3_SH => Op::Sh,
        FUNCT3_SW => Op::Sw,
        _ => return Err(RejectReason::UnknownFunct3),
    };
    Ok((op, pack_regs(0, rs1, rs2), imm_s))
}

fn classify_branch(
    funct3: u32,
    rs1: u8,
    rs2: u8,
    imm_b: i32,
) -> Result<(Op, u16, i32), RejectReason> {
    let op = match funct3 {
        FUNCT3_BEQ => Op::Beq,
        FUNCT3_BNE => Op::Bne,
        FUNCT3_BLT => Op::Blt,
        FUNCT3_BGE => Op::Bge,
        FUNCT3_BLTU => Op::Bltu,
        FUNCT3_BGEU => Op::Bgeu,
        _ => return Err(RejectReason::UnknownFunct3),
    };
    Ok((op, pack_regs(0, rs1, rs2), imm_b))
}

fn classify_jalr(
    funct3: u32,
    rd: u8,
    rs1: u8,
    imm_i: i32,
) -> Result<(Op, u16, i32), RejectReason> {
    if funct3 != 0 {
        return Err(RejectReason::UnknownFunct3);
    }
    x0_write_filtered(rd, Op::Jalr, pack_regs(rd, rs1, 0), imm_i)
}

fn classify_jal(rd: u8, imm_j: i32) -> Result<(Op, u16, i32), RejectReason> {
    classify_writing_u_or_j(Op::Jal, rd, imm_j)
}

fn classify_writing_u_or_j(op: Op, rd: u8, imm: i32) -> Result<(Op, u16, i32), RejectReason> {
    x0_write_filtered(rd, op, pack_regs(rd, 0, 0), imm)
}

fn classify_system(funct3: u32, imm_i: i32) -> Result<(Op, u16, i32), RejectReason> {
    if funct3 != FUNCT3_SYSTEM {
        return Err(RejectReason::UnknownFunct3);
    }
    let op = match imm_i {
        IMM_ECALL => Op::Ecall,
        IMM_EBREAK => Op::Ebreak,
        _ => return Err(RejectReason::UnknownImmediate),
    };
    Ok((op, pack_regs(0, 0, 0), 0))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decode::op::pack_regs;
    use quickcheck_macros::quickcheck;

    const BASE: u32 = 0x8000_0000;

    fn batch4(words: [u32; 4]) -> Stage1Batch<4> {
        Stage1Batch::decode(&words, BASE).unwrap()
    }

    #[test]
    fn add_x1_x2_x3() {
        let batch = batch4([0x0031_00B3, 0, 0, 0]);
        let mut validated = ValidatedBatch::new();
        validated.validate_and_pack(&batch);
        assert_eq!(validated.len(), 1);
        assert_eq!(validated.op(0), Op::Add);
        assert_eq!(validated.regs(0), pack_regs(1, 2, 3));
        assert_eq!(validated.regs(0), 0x0443);
        assert_eq!(validated.imm(0), 0);
        assert_eq!(validated.loc(0), BASE);
    }

    #[test]
    fn addi_x1_x2_minus_1() {
        let batch = batch4([0xFFF1_0093, 0, 0, 0]);
        let mut validated = ValidatedBatch::new();
        validated.validate_and_pack(&batch);
        assert_eq!(validated.len(), 1);
        assert_eq!(validated.op(0), Op::Addi);
        assert_eq!(crate::decode::op::unpack_rd(validated.regs(0)), 1);
        assert_eq!(crate::decode::op::unpack_rs1(validated.regs(0)), 2);
        assert_eq!(validated.imm(0), -1);
        assert_eq!(validated.loc(0), BASE);
    }

    #[test]
    fn sw_x3_8_x2() {
        let batch = batch4([0x0031_2423, 0, 0, 0]);
        let mut validated = ValidatedBatch::new();
        validated.validate_and_pack(&batch);
        assert_eq!(validated.len(), 1);
        assert_eq!(validated.op(0), Op::Sw);
        assert_eq!(validated.regs(0), pack_regs(0, 2, 3));
        assert_eq!(validated.regs(0), 0x0043);
        assert_eq!(validated.imm(0), 8);
    }

    #[test]
    fn beq_x1_x2_16() {
        let batch = batch4([0x0020_8863, 0, 0, 0]);
        let mut validated = ValidatedBatch::new();
        validated.validate_and_pack(&batch);
        assert_eq!(validated.len(), 1);
        assert_eq!(validated.op(0), Op::Beq);
        assert_eq!(validated.regs(0), pack_regs(0, 1, 2));
        assert_eq!(validated.regs(0), 0x0022);
        assert_eq!(validated.imm(0), 16);
    }

    #[test]
    fn lui_x1_0x12345() {
        let batch = batch4([0x1234_50B7, 0, 0, 0]);
        let mut validated = ValidatedBatch::new();
        validated.validate_and_pack(&batch);
        assert_eq!(validated.len(), 1);
        assert_eq!(validated.op(0), Op::Lui);
        assert_eq!(crate::decode::op::unpack_rd(validated.regs(0)), 1);
        assert_eq!(validated.imm(0), 0x1234_5000u32 as i32);
    }

    #[test]
    fn jal_x1_2048() {
        let batch = batch4([0x0010_00EF, 0, 0, 0]);
        let mut validated = ValidatedBatch::new();
        validated.validate_and_pack(&batch);
        assert_eq!(validated.len(), 1);
        assert_eq!(validated.op(0), Op::Jal);
        assert_eq!(crate::decode::op::unpack_rd(validated.regs(0)), 1);
        assert_eq!(validated.imm(0), 2048);
    }

    #[test]
    fn mixed_batch_of_four() {
        // valid ADD, unknown opcode 0x7F, valid ADDI, ADD with rd=x0
        let add = 0x0031_00B3u32;
        let unknown_opcode = 0x0000_007F;
        let addi = 0xFFF1_0093u32;
        let add_rd_x0 = 0x0031_0033u32; // add x0, x2, x3
        let batch = batch4([add, unknown_opcode, addi, add_rd_x0]);
        let mut validated = ValidatedBatch::new();
        validated.validate_and_pack(&batch);
        assert_eq!(validated.len(), 2);
        assert_eq!(validated.op(0), Op::Add);
        assert_eq!(validated.loc(0), BASE);
        assert_eq!(validated.op(1), Op::Addi);
        assert_eq!(validated.loc(1), BASE + 8);
    }

    #[test]
    fn nop_is_filtered_by_x0_write_rule() {
        // addi x0, x0, 0
        let nop = 0x0000_0013u32;
        let batch = batch4([nop, nop, nop, nop]);
        let mut validated = ValidatedBatch::new();
        validated.validate_and_pack(&batch);
        assert_eq!(validated.len(), 0);
    }

    #[test]
    fn stores_and_branches_are_not_x0_filtered() {
        // sw x0, 0(x0): stores rs2=x0 but does not write a register
        let sw_x0 = 0x0000_2023u32;
        // beq x0, x0, 0
        let beq_x0 = 0x0000_0063u32;
        let batch = batch4([sw_x0, beq_x0, 0, 0]);
        let mut validated = ValidatedBatch::new();
        validated.validate_and_pack(&batch);
        assert_eq!(validated.len(), 2);
        assert_eq!(validated.op(0), Op::Sw);
        assert_eq!(validated.op(1), Op::Beq);
    }

    #[test]
    fn column_lengths_stay_in_lockstep() {
        let add = 0x0031_00B3u32;
        let batch = batch4([add, add, add, add]);
        let mut validated = ValidatedBatch::new();
        validated.validate_and_pack(&batch);
        assert_eq!(validated.loc.len(), validated.op.len());
        assert_eq!(validated.op.len(), validated.regs.len());
        assert_eq!(validated.regs.len(), validated.imm.len());
    }

    #[test]
    fn ecall_and_ebreak() {
        let ecall = 0x0000_0073u32;
        let ebreak = 0x0010_0073u32;
        let batch = batch4([ecall, ebreak, 0, 0]);
        let mut validated = ValidatedBatch::new();
        validated.validate_and_pack(&batch);
        assert_eq!(validated.len(), 2);
        assert_eq!(validated.op(0), Op::Ecall);
        assert_eq!(validated.op(1), Op::Ebreak);
        assert_eq!(validated.regs(0), 0);
        assert_eq!(validated.imm(0), 0);
    }

    #[test]
    fn clear_empties_all_columns() {
        let add = 0x0031_00B3u32;
        let batch = batch4([add, 0, 0, 0]);
        let mut validated = ValidatedBatch::new();
        validated.validate_and_pack(&batch);
        assert_eq!(validated.len(), 1);
        validated.clear();
        assert_eq!(validated.len(), 0);
        assert!(validated.is_empty());
    }

    #[quickcheck]
    fn validate_and_pack_never_panics(a: u32, b: u32, c: u32, d: u32) -> bool {
        let batch = batch4([a, b, c, d]);
        let mut validated = ValidatedBatch::new();
        validated.validate_and_pack(&batch);
        validated.len() <= 4
    }

    #[quickcheck]
    fn accepted_locations_are_strictly_increasing(a: u32, b: u32, c: u32, d: u32) -> bool {
        let batch = batch4([a, b, c, d]);
        let mut validated = ValidatedBatch::new();
        validated.validate_and_pack(&batch);
        (1..validated.len()).all(|k| validated.loc(k) > validated.loc(k - 1))
    }

    #[quickcheck]
    fn columns_always_equal_length(a: u32, b: u32, c: u32, d: u32) -> bool {
        let batch = batch4([a, b, c, d]);
        let mut validated = ValidatedBatch::new();
        validated.validate_and_pack(&batch);
        validated.loc.len() == validated.op.len()
            && validated.op.len() == validated.regs.len()
            && validated.regs.len() == validated.imm.len()
    }

    #[quickcheck]
    fn every_accepted_lane_has_nonzero_rd_or_does_not_write(a: u32, b: u32, c: u32, d: u32) -> bool {
        let batch = batch4([a, b, c, d]);
        let mut validated = ValidatedBatch::new();
        validated.validate_and_pack(&batch);
        (0..validated.len()).all(|k| {
            let op = validated.op(k);
            let writes_rd = !matches!(
                op,
                Op::Sb | Op::Sh | Op::Sw | Op::Beq | Op::Bne | Op::Blt | Op::Bge | Op::Bltu
                    | Op::Bgeu | Op::Ecall | Op::Ebreak
            );
            !writes_rd || crate::decode::op::unpack_rd(validated.regs(k)) != 0
        })
    }
}
