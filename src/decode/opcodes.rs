//! RV32I opcode, funct3 and funct7 constants.
//!
//! Names follow the mnemonics used in chapter 2 of the unprivileged
//! RISC-V specification. Only the base integer opcodes are listed;
//! there is no M/A/F/D extension here (see the crate's scope notes).

pub const OP_LUI: u32 = 0b0110111;
pub const OP_AUIPC: u32 = 0b0010111;
pub const OP_JAL: u32 = 0b1101111;
pub const OP_JALR: u32 = 0b1100111;
pub const OP_BRANCH: u32 = 0b1100011;
pub const OP_LOAD: u32 = 0b0000011;
pub const OP_STORE: u32 = 0b0100011;
pub const OP_IMM: u32 = 0b0010011;
pub const OP: u32 = 0b0110011;
pub const OP_SYSTEM: u32 = 0b1110011;

// Conditional branches (opcode OP_BRANCH)
pub const FUNCT3_BEQ: u32 = 0b000;
pub const FUNCT3_BNE: u32 = 0b001;
pub const FUNCT3_BLT: u32 = 0b100;
pub const FUNCT3_BGE: u32 = 0b101;
pub const FUNCT3_BLTU: u32 = 0b110;
pub const FUNCT3_BGEU: u32 = 0b111;

// Load widths (opcode OP_LOAD)
pub const FUNCT3_LB: u32 = 0b000;
pub const FUNCT3_LH: u32 = 0b001;
pub const FUNCT3_LW: u32 = 0b010;
pub const FUNCT3_LBU: u32 = 0b100;
pub const FUNCT3_LHU: u32 = 0b101;

// Store widths (opcode OP_STORE)
pub const FUNCT3_SB: u32 = 0b000;
pub const FUNCT3_SH: u32 = 0b001;
pub const FUNCT3_SW: u32 = 0b010;

// Register-immediate opcodes (opcode OP_IMM)
pub const FUNCT3_ADDI: u32 = 0b000;
pub const FUNCT3_SLLI: u32 = 0b001;
pub const FUNCT3_SLTI: u32 = 0b010;
pub const FUNCT3_SLTIU: u32 = 0b011;
pub const FUNCT3_XORI: u32 = 0b100;
pub const FUNCT3_SRLI_SRAI: u32 = 0b101;
pub const FUNCT3_ORI: u32 = 0b110;
pub const FUNCT3_ANDI: u32 = 0b111;

// Register-register opcodes (opcode OP)
pub const FUNCT3_ADD_SUB: u32 = 0b000;
pub const FUNCT3_SLL: u32 = 0b001;
pub const FUNCT3_SLT: u32 = 0b010;
pub const FUNCT3_SLTU: u32 = 0b011;
pub const FUNCT3_XOR: u32 = 0b100;
pub const FUNCT3_SRL_SRA: u32 = 0b101;
pub const FUNCT3_OR: u32 = 0b110;
pub const FUNCT3_AND: u32 = 0b111;

pub const FUNCT7_ADD: u32 = 0x00;
pub const FUNCT7_SUB: u32 = 0x20;
pub const FUNCT7_SRL: u32 = 0x00;
pub const FUNCT7_SRA: u32 = 0x20;

/// Upper seven bits of `imm_i` (the shamt-high field) for the logical
/// shift-immediate instructions.
pub const SHAMT_HIGH_LOGICAL: u32 = 0x00;
/// Upper seven bits of `imm_i` for the arithmetic right shift-immediate
/// instruction.
pub const SHAMT_HIGH_ARITHMETIC: u32 = 0x20;

// ECALL / EBREAK (opcode OP_SYSTEM)
pub const FUNCT3_SYSTEM: u32 = 0b000;
pub const IMM_ECALL: i32 = 0;
pub const IMM_EBREAK: i32 = 1;
