//! Constant values of the compiler and the target architecture.

/// Default capacity of the token buffer.
///
/// Decimal literals take five tokens each, and an implied
/// multiplication takes one, so the number of tokens can
/// be larger than the number of characters suggests.
pub const MAX_TOKENS: usize = 128;

/// Default depth of the operator stack used when converting to postfix.
pub const MAX_DEPTH: usize = 128;

/// Size of an immediate operand inlined after a `push imm32`.
pub const IMM32_SIZE: usize = 4;

/// Size of an immediate operand inlined after a `movabs`.
pub const IMM64_SIZE: usize = 8;

/// Fallback when the operating system can't report its page size.
pub const DEFAULT_PAGE_SIZE: usize = 0x1000; // 4096
