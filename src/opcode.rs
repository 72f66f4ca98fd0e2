use num_enum::{IntoPrimitive, TryFromPrimitive};
use strum_macros::Display;

/// The closed set of tm32 operations, stored in the top 6 bits of every
/// instruction word. Conversion from a raw field value fails for anything
/// outside `0..=9`; the machine reports those as an unknown opcode when it
/// dispatches.
#[repr(u8)]
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Display, IntoPrimitive, TryFromPrimitive,
)]
#[strum(serialize_all = "UPPERCASE")]
pub enum Opcode {
  /// | Operation    | Semantics/RTL  | Assembly |
  /// |--------------|----------------|----------|
  /// | No Operation | `(do nothing)` | `nop`    |
  Nop = 0x0,

  /// Jumps to an absolute address computed from a base register and a
  /// signed offset. The target must be 4-aligned.
  ///
  /// | Operation | Semantics/RTL  | Assembly     |
  /// |-----------|----------------|--------------|
  /// | Jump      | `pc ← r[s] ± o` | `jmp $o(rs)` |
  Jmp = 0x1,

  /// Loads a 32-bit little-endian word from the address held in a register.
  ///
  /// | Operation | Semantics/RTL     | Assembly       |
  /// |-----------|-------------------|----------------|
  /// | Load Word | `r[d] ← m[r[s]]`  | `lw (rs), rd`  |
  Lw = 0x2,

  /// Stores a 32-bit little-endian word to the address held in a register.
  ///
  /// | Operation  | Semantics/RTL     | Assembly       |
  /// |------------|-------------------|----------------|
  /// | Store Word | `m[r[d]] ← r[s]`  | `sw rs, (rd)`  |
  Sw = 0x3,

  /// | Operation           | Semantics/RTL           | Assembly      |
  /// |---------------------|-------------------------|---------------|
  /// | Load Half Immediate | `r[d][15:0] ← o[15:0]`  | `lhi $o, rd`  |
  Lhi = 0x4,

  /// | Operation                 | Semantics/RTL            | Assembly       |
  /// |---------------------------|--------------------------|----------------|
  /// | Load Upper Half Immediate | `r[d][31:16] ← o[15:0]`  | `luhi $o, rd`  |
  Luhi = 0x5,

  /// Branches relative to `pc` when two registers differ. The alignment
  /// test reads `r[b]`, not the branch target.
  ///
  /// | Operation           | Semantics/RTL                       | Assembly          |
  /// |---------------------|-------------------------------------|-------------------|
  /// | Branch If Not Equal | `if r[a] ≠ r[b] : pc ← pc + o`      | `bne ra, rb, $o`  |
  Bne = 0x6,

  /// | Operation | Semantics/RTL  | Assembly     |
  /// |-----------|----------------|--------------|
  /// | Move      | `r[d] ← r[s]`  | `mv rs, rd`  |
  Mv = 0x7,

  /// | Operation | Semantics/RTL         | Assembly          |
  /// |-----------|-----------------------|-------------------|
  /// | Add       | `r[d] ← r[a] + r[b]`  | `add ra, rb, rd`  |
  Add = 0x8,

  /// Halts the machine on purpose.
  ///
  /// | Operation  | Semantics/RTL      | Assembly |
  /// |------------|--------------------|----------|
  /// | Breakpoint | `(stop execution)` | `brk`    |
  Brk = 0x9,
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn try_from_known_values() {
    assert_eq!(Opcode::try_from(0x0), Ok(Opcode::Nop));
    assert_eq!(Opcode::try_from(0x6), Ok(Opcode::Bne));
    assert_eq!(Opcode::try_from(0x9), Ok(Opcode::Brk));
  }

  #[test]
  fn try_from_unknown_values() {
    // 6-bit field, so anything from 10 through 63 can show up
    for raw in 10u8..64 {
      assert!(Opcode::try_from(raw).is_err());
    }
  }

  #[test]
  fn display_is_the_mnemonic() {
    assert_eq!(Opcode::Nop.to_string(), "NOP");
    assert_eq!(Opcode::Luhi.to_string(), "LUHI");
    assert_eq!(Opcode::Brk.to_string(), "BRK");
  }
}
