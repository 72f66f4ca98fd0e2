use crate::instruction::Instruction;
use crate::memory::Memory;
use crate::opcode::Opcode;

/// Where a loaded binary image begins, and where `pc` starts.
pub const ENTRYPOINT: u32 = 0x800;

#[derive(Debug, Clone, Copy, PartialEq)]
enum State {
  Running,
  Halted,
}

/// The register file: 32 general-purpose 32-bit registers plus the program
/// counter. Every register is mutable, `r0` included — none is hardwired
/// to zero. Arithmetic on register values wraps at 32 bits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Registers {
  pub pc: u32,
  pub grs: [u32; 32],
}

impl Registers {
  fn new() -> Self {
    Self {
      pc: ENTRYPOINT,
      grs: [0; 32],
    }
  }
}

/// A tm32 machine: one register file and a fixed amount of byte-addressable
/// memory.
///
/// The memory size is set at construction and never changes. The machine
/// starts running at [`ENTRYPOINT`] and only ever stops because an
/// instruction raised an [`Exception`].
#[derive(Debug)]
pub struct Machine {
  regs: Registers,
  memory: Memory,
  state: State,
}

impl Machine {
  pub fn new(memory_size: usize) -> Self {
    Self {
      regs: Registers::new(),
      memory: Memory::new(memory_size),
      state: State::Running,
    }
  }

  pub fn registers(&self) -> &Registers {
    &self.regs
  }

  pub fn memory(&self) -> &Memory {
    &self.memory
  }

  pub fn is_halted(&self) -> bool {
    self.state == State::Halted
  }

  /// Copies a binary image into memory at the entrypoint.
  pub fn load_image(&mut self, image: &[u8]) {
    self.memory.load(image, ENTRYPOINT);
  }

  /// Runs one fetch-decode-execute cycle.
  ///
  /// On success `pc` advances by 4 — unconditionally, so `jmp` and a taken
  /// `bne` end up 4 bytes past the `pc` they wrote themselves. On failure
  /// the machine halts with `pc` still naming the faulting word.
  ///
  /// A fetch past the end of memory reads the zero word, which decodes to
  /// `nop`; the machine spins forward instead of faulting.
  pub fn step(&mut self) -> Result<(), Halt> {
    let word = self.memory.read32(self.regs.pc);
    let instruction = Instruction::decode(word);
    match self.execute(&instruction) {
      Ok(()) => {
        self.regs.pc = self.regs.pc.wrapping_add(4);
        Ok(())
      }
      Err(exception) => {
        self.state = State::Halted;
        Err(Halt {
          exception,
          instruction,
        })
      }
    }
  }

  /// Steps until an exception halts the machine.
  pub fn run(&mut self) -> Halt {
    loop {
      if let Err(halt) = self.step() {
        return halt;
      }
    }
  }

  /// Applies a single decoded instruction to the machine.
  pub fn execute(&mut self, instr: &Instruction) -> Result<(), Exception> {
    let Ok(opcode) = Opcode::try_from(instr.opcode) else {
      return Err(Exception::UnknownOpcode(instr.opcode));
    };
    match opcode {
      Opcode::Nop => Ok(()),
      Opcode::Jmp => jmp(self, instr),
      Opcode::Lw => lw(self, instr),
      Opcode::Sw => sw(self, instr),
      Opcode::Lhi => lhi(self, instr),
      Opcode::Luhi => luhi(self, instr),
      Opcode::Bne => bne(self, instr),
      Opcode::Mv => mv(self, instr),
      Opcode::Add => add(self, instr),
      Opcode::Brk => Err(Exception::BreakpointHit),
    }
  }
}

/// The ways an instruction can halt the machine. All three are fatal — no
/// retry, no recovery. An out-of-bounds memory access is *not* one of them;
/// see [`Memory`] for that policy.
#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Exception {
  #[error("unknown opcode 0x{0:x}")]
  UnknownOpcode(u8),

  #[error("unaligned target address")]
  AddressAlignment,

  #[error("breakpoint hit")]
  BreakpointHit,
}

/// Why and where the machine stopped: the exception together with the
/// instruction that raised it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Halt {
  pub exception: Exception,
  pub instruction: Instruction,
}

// pc ← r[ra1] ± |offset|
fn jmp(machine: &mut Machine, instr: &Instruction) -> Result<(), Exception> {
  let base = machine.regs.grs[instr.ra1 as usize];
  let target = if instr.offset < 0 {
    base.wrapping_sub(u32::from(instr.offset.unsigned_abs()))
  } else {
    base.wrapping_add(instr.offset as u32)
  };
  if target % 4 != 0 {
    return Err(Exception::AddressAlignment);
  }
  machine.regs.pc = target;
  Ok(())
}

// r[ra2] ← m[r[ra1]]
fn lw(machine: &mut Machine, instr: &Instruction) -> Result<(), Exception> {
  let addr = machine.regs.grs[instr.ra1 as usize];
  // an out-of-bounds address loads 0, it never faults
  machine.regs.grs[instr.ra2 as usize] = machine.memory.read32(addr);
  Ok(())
}

// m[r[ra2]] ← r[ra1]
fn sw(machine: &mut Machine, instr: &Instruction) -> Result<(), Exception> {
  let addr = machine.regs.grs[instr.ra2 as usize];
  let value = machine.regs.grs[instr.ra1 as usize];
  // an out-of-bounds address drops the store, it never faults
  machine.memory.write32(addr, value);
  Ok(())
}

// r[ra1][15:0] ← offset[15:0]
fn lhi(machine: &mut Machine, instr: &Instruction) -> Result<(), Exception> {
  let reg = &mut machine.regs.grs[instr.ra1 as usize];
  *reg = (*reg & 0xFFFF_0000) | u32::from(instr.offset as u16);
  Ok(())
}

// r[ra1][31:16] ← offset[15:0]
fn luhi(machine: &mut Machine, instr: &Instruction) -> Result<(), Exception> {
  let reg = &mut machine.regs.grs[instr.ra1 as usize];
  *reg = u32::from(instr.offset as u16) << 16 | (*reg & 0xFFFF);
  Ok(())
}

// if r[ra1] ≠ r[ra2] : pc ← pc + offset
fn bne(machine: &mut Machine, instr: &Instruction) -> Result<(), Exception> {
  if machine.regs.grs[instr.ra1 as usize] != machine.regs.grs[instr.ra2 as usize] {
    // the alignment test reads r[ra2], not the branch target
    if machine.regs.grs[instr.ra2 as usize] % 4 != 0 {
      return Err(Exception::AddressAlignment);
    }
    machine.regs.pc = machine.regs.pc.wrapping_add_signed(i32::from(instr.offset));
  }
  Ok(())
}

// r[ra2] ← r[ra1]
fn mv(machine: &mut Machine, instr: &Instruction) -> Result<(), Exception> {
  machine.regs.grs[instr.ra2 as usize] = machine.regs.grs[instr.ra1 as usize];
  Ok(())
}

// r[ra3] ← r[ra1] + r[ra2]
fn add(machine: &mut Machine, instr: &Instruction) -> Result<(), Exception> {
  let sum = machine.regs.grs[instr.ra1 as usize]
    .wrapping_add(machine.regs.grs[instr.ra2 as usize]);
  // ra3 is an 8-bit field; the index wraps into the 32-entry file
  machine.regs.grs[(instr.ra3 & 0x1F) as usize] = sum;
  Ok(())
}
