use std::fs;
use std::process;

use simulator::vm::Machine;

/// The image to execute, picked up from the working directory.
const BINARY_PATH: &str = "./out.bin";

const MEMORY_SIZE: usize = 1 << 20;

fn main() {
  let mut machine = Machine::new(MEMORY_SIZE);
  println!("machine initialized with {MEMORY_SIZE} bytes of memory");

  let image = match fs::read(BINARY_PATH) {
    Ok(bytes) => bytes,
    Err(err) => {
      eprintln!("failed to read {BINARY_PATH}: {err}");
      process::exit(-1);
    }
  };
  println!("loaded {} byte image", image.len());
  machine.load_image(&image);

  let halt = machine.run();
  println!("EXCEPTION: {}", halt.exception);
  println!("  in {}", halt.instruction);
  print_stats(&machine);
  println!("exiting...");
  process::exit(-1);
}

fn print_stats(machine: &Machine) {
  let regs = machine.registers();
  println!("{} bytes of memory", machine.memory().len());
  println!("Registers");
  println!("PC: 0x{:x}", regs.pc);
  for (i, value) in regs.grs.iter().enumerate() {
    println!("r{i}: 0x{value:x}");
  }
}
