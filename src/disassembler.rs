/// # disassembler
///
/// Turns instruction words back into text without touching a machine. It
/// only ever borrows a memory image, so it can run against a ROM file or a
/// snapshot of live memory.
use crate::instruction::{Instruction, Opcode};

/// every line is padded to this width so listings line up
const LINE_WIDTH: usize = 30;

/// Decode the word at `offset` in `memory`. `base` is only added to the
/// address label, so a ROM file (offset 0) can be listed as if it were
/// loaded at 0x200. Bytes past the end of `memory` read as zero.
pub fn decode(memory: &[u8], offset: usize, base: usize) -> String {
    let byte = |a: usize| memory.get(a).copied().unwrap_or(0) as u16;
    let word = (byte(offset) << 8) | byte(offset + 1);
    let text = match Instruction::decode(Opcode(word)) {
        Some(instr) => instr.to_string(),
        None => format!("NOT IMPLEMENTED 0x{:04X}", word),
    };
    format!(
        "{:<width$}",
        format!("{:04X}:  {:04X}  {}", offset + base, word, text),
        width = LINE_WIDTH
    )
}

/// list a whole ROM image, two bytes at a time
pub fn disassemble(rom: &[u8], base: usize) -> impl Iterator<Item = String> + '_ {
    (0..rom.len()).step_by(2).map(move |pc| decode(rom, pc, base))
}

/// A window of lines around `pc` for a debug view; the line at `pc` is
/// marked with `>`. Stops at the edges of memory.
pub fn listing(memory: &[u8], pc: u16, before: usize, after: usize) -> Vec<String> {
    let pc = pc as usize;
    let first = pc.saturating_sub(2 * before);
    let last = (pc + 2 * after).min(memory.len().saturating_sub(2));
    (first..=last)
        .step_by(2)
        .map(|addr| {
            let marker = if addr == pc { '>' } else { ' ' };
            format!("{} {}", marker, decode(memory, addr, 0))
        })
        .collect()
}
