//! MAL-style text for microinstructions.
//!
//! Renders a decoded control word the way it would be written in micro
//! assembly, e.g. `MAR = SP = SP + 1; wr; goto 0x00B`.

use crate::cpu::control_store::ControlStore;
use crate::cpu::decode::{BusSource, MicroInstruction};
use crate::datapath::{AluFunction, AluSignals};

/// Render one microinstruction.
pub fn format_micro(instr: &MicroInstruction) -> String {
    let mut parts = Vec::new();

    let expr = alu_expression(&instr.alu, bus_name(instr.b_bus)) + shift_suffix(instr);
    let targets: Vec<&str> = instr.c_bus.iter().rev().map(|r| r.name()).collect();
    if !targets.is_empty() {
        parts.push(format!("{} = {}", targets.join(" = "), expr));
    } else if instr.jump.jmpz {
        parts.push(format!("Z = {expr}"));
    } else if instr.jump.jmpn {
        parts.push(format!("N = {expr}"));
    }

    if instr.memory.read {
        parts.push("rd".to_string());
    }
    if instr.memory.write {
        parts.push("wr".to_string());
    }
    if instr.memory.fetch {
        parts.push("fetch".to_string());
    }

    parts.push(goto_clause(instr));
    parts.join("; ")
}

/// One line per defined slot: `0x00A: <text>`.
pub fn disassemble_store(store: &ControlStore) -> String {
    store
        .iter()
        .map(|(addr, instr)| format!("{addr:#05X}: {}\n", format_micro(instr)))
        .collect()
}

fn bus_name(source: BusSource) -> Option<&'static str> {
    source.register().map(|r| r.name())
}

fn alu_expression(alu: &AluSignals, b: Option<&str>) -> String {
    let b = if alu.enb { b } else { None };

    // Text for the A path after ENA/INVA
    let a = match (alu.ena, alu.inva) {
        (true, false) => Some("H"),
        (true, true) => Some("~H"),
        (false, true) => Some("-1"),
        (false, false) => None,
    };

    match alu.function() {
        AluFunction::And => match (a, b) {
            (Some("-1"), Some(b)) => b.to_string(),
            (Some(a), Some(b)) => format!("{a} AND {b}"),
            _ => "0".to_string(),
        },
        AluFunction::Or => match (a, b) {
            (Some(a), Some(b)) => format!("{a} OR {b}"),
            (Some(a), None) => a.to_string(),
            (None, Some(b)) => b.to_string(),
            (None, None) => "0".to_string(),
        },
        AluFunction::NotB => b.map_or_else(|| "-1".to_string(), |b| format!("NOT {b}")),
        AluFunction::Sum => sum_expression(alu, b),
    }
}

fn sum_expression(alu: &AluSignals, b: Option<&str>) -> String {
    let mut inc = alu.inc;

    // ~H + 1 is -H
    if alu.ena && alu.inva && inc {
        return b.map_or_else(|| "-H".to_string(), |b| format!("{b} - H"));
    }

    let mut text = match (alu.ena, alu.inva, b) {
        (true, false, Some(b)) => format!("H + {b}"),
        (true, false, None) => "H".to_string(),
        (true, true, Some(b)) => format!("~H + {b}"),
        (true, true, None) => "~H".to_string(),
        // -1 + 1 cancels out
        (false, true, b) if inc => {
            inc = false;
            b.unwrap_or("0").to_string()
        }
        (false, true, Some(b)) => format!("{b} - 1"),
        (false, true, None) => "-1".to_string(),
        (false, false, Some(b)) => b.to_string(),
        (false, false, None) => String::new(),
    };

    if inc {
        if text.is_empty() {
            text = "1".to_string();
        } else {
            text.push_str(" + 1");
        }
    }
    if text.is_empty() {
        text = "0".to_string();
    }
    text
}

fn shift_suffix(instr: &MicroInstruction) -> &'static str {
    if instr.shift.sll8 {
        " << 8"
    } else if instr.shift.sra1 {
        " >> 1"
    } else {
        ""
    }
}

fn goto_clause(instr: &MicroInstruction) -> String {
    let addr = instr.next_address;
    if instr.jump.jmpc {
        return if addr & 0xFF == 0 {
            "goto (MBR)".to_string()
        } else {
            format!("goto (MBR OR {:#05X})", addr & 0xFF)
        };
    }

    let flag = match (instr.jump.jmpn, instr.jump.jmpz) {
        (true, true) => Some("N OR Z"),
        (true, false) => Some("N"),
        (false, true) => Some("Z"),
        (false, false) => None,
    };
    match flag {
        Some(flag) => format!("if ({flag}) goto {:#05X}; else goto {addr:#05X}", addr | 0x100),
        None => format!("goto {addr:#05X}"),
    }
}
