//! Debugger application state and logic.

use crate::cpu::debug::Breakpoint;
use crate::disasm::{disassemble_memory, format_micro, IjvmLine};
use crate::{Mic1, RunSummary, SimError, StopReason};

/// Ticks executed per frame while running.
const TICKS_PER_FRAME: u32 = 2_000;

/// Debugger application state.
pub struct DebuggerApp {
    /// The simulator being debugged.
    pub sim: Mic1,
    /// IJVM listing of the method area, computed once at load.
    pub listing: Vec<IjvmLine>,
    /// Is the debugger running continuously?
    pub running: bool,
    /// Set until the first frame after `run`, which may leave a breakpoint.
    resumed: bool,
    pub should_quit: bool,
    /// Status message to display.
    pub status: String,
    /// Memory view scroll offset, in words.
    pub mem_scroll: u32,
}

impl DebuggerApp {
    pub fn new(sim: Mic1) -> Self {
        let listing = disassemble_memory(sim.memory());
        Self {
            sim,
            listing,
            running: false,
            resumed: false,
            should_quit: false,
            status: "Ready. t: tick, s: step, r: run, q: quit.".into(),
            mem_scroll: 0,
        }
    }

    /// Execute one microinstruction.
    pub fn tick(&mut self) {
        let mpc = self.sim.mpc();
        let text = self.sim.next_instruction().map(format_micro);
        let result = self.sim.micro_step(1);
        let completed = matches!(result, Ok(RunSummary { stop: StopReason::Completed, .. }));
        self.report(result);
        if let (true, Some(text)) = (completed, text) {
            self.status = format!("{mpc:#05X}: {text}");
        }
    }

    /// Execute one IJVM instruction.
    pub fn step(&mut self) {
        let result = self.sim.step(1);
        self.report(result);
    }

    /// Start continuous execution.
    pub fn run(&mut self) {
        self.running = true;
        self.resumed = true;
        self.status = "Running...".into();
    }

    pub fn pause(&mut self) {
        self.running = false;
        self.status = "Paused.".into();
    }

    /// Advance a running machine by one frame's worth of ticks.
    pub fn advance(&mut self) {
        if !self.running {
            return;
        }
        if !std::mem::take(&mut self.resumed) {
            if let Some(entry) = self.sim.pending_breakpoint() {
                let id = entry.id;
                self.report(Ok(RunSummary { ticks: 0, stop: StopReason::Breakpoint(id) }));
                return;
            }
        }
        let result = self.sim.micro_step(TICKS_PER_FRAME);
        self.report(result);
    }

    /// Toggle a micro-line breakpoint at MPC.
    pub fn toggle_micro_breakpoint(&mut self) {
        let mpc = self.sim.mpc();
        let set = self.sim.breakpoints_mut().toggle(Breakpoint::MicroLine(mpc));
        self.status = format!("{} breakpoint at MPC={mpc:#05X}", if set { "Set" } else { "Removed" });
    }

    /// Toggle a macro-line breakpoint at PC.
    pub fn toggle_macro_breakpoint(&mut self) {
        let pc = self.sim.register(crate::Register::Pc) as u32;
        let set = self.sim.breakpoints_mut().toggle(Breakpoint::MacroLine(pc));
        self.status = format!("{} breakpoint at PC={pc:#06X}", if set { "Set" } else { "Removed" });
    }

    pub fn has_macro_breakpoint(&self, address: u32) -> bool {
        self.sim.breakpoints().iter().any(|e| e.breakpoint == Breakpoint::MacroLine(address))
    }

    pub fn has_micro_breakpoint(&self, line: u16) -> bool {
        self.sim.breakpoints().iter().any(|e| e.breakpoint == Breakpoint::MicroLine(line))
    }

    pub fn reset(&mut self) {
        self.sim.reset();
        self.running = false;
        self.status = "Reset. Ready.".into();
    }

    /// Microinstructions around MPC as `(address, text, is_current)`.
    pub fn micro_window(&self, lines: usize) -> Vec<(u16, String, bool)> {
        let mpc = self.sim.mpc();
        let start = mpc.saturating_sub(lines as u16 / 2);
        self.sim
            .control_store()
            .iter()
            .skip_while(|(addr, _)| *addr < start)
            .take(lines)
            .map(|(addr, instr)| (addr, format_micro(instr), addr == mpc))
            .collect()
    }

    /// Index of the listing line that holds PC.
    pub fn current_macro_line(&self) -> Option<usize> {
        let pc = self.sim.register(crate::Register::Pc) as u32;
        self.listing.iter().rposition(|line| line.address <= pc)
    }

    fn report(&mut self, result: Result<RunSummary, SimError>) {
        match result {
            Ok(RunSummary { stop: StopReason::Completed, ticks }) => {
                self.status = format!("{ticks} ticks, {} total", self.sim.total_ticks());
            }
            Ok(RunSummary { stop: StopReason::Halted(reason), .. }) => {
                self.running = false;
                self.status = format!("Halted: {reason} after {} ticks", self.sim.total_ticks());
            }
            Ok(RunSummary { stop: StopReason::Breakpoint(id), .. }) => {
                self.running = false;
                self.status = format!("Breakpoint {id} hit at MPC={:#05X}", self.sim.mpc());
            }
            Ok(RunSummary { stop, .. }) => {
                self.running = false;
                self.status = format!("Stopped: {stop:?}");
            }
            Err(e) => {
                self.running = false;
                self.status = format!("Error: {e}");
            }
        }
    }
}

/// Run the debugger on a loaded simulator.
pub fn run_debugger(sim: Mic1) -> std::io::Result<()> {
    use crossterm::{
        event::{self, Event, KeyCode, KeyEventKind},
        terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
        ExecutableCommand,
    };
    use ratatui::prelude::*;
    use std::io::stdout;
    use std::time::Duration;

    enable_raw_mode()?;
    stdout().execute(EnterAlternateScreen)?;
    let mut terminal = Terminal::new(CrosstermBackend::new(stdout()))?;

    let mut app = DebuggerApp::new(sim);

    loop {
        terminal.draw(|frame| {
            super::ui::draw(frame, &app);
        })?;

        if event::poll(Duration::from_millis(30))? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    match key.code {
                        KeyCode::Char('q') => app.should_quit = true,
                        KeyCode::Char('t') => {
                            app.running = false;
                            app.tick();
                        }
                        KeyCode::Char('s') => {
                            app.running = false;
                            app.step();
                        }
                        KeyCode::Char('r') => app.run(),
                        KeyCode::Char('p') => app.pause(),
                        KeyCode::Char('b') => app.toggle_micro_breakpoint(),
                        KeyCode::Char('m') => app.toggle_macro_breakpoint(),
                        KeyCode::Char('x') => app.reset(),
                        KeyCode::Up => app.mem_scroll = app.mem_scroll.saturating_sub(1),
                        KeyCode::Down => {
                            if (app.mem_scroll as usize) + 1 < app.sim.memory().size() {
                                app.mem_scroll += 1;
                            }
                        }
                        KeyCode::PageUp => app.mem_scroll = app.mem_scroll.saturating_sub(16),
                        KeyCode::PageDown => {
                            let last = app.sim.memory().size().saturating_sub(1) as u32;
                            app.mem_scroll = (app.mem_scroll + 16).min(last);
                        }
                        _ => {}
                    }
                }
            }
        }

        app.advance();

        if app.should_quit {
            break;
        }
    }

    disable_raw_mode()?;
    stdout().execute(LeaveAlternateScreen)?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cpu::decode::{BusSource, CBus};
    use crate::cpu::{encode_microcode, encode_program, MicroInstruction};
    use crate::datapath::AluSignals;
    use crate::Register;

    fn app() -> DebuggerApp {
        let inc_h = MicroInstruction {
            next_address: 1,
            alu: AluSignals { f0: true, f1: true, inc: true, ..Default::default() },
            c_bus: CBus::of(&[Register::H]),
            b_bus: BusSource::None,
            ..Default::default()
        };
        let halt = MicroInstruction { next_address: 1, ..Default::default() };
        let sim = Mic1::new(&encode_microcode(&[inc_h, halt]), &encode_program(&[(0, &[0xFF])])).unwrap();
        DebuggerApp::new(sim)
    }

    #[test]
    fn test_tick_and_halt() {
        let mut app = app();
        assert_eq!(app.listing.len(), 1);

        app.tick();
        assert_eq!(app.sim.register(Register::H), 1);
        assert!(app.status.starts_with("0x000: H = 1"));

        app.run();
        app.advance();
        assert!(!app.running);
        assert!(app.status.starts_with("Halted"));
    }

    #[test]
    fn test_breakpoint_toggle_and_reset() {
        let mut app = app();
        app.toggle_micro_breakpoint();
        assert!(app.has_micro_breakpoint(0));
        app.tick();
        app.reset();
        assert!(app.has_micro_breakpoint(0));
        assert_eq!(app.sim.register(Register::H), 0);
        assert_eq!(app.micro_window(4).len(), 2);
    }
}
