use std::io::{self, Write};

use cairn::{LoopEvent, LoopPhase, RunOutcome};

/// Prints loop events as a terminal transcript.
///
/// Text updates carry the whole block so far; only the unseen suffix is
/// written, which keeps the current line growing in place.
pub struct Renderer<W: Write> {
    out: W,
    block: Option<usize>,
    printed: usize,
    mid_line: bool,
}

impl<W: Write> Renderer<W> {
    pub fn new(out: W) -> Self {
        Self {
            out,
            block: None,
            printed: 0,
            mid_line: false,
        }
    }

    pub fn render(&mut self, event: &LoopEvent) -> io::Result<()> {
        match event {
            LoopEvent::TextUpdate { block_index, text } => {
                if self.block != Some(*block_index) {
                    self.end_line()?;
                    self.block = Some(*block_index);
                    self.printed = 0;
                }
                if let Some(unseen) = text.get(self.printed..) {
                    write!(self.out, "{unseen}")?;
                    self.printed = text.len();
                    self.mid_line = !text.ends_with('\n');
                }
            }
            LoopEvent::ToolCall { name, arguments, .. } => {
                self.end_line()?;
                writeln!(self.out, "→ {name} {arguments}")?;
            }
            LoopEvent::ToolResult {
                name,
                is_error,
                duration_ms,
                content,
                ..
            } => {
                self.end_line()?;
                if *is_error {
                    writeln!(self.out, "  ✗ {name} ({duration_ms} ms): {content}")?;
                } else {
                    writeln!(self.out, "  ✓ {name} ({duration_ms} ms)")?;
                }
            }
            LoopEvent::TurnAppended { .. } => {
                // a new assistant turn restarts block numbering
                self.end_line()?;
                self.block = None;
            }
            LoopEvent::Phase {
                phase: LoopPhase::Cancelled,
            } => {
                self.end_line()?;
                writeln!(self.out, "(cancelled)")?;
            }
            LoopEvent::Error { message } => {
                self.end_line()?;
                writeln!(self.out, "⚠ {message}")?;
            }
            LoopEvent::EndStream { .. } => self.end_line()?,
            LoopEvent::InitStream { .. } | LoopEvent::Phase { .. } => {}
        }
        self.out.flush()
    }

    /// Report a run that could not start or whose task died
    pub fn notice(&mut self, message: &str) -> io::Result<()> {
        self.end_line()?;
        writeln!(self.out, "⚠ {message}")?;
        self.out.flush()
    }

    pub fn finish(&mut self, outcome: &RunOutcome) -> io::Result<()> {
        self.end_line()?;
        if let RunOutcome::Failed { .. } = outcome {
            writeln!(self.out, "(run failed; you can send another message)")?;
        }
        self.out.flush()
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn end_line(&mut self) -> io::Result<()> {
        if self.mid_line {
            writeln!(self.out)?;
            self.mid_line = false;
        }
        Ok(())
    }
}
