//! Relative-cursor region renderer.
//!
//! Solves the "where is my cursor" problem with relative coordinates: the
//! frame reserves a block of lines at the current scroll position, then
//! repaints individual lines by moving up/down relative to the block's top.
//! [`Frame::grow`] opens additional lines mid-flight (used when a failed
//! check gains an inline error line).

use crossterm::{
    QueueableCommand,
    cursor::{Hide, MoveDown, MoveToColumn, MoveUp, Show},
    terminal::{Clear, ClearType},
};
use std::io::{Result, Stdout, Write, stdout};

/// A repaintable block of terminal lines addressed by row offset.
#[derive(Debug)]
pub struct Frame {
    stdout: Stdout,
    rows: u16,
    started: bool,
}

impl Frame {
    /// A frame of `rows` lines; nothing is written until the first paint.
    pub fn new(rows: u16) -> Self {
        Self {
            stdout: stdout(),
            rows,
            started: false,
        }
    }

    /// Reserve terminal space and park the cursor at the block's top.
    pub fn start(&mut self) -> Result<()> {
        self.stdout.queue(Hide)?;
        for _ in 0..self.rows {
            writeln!(self.stdout)?;
        }
        if self.rows > 0 {
            self.stdout.queue(MoveUp(self.rows))?;
        }
        self.stdout.flush()?;
        self.started = true;
        Ok(())
    }

    /// Repaint one line of the block. Batches output; call [`Frame::flush`]
    /// when a set of rows has been written.
    pub fn write_row(&mut self, row: u16, f: impl FnOnce(&mut Stdout) -> Result<()>) -> Result<()> {
        if !self.started {
            self.start()?;
        }
        if row >= self.rows {
            return Ok(());
        }

        self.stdout.queue(MoveToColumn(0))?;
        if row > 0 {
            self.stdout.queue(MoveDown(row))?;
        }
        self.stdout.queue(Clear(ClearType::CurrentLine))?;
        f(&mut self.stdout)?;
        self.stdout.queue(MoveToColumn(0))?;
        if row > 0 {
            self.stdout.queue(MoveUp(row))?;
        }
        Ok(())
    }

    /// Open `extra` new lines at the bottom of the block.
    pub fn grow(&mut self, extra: u16) -> Result<()> {
        if !self.started {
            self.rows += extra;
            return Ok(());
        }
        if self.rows > 0 {
            self.stdout.queue(MoveDown(self.rows))?;
        }
        self.stdout.queue(MoveToColumn(0))?;
        for _ in 0..extra {
            writeln!(self.stdout)?;
        }
        self.rows += extra;
        self.stdout.queue(MoveUp(self.rows))?;
        Ok(())
    }

    /// Flush pending repaints to the terminal.
    pub fn flush(&mut self) -> Result<()> {
        self.stdout.flush()
    }

    /// Move the cursor below the block and restore it for normal output.
    pub fn finish(&mut self) -> Result<()> {
        if !self.started {
            return Ok(());
        }
        if self.rows > 0 {
            self.stdout.queue(MoveDown(self.rows))?;
        }
        self.stdout.queue(MoveToColumn(0))?;
        self.stdout.queue(Show)?;
        self.stdout.flush()?;
        self.started = false;
        Ok(())
    }
}

impl Drop for Frame {
    fn drop(&mut self) {
        let _ = self.finish();
    }
}
