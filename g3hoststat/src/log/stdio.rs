/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2023-2026 ByteDance and/or its affiliates.
 */

use std::fmt;
use std::io::{self, IsTerminal, Write};
use std::sync::Mutex;

use anstyle::{AnsiColor, Color, Style};
use chrono::Local;
use slog::{Drain, Level, OwnedKVList, Record, KV};

const TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.6f";

const COLOR_MAGENTA: Style = Style::new().fg_color(Some(Color::Ansi(AnsiColor::Magenta)));
const COLOR_RED: Style = Style::new().fg_color(Some(Color::Ansi(AnsiColor::Red)));
const COLOR_YELLOW: Style = Style::new().fg_color(Some(Color::Ansi(AnsiColor::Yellow)));
const COLOR_GREEN: Style = Style::new().fg_color(Some(Color::Ansi(AnsiColor::Green)));
const COLOR_CYAN: Style = Style::new().fg_color(Some(Color::Ansi(AnsiColor::Cyan)));
const COLOR_BLUE: Style = Style::new().fg_color(Some(Color::Ansi(AnsiColor::Blue)));
const STYLE_BOLD: Style = Style::new().bold();
const STYLE_ITALIC: Style = Style::new().italic();

#[derive(Default)]
struct KvCollector {
    pairs: Vec<(String, String)>,
}

impl slog::Serializer for KvCollector {
    fn emit_arguments(&mut self, key: slog::Key, val: &fmt::Arguments) -> slog::Result {
        self.pairs.push((key.to_string(), val.to_string()));
        Ok(())
    }
}

struct LogLine<'a> {
    level: Level,
    message: String,
    kv_pairs: Vec<(String, String)>,
    location: Option<(&'a str, u32)>,
}

impl LogLine<'_> {
    fn message_str(&self) -> &str {
        if self.message.is_empty() {
            "()"
        } else {
            &self.message
        }
    }

    fn write_plain<W: Write>(&self, io: &mut W) -> io::Result<()> {
        write!(io, "{}", Local::now().format(TIME_FORMAT))?;
        write!(io, " {}", self.level)?;
        for (k, v) in &self.kv_pairs {
            write!(io, " {k}: {v},")?;
        }
        write!(io, " {}", self.message_str())?;
        if let Some((file, line)) = self.location {
            write!(io, " <{file}:{line}>")?;
        }
        writeln!(io)
    }

    fn write_console<W: Write>(&self, io: &mut W) -> io::Result<()> {
        let bold_s = STYLE_BOLD.render();
        let bold_e = STYLE_BOLD.render_reset();

        write!(io, "{}", Local::now().format(TIME_FORMAT))?;
        let level_color = match self.level {
            Level::Critical => COLOR_MAGENTA,
            Level::Error => COLOR_RED,
            Level::Warning => COLOR_YELLOW,
            Level::Info => COLOR_GREEN,
            Level::Debug => COLOR_CYAN,
            Level::Trace => COLOR_BLUE,
        };
        write!(
            io,
            " {}{}{}",
            level_color.render(),
            self.level,
            level_color.render_reset(),
        )?;

        for (k, v) in &self.kv_pairs {
            write!(io, " {bold_s}{k}{bold_e}={v},")?;
        }

        write!(io, " {bold_s}{}{bold_e}", self.message_str())?;

        if let Some((file, line)) = self.location {
            write!(
                io,
                " <{}{file}:{line}{}>",
                STYLE_ITALIC.render(),
                STYLE_ITALIC.render_reset()
            )?;
        }
        writeln!(io)
    }
}

/// A synchronous slog drain writing one line per record.
///
/// Colors are used only if the output is a terminal.
pub struct StdioDrain<W: Write> {
    io: Mutex<W>,
    console: bool,
    append_code_position: bool,
}

impl<W: Write + IsTerminal> StdioDrain<W> {
    pub fn new(io: W, append_code_position: bool) -> Self {
        let console = io.is_terminal();
        StdioDrain {
            io: Mutex::new(io),
            console,
            append_code_position,
        }
    }
}

impl<W: Write> StdioDrain<W> {
    #[cfg(test)]
    pub(crate) fn with_plain(io: W, append_code_position: bool) -> Self {
        StdioDrain {
            io: Mutex::new(io),
            console: false,
            append_code_position,
        }
    }
}

impl<W: Write> Drain for StdioDrain<W> {
    type Ok = ();
    type Err = io::Error;

    fn log(&self, record: &Record, values: &OwnedKVList) -> io::Result<()> {
        let mut collector = KvCollector::default();
        let _ = record.kv().serialize(record, &mut collector);
        let _ = values.serialize(record, &mut collector);

        let line = LogLine {
            level: record.level(),
            message: record.msg().to_string(),
            kv_pairs: collector.pairs,
            location: self
                .append_code_position
                .then(|| (record.file(), record.line())),
        };

        let mut buf = Vec::with_capacity(256);
        if self.console {
            line.write_console(&mut buf)?;
        } else {
            line.write_plain(&mut buf)?;
        }

        let mut io = self.io.lock().unwrap_or_else(|e| e.into_inner());
        io.write_all(&buf)?;
        io.flush()
    }
}
