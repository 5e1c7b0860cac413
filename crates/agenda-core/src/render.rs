use std::io::{self, IsTerminal, Write};

use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

use crate::classify::Tone;
use crate::config::ColorMode;
use crate::navigation::Granularity;
use crate::view::{AnnotatedEvent, CalendarCell, CalendarViewModel, EventDetail};

const CELL_TEXT_WIDTH: usize = 14;
const DIM: &str = "2";
const BOLD: &str = "1";
const REVERSE: &str = "7";

#[derive(Debug, Clone)]
pub struct Renderer {
    color: bool,
}

impl Renderer {
    pub fn new(mode: ColorMode) -> Self {
        let color = match mode {
            ColorMode::On => true,
            ColorMode::Off => false,
            ColorMode::Auto => io::stdout().is_terminal(),
        };
        Self { color }
    }

    pub fn plain() -> Self {
        Self { color: false }
    }

    /// Grid plus the today, upcoming and detail panels.
    #[tracing::instrument(skip(self, out, view), fields(title = %view.title))]
    pub fn write_calendar<W: Write>(
        &self,
        out: &mut W,
        view: &CalendarViewModel<'_>,
    ) -> anyhow::Result<()> {
        self.write_grid(out, view)?;
        writeln!(out)?;
        self.write_today(out, view)?;
        writeln!(out)?;
        self.write_upcoming(out, view)?;
        if let Some(detail) = &view.selected_event_detail {
            writeln!(out)?;
            self.write_detail(out, detail)?;
        }
        Ok(())
    }

    #[tracing::instrument(skip(self, out, view))]
    pub fn write_grid<W: Write>(
        &self,
        out: &mut W,
        view: &CalendarViewModel<'_>,
    ) -> anyhow::Result<()> {
        writeln!(out, "{}", self.paint(&view.title, BOLD))?;
        writeln!(out)?;

        if view.granularity == Granularity::Day {
            return self.write_day(out, view);
        }

        let (first, last) = view.period;
        let headers = view
            .weekday_labels
            .iter()
            .map(|label| label.to_string())
            .collect::<Vec<_>>();

        let mut rows = Vec::new();
        for week in view.rows() {
            let in_period = week
                .iter()
                .any(|cell| cell.date >= first && cell.date <= last);
            if view.granularity == Granularity::Week && !in_period {
                continue;
            }

            if !rows.is_empty() {
                rows.push(vec![String::new(); week.len()]);
            }
            rows.extend(self.week_lines(week, view.cell_event_limit));
        }

        write_table(out, headers, rows)?;
        Ok(())
    }

    #[tracing::instrument(skip(self, out, view))]
    pub fn write_today<W: Write>(
        &self,
        out: &mut W,
        view: &CalendarViewModel<'_>,
    ) -> anyhow::Result<()> {
        writeln!(
            out,
            "{}",
            self.paint(
                &format!("Today, {}", view.today.format("%A %Y-%m-%d")),
                BOLD
            )
        )?;

        if view.today_events.is_empty() {
            writeln!(out, "  No events scheduled for today")?;
            return Ok(());
        }

        for entry in &view.today_events {
            writeln!(
                out,
                "{} {} {}  {}  [{}]",
                selection_marker(entry),
                self.glyph(entry),
                entry.event.time.label,
                self.paint_tone(&entry.event.title, entry.presentation.type_color),
                self.paint_tone(entry.event.status.as_key(), entry.presentation.status_color),
            )?;
        }
        Ok(())
    }

    #[tracing::instrument(skip(self, out, view))]
    pub fn write_upcoming<W: Write>(
        &self,
        out: &mut W,
        view: &CalendarViewModel<'_>,
    ) -> anyhow::Result<()> {
        writeln!(
            out,
            "{}",
            self.paint(
                &format!(
                    "Upcoming ({} of {})",
                    view.upcoming_events.len(),
                    view.upcoming_total
                ),
                BOLD
            )
        )?;

        if view.upcoming_events.is_empty() {
            writeln!(out, "  No upcoming events")?;
            return Ok(());
        }

        for entry in &view.upcoming_events {
            let event = entry.event;
            let when = match event.time.start_label() {
                "" => event.date.format("%Y-%m-%d").to_string(),
                start => format!("{} • {start}", event.date.format("%Y-%m-%d")),
            };
            let contact = event.display_contact().unwrap_or_default();
            writeln!(
                out,
                "{} {} {}  {}  {}",
                selection_marker(entry),
                self.glyph(entry),
                when,
                self.paint_tone(&event.title, entry.presentation.type_color),
                self.paint(contact, DIM),
            )?;
        }
        Ok(())
    }

    #[tracing::instrument(skip(self, out, detail), fields(id = %detail.event.id))]
    pub fn write_detail<W: Write>(
        &self,
        out: &mut W,
        detail: &EventDetail<'_>,
    ) -> anyhow::Result<()> {
        let event = detail.event;
        let presentation = detail.presentation;

        writeln!(
            out,
            "{} {}",
            self.paint_tone(presentation.icon.glyph(), presentation.type_color),
            self.paint(&event.title, BOLD)
        )?;
        writeln!(out, "id          {}", event.id)?;
        writeln!(
            out,
            "type        {}",
            self.paint_tone(event.kind.as_key(), presentation.type_color)
        )?;
        writeln!(
            out,
            "status      {}",
            self.paint_tone(event.status.as_key(), presentation.status_color)
        )?;
        writeln!(out, "date        {}", event.date.format("%A %Y-%m-%d"))?;
        writeln!(out, "time        {}", event.time.label)?;
        writeln!(out, "duration    {}", event.duration)?;
        writeln!(out, "location    {}", event.location)?;
        writeln!(out, "contact     {}", event.contact.as_deref().unwrap_or_default())?;
        writeln!(out, "description {}", event.description)?;
        writeln!(out, "attendees   {}", detail.attendee_count)?;
        for badge in &detail.attendees {
            writeln!(out, "  {:<3} {}", self.paint(&badge.initials, REVERSE), badge.name)?;
        }
        Ok(())
    }

    fn write_day<W: Write>(
        &self,
        out: &mut W,
        view: &CalendarViewModel<'_>,
    ) -> anyhow::Result<()> {
        let (day, _) = view.period;
        let Some(cell) = view.cell(day) else {
            writeln!(out, "  No events")?;
            return Ok(());
        };

        if cell.events.is_empty() {
            writeln!(out, "  No events")?;
        }
        for entry in &cell.events {
            writeln!(
                out,
                "{} {} {}  {}",
                selection_marker(entry),
                self.glyph(entry),
                entry.event.time.label,
                self.paint_tone(&entry.event.title, entry.presentation.type_color),
            )?;
        }
        Ok(())
    }

    /// One grid week as table lines: day numbers, then up to `limit`
    /// events per cell, then the overflow markers.
    fn week_lines(&self, week: &[CalendarCell<'_>], limit: usize) -> Vec<Vec<String>> {
        let mut lines = vec![week.iter().map(|cell| self.day_label(cell)).collect::<Vec<_>>()];

        for slot in 0..limit {
            if week.iter().all(|cell| cell.visible_events(limit).len() <= slot) {
                break;
            }
            lines.push(
                week.iter()
                    .map(|cell| {
                        cell.visible_events(limit)
                            .get(slot)
                            .map(|entry| self.cell_entry(entry))
                            .unwrap_or_default()
                    })
                    .collect(),
            );
        }

        if week.iter().any(|cell| cell.hidden_count(limit) > 0) {
            lines.push(
                week.iter()
                    .map(|cell| {
                        cell.overflow_label(limit)
                            .map(|label| self.paint(&label, DIM))
                            .unwrap_or_default()
                    })
                    .collect(),
            );
        }

        lines
    }

    fn day_label(&self, cell: &CalendarCell<'_>) -> String {
        let day = cell.date.format("%e").to_string();
        if cell.is_today {
            return self.paint(&format!("[{}]", day.trim()), REVERSE);
        }
        if !cell.in_current_month {
            return self.paint(&day, DIM);
        }
        day
    }

    fn cell_entry(&self, entry: &AnnotatedEvent<'_>) -> String {
        let text = truncate_width(&entry.event.title, CELL_TEXT_WIDTH);
        let text = if entry.selected {
            format!(">{text}")
        } else {
            text
        };
        format!(
            "{} {}",
            self.glyph(entry),
            self.paint_tone(&text, entry.presentation.type_color)
        )
    }

    fn glyph(&self, entry: &AnnotatedEvent<'_>) -> String {
        self.paint_tone(
            entry.presentation.icon.glyph(),
            entry.presentation.status_color,
        )
    }

    pub fn paint_tone(&self, text: &str, tone: Tone) -> String {
        self.paint(text, tone.ansi_code())
    }

    fn paint(&self, text: &str, code: &str) -> String {
        if !self.color || text.is_empty() {
            return text.to_string();
        }
        format!("\x1b[{code}m{text}\x1b[0m")
    }
}

fn selection_marker(entry: &AnnotatedEvent<'_>) -> &'static str {
    if entry.selected { ">" } else { " " }
}

fn truncate_width(text: &str, max: usize) -> String {
    if UnicodeWidthStr::width(text) <= max {
        return text.to_string();
    }

    let mut out = String::new();
    let mut used = 0usize;
    for ch in text.chars() {
        let width = UnicodeWidthChar::width(ch).unwrap_or(0);
        if used + width + 1 > max {
            break;
        }
        used += width;
        out.push(ch);
    }
    out.push('…');
    out
}

fn write_table<W: Write>(
    mut writer: W,
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
) -> anyhow::Result<()> {
    let column_count = headers.len();
    let mut widths = vec![0usize; column_count];

    for (idx, header) in headers.iter().enumerate() {
        widths[idx] = widths[idx].max(UnicodeWidthStr::width(header.as_str()));
    }

    for row in &rows {
        for (idx, cell) in row.iter().enumerate().take(column_count) {
            widths[idx] = widths[idx].max(UnicodeWidthStr::width(strip_ansi(cell).as_str()));
        }
    }

    for idx in 0..column_count {
        write!(writer, "{:width$} ", headers[idx], width = widths[idx])?;
    }
    writeln!(writer)?;

    for width in &widths {
        write!(writer, "{:-<width$} ", "", width = *width)?;
    }
    writeln!(writer)?;

    for row in rows {
        for (idx, width) in widths.iter().enumerate() {
            let cell = row.get(idx).map(String::as_str).unwrap_or_default();
            let visible_width = UnicodeWidthStr::width(strip_ansi(cell).as_str());
            let padding = width.saturating_sub(visible_width);
            write!(writer, "{}{} ", cell, " ".repeat(padding))?;
        }
        writeln!(writer)?;
    }

    Ok(())
}

fn strip_ansi(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut escaped = false;

    for ch in s.chars() {
        if escaped {
            if ch == 'm' {
                escaped = false;
            }
            continue;
        }

        if ch == '\x1b' {
            escaped = true;
            continue;
        }

        out.push(ch);
    }

    out
}
