//! Text rendering of session state: the per-date event table and the
//! grouped attendance report. Width math goes through `unicode-width`
//! because participant names are routinely full-width CJK.

use std::io::{self, IsTerminal, Write};

use anyhow::anyhow;
use chrono::{Datelike, NaiveDate};

use unicode_width::UnicodeWidthStr;

use crate::config::Config;
use crate::dates::format_iso;
use crate::holiday::{HolidayProvider, is_red_day};
use crate::session::Session;

#[derive(Debug, Clone, Copy)]
enum Align {
    Left,
    Right,
}

#[derive(Debug, Clone)]
pub struct Renderer {
    color: bool,
}

impl Renderer {
    pub fn new(cfg: &Config) -> anyhow::Result<Self> {
        let color_cfg = cfg.get("color").unwrap_or_else(|| "on".to_string());
        let color = match color_cfg.to_ascii_lowercase().as_str() {
            "on" | "yes" | "true" | "1" => true,
            "off" | "no" | "false" | "0" => false,
            other => return Err(anyhow!("invalid color setting: {other}")),
        };

        Ok(Self { color })
    }

    /// The raw per-date table: one row per selected date, names in
    /// insertion order. Red days paint red; the highlighted
    /// participant's dates are starred.
    pub fn print_events(&mut self, session: &Session) -> anyhow::Result<()> {
        let mut out = io::stdout().lock();

        if session.events().is_empty() {
            writeln!(out, "No dates selected.")?;
            return Ok(());
        }

        let highlighted = session.highlighted_dates();
        let headers = vec![
            "Date".to_string(),
            "Day".to_string(),
            "Names".to_string(),
        ];

        let mut rows = Vec::with_capacity(session.events().len());
        for (&date, names) in session.events() {
            let mut date_cell = format_iso(date);
            if highlighted.contains(&date) {
                date_cell.push_str(" *");
            }
            if is_red_day(session.holidays(), date) {
                date_cell = self.paint(&date_cell, "31");
            }

            rows.push(vec![
                date_cell,
                weekday_label(date).to_string(),
                names.join(", "),
            ]);
        }

        write_table(&mut out, headers, rows, &[Align::Left, Align::Left, Align::Left])?;
        Ok(())
    }

    /// The grouped report. Period and day count print once per group
    /// (the rowspan idea, in text); member names print one per row.
    /// Overridden groups get a trailing marker on the period.
    pub fn print_report(&mut self, session: &Session) -> anyhow::Result<()> {
        let mut out = io::stdout().lock();

        let groups = session.grouped_report();
        if groups.is_empty() {
            writeln!(out, "No attendance recorded.")?;
            return Ok(());
        }

        let headers = vec![
            "#".to_string(),
            "Period".to_string(),
            "Days".to_string(),
            "Name".to_string(),
        ];

        let mut rows = Vec::new();
        for (idx, group) in groups.iter().enumerate() {
            let mut period = session.period_for_group(&group.dates_key);
            if session.override_for(&group.dates_key).is_some() {
                period.push_str(" *");
            }

            for (row_idx, name) in group.names.iter().enumerate() {
                let name_cell = if session.highlight() == Some(name.as_str()) {
                    self.paint(name, "33")
                } else {
                    name.clone()
                };
                if row_idx == 0 {
                    rows.push(vec![
                        (idx + 1).to_string(),
                        period.clone(),
                        group.day_count.to_string(),
                        name_cell,
                    ]);
                } else {
                    rows.push(vec![
                        String::new(),
                        String::new(),
                        String::new(),
                        name_cell,
                    ]);
                }
            }
        }

        write_table(
            &mut out,
            headers,
            rows,
            &[Align::Right, Align::Left, Align::Right, Align::Left],
        )?;
        Ok(())
    }

    /// Classification of one date against the holiday table.
    pub fn print_date_info(
        &mut self,
        date: NaiveDate,
        provider: &dyn HolidayProvider,
    ) -> anyhow::Result<()> {
        let mut out = io::stdout().lock();

        let kind = if provider.is_holiday(date) {
            "holiday"
        } else if is_red_day(provider, date) {
            "red day (Sunday)"
        } else if date.weekday() == chrono::Weekday::Sat {
            "Saturday"
        } else {
            "working day"
        };

        writeln!(
            out,
            "{} ({}) is a {} in {}",
            format_iso(date),
            weekday_label(date),
            kind,
            provider.name()
        )?;
        Ok(())
    }

    fn paint(&self, text: &str, code: &str) -> String {
        if !self.color || !io::stdout().is_terminal() {
            return text.to_string();
        }
        format!("\x1b[{code}m{text}\x1b[0m")
    }
}

fn weekday_label(date: NaiveDate) -> &'static str {
    match date.weekday() {
        chrono::Weekday::Mon => "Mon",
        chrono::Weekday::Tue => "Tue",
        chrono::Weekday::Wed => "Wed",
        chrono::Weekday::Thu => "Thu",
        chrono::Weekday::Fri => "Fri",
        chrono::Weekday::Sat => "Sat",
        chrono::Weekday::Sun => "Sun",
    }
}

fn write_table<W: Write>(
    mut writer: W,
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
    aligns: &[Align],
) -> anyhow::Result<()> {
    let column_count = headers.len();
    let mut widths = vec![0usize; column_count];

    for (idx, header) in headers.iter().enumerate() {
        widths[idx] = widths[idx].max(UnicodeWidthStr::width(header.as_str()));
    }
    for row in &rows {
        for (idx, cell) in row.iter().enumerate() {
            widths[idx] = widths[idx].max(UnicodeWidthStr::width(strip_ansi(cell).as_str()));
        }
    }

    for idx in 0..column_count {
        write!(writer, "{:width$} ", headers[idx], width = widths[idx])?;
    }
    writeln!(writer)?;

    for idx in 0..column_count {
        write!(writer, "{:-<width$} ", "", width = widths[idx])?;
    }
    writeln!(writer)?;

    for row in rows {
        for idx in 0..column_count {
            let cell = &row[idx];
            let visible = UnicodeWidthStr::width(strip_ansi(cell).as_str());
            let padding = " ".repeat(widths[idx].saturating_sub(visible));
            match aligns.get(idx).copied().unwrap_or(Align::Left) {
                Align::Left => write!(writer, "{cell}{padding} ")?,
                Align::Right => write!(writer, "{padding}{cell} ")?,
            }
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

#[cfg(test)]
mod tests {
    use super::{Align, strip_ansi, write_table};

    #[test]
    fn strips_ansi_codes() {
        assert_eq!(strip_ansi("\x1b[31m2024-01-07\x1b[0m"), "2024-01-07");
        assert_eq!(strip_ansi("plain"), "plain");
    }

    #[test]
    fn table_pads_wide_names_correctly() {
        let mut buf = Vec::new();
        write_table(
            &mut buf,
            vec!["Name".to_string(), "Days".to_string()],
            vec![
                vec!["김철수".to_string(), "3".to_string()],
                vec!["Lee".to_string(), "12".to_string()],
            ],
            &[Align::Left, Align::Right],
        )
        .expect("write table");

        let out = String::from_utf8(buf).expect("utf8");
        let lines: Vec<&str> = out.lines().collect();
        // 김철수 is six columns wide; both name cells pad to that.
        assert!(lines[2].starts_with("김철수"));
        assert!(lines[3].starts_with("Lee    "));
        // Right-aligned day counts share their last column.
        assert!(lines[2].ends_with("3 "));
        assert!(lines[3].ends_with("12 "));
    }
}
