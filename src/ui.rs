use chrono::{DateTime, Local};
use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Paragraph, Widget, Wrap},
};
use time_humanize::{Accuracy, HumanTime, Tense};
use unicode_width::UnicodeWidthStr;

use takt::{
    cue::{Cue, CueKind},
    economy::Quality,
    judge::{JudgementOutcome, SequenceVerdict, TimingVerdict, Verdict},
    score::VerdictCounts,
    session::{
        GameMode, ProgressView, SessionSnapshot, ACTIVE_WINDOW_AHEAD_SECS,
        ACTIVE_WINDOW_BEHIND_SECS,
    },
    upgrade::can_afford,
};

use crate::{App, AppState};

const HORIZONTAL_MARGIN: u16 = 5;
const VERTICAL_MARGIN: u16 = 2;

/// Column of the hit line inside the cue lane.
const HIT_LINE_COL: u16 = 3;

impl Widget for &App {
    fn render(self, area: Rect, buf: &mut Buffer) {
        match self.state {
            AppState::Shop => render_shop(self, area, buf),
            AppState::Playing => render_playing(self, area, buf),
            AppState::Results => render_results(self, area, buf),
        }
    }
}

fn render_shop(app: &App, area: Rect, buf: &mut Buffer) {
    let bold_style = Style::default().add_modifier(Modifier::BOLD);
    let dim_style = Style::default().add_modifier(Modifier::DIM);
    let italic_style = Style::default().add_modifier(Modifier::ITALIC);
    let magenta_bold_style = Style::default().patch(bold_style).fg(Color::Magenta);
    let yellow_bold_style = Style::default().patch(bold_style).fg(Color::Yellow);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .horizontal_margin(HORIZONTAL_MARGIN)
        .vertical_margin(VERTICAL_MARGIN)
        .constraints([
            Constraint::Length(2),
            Constraint::Length(2),
            Constraint::Length(app.upgrades.len() as u16 + 2),
            Constraint::Min(1),
            Constraint::Length(1),
        ])
        .split(area);

    let title = Paragraph::new(Span::styled("♪ takt", magenta_bold_style))
        .alignment(Alignment::Center);
    title.render(chunks[0], buf);

    let mut wallet = vec![Span::styled(format!("{} coins", app.coins), yellow_bold_style)];
    if let Some(played_at) = app.last_played {
        wallet.push(Span::styled(
            format!("   last set {}", ago(played_at)),
            dim_style,
        ));
    }
    Paragraph::new(Line::from(wallet))
        .alignment(Alignment::Center)
        .render(chunks[1], buf);

    let title_width = app
        .upgrades
        .iter()
        .map(|upgrade| upgrade.kind.title().width())
        .max()
        .unwrap_or(0);
    let mut rows = vec![Line::from(Span::styled("upgrades", dim_style))];
    for (slot, upgrade) in app.upgrades.iter().enumerate() {
        let row = format!(
            "({}) {:<title_width$}  lv{}  {:>5} coins  {}",
            slot + 1,
            upgrade.kind.title(),
            upgrade.level,
            upgrade.current_cost,
            upgrade.kind.blurb(),
        );
        let style = if can_afford(app.coins, upgrade) {
            bold_style
        } else {
            dim_style
        };
        rows.push(Line::from(Span::styled(row, style)));
    }
    Paragraph::new(rows)
        .alignment(Alignment::Center)
        .render(chunks[2], buf);

    let mut history = vec![Line::from(Span::styled("recent sets", dim_style))];
    if app.recent.is_empty() {
        history.push(Line::from(Span::styled(
            "no sets played yet",
            Style::default().patch(dim_style).patch(italic_style),
        )));
    }
    for record in &app.recent {
        history.push(Line::from(Span::styled(
            format!(
                "{}  {} pts  {:.1}% acc  x{}  +{} coins  {}",
                record.mode,
                record.score,
                record.accuracy * 100.0,
                record.max_combo,
                record.coins_earned,
                ago(record.played_at),
            ),
            dim_style,
        )));
    }
    Paragraph::new(history)
        .alignment(Alignment::Center)
        .render(chunks[3], buf);

    let legend = Paragraph::new(Span::styled(
        "(enter) play / (t)iming set / (s)equence set / (1-3) buy / (esc)ape",
        italic_style,
    ));
    legend.render(chunks[4], buf);
}

fn render_playing(app: &App, area: Rect, buf: &mut Buffer) {
    let Some(snapshot) = app.snapshot.as_ref() else {
        return;
    };

    let bold_style = Style::default().add_modifier(Modifier::BOLD);
    let dim_style = Style::default().add_modifier(Modifier::DIM);
    let italic_style = Style::default().add_modifier(Modifier::ITALIC);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .horizontal_margin(HORIZONTAL_MARGIN)
        .vertical_margin(VERTICAL_MARGIN)
        .constraints([
            Constraint::Length(2),
            Constraint::Min(1),
            Constraint::Length(1),
            Constraint::Length(1),
            Constraint::Length(1),
        ])
        .split(area);

    let remaining = (app.engine.config().duration_secs - snapshot.elapsed).max(0.0);
    let mut header = format!("{:.1}s left   {} pts", remaining, snapshot.score);
    if let ProgressView::Timing { combo, .. } = &snapshot.progress {
        if *combo > 1 {
            header.push_str(&format!("   combo x{}", combo));
        }
    }
    Paragraph::new(Span::styled(header, bold_style))
        .alignment(Alignment::Center)
        .render(chunks[0], buf);

    match &snapshot.progress {
        ProgressView::Timing { active, .. } => {
            render_lane(snapshot, active, chunks[1], buf);
        }
        ProgressView::Sequence { cursor, expected } => {
            let mut lines = Vec::new();
            match expected {
                Some(cue) => {
                    lines.push(Line::from(vec![
                        Span::styled("next  ", dim_style),
                        Span::styled(
                            format!("{} {}", cue_glyph(cue.kind), kind_label(cue.kind)),
                            Style::default().patch(bold_style).fg(kind_color(cue.kind)),
                        ),
                    ]));
                    let upcoming: String = app
                        .engine
                        .cues()
                        .iter()
                        .skip(*cursor + 1)
                        .take(6)
                        .map(|cue| cue_glyph(cue.kind))
                        .collect::<Vec<_>>()
                        .join(" ");
                    lines.push(Line::from(Span::styled(
                        format!("then  {}", upcoming),
                        dim_style,
                    )));
                }
                None => lines.push(Line::from(Span::styled("chart done", dim_style))),
            }
            lines.push(Line::from(Span::styled(
                format!("{} of {}", cursor, app.engine.cues().len()),
                dim_style,
            )));
            Paragraph::new(lines)
                .alignment(Alignment::Center)
                .render(chunks[1], buf);
        }
    }

    if let Some(outcome) = &snapshot.last_outcome {
        let (text, color) = outcome_text(outcome);
        Paragraph::new(Span::styled(
            text,
            Style::default().patch(bold_style).fg(color),
        ))
        .alignment(Alignment::Center)
        .render(chunks[2], buf);
    }

    Paragraph::new(Span::styled(counts_text(&snapshot.counts), dim_style))
        .alignment(Alignment::Center)
        .render(chunks[3], buf);

    let legend = match app.active_mode {
        GameMode::Timing => "(space) tap / (↑) hold / (←/→) flick / (esc)ape",
        GameMode::Sequence => "perform the shown action / (esc)ape",
    };
    Paragraph::new(Span::styled(legend, italic_style)).render(chunks[4], buf);
}

/// Paints the cue lane directly into the buffer: a baseline, the hit line,
/// and one glyph per visible cue at its projected column.
fn render_lane(snapshot: &SessionSnapshot, active: &[Cue], area: Rect, buf: &mut Buffer) {
    if area.width == 0 || area.height == 0 {
        return;
    }
    let lane_y = area.y + area.height / 2;

    for x in 0..area.width {
        if let Some(cell) = buf.cell_mut((area.x + x, lane_y)) {
            cell.set_symbol("─");
            cell.set_style(Style::default().add_modifier(Modifier::DIM));
        }
    }
    if let Some(cell) = buf.cell_mut((area.x + HIT_LINE_COL, lane_y)) {
        cell.set_symbol("┃");
        cell.set_style(Style::default().add_modifier(Modifier::BOLD));
    }

    for cue in active {
        let offset = cue.time - snapshot.elapsed;
        if let Some(col) = lane_column(offset, area.width) {
            if let Some(cell) = buf.cell_mut((area.x + col, lane_y)) {
                cell.set_symbol(cue_glyph(cue.kind));
                cell.set_style(
                    Style::default()
                        .fg(kind_color(cue.kind))
                        .add_modifier(Modifier::BOLD),
                );
            }
        }
    }
}

fn render_results(app: &App, area: Rect, buf: &mut Buffer) {
    let Some(result) = app.result.as_ref() else {
        return;
    };

    let bold_style = Style::default().add_modifier(Modifier::BOLD);
    let italic_style = Style::default().add_modifier(Modifier::ITALIC);
    let yellow_bold_style = Style::default().patch(bold_style).fg(Color::Yellow);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .horizontal_margin(HORIZONTAL_MARGIN)
        .vertical_margin(VERTICAL_MARGIN)
        .constraints([
            Constraint::Min(1),
            Constraint::Length(1),
            Constraint::Length(1),
            Constraint::Length(1),
            Constraint::Length(1),
            Constraint::Min(1),
            Constraint::Length(1),
        ])
        .split(area);

    Paragraph::new(Span::styled("set complete", bold_style))
        .alignment(Alignment::Center)
        .render(chunks[1], buf);

    let stats = format!(
        "{} pts   {:.1}% acc   x{} best combo",
        result.score,
        result.accuracy * 100.0,
        result.max_combo,
    );
    Paragraph::new(Span::styled(stats, bold_style))
        .alignment(Alignment::Center)
        .render(chunks[2], buf);

    let mut verdict = Vec::new();
    if let Some(quality) = app.quality {
        verdict.push(Span::styled(
            quality.to_string().to_uppercase(),
            Style::default()
                .patch(bold_style)
                .fg(quality_color(quality)),
        ));
        verdict.push(Span::raw("   "));
    }
    verdict.push(Span::styled(
        format!("+{} coins", result.coins_earned),
        yellow_bold_style,
    ));
    Paragraph::new(Line::from(verdict))
        .alignment(Alignment::Center)
        .render(chunks[3], buf);

    Paragraph::new(Span::styled(counts_text(&result.counts), Style::default()))
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: true })
        .render(chunks[4], buf);

    let legend = Paragraph::new(Span::styled("(r)eplay / (s)hop / (esc)ape", italic_style));
    legend.render(chunks[6], buf);
}

/// Projects a cue's time offset onto a lane column. The hit line sits at
/// `HIT_LINE_COL`; the right edge is `ACTIVE_WINDOW_AHEAD_SECS` away and
/// the left edge `ACTIVE_WINDOW_BEHIND_SECS` behind.
fn lane_column(offset_secs: f64, width: u16) -> Option<u16> {
    if width <= HIT_LINE_COL + 1 {
        return None;
    }
    let col = if offset_secs >= 0.0 {
        let frac = offset_secs / ACTIVE_WINDOW_AHEAD_SECS;
        if frac > 1.0 {
            return None;
        }
        HIT_LINE_COL as f64 + frac * (width - 1 - HIT_LINE_COL) as f64
    } else {
        let frac = -offset_secs / ACTIVE_WINDOW_BEHIND_SECS;
        if frac > 1.0 {
            return None;
        }
        HIT_LINE_COL as f64 - frac * HIT_LINE_COL as f64
    };
    Some(col.round() as u16)
}

fn cue_glyph(kind: CueKind) -> &'static str {
    match kind {
        CueKind::Tap => "●",
        CueKind::Hold => "◼",
        CueKind::FlickLeft => "◀",
        CueKind::FlickRight => "▶",
    }
}

fn kind_label(kind: CueKind) -> &'static str {
    match kind {
        CueKind::Tap => "tap (space)",
        CueKind::Hold => "hold (↑)",
        CueKind::FlickLeft => "flick (←)",
        CueKind::FlickRight => "flick (→)",
    }
}

fn kind_color(kind: CueKind) -> Color {
    match kind {
        CueKind::Tap => Color::White,
        CueKind::Hold => Color::Cyan,
        CueKind::FlickLeft | CueKind::FlickRight => Color::Magenta,
    }
}

fn quality_color(quality: Quality) -> Color {
    match quality {
        Quality::Excellent => Color::Green,
        Quality::Good => Color::Yellow,
        Quality::Normal => Color::White,
        Quality::Poor => Color::Red,
    }
}

fn outcome_text(outcome: &JudgementOutcome) -> (&'static str, Color) {
    match outcome.verdict {
        Verdict::Timing(TimingVerdict::Perfect) => ("PERFECT", Color::Green),
        Verdict::Timing(TimingVerdict::Good) => ("GOOD", Color::Yellow),
        Verdict::Timing(TimingVerdict::Miss) => ("MISS", Color::Red),
        Verdict::Sequence(SequenceVerdict::Correct) => ("CORRECT", Color::Green),
        Verdict::Sequence(SequenceVerdict::Wrong) => ("WRONG", Color::Red),
    }
}

fn counts_text(counts: &VerdictCounts) -> String {
    match counts {
        VerdictCounts::Sequence { correct, wrong } => {
            format!("correct {}   wrong {}", correct, wrong)
        }
        VerdictCounts::Timing {
            perfect,
            good,
            miss,
        } => format!("perfect {}   good {}   miss {}", perfect, good, miss),
    }
}

fn ago(played_at: DateTime<Local>) -> String {
    let elapsed = Local::now()
        .signed_duration_since(played_at)
        .to_std()
        .unwrap_or_default();
    HumanTime::from(elapsed).to_text_en(Accuracy::Rough, Tense::Past)
}
