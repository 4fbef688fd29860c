//! Recommendation result and error views.

use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::Modifier,
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Paragraph, Row, Table, Wrap},
    Frame,
};

use crate::domain::RecommendationReport;
use crate::tui::styles::DietTheme;
use crate::DietError;

/// Outcome shown after the user presses Enter on the form.
#[derive(Debug, Clone, Default)]
pub enum ResultState {
    #[default]
    Empty,
    Complete {
        report: RecommendationReport,
        show_debug: bool,
    },
    Error {
        message: String,
        hint: Option<&'static str>,
    },
}

impl ResultState {
    #[must_use]
    pub fn from_outcome(outcome: Result<RecommendationReport, DietError>) -> Self {
        match outcome {
            Ok(report) => Self::Complete {
                report,
                show_debug: false,
            },
            Err(e) => Self::Error {
                message: e.to_string(),
                hint: e.hint(),
            },
        }
    }

    pub fn toggle_debug(&mut self) {
        if let Self::Complete { show_debug, .. } = self {
            *show_debug = !*show_debug;
        }
    }

    #[must_use]
    pub fn is_error(&self) -> bool {
        matches!(self, Self::Error { .. })
    }
}

/// Render the result (or error) screen
pub fn render_result(f: &mut Frame, area: Rect, state: &ResultState) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Header
            Constraint::Min(0),    // Content
            Constraint::Length(3), // Footer
        ])
        .split(area);

    render_result_header(f, chunks[0]);
    match state {
        ResultState::Empty => render_empty(f, chunks[1]),
        ResultState::Complete { report, show_debug } => {
            if *show_debug {
                let columns = Layout::default()
                    .direction(Direction::Horizontal)
                    .constraints([Constraint::Percentage(55), Constraint::Percentage(45)])
                    .split(chunks[1]);
                render_recommendation(f, columns[0], report);
                render_debug(f, columns[1], report);
            } else {
                render_recommendation(f, chunks[1], report);
            }
        }
        ResultState::Error { message, hint } => render_error(f, chunks[1], message, *hint),
    }
    render_result_footer(f, chunks[2], state);
}

fn render_result_header(f: &mut Frame, area: Rect) {
    let header = Paragraph::new(Line::from(vec![
        Span::styled(" ", DietTheme::text()),
        Span::styled("Recommendation", DietTheme::title()),
        Span::styled(" │ Personalized Diet Plan", DietTheme::text_secondary()),
    ]))
    .block(
        Block::default()
            .borders(Borders::BOTTOM)
            .border_style(DietTheme::border()),
    );

    f.render_widget(header, area);
}

fn render_empty(f: &mut Frame, area: Rect) {
    let content = Paragraph::new(vec![
        Line::from(""),
        Line::from(Span::styled(
            "No recommendation yet",
            DietTheme::text_secondary(),
        )),
    ])
    .alignment(Alignment::Center)
    .block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(DietTheme::border()),
    );

    f.render_widget(content, area);
}

fn render_recommendation(f: &mut Frame, area: Rect, report: &RecommendationReport) {
    let block = Block::default()
        .title(Span::styled(" Recommended Diet ", DietTheme::subtitle()))
        .borders(Borders::ALL)
        .border_style(DietTheme::border_focused());

    let inner = block.inner(area);
    f.render_widget(block, area);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Label
            Constraint::Min(0),    // Advisory
        ])
        .margin(1)
        .split(inner);

    let class = report.result.class_label;
    let label = Paragraph::new(Line::from(Span::styled(
        class.label(),
        DietTheme::diet_class(class).add_modifier(Modifier::UNDERLINED),
    )))
    .alignment(Alignment::Center);
    f.render_widget(label, chunks[0]);

    let advisory = Paragraph::new(vec![
        Line::from(Span::styled("Advice", DietTheme::text_secondary())),
        Line::from(""),
        Line::from(Span::styled(
            report.result.advisory_text.as_str(),
            DietTheme::text(),
        )),
    ])
    .wrap(Wrap { trim: true });
    f.render_widget(advisory, chunks[1]);
}

fn render_debug(f: &mut Frame, area: Rect, report: &RecommendationReport) {
    let rows: Vec<Row> = report
        .features
        .entries()
        .into_iter()
        .map(|(name, value)| {
            Row::new(vec![
                Cell::from(Span::styled(name, DietTheme::text_secondary())),
                Cell::from(Span::styled(format!("{value}"), DietTheme::text())),
            ])
        })
        .collect();

    let table = Table::new(rows, [Constraint::Min(32), Constraint::Length(12)])
        .header(Row::new(vec!["Feature", "Value"]).style(DietTheme::header()))
        .block(
            Block::default()
                .title(Span::styled(
                    format!(" Debug │ raw class index {} ", report.class_index),
                    DietTheme::info(),
                ))
                .borders(Borders::ALL)
                .border_style(DietTheme::border()),
        );

    f.render_widget(table, area);
}

fn render_error(f: &mut Frame, area: Rect, message: &str, hint: Option<&'static str>) {
    let mut lines = vec![
        Line::from(""),
        Line::from(Span::styled("! Error", DietTheme::danger())),
        Line::from(""),
        Line::from(Span::styled(message, DietTheme::text())),
    ];
    if let Some(hint) = hint {
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(hint, DietTheme::warning())));
    }

    let content = Paragraph::new(lines)
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: true })
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(DietTheme::danger()),
        );

    f.render_widget(content, area);
}

fn render_result_footer(f: &mut Frame, area: Rect, state: &ResultState) {
    let content = match state {
        ResultState::Complete { show_debug, .. } => Line::from(vec![
            Span::styled("[Enter] ", DietTheme::key_hint()),
            Span::styled("Back to Form ", DietTheme::key_desc()),
            Span::styled("[D] ", DietTheme::key_hint()),
            Span::styled(
                if *show_debug { "Hide Debug " } else { "Show Debug " },
                DietTheme::key_desc(),
            ),
            Span::styled("[Esc] ", DietTheme::key_hint()),
            Span::styled("Quit", DietTheme::key_desc()),
        ]),
        _ => Line::from(vec![
            Span::styled("[Enter] ", DietTheme::key_hint()),
            Span::styled("Retry ", DietTheme::key_desc()),
            Span::styled("[Esc] ", DietTheme::key_hint()),
            Span::styled("Quit", DietTheme::key_desc()),
        ]),
    };

    let footer = Paragraph::new(content).block(
        Block::default()
            .borders(Borders::TOP)
            .border_style(DietTheme::border()),
    );

    f.render_widget(footer, area);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{encode, map_class_index, RawInput};

    fn report(index: i64) -> RecommendationReport {
        RecommendationReport {
            features: encode(&RawInput::default()),
            class_index: index,
            result: map_class_index(index).expect("known class"),
        }
    }

    #[test]
    fn test_toggle_debug() {
        let mut state = ResultState::from_outcome(Ok(report(2)));
        state.toggle_debug();
        assert!(matches!(state, ResultState::Complete { show_debug: true, .. }));
        state.toggle_debug();
        assert!(matches!(state, ResultState::Complete { show_debug: false, .. }));
    }

    #[test]
    fn test_mapping_error_carries_hint() {
        let state =
            ResultState::from_outcome(Err(DietError::PredictionMapping("index 7".into())));
        match state {
            ResultState::Error { message, hint } => {
                assert!(message.contains("index 7"));
                assert!(hint.expect("hint").contains("column order"));
            }
            other => panic!("unexpected state: {other:?}"),
        }
    }

    #[test]
    fn test_toggle_debug_ignored_on_error() {
        let mut state =
            ResultState::from_outcome(Err(DietError::Validation("age 3 out of range".into())));
        state.toggle_debug();
        assert!(state.is_error());
    }
}
