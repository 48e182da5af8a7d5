use crate::ui::app::{App, FocusPanel, Status};
use ratatui::{
    layout::{Constraint, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span, Text},
    widgets::{
        Block, Borders, List, ListItem, Paragraph, Row, Scrollbar, ScrollbarOrientation,
        ScrollbarState, Table,
    },
    Frame,
};

// Brandbook colors
const BRAND_DARK: Color = Color::Rgb(0x1F, 0x2F, 0x3C); // #1f2f3c
const BRAND_SELECT_BG: Color = Color::Rgb(0xC3, 0xD3, 0xE0); // #c3d3e0
const BRAND_GREEN: Color = Color::Rgb(0x82, 0x9A, 0x68); // #829a68
const BRAND_ORANGE: Color = Color::Rgb(0x9E, 0x68, 0x3C); // #9e683c
const BRAND_RED: Color = Color::Rgb(0xA8, 0x44, 0x3A); // #a8443a
const BRAND_MUTED: Color = Color::Rgb(0x71, 0x65, 0x65); // #716565

// Styles
const HEADER_STYLE: Style = Style::new().fg(BRAND_DARK).add_modifier(Modifier::BOLD);
const SELECTED_STYLE: Style = Style::new()
    .bg(BRAND_SELECT_BG)
    .fg(BRAND_DARK)
    .add_modifier(Modifier::BOLD);

pub fn draw_dashboard(frame: &mut Frame, app: &App) {
    let chunks = Layout::vertical([
        Constraint::Length(3), // Header
        Constraint::Min(10),   // Main content
        Constraint::Length(3), // Status
        Constraint::Length(3), // Footer
    ])
    .split(frame.area());

    draw_header(frame, chunks[0], app);
    draw_main_content(frame, chunks[1], app);
    draw_status(frame, chunks[2], app);
    draw_footer(
        frame,
        chunks[3],
        " ←→ Panel | ↑↓ Select | Enter Run/Isolate | a Isolate category | c Clear | s Save | q Quit ",
    );
}

fn pct_color(pct: u8) -> Color {
    match pct {
        100 => BRAND_GREEN,
        50..=99 => BRAND_ORANGE,
        _ => BRAND_RED,
    }
}

fn draw_header(frame: &mut Frame, area: Rect, app: &App) {
    let title = match &app.analysis {
        Some(analysis) => format!(
            " Model Compliance | {} | {} | {} elements | {}% avg | {} fully compliant ",
            app.model.model_name,
            analysis.discipline_name,
            analysis.summary.total_elements,
            analysis.summary.average_compliance_pct,
            analysis.summary.fully_compliant
        ),
        None => format!(
            " Model Compliance | {} | {} ",
            app.model.model_name,
            app.selected_discipline_name()
        ),
    };

    let header = Paragraph::new(title)
        .style(HEADER_STYLE)
        .block(Block::default().borders(Borders::ALL));

    frame.render_widget(header, area);
}

fn draw_main_content(frame: &mut Frame, area: Rect, app: &App) {
    let chunks = Layout::horizontal([
        Constraint::Percentage(15), // Disciplines
        Constraint::Percentage(25), // Categories
        Constraint::Percentage(60), // Elements
    ])
    .split(area);

    draw_disciplines(frame, chunks[0], app);
    draw_categories(frame, chunks[1], app);
    draw_elements(frame, chunks[2], app);
}

fn item_style(is_selected: bool, is_focused: bool) -> Style {
    if is_selected && is_focused {
        SELECTED_STYLE
    } else if is_selected {
        Style::default().add_modifier(Modifier::BOLD)
    } else {
        Style::default()
    }
}

fn border_style(is_focused: bool) -> Style {
    if is_focused {
        Style::default().fg(BRAND_ORANGE)
    } else {
        Style::default()
    }
}

fn draw_disciplines(frame: &mut Frame, area: Rect, app: &App) {
    let is_focused = app.focus_panel == FocusPanel::Disciplines;

    let items: Vec<ListItem> = app
        .disciplines
        .iter()
        .enumerate()
        .map(|(i, discipline)| {
            let is_selected = i == app.selected_discipline;
            let marker = if is_selected && is_focused { " ◄" } else { "" };
            ListItem::new(Line::from(vec![
                Span::styled(&discipline.name, item_style(is_selected, is_focused)),
                Span::styled(marker, Style::default().fg(BRAND_ORANGE)),
            ]))
        })
        .collect();

    let list = List::new(items).block(
        Block::default()
            .title(" Disciplines ")
            .borders(Borders::ALL)
            .border_style(border_style(is_focused)),
    );

    frame.render_widget(list, area);
}

fn draw_categories(frame: &mut Frame, area: Rect, app: &App) {
    let is_focused = app.focus_panel == FocusPanel::Categories;

    let items: Vec<ListItem> = app
        .category_outcomes()
        .iter()
        .enumerate()
        .map(|(i, category)| {
            let is_selected = i == app.selected_category;
            let marker = if is_selected && is_focused { " ◄" } else { "" };

            let figures = if category.failed() {
                Span::styled("failed", Style::default().fg(BRAND_RED))
            } else {
                Span::styled(
                    format!(
                        "({}) {}%",
                        category.summary.total_elements, category.summary.average_compliance_pct
                    ),
                    Style::default().fg(pct_color(category.summary.average_compliance_pct)),
                )
            };

            ListItem::new(Line::from(vec![
                Span::styled(&category.display_name, item_style(is_selected, is_focused)),
                Span::raw(" "),
                figures,
                Span::styled(marker, Style::default().fg(BRAND_ORANGE)),
            ]))
        })
        .collect();

    let list = List::new(items).block(
        Block::default()
            .title(" Categories ")
            .borders(Borders::ALL)
            .border_style(border_style(is_focused)),
    );

    frame.render_widget(list, area);
}

fn draw_elements(frame: &mut Frame, area: Rect, app: &App) {
    let is_focused = app.focus_panel == FocusPanel::Elements;
    let rows_in_category = app.category_rows();

    let category_name = app
        .selected_category_outcome()
        .map(|c| c.display_name.clone())
        .unwrap_or_default();

    // Borders and header row
    let visible_rows = (area.height as usize).saturating_sub(3);
    let scroll_offset = if app.selected_element >= visible_rows {
        app.selected_element - visible_rows + 1
    } else {
        0
    };

    let header = Row::new(vec!["Family / Type", "Element ID", "Manufacturer", "Model", "Filled"])
        .style(HEADER_STYLE)
        .height(1);

    let rows: Vec<Row> = rows_in_category
        .iter()
        .enumerate()
        .skip(scroll_offset)
        .take(visible_rows)
        .map(|(i, row)| {
            let is_selected = i == app.selected_element;
            let name = if row.type_mark.is_empty() {
                row.family_name.clone()
            } else {
                format!("{} [{}]", row.family_name, row.type_mark)
            };
            let id = row
                .revit_element_id
                .clone()
                .unwrap_or_else(|| row.element_id.clone());
            let id = match row.viewer_db_id {
                Some(db_id) => format!("{id} #{db_id}"),
                None => id,
            };
            let pct = format!(
                "{}/{} {}%",
                row.compliance.filled, row.compliance.total, row.compliance.pct
            );
            Row::new(vec![
                Text::from(name),
                Text::from(id),
                Text::from(row.manufacturer.clone()),
                Text::from(row.model.clone()),
                Text::styled(pct, Style::default().fg(pct_color(row.compliance.pct))),
            ])
            .style(item_style(is_selected, is_focused))
        })
        .collect();

    let widths = [
        Constraint::Percentage(34),
        Constraint::Percentage(16),
        Constraint::Percentage(18),
        Constraint::Percentage(16),
        Constraint::Percentage(16),
    ];

    let title = format!(" {} ({} elements) ", category_name, rows_in_category.len());
    let table = Table::new(rows, widths).header(header).block(
        Block::default()
            .title(title)
            .borders(Borders::ALL)
            .border_style(border_style(is_focused)),
    );

    frame.render_widget(table, area);

    if rows_in_category.len() > visible_rows {
        let scrollbar = Scrollbar::new(ScrollbarOrientation::VerticalRight)
            .begin_symbol(Some("↑"))
            .end_symbol(Some("↓"));
        let mut scrollbar_state =
            ScrollbarState::new(rows_in_category.len()).position(app.selected_element);

        frame.render_stateful_widget(scrollbar, scrollbar_area(area), &mut scrollbar_state);
    }
}

/// Right-hand column of a bordered table below its header row.
fn scrollbar_area(area: Rect) -> Rect {
    Rect {
        x: (area.x + area.width).saturating_sub(1),
        y: area.y + 2,
        width: 1,
        height: area.height.saturating_sub(3),
    }
}

fn draw_status(frame: &mut Frame, area: Rect, app: &App) {
    let (text, color) = match &app.status {
        Status::Info(text) => (text.as_str(), BRAND_DARK),
        Status::Warning(text) => (text.as_str(), BRAND_ORANGE),
        Status::Error(text) => (text.as_str(), BRAND_RED),
    };

    let status = Paragraph::new(format!(" {text} "))
        .style(Style::default().fg(color))
        .block(Block::default().borders(Borders::ALL));

    frame.render_widget(status, area);
}

fn draw_footer(frame: &mut Frame, area: Rect, help: &str) {
    let footer = Paragraph::new(help)
        .style(Style::default().fg(BRAND_MUTED))
        .block(Block::default().borders(Borders::ALL));

    frame.render_widget(footer, area);
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn scrollbar_fits_inside_the_table_border() {
        let area = Rect::new(10, 5, 40, 20);
        assert_eq!(scrollbar_area(area), Rect::new(49, 7, 1, 17));
    }

    #[test]
    fn scrollbar_in_a_collapsed_panel_is_empty() {
        let area = Rect::new(0, 0, 0, 2);
        let scrollbar = scrollbar_area(area);
        assert_eq!(scrollbar.height, 0);
        assert_eq!(scrollbar.x, 0);
    }
}
