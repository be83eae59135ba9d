use ratatui::{
    prelude::*,
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph, Wrap},
};

use zonar_core::{Balloon, CheckoutField, Precision, ShippingMethod};

use crate::app::{App, Focus, METHODS, Screen};

pub(crate) fn draw(frame: &mut Frame<'_>, app: &App) {
    let area = frame.area();

    // Outer layout: title, main content, status line
    let layout_chunks = Layout::default()
        .direction(Direction::Vertical)
        .margin(1)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(0),
            Constraint::Length(3),
        ])
        .split(area);

    let chunks = layout_chunks.as_ref();
    let [header_area, content_area, status_area] = chunks else {
        return;
    };

    let header = Paragraph::new("zonar – delivery address checkout")
        .block(Block::default().borders(Borders::ALL).title("Zonar"));
    frame.render_widget(header, *header_area);

    match app.screen {
        Screen::MethodSelect => draw_method_select(frame, app, *content_area),
        Screen::AddressEntry => draw_address_entry(frame, app, *content_area),
        Screen::Summary => draw_summary(frame, app, *content_area),
    }

    let nav_hint = match app.screen {
        Screen::MethodSelect => "↑/↓ move · Enter select method · q/Ctrl-C quit",
        Screen::AddressEntry => {
            "Type address · ↑/↓ pick suggestion · Enter capture · Tab next field · Del clear · F3 pin at center · F2 provider · → summary · Ctrl-C quit"
        }
        Screen::Summary => "Esc/←/b back · m change method · q/Ctrl-C quit",
    };

    let status_text = if app.is_loading {
        format!("Loading… · {nav_hint}")
    } else if let Some(msg) = &app.error_message {
        format!("{msg} · {nav_hint}")
    } else if let Some(hint) = app.machine.hint() {
        format!("{hint} · {nav_hint}")
    } else {
        nav_hint.to_owned()
    };

    let status_style = if app.error_message.is_some() || app.machine.hint().is_some() {
        Style::default().fg(Color::Red)
    } else if app.is_loading {
        Style::default().fg(Color::Yellow)
    } else {
        Style::default()
    };

    let status = Paragraph::new(status_text)
        .block(Block::default().borders(Borders::ALL).title("Status"))
        .style(status_style)
        .wrap(Wrap { trim: true });

    frame.render_widget(status, *status_area);
}

fn method_label(method: ShippingMethod) -> &'static str {
    match method {
        ShippingMethod::ZoneDelivery => "Courier delivery (zone pricing)",
        ShippingMethod::SelfPickup => "Self pickup",
        ShippingMethod::FreeShipping => "Free shipping",
    }
}

fn draw_method_select(frame: &mut Frame<'_>, app: &App, area: Rect) {
    let items = METHODS
        .iter()
        .enumerate()
        .map(|(idx, method)| {
            let prefix = if idx == app.method_index { "> " } else { "  " };
            ListItem::new(format!("{prefix}{}", method_label(*method)))
        })
        .collect::<Vec<ListItem<'_>>>();

    let list = List::new(items)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title("Shipping method (↑/↓, Enter)"),
        )
        .highlight_style(
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        );

    let mut state = ListState::default();
    state.select(Some(app.method_index));
    frame.render_stateful_widget(list, area, &mut state);
}

fn draw_address_entry(frame: &mut Frame<'_>, app: &App, area: Rect) {
    let column_chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(60), Constraint::Percentage(40)])
        .split(area);
    let columns = column_chunks.as_ref();
    let [form_area, map_area] = columns else {
        return;
    };

    let form_chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // address input
            Constraint::Length(3), // flat / entrance / floor
            Constraint::Min(0),    // suggestions
        ])
        .split(*form_area);
    let form = form_chunks.as_ref();
    let [input_area, fields_area, suggestions_area] = form else {
        return;
    };

    let provider_name = app
        .providers
        .get(app.provider_index)
        .map_or("<provider>", |meta| meta.name.as_str());

    let lock_marker = if app.machine.slot().read_only {
        " [locked]"
    } else {
        ""
    };
    let input = Paragraph::new(app.address_input.as_str())
        .block(Block::default().borders(Borders::ALL).title(format!(
            "Address via {provider_name}{lock_marker}"
        )))
        .style(focus_style(app, Focus::Address))
        .wrap(Wrap { trim: true });
    frame.render_widget(input, *input_area);

    draw_numeric_fields(frame, app, *fields_area);
    draw_suggestions(frame, app, *suggestions_area);
    draw_map(frame, app, *map_area);
}

fn focus_style(app: &App, focus: Focus) -> Style {
    if app.focus == focus {
        Style::default().fg(Color::Cyan)
    } else {
        Style::default()
    }
}

fn field_style(app: &App, focus: Focus, field: CheckoutField) -> Style {
    if app.validity.field_errors.contains(&field) && app.fields_touched() {
        Style::default().fg(Color::Red)
    } else {
        focus_style(app, focus)
    }
}

fn draw_numeric_fields(frame: &mut Frame<'_>, app: &App, area: Rect) {
    let chunk_list = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage(34),
            Constraint::Percentage(33),
            Constraint::Percentage(33),
        ])
        .split(area);
    let chunks = chunk_list.as_ref();
    let [flat_area, entrance_area, floor_area] = chunks else {
        return;
    };

    let flat = Paragraph::new(app.flat_input.as_str())
        .block(Block::default().borders(Borders::ALL).title("Flat"))
        .style(field_style(app, Focus::Flat, CheckoutField::Flat));
    frame.render_widget(flat, *flat_area);

    let entrance = Paragraph::new(app.entrance_input.as_str())
        .block(Block::default().borders(Borders::ALL).title("Entrance"))
        .style(field_style(app, Focus::Entrance, CheckoutField::Entrance));
    frame.render_widget(entrance, *entrance_area);

    let floor = Paragraph::new(app.floor_input.as_str())
        .block(Block::default().borders(Borders::ALL).title("Floor"))
        .style(field_style(app, Focus::Floor, CheckoutField::Floor));
    frame.render_widget(floor, *floor_area);
}

fn precision_color(precision: Precision) -> Color {
    match precision {
        Precision::Exact => Color::Green,
        Precision::Approximate => Color::Yellow,
        Precision::Ambiguous => Color::Magenta,
    }
}

fn draw_suggestions(frame: &mut Frame<'_>, app: &App, area: Rect) {
    let suggestions = app.machine.suggestions();
    let items = if suggestions.is_empty() {
        vec![ListItem::new("No suggestions. Keep typing or press F3.")]
    } else {
        suggestions
            .iter()
            .map(|candidate| {
                ListItem::new(candidate.label.clone())
                    .style(Style::default().fg(precision_color(candidate.precision)))
            })
            .collect()
    };

    let list = List::new(items)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title("Suggestions (↑/↓, Enter)"),
        )
        .highlight_style(
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        );

    let mut state = ListState::default();
    if !suggestions.is_empty() {
        state.select(Some(app.suggestion_index));
    }
    frame.render_stateful_widget(list, area, &mut state);
}

fn balloon_line(balloon: &Balloon) -> (String, Color) {
    match balloon {
        Balloon::Loading => (String::from("Balloon: loading…"), Color::Yellow),
        Balloon::Summary {
            minutes_text,
            min_order,
        } => {
            let line = match min_order {
                Some(min_order) => format!("Balloon: {minutes_text} · min order {min_order}"),
                None => format!("Balloon: {minutes_text}"),
            };
            (line, Color::Green)
        }
        Balloon::Error(message) => (format!("Balloon: {message}"), Color::Red),
    }
}

fn draw_map(frame: &mut Frame<'_>, app: &App, area: Rect) {
    let mut lines = vec![
        Line::from(format!("Center: {}", app.map.center())),
        Line::from(format!("Zoom: {} (PgUp/PgDn)", app.map.zoom())),
    ];

    match app.map.placemark() {
        Some(placemark) => {
            lines.push(Line::from(format!("Pin: {}", placemark.coordinates)));
            let (text, color) = balloon_line(&placemark.balloon);
            lines.push(Line::from(text).style(Style::default().fg(color)));
        }
        None => lines.push(Line::from("No pin. F3 drops one at the center.")),
    }

    if let Some(time) = app.machine.time_display() {
        lines.push(Line::from(""));
        lines.push(Line::from(time.to_owned()).style(Style::default().fg(Color::Green)));
    }

    let map = Paragraph::new(lines)
        .block(Block::default().borders(Borders::ALL).title("Map"))
        .wrap(Wrap { trim: true });
    frame.render_widget(map, area);
}

fn draw_summary(frame: &mut Frame<'_>, app: &App, area: Rect) {
    let slot = app.machine.slot();
    let check = |flag: bool| if flag { "✓" } else { "✗" };

    let mut lines = vec![
        Line::from(format!("Method: {}", method_label(app.machine.method()))),
        Line::from(format!(
            "Address: {}",
            if slot.raw_text.is_empty() {
                "<none>"
            } else {
                slot.raw_text.as_str()
            }
        )),
        Line::from(format!(
            "Captured {} · valid {}",
            check(slot.captured),
            check(slot.valid)
        )),
    ];

    if let Some(zone) = app.current_zone {
        lines.push(Line::from(format!("Zone: {zone}")));
    }
    if let Some(result) = &app.last_result {
        if let Some(min_order) = result.min_order {
            lines.push(Line::from(format!(
                "Min order: {min_order} (basket {})",
                app.basket_total
            )));
        }
        if let Some(time) = &result.time_text {
            lines.push(Line::from(time.clone()));
        }
    }

    lines.push(Line::from(""));
    lines.push(Line::from(format!(
        "Address valid {} · amount valid {}",
        check(app.validity.address_valid),
        check(app.validity.amount_valid)
    )));

    let submit_line = if app.validity.submit_enabled() {
        Line::from("ORDER CAN BE PLACED").style(
            Style::default()
                .fg(Color::Green)
                .add_modifier(Modifier::BOLD),
        )
    } else {
        Line::from("Submit disabled; fix the marked fields").style(Style::default().fg(Color::Red))
    };
    lines.push(submit_line);

    let summary = Paragraph::new(lines)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title("Checkout summary (Esc/←/b back)"),
        )
        .wrap(Wrap { trim: true });
    frame.render_widget(summary, area);
}
