use crate::tui::watch::WatchApp;
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

pub fn draw(frame: &mut Frame, app: &WatchApp) {
    let banner_visible = app.banner_visible();

    let mut constraints = vec![Constraint::Length(1)];
    if banner_visible {
        constraints.push(Constraint::Length(1));
    }
    constraints.push(Constraint::Min(0));
    constraints.push(Constraint::Length(8));
    constraints.push(Constraint::Length(3));

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints(constraints)
        .split(frame.area());

    let mut next = 0;
    draw_header(frame, app, chunks[next]);
    next += 1;
    if banner_visible {
        draw_banner(frame, chunks[next]);
        next += 1;
    }
    draw_main(frame, app, chunks[next]);
    draw_notifications(frame, app, chunks[next + 1]);
    draw_footer(frame, app, chunks[next + 2]);
}

fn draw_header(frame: &mut Frame, app: &WatchApp, area: Rect) {
    let state = app.detector.state();
    let (status, color) = if state.is_online() {
        ("EN LIGNE", Color::Green)
    } else {
        ("HORS LIGNE", Color::Red)
    };

    let header = Paragraph::new(Line::from(vec![
        Span::styled(" MRC en Poche ", Style::default().fg(Color::Cyan).bold()),
        Span::raw("— surveillance  "),
        Span::styled(status, Style::default().fg(color).bold()),
    ]))
    .style(Style::default().bg(Color::DarkGray).fg(Color::White));

    frame.render_widget(header, area);
}

fn draw_banner(frame: &mut Frame, area: Rect) {
    let banner = Paragraph::new(Line::from(
        " Hors ligne — les fonctionnalités en ligne sont indisponibles. [d] masquer ",
    ))
    .style(Style::default().bg(Color::Red).fg(Color::White).bold());

    frame.render_widget(banner, area);
}

fn draw_main(frame: &mut Frame, app: &WatchApp, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(area);

    draw_quotas(frame, app, chunks[0]);
    draw_keys(frame, app, chunks[1]);
}

fn draw_quotas(frame: &mut Frame, app: &WatchApp, area: Rect) {
    let lines: Vec<Line> = app
        .quota_lines
        .iter()
        .map(|(feature, remaining, quota)| {
            let color = if *remaining == 0 {
                Color::Red
            } else {
                Color::Green
            };
            Line::from(vec![
                Span::raw(format!(" {:<14}", feature)),
                Span::styled(
                    format!("{}/{} restants", remaining, quota),
                    Style::default().fg(color),
                ),
            ])
        })
        .collect();

    let quotas = Paragraph::new(lines).block(
        Block::default()
            .borders(Borders::ALL)
            .title(" Quotas mensuels "),
    );
    frame.render_widget(quotas, area);
}

fn draw_keys(frame: &mut Frame, app: &WatchApp, area: Rect) {
    let lines: Vec<Line> = app
        .key_status
        .iter()
        .map(|(provider, configured)| {
            let (label, color) = if *configured {
                ("configurée", Color::Green)
            } else {
                ("absente", Color::DarkGray)
            };
            Line::from(vec![
                Span::raw(format!(" {:<14}", provider.as_str())),
                Span::styled(label, Style::default().fg(color)),
            ])
        })
        .collect();

    let keys = Paragraph::new(lines).block(
        Block::default()
            .borders(Borders::ALL)
            .title(" Clés API "),
    );
    frame.render_widget(keys, area);
}

fn draw_notifications(frame: &mut Frame, app: &WatchApp, area: Rect) {
    let lines: Vec<Line> = if app.toasts.is_empty() {
        vec![Line::from(Span::styled(
            " (aucune notification) ",
            Style::default().fg(Color::DarkGray),
        ))]
    } else {
        app.toasts
            .iter()
            .map(|toast| Line::from(format!(" {}", toast)))
            .collect()
    };

    let notifications = Paragraph::new(lines).block(
        Block::default()
            .borders(Borders::ALL)
            .title(" Notifications "),
    );
    frame.render_widget(notifications, area);
}

fn draw_footer(frame: &mut Frame, app: &WatchApp, area: Rect) {
    let mut lines = vec![Line::from(vec![
        Span::styled("[q]", Style::default().fg(Color::Cyan)),
        Span::raw(" quitter  "),
        Span::styled("[d]", Style::default().fg(Color::Cyan)),
        Span::raw(" masquer le bandeau  "),
        Span::styled("[h]", Style::default().fg(Color::Cyan)),
        Span::raw(" aide"),
    ])];

    if app.show_help {
        lines.push(Line::from(
            " L'état se met à jour à chaque sonde ; les quotas se réinitialisent chaque mois. ",
        ));
    } else if app.tour_hint_visible() {
        lines.push(Line::from(Span::styled(
            " Premier passage ici ? Appuyez sur h pour découvrir cet écran. ",
            Style::default().fg(Color::Yellow),
        )));
    }

    let footer = Paragraph::new(lines).block(Block::default().borders(Borders::TOP));
    frame.render_widget(footer, area);
}
