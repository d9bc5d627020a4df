//! Interactive TUI application.

#![allow(clippy::too_many_lines)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::cast_sign_loss)]

use crate::api::types::IpInfo;
use crate::api::ApiClient;
use crate::error::Result;
use crate::speed::{Phase, SpeedTestObserver, SpeedTestReport, SpeedTester};
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, BorderType, Cell, Gauge, Paragraph, Row, Table},
    Frame,
};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::time::Duration;

/// Messages sent from async tasks to the main event loop.
#[derive(Debug)]
enum AppMessage {
    /// Speed test entered a new phase.
    Phase(Phase),
    /// One ping round-trip completed.
    PingSample { ms: f64 },
    /// Instantaneous throughput for live display.
    Live { mbps: f64 },
    /// A download/upload trial finished.
    Trial { phase: Phase, mbps: f64 },
    /// Overall progress percentage.
    Progress(u8),
    /// Speed test finished.
    SpeedFinished(Box<SpeedTestReport>),
    /// Speed test failed.
    SpeedFailed(String),
    /// Connection overview loaded.
    IpLoaded(Box<IpInfo>),
    /// Connection overview failed to load.
    IpFailed(String),
}

/// Observer that forwards engine events into the event loop.
struct ChannelObserver {
    tx: mpsc::UnboundedSender<AppMessage>,
}

impl SpeedTestObserver for ChannelObserver {
    fn phase_changed(&self, phase: Phase) {
        let _ = self.tx.send(AppMessage::Phase(phase));
    }

    fn ping_sample(&self, _seq: usize, ms: f64) {
        let _ = self.tx.send(AppMessage::PingSample { ms });
    }

    fn live_throughput(&self, _phase: Phase, mbps: f64) {
        let _ = self.tx.send(AppMessage::Live { mbps });
    }

    fn trial_finished(&self, phase: Phase, _trial: usize, mbps: f64) {
        let _ = self.tx.send(AppMessage::Trial { phase, mbps });
    }

    fn progress(&self, percent: u8) {
        let _ = self.tx.send(AppMessage::Progress(percent));
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
enum View {
    #[default]
    SpeedTest,
    MyIp,
    Help,
}

/// Speed test widget state.
#[derive(Debug, Default)]
enum SpeedState {
    #[default]
    Idle,
    Running {
        phase: Phase,
        progress: u8,
        live_mbps: f64,
        ping_samples: Vec<f64>,
        download_trials: Vec<f64>,
        upload_trials: Vec<f64>,
    },
    Complete(Box<SpeedTestReport>),
    Failed(String),
}

/// Connection overview widget state.
#[derive(Debug, Default)]
enum IpState {
    #[default]
    Idle,
    Loading,
    Ready(Box<IpInfo>),
    Failed(String),
}

pub struct App {
    client: ApiClient,
    current_view: View,
    tab_index: usize,
    speed: SpeedState,
    ip: IpState,
    /// Stop flag of the speed test currently running, if any.
    speed_stop: Option<Arc<AtomicBool>>,
    /// Channel sender for async tasks.
    message_tx: Option<mpsc::UnboundedSender<AppMessage>>,
}

impl App {
    #[must_use]
    pub fn new(client: ApiClient) -> Self {
        Self {
            client,
            current_view: View::default(),
            tab_index: 0,
            speed: SpeedState::default(),
            ip: IpState::default(),
            speed_stop: None,
            message_tx: None,
        }
    }

    pub async fn run(&mut self) -> Result<()> {
        // Create channel for async task communication
        let (tx, mut rx) = mpsc::unbounded_channel();
        self.message_tx = Some(tx);

        // Initialize terminal with raw mode and alternate screen
        let mut terminal = ratatui::init();

        // Load the connection overview in the background right away
        self.start_ip_fetch();

        let res = self.run_loop(&mut terminal, &mut rx).await;

        // A still-running speed test stops at the next probe boundary
        if let Some(stop) = &self.speed_stop {
            stop.store(true, Ordering::Relaxed);
        }

        // Restore terminal state
        ratatui::restore();

        res
    }

    async fn run_loop(
        &mut self,
        terminal: &mut ratatui::DefaultTerminal,
        rx: &mut mpsc::UnboundedReceiver<AppMessage>,
    ) -> Result<()> {
        loop {
            // 1. Process all pending messages from async tasks
            while let Ok(msg) = rx.try_recv() {
                self.handle_message(msg);
            }

            // 2. Render UI
            terminal.draw(|f| self.draw(f))?;

            // 3. Handle keyboard events (non-blocking with 50ms timeout)
            if crossterm::event::poll(Duration::from_millis(50))? {
                if let crossterm::event::Event::Key(key) = crossterm::event::read()? {
                    if !self.handle_key(key) {
                        break;
                    }
                }
            }
        }

        Ok(())
    }

    fn handle_message(&mut self, msg: AppMessage) {
        match msg {
            AppMessage::Phase(new_phase) => {
                if let SpeedState::Running { phase, live_mbps, .. } = &mut self.speed {
                    *phase = new_phase;
                    *live_mbps = 0.0;
                }
            }
            AppMessage::PingSample { ms } => {
                if let SpeedState::Running { ping_samples, .. } = &mut self.speed {
                    ping_samples.push(ms);
                }
            }
            AppMessage::Live { mbps } => {
                if let SpeedState::Running { live_mbps, .. } = &mut self.speed {
                    *live_mbps = mbps;
                }
            }
            AppMessage::Trial { phase, mbps } => {
                if let SpeedState::Running {
                    download_trials,
                    upload_trials,
                    ..
                } = &mut self.speed
                {
                    match phase {
                        Phase::Download => download_trials.push(mbps),
                        Phase::Upload => upload_trials.push(mbps),
                        _ => {}
                    }
                }
            }
            AppMessage::Progress(percent) => {
                if let SpeedState::Running { progress, .. } = &mut self.speed {
                    *progress = percent;
                }
            }
            AppMessage::SpeedFinished(report) => {
                self.speed = SpeedState::Complete(report);
                self.speed_stop = None;
            }
            AppMessage::SpeedFailed(message) => {
                self.speed = SpeedState::Failed(message);
                self.speed_stop = None;
            }
            AppMessage::IpLoaded(info) => {
                self.ip = IpState::Ready(info);
            }
            AppMessage::IpFailed(message) => {
                self.ip = IpState::Failed(message);
            }
        }
    }

    fn handle_key(&mut self, key: crossterm::event::KeyEvent) -> bool {
        use crossterm::event::KeyCode;

        match key.code {
            KeyCode::Char('c')
                if key
                    .modifiers
                    .contains(crossterm::event::KeyModifiers::CONTROL) =>
            {
                return false;
            }

            KeyCode::Tab => {
                self.tab_index = (self.tab_index + 1) % 3;
                self.current_view = match self.tab_index {
                    0 => View::SpeedTest,
                    1 => View::MyIp,
                    _ => View::Help,
                };
                return true;
            }

            KeyCode::Char('1') => {
                self.tab_index = 0;
                self.current_view = View::SpeedTest;
                return true;
            }
            KeyCode::Char('2') => {
                self.tab_index = 1;
                self.current_view = View::MyIp;
                return true;
            }
            KeyCode::Char('3') => {
                self.tab_index = 2;
                self.current_view = View::Help;
                return true;
            }

            KeyCode::Char(' ') if self.current_view == View::SpeedTest => {
                if !matches!(self.speed, SpeedState::Running { .. }) {
                    self.start_speed_test();
                }
                return true;
            }

            KeyCode::Char('r') if self.current_view == View::MyIp => {
                if !matches!(self.ip, IpState::Loading) {
                    self.start_ip_fetch();
                }
                return true;
            }

            KeyCode::Char('q') if self.current_view != View::Help => {
                return false;
            }

            KeyCode::Esc | KeyCode::Char('q') if self.current_view == View::Help => {
                self.tab_index = 0;
                self.current_view = View::SpeedTest;
                return true;
            }

            _ => {}
        }

        true
    }

    fn start_speed_test(&mut self) {
        let Some(tx) = self.message_tx.clone() else {
            return;
        };

        self.speed = SpeedState::Running {
            phase: Phase::Ping,
            progress: 0,
            live_mbps: 0.0,
            ping_samples: Vec::new(),
            download_trials: Vec::new(),
            upload_trials: Vec::new(),
        };

        let tester = SpeedTester::new(self.client.clone());
        self.speed_stop = Some(tester.stop_flag());

        tokio::spawn(async move {
            let observer = ChannelObserver { tx: tx.clone() };
            match tester.run(&observer).await {
                Ok(report) => {
                    let _ = tx.send(AppMessage::SpeedFinished(Box::new(report)));
                }
                Err(e) => {
                    let _ = tx.send(AppMessage::SpeedFailed(e.to_string()));
                }
            }
        });
    }

    fn start_ip_fetch(&mut self) {
        let Some(tx) = self.message_tx.clone() else {
            return;
        };

        self.ip = IpState::Loading;
        let client = self.client.clone();

        tokio::spawn(async move {
            match client.my_ip_full().await {
                Ok(info) => {
                    let _ = tx.send(AppMessage::IpLoaded(Box::new(info)));
                }
                Err(e) => {
                    let _ = tx.send(AppMessage::IpFailed(e.to_string()));
                }
            }
        });
    }

    fn draw(&mut self, f: &mut Frame) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3),
                Constraint::Length(2),
                Constraint::Min(10),
                Constraint::Length(3),
            ])
            .split(f.area());

        self.draw_title_bar(f, chunks[0]);
        self.draw_tabs(f, chunks[1]);

        match self.current_view {
            View::SpeedTest => self.draw_speed_test(f, chunks[2]),
            View::MyIp => self.draw_my_ip(f, chunks[2]),
            View::Help => self.draw_help(f, chunks[2]),
        }

        self.draw_bottom_bar(f, chunks[3]);
    }

    fn draw_title_bar(&self, f: &mut Frame, area: Rect) {
        let chunks = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([
                Constraint::Length(20),
                Constraint::Min(10),
                Constraint::Length(24),
            ])
            .split(area);

        let title = Paragraph::new("Network Tools").style(
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        );
        f.render_widget(title, chunks[0]);

        let version = Paragraph::new(concat!("ipscout v", env!("CARGO_PKG_VERSION")))
            .style(Style::default().fg(Color::DarkGray))
            .alignment(ratatui::layout::Alignment::Center);
        f.render_widget(version, chunks[1]);

        let ip_summary = match &self.ip {
            IpState::Ready(info) => info.ip.clone(),
            IpState::Loading => "...".to_string(),
            _ => String::new(),
        };
        let ip_widget = Paragraph::new(ip_summary)
            .style(Style::default().fg(Color::DarkGray))
            .alignment(ratatui::layout::Alignment::Right);
        f.render_widget(ip_widget, chunks[2]);
    }

    fn draw_tabs(&self, f: &mut Frame, area: Rect) {
        let titles = ["Speed Test", "My IP", "Help"];
        let mut tab_text = String::new();
        for (i, title) in titles.iter().enumerate() {
            if i == self.tab_index {
                tab_text.push_str(&format!("[{}] ", title));
            } else {
                tab_text.push_str(&format!(" {} ", title));
            }
        }
        let tabs = Paragraph::new(tab_text)
            .style(Style::default().fg(Color::White))
            .block(Block::default().border_type(BorderType::Plain));
        f.render_widget(tabs, area);
    }

    fn draw_speed_test(&self, f: &mut Frame, area: Rect) {
        match &self.speed {
            SpeedState::Idle => {
                let msg = Paragraph::new("Press [Space] to start the speed test")
                    .style(Style::default().fg(Color::DarkGray))
                    .alignment(ratatui::layout::Alignment::Center);
                f.render_widget(msg, area);
            }

            SpeedState::Running {
                phase,
                live_mbps,
                ping_samples,
                download_trials,
                upload_trials,
                ..
            } => {
                let mut lines = vec![
                    Line::from(vec![
                        Span::styled("Phase: ", Style::default().fg(Color::DarkGray)),
                        Span::styled(
                            phase.to_string(),
                            Style::default()
                                .fg(Color::Cyan)
                                .add_modifier(Modifier::BOLD),
                        ),
                    ]),
                    Line::from(""),
                ];

                if !ping_samples.is_empty() {
                    let last = ping_samples.last().copied().unwrap_or_default();
                    lines.push(Line::from(format!(
                        "Ping: {} samples, last {last:.1} ms",
                        ping_samples.len()
                    )));
                }
                if matches!(phase, Phase::Download | Phase::Upload) {
                    lines.push(Line::from(vec![
                        Span::raw("Live: "),
                        Span::styled(
                            format!("{live_mbps:.1} Mbps"),
                            Style::default().fg(Color::Green),
                        ),
                    ]));
                }
                if !download_trials.is_empty() {
                    lines.push(Line::from(format!(
                        "Download trials: {}",
                        format_trials(download_trials)
                    )));
                }
                if !upload_trials.is_empty() {
                    lines.push(Line::from(format!(
                        "Upload trials: {}",
                        format_trials(upload_trials)
                    )));
                }

                let para = Paragraph::new(lines)
                    .block(Block::default().border_type(BorderType::Rounded));
                f.render_widget(para, area);
            }

            SpeedState::Complete(report) => {
                let lines = vec![
                    Line::from(Span::styled(
                        "Test complete",
                        Style::default()
                            .fg(Color::Green)
                            .add_modifier(Modifier::BOLD),
                    )),
                    Line::from(""),
                    Line::from(format!("Ping:      {:>8.1} ms", report.ping_ms)),
                    Line::from(format!("Jitter:    {:>8.1} ms", report.jitter_ms)),
                    Line::from(format!("Download:  {:>8.2} Mbps", report.download_mbps)),
                    Line::from(format!("Upload:    {:>8.2} Mbps", report.upload_mbps)),
                    Line::from(format!(
                        "Peak down: {:>8.2} Mbps",
                        report.peak_download_mbps
                    )),
                    Line::from(""),
                    Line::from(Span::styled(
                        "Press [Space] to test again",
                        Style::default().fg(Color::DarkGray),
                    )),
                ];
                let para = Paragraph::new(lines)
                    .block(Block::default().border_type(BorderType::Rounded));
                f.render_widget(para, area);
            }

            SpeedState::Failed(message) => {
                let lines = vec![
                    Line::from(Span::styled(
                        format!("Speed test failed: {message}"),
                        Style::default().fg(Color::Red),
                    )),
                    Line::from(""),
                    Line::from(Span::styled(
                        "Press [Space] to retry",
                        Style::default().fg(Color::DarkGray),
                    )),
                ];
                let para = Paragraph::new(lines)
                    .block(Block::default().border_type(BorderType::Rounded));
                f.render_widget(para, area);
            }
        }
    }

    fn draw_my_ip(&self, f: &mut Frame, area: Rect) {
        match &self.ip {
            IpState::Idle | IpState::Loading => {
                let msg = Paragraph::new("Fetching your connection details...")
                    .style(Style::default().fg(Color::DarkGray))
                    .alignment(ratatui::layout::Alignment::Center);
                f.render_widget(msg, area);
            }

            IpState::Ready(info) => {
                let mut rows = vec![
                    info_row("IP", &info.ip),
                    info_row("Version", &info.version),
                    info_row("Country", &info.country),
                    info_row("City", &info.city),
                    info_row("ISP", &info.isp),
                ];
                if let Some(region) = &info.region {
                    rows.push(info_row("Region", region));
                }
                if let Some(timezone) = &info.timezone {
                    rows.push(info_row("Timezone", timezone));
                }
                if let Some(coordinates) = &info.coordinates {
                    rows.push(info_row("Coordinates", coordinates));
                }
                if let Some(ipv4) = &info.ipv4_address {
                    rows.push(info_row("IPv4", ipv4));
                }
                if let Some(ipv6) = &info.ipv6_address {
                    rows.push(info_row("IPv6", ipv6));
                }
                rows.push(info_row(
                    "IPv6 ready",
                    if info.has_ipv6() { "yes" } else { "no" },
                ));

                let table = Table::new(rows, [Constraint::Length(14), Constraint::Min(20)])
                    .block(Block::default().border_type(BorderType::Rounded));
                f.render_widget(table, area);
            }

            IpState::Failed(message) => {
                let lines = vec![
                    Line::from(Span::styled(
                        format!("Lookup failed: {message}"),
                        Style::default().fg(Color::Red),
                    )),
                    Line::from(""),
                    Line::from(Span::styled(
                        "Press [r] to retry",
                        Style::default().fg(Color::DarkGray),
                    )),
                ];
                let para = Paragraph::new(lines)
                    .block(Block::default().border_type(BorderType::Rounded));
                f.render_widget(para, area);
            }
        }
    }

    fn draw_help(&self, f: &mut Frame, area: Rect) {
        let help_items = [
            ("Space", "Start or restart the speed test"),
            ("r", "Reload the connection overview"),
            ("1/2/3", "Switch tabs (Speed/My IP/Help)"),
            ("Tab", "Cycle through tabs"),
            ("q", "Quit application"),
        ];

        let rows: Vec<Row> = help_items
            .iter()
            .map(|(key, desc)| {
                Row::new(vec![
                    Cell::from(format!("  {}  ", key)).style(Style::default().fg(Color::Yellow)),
                    Cell::from(*desc).style(Style::default().fg(Color::White)),
                ])
            })
            .collect();

        let help_table = Table::new(rows, [Constraint::Length(12), Constraint::Min(30)])
            .block(
                Block::default()
                    .title(" Keyboard Shortcuts ")
                    .border_type(BorderType::Rounded),
            )
            .column_spacing(2);

        f.render_widget(help_table, area);
    }

    fn draw_bottom_bar(&self, f: &mut Frame, area: Rect) {
        let (percent, label) = match &self.speed {
            SpeedState::Running { progress, phase, .. } => {
                (u16::from(*progress), format!("{phase} {progress}%"))
            }
            SpeedState::Complete(_) => (100, "complete".to_string()),
            _ => (0, "idle".to_string()),
        };

        let gauge = Gauge::default()
            .block(
                Block::default()
                    .title(label)
                    .border_type(BorderType::Rounded),
            )
            .gauge_style(Style::default().fg(Color::Cyan))
            .percent(percent.min(100));

        f.render_widget(gauge, area);
    }
}

fn info_row<'a>(label: &'a str, value: &str) -> Row<'a> {
    Row::new(vec![
        Cell::from(label).style(Style::default().fg(Color::DarkGray)),
        Cell::from(value.to_string()),
    ])
}

fn format_trials(trials: &[f64]) -> String {
    trials
        .iter()
        .map(|t| format!("{t:.1}"))
        .collect::<Vec<_>>()
        .join(" / ")
}
