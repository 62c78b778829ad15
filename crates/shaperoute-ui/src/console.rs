//! Line-oriented console front-end.
//!
//! Stands in for the map widget and the form: each input line is one user
//! gesture, and the map and panel view models are rendered as text.

use crate::control_panel::ControlPanel;
use crate::message::Message;
use crate::runtime::Runtime;
use shaperoute_core::{
    thread_safe_vec, AppEvent, EventCategory, EventFilter, NoticeEvent, NoticeLevel, Position,
    SubscriptionId, ThreadSafeVec,
};
use shaperoute_settings::RouteSettings;
use std::fmt::Write as _;
use thiserror::Error;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tracing::debug;

pub const HELP: &str = "\
Commands:
  click <lat> <lon>   pick the start point
  tap <x> <y>         pick the point under a map pixel
  search <text>       look up a place and start there
  distance <km>       set the target distance
  shape <id>          choose a shape
  generate            generate a route
  download            save the route as GPX
  dismiss             close the current notice
  status              show the map and form
  help                show this text
  quit                exit
";

/// A parsed input line.
#[derive(Debug, Clone, PartialEq)]
pub enum ConsoleCommand {
    Click(Position),
    Tap { x: f64, y: f64 },
    Search(String),
    Distance(f64),
    Shape(String),
    Generate,
    Download,
    Dismiss,
    Status,
    Help,
    Quit,
}

#[derive(Error, Debug, PartialEq)]
pub enum CommandError {
    #[error("Empty command")]
    Empty,

    #[error("Unknown command '{0}' (try 'help')")]
    Unknown(String),

    #[error("Usage: {0}")]
    Usage(&'static str),

    #[error("Not a number: '{0}'")]
    InvalidNumber(String),
}

fn number(text: &str) -> Result<f64, CommandError> {
    text.parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or_else(|| CommandError::InvalidNumber(text.to_string()))
}

fn pair(rest: &str, usage: &'static str) -> Result<(f64, f64), CommandError> {
    let parts: Vec<&str> = rest
        .split(|c: char| c == ',' || c.is_whitespace())
        .filter(|p| !p.is_empty())
        .collect();
    match parts.as_slice() {
        [a, b] => Ok((number(a)?, number(b)?)),
        _ => Err(CommandError::Usage(usage)),
    }
}

impl ConsoleCommand {
    pub fn parse(line: &str) -> Result<Self, CommandError> {
        let line = line.trim();
        let (word, rest) = match line.split_once(char::is_whitespace) {
            Some((word, rest)) => (word, rest.trim()),
            None => (line, ""),
        };

        match word.to_ascii_lowercase().as_str() {
            "" => Err(CommandError::Empty),
            "click" => {
                let (lat, lon) = pair(rest, "click <lat> <lon>")?;
                Ok(Self::Click(Position::new(lat, lon)))
            }
            "tap" => {
                let (x, y) = pair(rest, "tap <x> <y>")?;
                Ok(Self::Tap { x, y })
            }
            "search" if rest.is_empty() => Err(CommandError::Usage("search <text>")),
            "search" => Ok(Self::Search(rest.to_string())),
            "distance" if rest.is_empty() => Err(CommandError::Usage("distance <km>")),
            "distance" => Ok(Self::Distance(number(rest)?)),
            "shape" if rest.is_empty() => Err(CommandError::Usage("shape <id>")),
            "shape" => Ok(Self::Shape(rest.to_string())),
            "generate" => Ok(Self::Generate),
            "download" => Ok(Self::Download),
            "dismiss" => Ok(Self::Dismiss),
            "status" => Ok(Self::Status),
            "help" | "?" => Ok(Self::Help),
            "quit" | "exit" => Ok(Self::Quit),
            other => Err(CommandError::Unknown(other.to_string())),
        }
    }
}

/// What the caller should do after a command.
#[derive(Debug, Clone, PartialEq)]
pub enum Reply {
    Text(String),
    Nothing,
    Quit,
}

pub struct Console {
    panel: ControlPanel,
    notices: ThreadSafeVec<NoticeEvent>,
    subscription: SubscriptionId,
}

impl Console {
    /// Attach to `runtime`'s event bus for notices.
    pub fn new(runtime: &Runtime, route: &RouteSettings) -> Self {
        let notices = thread_safe_vec();
        let feed = notices.clone();
        let subscription = runtime.orchestrator().events().subscribe(
            EventFilter::Categories(vec![EventCategory::Notice]),
            move |event| {
                if let AppEvent::Notice(notice) = event {
                    feed.lock().push(notice);
                }
            },
        );
        Self {
            panel: ControlPanel::new(route),
            notices,
            subscription,
        }
    }

    /// Detach from the event bus.
    pub fn detach(&self, runtime: &Runtime) {
        runtime.orchestrator().events().unsubscribe(self.subscription);
    }

    /// Notices raised since the last call.
    pub fn take_notices(&self) -> Vec<NoticeEvent> {
        std::mem::take(&mut *self.notices.lock())
    }

    /// Turn a command into a message through the panel or the map, the
    /// same way the widgets would.
    pub fn handle(&mut self, runtime: &mut Runtime, command: ConsoleCommand) -> Reply {
        let state = runtime.orchestrator().state();
        let message = match command {
            ConsoleCommand::Click(position) => Some(Message::PointPicked(position)),
            ConsoleCommand::Tap { x, y } => Some(runtime.orchestrator().map().click(x, y)),
            ConsoleCommand::Search(text) => {
                self.panel.set_query(text);
                self.panel.submit_search(state)
            }
            ConsoleCommand::Distance(km) => Some(self.panel.change_distance(km)),
            ConsoleCommand::Shape(id) => self.panel.select_shape(state, &id),
            ConsoleCommand::Generate => self.panel.generate(state),
            ConsoleCommand::Download => self.panel.download(state),
            ConsoleCommand::Dismiss => Some(Message::NoticeDismissed),
            ConsoleCommand::Status => return Reply::Text(self.render(runtime)),
            ConsoleCommand::Help => return Reply::Text(HELP.to_string()),
            ConsoleCommand::Quit => return Reply::Quit,
        };

        match message {
            Some(message) => {
                runtime.dispatch(message);
                Reply::Nothing
            }
            None => {
                debug!("Input ignored in the current state");
                Reply::Text("(not available right now)\n".to_string())
            }
        }
    }

    pub fn render(&self, runtime: &Runtime) -> String {
        let orchestrator = runtime.orchestrator();
        let state = orchestrator.state();
        let scene = orchestrator.map().scene(state);
        let view = self.panel.view(state);
        let mut out = String::new();

        let _ = writeln!(
            out,
            "MAP       {} @ z{}",
            scene.viewport.center, scene.viewport.zoom
        );
        if let Some(marker) = scene.marker {
            let _ = writeln!(out, "  marker  {}", marker);
        }
        if let Some(points) = scene.polyline {
            let _ = writeln!(out, "  route   {} points", points.len());
        }

        let _ = writeln!(out, "START     {}", view.start_point_label);
        let _ = writeln!(
            out,
            "{}  [{} .. {}, step {}]",
            view.distance_label,
            view.distance_range.min_km,
            view.distance_range.max_km,
            view.distance_range.step_km
        );
        let _ = writeln!(out, "{}", view.shape_header);
        match view.shape_placeholder {
            Some(placeholder) => {
                let _ = writeln!(out, "  {}", placeholder);
            }
            None => {
                for option in &view.shape_options {
                    let mark = if option.selected { '*' } else { ' ' };
                    let _ = writeln!(out, " {} {:<24} {}", mark, option.id, option.label);
                }
            }
        }

        let _ = writeln!(
            out,
            "[{}]{}",
            view.generate_label,
            if view.generate_enabled { "" } else { " (disabled)" }
        );
        if let Some(distance) = &view.route_distance_label {
            let _ = writeln!(out, "ROUTE     {}", distance);
        }
        if view.download_visible {
            let _ = writeln!(out, "[{}]", view.download_label);
        }
        if let Some(notice) = &state.notice {
            let _ = writeln!(out, "NOTICE    {}", notice.message);
        }
        out
    }
}

fn format_notice(notice: &NoticeEvent) -> String {
    let tag = match notice.level {
        NoticeLevel::Info => "info",
        NoticeLevel::Error => "ERROR",
    };
    format!(
        "[{} {}] {}\n",
        notice.raised_at.format("%H:%M:%S"),
        tag,
        notice.message
    )
}

enum Input {
    Line(Option<String>),
    Effect,
}

/// Drive `runtime` from `input` until `quit` or end of input.
///
/// At end of input, running effects are allowed to finish first.
pub async fn run<R, W>(
    runtime: &mut Runtime,
    route: &RouteSettings,
    input: R,
    mut output: W,
) -> std::io::Result<()>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut console = Console::new(runtime, route);
    let mut lines = input.lines();

    output.write_all(HELP.as_bytes()).await?;
    runtime.dispatch(Message::Started);

    loop {
        let next = tokio::select! {
            line = lines.next_line() => Input::Line(line?),
            _ = runtime.step(), if runtime.pending() > 0 => Input::Effect,
        };

        let reply = match next {
            Input::Line(None) => {
                runtime.settle().await;
                Reply::Quit
            }
            Input::Line(Some(line)) if line.trim().is_empty() => Reply::Nothing,
            Input::Line(Some(line)) => match ConsoleCommand::parse(&line) {
                Ok(command) => console.handle(runtime, command),
                Err(e) => Reply::Text(format!("{}\n", e)),
            },
            Input::Effect => Reply::Nothing,
        };

        for notice in console.take_notices() {
            output.write_all(format_notice(&notice).as_bytes()).await?;
        }
        match reply {
            Reply::Text(text) => output.write_all(text.as_bytes()).await?,
            Reply::Nothing => {}
            Reply::Quit => break,
        }
        output.flush().await?;
    }

    console.detach(runtime);
    output.flush().await
}
