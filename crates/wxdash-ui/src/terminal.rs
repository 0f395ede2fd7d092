//! Line-oriented terminal front end.
//!
//! Each input line is a command that becomes a DOM [`Event`] on the current
//! page; the page is printed as indented text whenever it changes.

use std::io::Write;

use thiserror::Error;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use wxdash_core::{AppState, KvStore};

use crate::controller::Controller;
use crate::dom::{Element, Event, Node};
use crate::view;

pub const HELP: &str = "\
Команды:
  type <текст>   ввести название города
  pick <n>       выбрать n-ю подсказку
  add            добавить выбранный город
  select <n>     показать n-й город
  rm <n>         удалить n-й город
  refresh        обновить прогноз
  click <id>     нажать на элемент по id
  show           показать страницу
  help           эта справка
  quit           выход";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Type(String),
    Pick(usize),
    Add,
    Select(usize),
    Remove(usize),
    Refresh,
    Click(String),
    Show,
    Help,
    Quit,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CommandError {
    #[error("unknown command: {0}")]
    Unknown(String),
    #[error("{0} expects a number starting at 1")]
    BadIndex(&'static str),
    #[error("{0} expects an argument")]
    MissingArgument(&'static str),
    #[error("no item #{0}")]
    NoSuchItem(usize),
}

fn index_arg(name: &'static str, arg: &str) -> Result<usize, CommandError> {
    match arg.parse::<usize>() {
        Ok(n) if n > 0 => Ok(n),
        _ => Err(CommandError::BadIndex(name)),
    }
}

/// Parse one input line. Blank lines are `Ok(None)`.
pub fn parse(line: &str) -> Result<Option<Command>, CommandError> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(None);
    }
    let (word, rest) = match line.split_once(char::is_whitespace) {
        Some((word, rest)) => (word, rest.trim()),
        None => (line, ""),
    };

    let command = match word {
        // `type` with no argument clears the field
        "type" => Command::Type(rest.to_string()),
        "pick" => Command::Pick(index_arg("pick", rest)?),
        "add" => Command::Add,
        "select" => Command::Select(index_arg("select", rest)?),
        "rm" => Command::Remove(index_arg("rm", rest)?),
        "refresh" => Command::Refresh,
        "click" if rest.is_empty() => return Err(CommandError::MissingArgument("click")),
        "click" => Command::Click(rest.to_string()),
        "show" => Command::Show,
        "help" => Command::Help,
        "quit" | "exit" => Command::Quit,
        other => return Err(CommandError::Unknown(other.to_string())),
    };
    Ok(Some(command))
}

fn location_id(state: &AppState, n: usize) -> Result<&str, CommandError> {
    state
        .locations
        .get(n - 1)
        .map(|l| l.id.as_str())
        .ok_or(CommandError::NoSuchItem(n))
}

/// DOM events that carry out `command`. Pointer presses come with the click
/// that follows them, like a real pointer.
pub fn events_for(command: &Command, state: &AppState) -> Result<Vec<Event>, CommandError> {
    let press = |target: String| vec![Event::pointer_down(target.clone()), Event::click(target)];

    let events = match command {
        Command::Type(text) => vec![
            Event::pointer_down(view::INPUT_ID),
            Event::input(view::INPUT_ID, text.clone()),
        ],
        Command::Pick(n) => press(view::suggestion_id(n - 1)),
        Command::Add => press(view::ADD_ID.to_string()),
        Command::Select(n) => press(view::chip_name_id(location_id(state, *n)?)),
        Command::Remove(n) => press(view::remove_id(location_id(state, *n)?)),
        Command::Refresh => press(view::REFRESH_ID.to_string()),
        Command::Click(id) => press(id.clone()),
        Command::Show | Command::Help | Command::Quit => Vec::new(),
    };
    Ok(events)
}

fn is_block(tag: &str) -> bool {
    matches!(
        tag,
        "div" | "section" | "aside" | "header" | "h1" | "h2" | "h3" | "p"
    )
}

fn inline_text<A>(node: &Node<A>, out: &mut Vec<String>) {
    match node {
        Node::Text(t) => {
            if !t.is_empty() {
                out.push(t.clone());
            }
        }
        Node::Element(e) if e.is_hidden() || is_block(e.tag) => {}
        Node::Element(e) => match e.tag {
            "input" => {
                let value = e.attr("value").unwrap_or_default();
                if value.is_empty() {
                    out.push(format!("[{}…]", e.attr("placeholder").unwrap_or_default()));
                } else {
                    out.push(format!("[{value}]"));
                }
            }
            "button" => {
                let label = e.text_content();
                let mut shown = match &e.id {
                    Some(id) => format!("[{label}](#{id})"),
                    None => format!("[{label}]"),
                };
                if e.has_attr("disabled") {
                    shown.push_str("(…)");
                }
                out.push(shown);
            }
            _ => {
                let text = e.text_content();
                if !text.is_empty() {
                    out.push(text);
                }
            }
        },
    }
}

fn render_block<A>(element: &Element<A>, depth: usize, out: &mut String) {
    if element.is_hidden() {
        return;
    }

    let mut parts = Vec::new();
    for child in &element.children {
        inline_text(child, &mut parts);
    }

    let mut child_depth = depth;
    if !parts.is_empty() {
        out.push_str(&"  ".repeat(depth));
        out.push_str(&parts.join(" "));
        out.push('\n');
        child_depth += 1;
    }

    for child in element.child_elements().filter(|c| is_block(c.tag)) {
        render_block(child, child_depth, out);
    }
}

/// Render a page as indented plain text
pub fn render_text<A>(page: &Node<A>) -> String {
    let mut out = String::new();
    match page {
        Node::Element(e) => render_block(e, 0, &mut out),
        Node::Text(t) => out.push_str(t),
    }
    out
}

/// Drive `controller` from `input` until end of input or `quit`, printing
/// the page to `output` whenever it changes.
pub async fn run<S, R, W>(
    controller: &mut Controller<S>,
    input: R,
    output: &mut W,
) -> std::io::Result<()>
where
    S: KvStore,
    R: AsyncBufRead + Unpin,
    W: Write,
{
    let mut lines = input.lines();
    let mut last_frame = String::new();

    controller.start();
    writeln!(output, "{HELP}")?;

    loop {
        let mut force = false;
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else {
                    break;
                };
                match parse(&line) {
                    Ok(None) => continue,
                    Ok(Some(Command::Quit)) => break,
                    Ok(Some(Command::Help)) => {
                        writeln!(output, "{HELP}")?;
                        continue;
                    }
                    Ok(Some(Command::Show)) => force = true,
                    Ok(Some(command)) => match events_for(&command, controller.state()) {
                        Ok(events) => {
                            for event in &events {
                                controller.dispatch(event);
                            }
                        }
                        Err(e) => writeln!(output, "! {e}")?,
                    },
                    Err(e) => writeln!(output, "! {e}")?,
                }
            }
            Some(event) = controller.next_input() => {
                controller.handle_input(event);
            }
        }

        let frame = render_text(&controller.page());
        if force || frame != last_frame {
            writeln!(output, "{frame}")?;
            output.flush()?;
            last_frame = frame;
        }
    }

    Ok(())
}
