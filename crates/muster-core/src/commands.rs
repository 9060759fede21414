//! The interactive action surface: parses one command line at a time
//! and applies it to the session. The engine below never sees raw user
//! input; everything is validated here first.

use std::io::{self, BufRead, Write};

use anyhow::anyhow;
use chrono::NaiveDate;
use tracing::{debug, info, instrument, warn};

use crate::config::Config;
use crate::dates::{DisplayFormat, parse_iso};
use crate::render::Renderer;
use crate::segment::MergeMode;
use crate::session::Session;

pub fn known_command_names() -> Vec<&'static str> {
    vec![
        "pick",
        "drop",
        "names",
        "remove",
        "mode",
        "format",
        "override",
        "highlight",
        "dates",
        "report",
        "holidays",
        "reset",
        "help",
        "quit",
        "exit",
    ]
}

pub fn expand_command_abbrev<'a>(token: &'a str, known: &[&'a str]) -> Option<&'a str> {
    if known.contains(&token) {
        return Some(token);
    }

    let mut matches = known.iter().copied().filter(|name| name.starts_with(token));
    let first = matches.next()?;
    if matches.next().is_some() {
        None
    } else {
        Some(first)
    }
}

/// Whether the loop keeps going after a command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

/// Run the interactive loop until `quit` or end of input.
pub fn repl(
    session: &mut Session,
    cfg: &Config,
    renderer: &mut Renderer,
) -> anyhow::Result<()> {
    let stdin = io::stdin();
    let mut confirm = |prompt: &str| ask_stdin(prompt);

    loop {
        print!("muster> ");
        io::stdout().flush()?;

        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 {
            info!("end of input");
            return Ok(());
        }

        match dispatch_line(session, cfg, renderer, &line, &mut confirm) {
            Ok(Flow::Quit) => return Ok(()),
            Ok(Flow::Continue) => {}
            Err(err) => eprintln!("error: {err:#}"),
        }
    }
}

/// Parse and execute one command line. `confirm` is the caller's gate
/// for destructive actions; tests inject their own.
#[instrument(skip(session, cfg, renderer, line, confirm))]
pub fn dispatch_line(
    session: &mut Session,
    cfg: &Config,
    renderer: &mut Renderer,
    line: &str,
    confirm: &mut dyn FnMut(&str) -> bool,
) -> anyhow::Result<Flow> {
    let tokens: Vec<&str> = line.split_whitespace().collect();
    let Some((&head, args)) = tokens.split_first() else {
        return Ok(Flow::Continue);
    };

    let known = known_command_names();
    let Some(command) = expand_command_abbrev(head, &known) else {
        return Err(anyhow!("unknown command: {head} (try 'help')"));
    };

    debug!(command, ?args, "dispatching command");

    match command {
        "pick" => cmd_pick(session, args),
        "drop" => cmd_drop(session, cfg, args, confirm),
        "names" => cmd_names(session, args),
        "remove" => cmd_remove(session, args),
        "mode" => cmd_mode(session, args),
        "format" => cmd_format(session, args),
        "override" => cmd_override(session, args),
        "highlight" => cmd_highlight(session, args),
        "dates" => {
            renderer.print_events(session)?;
            Ok(Flow::Continue)
        }
        "report" => {
            renderer.print_report(session)?;
            Ok(Flow::Continue)
        }
        "holidays" => cmd_holidays(session, renderer, args),
        "reset" => cmd_reset(session, cfg, confirm),
        "help" => cmd_help(),
        "quit" | "exit" => Ok(Flow::Quit),
        other => Err(anyhow!("unknown command: {other}")),
    }
}

fn parse_date_arg(token: &str) -> anyhow::Result<NaiveDate> {
    parse_iso(token).ok_or_else(|| anyhow!("invalid date (expected YYYY-MM-DD): {token}"))
}

fn cmd_pick(session: &mut Session, args: &[&str]) -> anyhow::Result<Flow> {
    if args.is_empty() {
        return Err(anyhow!("pick requires at least one date"));
    }
    for token in args {
        let date = parse_date_arg(token)?;
        session.select_date(date);
    }
    println!("Selected {} date(s).", args.len());
    Ok(Flow::Continue)
}

fn cmd_drop(
    session: &mut Session,
    cfg: &Config,
    args: &[&str],
    confirm: &mut dyn FnMut(&str) -> bool,
) -> anyhow::Result<Flow> {
    let [token] = args else {
        return Err(anyhow!("drop requires exactly one date"));
    };
    let date = parse_date_arg(token)?;

    let name_count = session.events().get(&date).map_or(0, Vec::len);
    let needs_confirmation = cfg.get_bool("confirmation").unwrap_or(true);
    if name_count > 0 && needs_confirmation {
        let prompt = format!("{token} has {name_count} name(s); drop it anyway? (y/N) ");
        if !confirm(&prompt) {
            println!("Not dropped.");
            return Ok(Flow::Continue);
        }
    }

    if session.deselect_date(date) {
        println!("Dropped {token}.");
    } else {
        warn!(date = %token, "drop of unselected date");
        println!("{token} was not selected.");
    }
    Ok(Flow::Continue)
}

fn cmd_names(session: &mut Session, args: &[&str]) -> anyhow::Result<Flow> {
    let Some((&token, raw)) = args.split_first() else {
        return Err(anyhow!("names requires a date and the names to add"));
    };
    let date = parse_date_arg(token)?;

    let added = session.add_names(date, &raw.join(" "));
    println!("Added {added} name(s) to {token}.");
    Ok(Flow::Continue)
}

fn cmd_remove(session: &mut Session, args: &[&str]) -> anyhow::Result<Flow> {
    let [token, name] = args else {
        return Err(anyhow!("remove requires a date and one name"));
    };
    let date = parse_date_arg(token)?;

    if session.remove_name(date, name) {
        println!("Removed {name} from {token}.");
    } else {
        println!("{name} was not on {token}.");
    }
    Ok(Flow::Continue)
}

fn cmd_mode(session: &mut Session, args: &[&str]) -> anyhow::Result<Flow> {
    let [token] = args else {
        println!("Merge mode is '{}'.", session.mode().as_str());
        return Ok(Flow::Continue);
    };
    let mode = MergeMode::parse(token)
        .ok_or_else(|| anyhow!("invalid merge mode: {token} (expected keep, red, or all)"))?;
    session.set_mode(mode);
    println!("Merge mode set to '{}'.", mode.as_str());
    Ok(Flow::Continue)
}

fn cmd_format(session: &mut Session, args: &[&str]) -> anyhow::Result<Flow> {
    let [token] = args else {
        println!("Display format is '{}'.", session.format().as_str());
        return Ok(Flow::Continue);
    };
    let format = DisplayFormat::parse(token)
        .ok_or_else(|| anyhow!("invalid display format: {token} (expected short or dotted)"))?;
    session.set_format(format);
    println!("Display format set to '{}'.", format.as_str());
    Ok(Flow::Continue)
}

fn cmd_override(session: &mut Session, args: &[&str]) -> anyhow::Result<Flow> {
    let [index_token, mode_token] = args else {
        return Err(anyhow!(
            "override requires a group number and a mode (or 'clear')"
        ));
    };

    let groups = session.grouped_report();
    let index: usize = index_token
        .parse()
        .map_err(|_| anyhow!("invalid group number: {index_token}"))?;
    let group = index
        .checked_sub(1)
        .and_then(|i| groups.get(i))
        .ok_or_else(|| anyhow!("no group {index} (report has {})", groups.len()))?;
    let key = group.dates_key.clone();

    if mode_token.eq_ignore_ascii_case("clear") {
        if session.clear_override(&key) {
            println!("Cleared override on group {index}.");
        } else {
            println!("Group {index} had no override.");
        }
        return Ok(Flow::Continue);
    }

    let mode = MergeMode::parse(mode_token)
        .ok_or_else(|| anyhow!("invalid merge mode: {mode_token}"))?;
    session.set_override(key, mode);
    println!("Group {index} now displays with '{}'.", mode.as_str());
    Ok(Flow::Continue)
}

fn cmd_highlight(session: &mut Session, args: &[&str]) -> anyhow::Result<Flow> {
    match args {
        [] => {
            session.set_highlight(None);
            println!("Highlight cleared.");
        }
        [name] => {
            session.set_highlight(Some((*name).to_string()));
            let count = session.highlighted_dates().len();
            println!("Highlighting {name} ({count} date(s)).");
        }
        _ => return Err(anyhow!("highlight takes at most one name")),
    }
    Ok(Flow::Continue)
}

fn cmd_holidays(
    session: &Session,
    renderer: &mut Renderer,
    args: &[&str],
) -> anyhow::Result<Flow> {
    match args {
        [] => println!("Holiday region: {}", session.holidays().name()),
        [token] => {
            let date = parse_date_arg(token)?;
            renderer.print_date_info(date, session.holidays())?;
        }
        _ => return Err(anyhow!("holidays takes at most one date")),
    }
    Ok(Flow::Continue)
}

fn cmd_reset(
    session: &mut Session,
    cfg: &Config,
    confirm: &mut dyn FnMut(&str) -> bool,
) -> anyhow::Result<Flow> {
    let needs_confirmation = cfg.get_bool("confirmation").unwrap_or(true);
    if !session.events().is_empty()
        && needs_confirmation
        && !confirm("Discard all dates, names, and overrides? (y/N) ")
    {
        println!("Not reset.");
        return Ok(Flow::Continue);
    }
    session.reset();
    println!("Session reset.");
    Ok(Flow::Continue)
}

fn cmd_help() -> anyhow::Result<Flow> {
    println!(
        "commands:\n\
         \x20 pick <date>...          select dates (YYYY-MM-DD)\n\
         \x20 drop <date>             deselect a date and its names\n\
         \x20 names <date> <names>    add names (comma/space separated)\n\
         \x20 remove <date> <name>    remove one name from a date\n\
         \x20 mode [keep|red|all]     show or set the merge mode\n\
         \x20 format [short|dotted]   show or set the display format\n\
         \x20 override <n> <mode>     per-group display mode ('clear' to unset)\n\
         \x20 highlight [name]        mark a participant's dates (no name: clear)\n\
         \x20 dates                   show the raw per-date table\n\
         \x20 report                  show the grouped attendance report\n\
         \x20 holidays [date]         region info, or classify one date\n\
         \x20 reset                   discard the whole session\n\
         \x20 quit                    leave"
    );
    Ok(Flow::Continue)
}

fn ask_stdin(prompt: &str) -> bool {
    print!("{prompt}");
    if io::stdout().flush().is_err() {
        return false;
    }
    let mut answer = String::new();
    if io::stdin().lock().read_line(&mut answer).is_err() {
        return false;
    }
    matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes")
}

#[cfg(test)]
mod tests {
    use super::{expand_command_abbrev, known_command_names};

    #[test]
    fn expands_unambiguous_prefixes() {
        let known = known_command_names();
        assert_eq!(expand_command_abbrev("rep", &known), Some("report"));
        assert_eq!(expand_command_abbrev("pick", &known), Some("pick"));
        assert_eq!(expand_command_abbrev("q", &known), Some("quit"));
    }

    #[test]
    fn ambiguous_or_unknown_prefixes_do_not_expand() {
        let known = known_command_names();
        // "re" matches remove, report, and reset.
        assert_eq!(expand_command_abbrev("re", &known), None);
        assert_eq!(expand_command_abbrev("zzz", &known), None);
    }
}
