use std::{env, fmt::Write as _, process::ExitCode};

use log::{error, info, LevelFilter};
use redblack::{NodeRef, RbTree};
use simplelog::{ColorChoice, Config, TermLogger, TerminalMode};

enum Command {
    Insert(i64),
    Delete(i64),
    Search(i64),
    Min,
}

fn parse(arg: &str) -> Option<Command> {
    if arg == "min" {
        return Some(Command::Min);
    }

    let (op, value) = arg.split_at(arg.char_indices().nth(1)?.0);
    let value = value.parse().ok()?;

    match op {
        "+" => Some(Command::Insert(value)),
        "-" => Some(Command::Delete(value)),
        "?" => Some(Command::Search(value)),
        _ => None,
    }
}

fn shape(node: Option<NodeRef<'_, i64>>, out: &mut String) {
    let Some(node) = node else {
        out.push('_');
        return;
    };

    let color = if node.is_red() { 'R' } else { 'B' };
    let _ = write!(out, "{}{color}", node.key());

    if node.left().is_some() || node.right().is_some() {
        out.push('(');
        shape(node.left(), out);
        out.push(',');
        shape(node.right(), out);
        out.push(')');
    }
}

fn main() -> ExitCode {
    let mut level = LevelFilter::Debug;
    let mut dot = false;
    let mut commands = Vec::new();

    for arg in env::args().skip(1) {
        match arg.as_str() {
            "--trace" => level = LevelFilter::Trace,
            "--quiet" => level = LevelFilter::Warn,
            "--dot" => dot = true,
            other => match parse(other) {
                Some(cmd) => commands.push(cmd),
                None => {
                    eprintln!("unrecognized command {other:?}; expected +N, -N, ?N or min");
                    return ExitCode::FAILURE;
                }
            },
        }
    }

    if commands.is_empty() {
        commands = [10, 5, 15, 20, 30, 25]
            .into_iter()
            .map(Command::Insert)
            .chain([Command::Delete(10), Command::Search(0), Command::Min])
            .collect();
    }

    if TermLogger::init(level, Config::default(), TerminalMode::Mixed, ColorChoice::Auto).is_err() {
        eprintln!("failed to install logger");
    }

    let mut tree: RbTree<i64> = RbTree::new();

    for cmd in commands {
        match cmd {
            Command::Insert(key) => info!("insert {key}: {:?}", tree.insert(key)),
            Command::Delete(key) => info!("delete {key}: {:?}", tree.delete(&key)),
            Command::Search(key) => match tree.search(&key) {
                Some(node) => info!("search {key}: found, {:?}", node.color()),
                None => info!("search {key}: not found"),
            },
            Command::Min => match tree.find_min() {
                Some(node) => info!("min: {}", node.key()),
                None => info!("min: tree is empty"),
            },
        }

        let mut out = String::new();
        shape(tree.root(), &mut out);
        println!("{out}");

        if let Err(e) = tree.validate() {
            error!("{e}");
            return ExitCode::FAILURE;
        }
    }

    if dot {
        let mut out = String::new();
        if tree.dotgraph("demo", &mut out).is_ok() {
            println!("{out}");
        }
    }

    ExitCode::SUCCESS
}
