//! # REPL
//!
//! Line editing, tab completion and output rendering around a [`Session`].
//!
//! The prompt shows the selected package and service. Completion candidates are rebuilt
//! from the schema index whenever the selection changes. Ctrl-C clears a non-empty line
//! and ends the session on an empty one; Ctrl-D ends it too.
use crate::formatter::{FormattedString, Notice, SessionInfo};
use anyhow::anyhow;
use colored::*;
use protoshell_core::grpc::connection::ChannelConnector;
use protoshell_core::index::SchemaIndex;
use protoshell_core::session::{Reply, Session, SessionContext};
use rustyline::completion::{Completer, Pair};
use rustyline::error::ReadlineError;
use rustyline::history::DefaultHistory;
use rustyline::{
    Cmd, ConditionalEventHandler, Editor, Event, EventContext, EventHandler, KeyEvent, Movement,
    RepeatCount,
};
use tracing::debug;

const COMMANDS: [&str; 5] = ["info", "package", "service", "set", "call"];
const SETTINGS: [&str; 3] = ["host", "port", "header"];

pub async fn run(mut session: Session<ChannelConnector>) -> anyhow::Result<()> {
    let mut rl: Editor<ShellHelper, DefaultHistory> =
        Editor::new().map_err(|e| anyhow!("failed to init rustyline: {e}"))?;
    rl.set_helper(Some(ShellHelper::new(session.index(), session.context())));
    rl.bind_sequence(
        KeyEvent::ctrl('C'),
        EventHandler::Conditional(Box::new(InterruptHandler)),
    );

    loop {
        let line = match rl.readline(&prompt(session.context())) {
            Ok(line) => line,
            Err(ReadlineError::Eof) | Err(ReadlineError::Interrupted) => break,
            Err(e) => return Err(anyhow!("readline error: {e}")),
        };

        if !line.trim().is_empty() {
            rl.add_history_entry(line.as_str())
                .map_err(|e| anyhow!("failed to record history: {e}"))?;
        }

        let reply = session.execute(&line).await;

        if matches!(reply, Reply::PackageSelected(_) | Reply::ServiceSelected(_)) {
            debug!("refreshing completion data");
            if let Some(helper) = rl.helper_mut() {
                *helper = ShellHelper::new(session.index(), session.context());
            }
        }

        for output in render(reply) {
            print!("{output}");
        }
    }

    println!("exit");
    Ok(())
}

/// Turns a command reply into the text printed for it.
pub fn render(reply: Reply) -> Vec<FormattedString> {
    match reply {
        Reply::Nothing => vec![],
        Reply::Info { address, headers } => vec![
            SessionInfo {
                address: &address,
                headers: &headers,
            }
            .into(),
        ],
        Reply::Package(name) | Reply::Service(name) => {
            vec![Notice(name.unwrap_or_default()).into()]
        }
        Reply::PackageSelected(name) | Reply::ServiceSelected(name) => vec![Notice(name).into()],
        Reply::Call { request, response } => {
            let response = match response {
                Ok(response) => FormattedString::from(&response),
                Err(e) => FormattedString::from(e),
            };
            vec![FormattedString::from(&request), response]
        }
        Reply::Error(e) => vec![e.into()],
    }
}

fn prompt(context: &SessionContext) -> String {
    let arrow = ">".green();

    match (&context.package, &context.service) {
        (Some(package), Some(service)) => {
            format!("{} {} ", format!("{package}.{service}").blue(), arrow)
        }
        (Some(package), None) => format!("{} {} ", package.blue(), arrow),
        _ => format!("{arrow} "),
    }
}

/// Ends the session on an empty line, clears the line otherwise.
struct InterruptHandler;

impl ConditionalEventHandler for InterruptHandler {
    fn handle(
        &self,
        _evt: &Event,
        _n: RepeatCount,
        _positive: bool,
        ctx: &EventContext<'_>,
    ) -> Option<Cmd> {
        if ctx.line().is_empty() {
            Some(Cmd::Interrupt)
        } else {
            Some(Cmd::Kill(Movement::WholeLine))
        }
    }
}

#[derive(Debug, Default)]
struct ShellHelper {
    packages: Vec<String>,
    services: Vec<String>,
    methods: Vec<String>,
}

impl ShellHelper {
    /// Candidates for the current selection: services of the selected package and methods
    /// of the selected service. Without a selection, every name in the index is offered.
    fn new(index: &SchemaIndex, context: &SessionContext) -> Self {
        let packages = index.package_names();

        let selected: Vec<String> = match &context.package {
            Some(package) => vec![package.clone()],
            None => packages.clone(),
        };

        let mut services = Vec::new();
        let mut methods = Vec::new();

        for package in &selected {
            let Ok(names) = index.service_names(package) else {
                continue;
            };

            for service in names {
                let in_scope = context.service.as_ref().is_none_or(|s| *s == service);
                if in_scope {
                    let rpcs = index.methods(package, &service).unwrap_or_default();
                    methods.extend(rpcs.into_iter().map(|rpc| rpc.name));
                }
                services.push(service);
            }
        }

        services.dedup();
        methods.sort();
        methods.dedup();

        Self {
            packages,
            services,
            methods,
        }
    }

    fn pairs_from_prefix<S: AsRef<str>>(items: &[S], prefix: &str) -> Vec<Pair> {
        items
            .iter()
            .map(AsRef::as_ref)
            .filter(|item| item.starts_with(prefix))
            .map(|item| Pair {
                display: item.to_string(),
                replacement: item.to_string(),
            })
            .collect()
    }
}

impl rustyline::Helper for ShellHelper {}

impl rustyline::highlight::Highlighter for ShellHelper {}

impl rustyline::hint::Hinter for ShellHelper {
    type Hint = String;

    fn hint(&self, _line: &str, _pos: usize, _ctx: &rustyline::Context<'_>) -> Option<String> {
        None
    }
}

impl rustyline::validate::Validator for ShellHelper {}

impl Completer for ShellHelper {
    type Candidate = Pair;

    fn complete(
        &self,
        line: &str,
        pos: usize,
        _ctx: &rustyline::Context<'_>,
    ) -> rustyline::Result<(usize, Vec<Self::Candidate>)> {
        let start = line[..pos]
            .char_indices()
            .rfind(|(_, c)| c.is_whitespace())
            .map(|(i, c)| i + c.len_utf8())
            .unwrap_or(0);
        let word = &line[start..pos];
        let tokens: Vec<&str> = line[..start].split_whitespace().collect();

        let candidates = match tokens.as_slice() {
            [] => Self::pairs_from_prefix(&COMMANDS, word),
            ["package"] => Self::pairs_from_prefix(&self.packages, word),
            ["service"] => Self::pairs_from_prefix(&self.services, word),
            ["call"] => Self::pairs_from_prefix(&self.methods, word),
            ["set"] => Self::pairs_from_prefix(&SETTINGS, word),
            _ => vec![],
        };

        Ok((start, candidates))
    }
}
