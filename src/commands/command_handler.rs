use crate::{
    commands::{
        command_error::CommandError, config_get::config_get, echo::echo, get::get, keys::keys,
        ping::ping, set::set, type_command::type_command, xadd::xadd, xrange::xrange,
        xread::xread,
    },
    state::State,
};

/// Every command the server understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandKind {
    Ping,
    Echo,
    Get,
    Set,
    ConfigGet,
    Keys,
    Type,
    XAdd,
    XRange,
    XRead,
}

/// Canonical (upper-case) command name to handler. Names missing from the
/// table get the generic unknown-command error.
static COMMAND_TABLE: &[(&str, CommandKind)] = &[
    ("PING", CommandKind::Ping),
    ("ECHO", CommandKind::Echo),
    ("GET", CommandKind::Get),
    ("SET", CommandKind::Set),
    ("CONFIG GET", CommandKind::ConfigGet),
    ("KEYS", CommandKind::Keys),
    ("TYPE", CommandKind::Type),
    ("XADD", CommandKind::XAdd),
    ("XRANGE", CommandKind::XRange),
    ("XREAD", CommandKind::XRead),
];

impl CommandKind {
    pub fn lookup(name: &str) -> Option<Self> {
        COMMAND_TABLE
            .iter()
            .find(|(table_name, _)| *table_name == name)
            .map(|(_, kind)| *kind)
    }
}

/// A decoded request: the canonical command name, its handler and the
/// remaining arguments.
#[derive(Debug, PartialEq, Clone)]
pub struct CommandHandler {
    pub name: String,
    pub kind: CommandKind,
    pub arguments: Vec<String>,
}

impl CommandHandler {
    /// Resolves the command named by the first element of `input`.
    ///
    /// Names are case-insensitive. `CONFIG` is folded together with its
    /// subcommand, so `config get dir` becomes `CONFIG GET` with `[dir]`.
    pub fn new(input: Vec<String>) -> Result<Self, CommandError> {
        let mut elements = input.into_iter();

        let Some(command) = elements.next() else {
            return Err(CommandError::UnknownCommand(String::new()));
        };

        let mut name = command.to_uppercase();

        if name == "CONFIG" {
            match elements.next() {
                Some(sub_command) if sub_command.eq_ignore_ascii_case("get") => {
                    name = "CONFIG GET".to_string();
                }
                _ => return Err(CommandError::InvalidConfigCommand),
            }
        }

        let Some(kind) = CommandKind::lookup(&name) else {
            return Err(CommandError::UnknownCommand(command));
        };

        Ok(Self {
            name,
            kind,
            arguments: elements.collect(),
        })
    }

    /// Whether the command can park the connection waiting on other clients.
    pub fn may_block(&self) -> bool {
        self.kind == CommandKind::XRead
    }

    /// Runs the command against the shared state and returns the encoded
    /// reply.
    ///
    /// Only XREAD with BLOCK can take long to complete; dropping the returned
    /// future abandons the wait.
    pub async fn handle_command(self, state: &State) -> Result<String, CommandError> {
        match self.kind {
            CommandKind::Ping => ping(self.arguments),
            CommandKind::Echo => echo(self.arguments),
            CommandKind::Get => get(&state.store, self.arguments).await,
            CommandKind::Set => set(&state.store, self.arguments).await,
            CommandKind::ConfigGet => config_get(&state.server, self.arguments),
            CommandKind::Keys => keys(&state.store, self.arguments).await,
            CommandKind::Type => type_command(&state.store, &state.streams, self.arguments).await,
            CommandKind::XAdd => xadd(&state.streams, self.arguments).await,
            CommandKind::XRange => xrange(&state.streams, self.arguments).await,
            CommandKind::XRead => xread(&state.streams, self.arguments).await,
        }
    }
}
