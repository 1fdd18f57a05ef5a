//! Command parsing, registry, and built-in commands.
//!
//! Handlers are plain function pointers over an environment `E` (the server
//! context) and a [`CommandContext`] naming the sender and the arguments.

pub mod args;

use std::collections::BTreeMap;

/// Anything that can run commands: the console or a connected player.
pub trait CommandSender: Send + Sync {
    /// Handle to the player behind this sender, if there is one.
    type Player;

    fn name(&self) -> String;
    fn send_message(&self, message: &str);
    fn as_player(&self) -> Option<Self::Player>;
}

/// Context passed to a command handler.
pub struct CommandContext<'a, P> {
    pub sender: &'a dyn CommandSender<Player = P>,
    /// Arguments after the command name.
    pub args: Vec<String>,
}

impl<'a, P> CommandContext<'a, P> {
    pub fn new(sender: &'a dyn CommandSender<Player = P>, args: Vec<String>) -> Self {
        Self { sender, args }
    }

    pub fn sender_name(&self) -> String {
        self.sender.name()
    }

    /// The sending player, or the standard refusal for console senders.
    pub fn player(&self) -> Result<P, CommandResult> {
        self.sender
            .as_player()
            .ok_or_else(|| CommandResult::err("You are not a player"))
    }
}

/// Result returned by a command handler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandResult {
    /// Whether the command executed successfully.
    pub success: bool,
    /// Messages to send back to the command sender.
    pub messages: Vec<String>,
    /// Optional message to broadcast to all players.
    pub broadcast: Option<String>,
    /// If true, the server should shut down.
    pub should_stop: bool,
}

impl CommandResult {
    /// Create a successful result with a single message.
    pub fn ok(message: impl Into<String>) -> Self {
        Self {
            success: true,
            messages: vec![message.into()],
            broadcast: None,
            should_stop: false,
        }
    }

    /// Create a successful result that prints nothing.
    pub fn silent() -> Self {
        Self {
            success: true,
            messages: Vec::new(),
            broadcast: None,
            should_stop: false,
        }
    }

    /// Create a failed result with a single message.
    pub fn err(message: impl Into<String>) -> Self {
        Self {
            success: false,
            messages: vec![message.into()],
            broadcast: None,
            should_stop: false,
        }
    }

    /// Failed result with the standard usage line.
    pub fn usage(name: &str, usage: &str) -> Self {
        if usage.is_empty() {
            Self::err(format!("Usage: /{name}"))
        } else {
            Self::err(format!("Usage: /{name} {usage}"))
        }
    }
}

/// Function pointer type for command handlers.
pub type CommandFn<E, P> = fn(&E, &CommandContext<'_, P>) -> CommandResult;

/// A registered command.
pub struct CommandEntry<E, P> {
    pub name: String,
    /// Argument synopsis, e.g. `<src> <dest>`.
    pub usage: String,
    pub description: String,
    pub handler: CommandFn<E, P>,
}

/// Registry of available server commands.
pub struct CommandRegistry<E, P> {
    commands: BTreeMap<String, CommandEntry<E, P>>,
}

impl<E, P> CommandRegistry<E, P> {
    /// Create a registry holding only the built-in `help` and `stop`.
    pub fn new() -> Self {
        let mut registry = Self {
            commands: BTreeMap::new(),
        };
        registry.register("help", "", "List available commands", |_, _| {
            CommandResult::silent()
        });
        registry.register("stop", "", "Stop the server", cmd_stop);
        registry
    }

    /// Register a command. Names are case-insensitive.
    pub fn register(
        &mut self,
        name: &str,
        usage: &str,
        description: &str,
        handler: CommandFn<E, P>,
    ) {
        let name = name.to_ascii_lowercase();
        self.commands.insert(
            name.clone(),
            CommandEntry {
                name,
                usage: usage.to_string(),
                description: description.to_string(),
                handler,
            },
        );
    }

    /// Execute a command by name.
    pub fn execute(&self, env: &E, name: &str, ctx: &CommandContext<'_, P>) -> CommandResult {
        let name = name.to_ascii_lowercase();
        if name == "help" {
            return self.help();
        }
        match self.commands.get(&name) {
            Some(entry) => (entry.handler)(env, ctx),
            None => CommandResult::err(format!(
                "Unknown command: {name}. Type /help for a list of commands."
            )),
        }
    }

    /// Parse a raw line (with or without the leading `/`) and execute it.
    pub fn dispatch(
        &self,
        env: &E,
        sender: &dyn CommandSender<Player = P>,
        line: &str,
    ) -> CommandResult {
        let Some((name, args)) = args::split_line(line) else {
            return CommandResult::silent();
        };
        self.execute(env, &name, &CommandContext::new(sender, args))
    }

    /// Look up a command entry.
    pub fn get(&self, name: &str) -> Option<&CommandEntry<E, P>> {
        self.commands.get(&name.to_ascii_lowercase())
    }

    /// Get a reference to all registered commands, sorted by name.
    pub fn get_commands(&self) -> &BTreeMap<String, CommandEntry<E, P>> {
        &self.commands
    }

    fn help(&self) -> CommandResult {
        let mut lines = vec!["Available commands:".to_string()];
        for entry in self.commands.values() {
            lines.push(format!("  /{} - {}", entry.name, entry.description));
        }
        CommandResult {
            success: true,
            messages: lines,
            broadcast: None,
            should_stop: false,
        }
    }
}

impl<E, P> Default for CommandRegistry<E, P> {
    fn default() -> Self {
        Self::new()
    }
}

// ---------------------------------------------------------------------------
// Built-in commands
// ---------------------------------------------------------------------------

fn cmd_stop<E, P>(_env: &E, ctx: &CommandContext<'_, P>) -> CommandResult {
    if ctx.sender.as_player().is_some() {
        return CommandResult::err("Only the console can stop the server");
    }
    CommandResult {
        success: true,
        messages: vec!["Stopping the server...".to_string()],
        broadcast: None,
        should_stop: true,
    }
}

// ===========================================================================
// Tests
// ===========================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    struct TestSender {
        name: &'static str,
        player: bool,
        inbox: Mutex<Vec<String>>,
    }

    impl TestSender {
        fn console() -> Self {
            Self {
                name: "Console",
                player: false,
                inbox: Mutex::new(Vec::new()),
            }
        }

        fn player(name: &'static str) -> Self {
            Self {
                name,
                player: true,
                inbox: Mutex::new(Vec::new()),
            }
        }
    }

    impl CommandSender for TestSender {
        type Player = &'static str;

        fn name(&self) -> String {
            self.name.to_string()
        }

        fn send_message(&self, message: &str) {
            self.inbox.lock().unwrap().push(message.to_string());
        }

        fn as_player(&self) -> Option<&'static str> {
            self.player.then_some(self.name)
        }
    }

    type Registry = CommandRegistry<u32, &'static str>;

    fn echo(env: &u32, ctx: &CommandContext<'_, &'static str>) -> CommandResult {
        CommandResult::ok(format!("{env}:{}:{}", ctx.sender_name(), ctx.args.join(",")))
    }

    fn whoami(_env: &u32, ctx: &CommandContext<'_, &'static str>) -> CommandResult {
        match ctx.player() {
            Ok(name) => CommandResult::ok(name),
            Err(refusal) => refusal,
        }
    }

    #[test]
    fn registry_has_builtins() {
        let reg = Registry::new();
        assert_eq!(reg.get_commands().len(), 2);
        assert!(reg.get_commands().contains_key("help"));
        assert!(reg.get_commands().contains_key("stop"));
    }

    #[test]
    fn dispatch_passes_env_and_args() {
        let mut reg = Registry::new();
        reg.register("Echo", "<words>", "Repeat words", echo);
        let sender = TestSender::player("Steve");
        let result = reg.dispatch(&7, &sender, "/ECHO a  b");
        assert!(result.success);
        assert_eq!(result.messages[0], "7:Steve:a,b");
        assert!(reg.get("echo").is_some());
    }

    #[test]
    fn unknown_command() {
        let reg = Registry::new();
        let sender = TestSender::console();
        let result = reg.dispatch(&0, &sender, "teleport");
        assert!(!result.success);
        assert!(result.messages[0].contains("Unknown command"));
    }

    #[test]
    fn empty_line_does_nothing() {
        let reg = Registry::new();
        let sender = TestSender::console();
        let result = reg.dispatch(&0, &sender, "/   ");
        assert!(result.success);
        assert!(result.messages.is_empty());
    }

    #[test]
    fn help_lists_commands_sorted() {
        let mut reg = Registry::new();
        reg.register("echo", "<words>", "Repeat words", echo);
        let sender = TestSender::console();
        let result = reg.dispatch(&0, &sender, "help");
        assert!(result.success);
        assert_eq!(result.messages[0], "Available commands:");
        assert_eq!(result.messages[1], "  /echo - Repeat words");
        assert_eq!(result.messages.len(), 4);
    }

    #[test]
    fn player_only_commands_refuse_console() {
        let mut reg = Registry::new();
        reg.register("whoami", "", "Print your name", whoami);
        let console = TestSender::console();
        let result = reg.dispatch(&0, &console, "whoami");
        assert!(!result.success);
        assert_eq!(result.messages[0], "You are not a player");

        let player = TestSender::player("Alex");
        assert_eq!(reg.dispatch(&0, &player, "whoami").messages[0], "Alex");
    }

    #[test]
    fn stop_is_console_only() {
        let reg = Registry::new();
        let console = TestSender::console();
        let result = reg.dispatch(&0, &console, "stop");
        assert!(result.success);
        assert!(result.should_stop);

        let player = TestSender::player("Steve");
        let result = reg.dispatch(&0, &player, "stop");
        assert!(!result.success);
        assert!(!result.should_stop);
    }

    #[test]
    fn result_helpers() {
        let ok = CommandResult::ok("success");
        assert!(ok.success);
        assert_eq!(ok.messages[0], "success");

        let err = CommandResult::err("failed");
        assert!(!err.success);
        assert_eq!(err.messages[0], "failed");

        assert_eq!(
            CommandResult::usage("copylvl", "<src> <dest>").messages[0],
            "Usage: /copylvl <src> <dest>"
        );
        assert_eq!(CommandResult::usage("spawn", "").messages[0], "Usage: /spawn");
    }

    #[test]
    fn sender_receives_messages() {
        let sender = TestSender::console();
        sender.send_message("hi");
        assert_eq!(*sender.inbox.lock().unwrap(), vec!["hi".to_string()]);
    }
}
