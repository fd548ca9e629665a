//! send2outlook CLI - open markdown notes as Microsoft Outlook drafts.

use std::env;
use std::io::{self, IsTerminal, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result, anyhow};
use clap::{Args, CommandFactory, Parser, Subcommand, ValueEnum};
use clap_complete::Shell;
use env_logger::fmt::WriteStyle;
use log::{LevelFilter, debug, info};
use send2outlook_core::{
    Action, AppConfig, AppPaths, CommonMarkRenderer, EmailComposer, FileWorkspace, JsonDataFile,
    MailBridge, Notifier, PreparedDispatch, Registry, SettingField, Settings, SettingsStore,
    ShellRunner, html_to_text,
};
use serde::Serialize;
use serde_json::Value;

const APP_NAME: &str = env!("CARGO_PKG_NAME");

/// Wrap width for the plain-text preview.
const PREVIEW_WIDTH: usize = 80;

fn main() {
    match try_main() {
        Ok(code) => std::process::exit(code),
        Err(err) => {
            let _ = writeln!(io::stderr(), "{err:?}");
            std::process::exit(1);
        }
    }
}

fn try_main() -> Result<i32> {
    let cli = Cli::parse();
    // `init` decides for itself whether an existing config may be replaced.
    let create_config = !matches!(cli.command, Command::Init(_));
    let ctx = RuntimeContext::new(cli.common.clone(), create_config)?;
    ctx.init_logging()?;
    debug!("config loaded from {}", ctx.paths.global_config.display());

    match cli.command {
        Command::Send(args) => handle_send(&ctx, args),
        Command::Run(args) => handle_run(&ctx, args),
        Command::Commands => handle_commands(&ctx).map(|_| 0),
        Command::Settings { command } => handle_settings(&ctx, command).map(|_| 0),
        Command::Config { command } => handle_config(&ctx, command).map(|_| 0),
        Command::Init(cmd) => handle_init(&ctx, cmd).map(|_| 0),
        Command::Completions { shell } => handle_completions(shell).map(|_| 0),
    }
}

#[derive(Debug, Parser)]
#[command(
    author,
    version,
    about = "Open a markdown note as a pre-filled Microsoft Outlook message.",
    propagate_version = true
)]
struct Cli {
    #[command(flatten)]
    common: CommonOpts,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Clone, Args)]
struct CommonOpts {
    #[arg(long, value_name = "PATH", global = true)]
    config: Option<PathBuf>,
    #[arg(short, long, action = clap::ArgAction::SetTrue, global = true)]
    quiet: bool,
    #[arg(short = 'v', long = "verbose", action = clap::ArgAction::Count, global = true)]
    verbose: u8,
    #[arg(long, global = true)]
    debug: bool,
    #[arg(long, global = true)]
    trace: bool,
    #[arg(long, global = true, conflicts_with = "yaml")]
    json: bool,
    #[arg(long, global = true)]
    yaml: bool,
    #[arg(long = "no-color", global = true, conflicts_with = "color")]
    no_color: bool,
    #[arg(long, value_enum, default_value_t = ColorOption::Auto, global = true)]
    color: ColorOption,
    #[arg(long = "dry-run", global = true)]
    dry_run: bool,
    #[arg(short = 'y', long = "yes", global = true)]
    assume_yes: bool,
    #[arg(long = "diagnostics", global = true)]
    diagnostics: bool,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum ColorOption {
    Auto,
    Always,
    Never,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Send a note to Outlook (same as the "Send to Outlook" menu item)
    Send(SendArgs),
    /// Run a registered command against a note
    Run(RunArgs),
    /// List registered commands and menu items
    Commands,
    /// Show or edit default recipients
    Settings {
        #[command(subcommand)]
        command: SettingsCommand,
    },
    Config {
        #[command(subcommand)]
        command: ConfigCommand,
    },
    Init(InitCommand),
    Completions {
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Debug, Args)]
struct SendArgs {
    /// Markdown note to send
    file: PathBuf,
}

#[derive(Debug, Args)]
struct RunArgs {
    /// Command id (e.g., 'send-to-outlook')
    id: String,
    /// Markdown note the command acts on
    file: PathBuf,
}

#[derive(Debug, Subcommand)]
enum SettingsCommand {
    Show,
    Path,
    /// Set one field: recipient or cc (semicolon-separated addresses)
    Set {
        field: SettingField,
        #[arg(allow_hyphen_values = true)]
        value: String,
    },
    /// Edit all fields interactively
    Edit,
}

#[derive(Debug, Subcommand)]
enum ConfigCommand {
    Show,
    Path,
    Reset,
}

#[derive(Debug, Clone, Args)]
struct InitCommand {
    #[arg(long = "force")]
    force: bool,
}

#[derive(Debug, Clone)]
struct RuntimeContext {
    common: CommonOpts,
    paths: AppPaths,
    config: AppConfig,
}

impl RuntimeContext {
    fn new(common: CommonOpts, create_config: bool) -> Result<Self> {
        let paths = AppPaths::discover(common.config.clone()).map_err(|e| anyhow!("{e}"))?;
        Self::with_paths(common, paths, create_config)
    }

    fn with_paths(common: CommonOpts, paths: AppPaths, create_config: bool) -> Result<Self> {
        if create_config {
            AppConfig::ensure_default(&paths.global_config).map_err(|e| anyhow!("{e}"))?;
        }
        let config = AppConfig::load(&paths).map_err(|e| anyhow!("{e}"))?;
        Ok(Self {
            common,
            paths,
            config,
        })
    }

    fn init_logging(&self) -> Result<()> {
        if self.common.quiet {
            log::set_max_level(LevelFilter::Off);
            return Ok(());
        }

        let mut builder =
            env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"));

        builder.filter_level(self.effective_log_level());

        if self.color_disabled() {
            builder.write_style(WriteStyle::Never);
        } else if self.color_forced() {
            builder.write_style(WriteStyle::Always);
        } else {
            builder.write_style(WriteStyle::Auto);
        }

        if self.common.diagnostics {
            builder.format_timestamp_millis();
            builder.format_module_path(true);
            builder.format_target(true);
        }

        builder.try_init().or_else(|err| {
            if self.common.verbose > 0 {
                eprintln!("logger already initialized: {err}");
            }
            Ok(())
        })
    }

    fn effective_log_level(&self) -> LevelFilter {
        if self.common.trace {
            LevelFilter::Trace
        } else if self.common.debug {
            LevelFilter::Debug
        } else {
            match self.common.verbose {
                0 => LevelFilter::Info,
                1 => LevelFilter::Debug,
                _ => LevelFilter::Trace,
            }
        }
    }

    fn color_forced(&self) -> bool {
        matches!(self.common.color, ColorOption::Always) || env::var_os("FORCE_COLOR").is_some()
    }

    fn color_disabled(&self) -> bool {
        self.common.no_color
            || matches!(self.common.color, ColorOption::Never)
            || env::var_os("NO_COLOR").is_some()
    }

    /// Whether to colour output written to a stream that is (or is not) a terminal.
    fn use_color(&self, is_terminal: bool) -> bool {
        if self.color_disabled() {
            false
        } else {
            self.color_forced() || is_terminal
        }
    }

    fn settings_store(&self) -> Result<SettingsStore<JsonDataFile>> {
        let path = self
            .paths
            .settings_file(self.config.settings_file.as_deref())
            .map_err(|e| anyhow!("{e}"))?;
        Ok(SettingsStore::new(JsonDataFile::new(path)))
    }

    fn mail_bridge(&self) -> MailBridge {
        let notifier = TerminalNotifier {
            color: self.use_color(io::stderr().is_terminal()),
        };
        MailBridge::new(
            &self.config.mail_client,
            Arc::new(ShellRunner::new(self.config.mail_client.shell.clone())),
            Arc::new(notifier),
        )
    }
}

/// Prints notifications to stderr.
struct TerminalNotifier {
    color: bool,
}

impl Notifier for TerminalNotifier {
    fn notify(&self, message: &str) {
        use owo_colors::OwoColorize;

        if self.color {
            eprintln!("{}", message.red().bold());
        } else {
            eprintln!("{message}");
        }
    }
}

fn handle_send(ctx: &RuntimeContext, args: SendArgs) -> Result<i32> {
    let registry = Registry::with_defaults();
    let action = registry
        .menu_action()
        .ok_or_else(|| anyhow!("no menu item registered"))?;
    run_action(ctx, action, &args.file)
}

fn handle_run(ctx: &RuntimeContext, args: RunArgs) -> Result<i32> {
    let registry = Registry::with_defaults();
    let action = registry.resolve(&args.id).ok_or_else(|| {
        let known: Vec<&str> = registry.commands.iter().map(|c| c.id.as_str()).collect();
        anyhow!("unknown command '{}' (available: {})", args.id, known.join(", "))
    })?;
    run_action(ctx, action, &args.file)
}

fn run_action(ctx: &RuntimeContext, action: Action, file: &Path) -> Result<i32> {
    match action {
        Action::SendActiveNote => send_active_note(ctx, file),
    }
}

#[derive(Debug, Serialize)]
struct DryRun {
    #[serde(flatten)]
    prepared: PreparedDispatch,
    preview: String,
}

fn send_active_note(ctx: &RuntimeContext, file: &Path) -> Result<i32> {
    let workspace = FileWorkspace::open(file);
    let settings = ctx.settings_store()?.load();
    let renderer = CommonMarkRenderer::new(&ctx.config.markdown);
    let bridge = ctx.mail_bridge();
    let composer = EmailComposer::new(&renderer, &bridge);

    if ctx.common.dry_run {
        let Some(draft) = composer
            .draft(&workspace)
            .map_err(|e| anyhow!("{}: {e}", file.display()))?
        else {
            info!("{} is not an open markdown note, nothing to send", file.display());
            return Ok(0);
        };
        let prepared = bridge.prepare(&draft.title, &draft.html_body, &settings);
        let preview = html_to_text(&draft.html_body, PREVIEW_WIDTH);
        print_dry_run(ctx, &DryRun { prepared, preview })?;
        return Ok(0);
    }

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("starting event loop")?;

    runtime.block_on(async {
        let pending = composer
            .compose_and_send(&workspace, &settings)
            .map_err(|e| anyhow!("{}: {e}", file.display()))?;
        let Some(handle) = pending else {
            info!("{} is not an open markdown note, nothing to send", file.display());
            return Ok::<_, anyhow::Error>(0);
        };

        // The composer does not wait; stay alive until the runner finishes.
        let outcome = handle.await.context("dispatch task aborted")?;
        debug!("dispatch finished: {outcome:?}");
        Ok::<_, anyhow::Error>(if outcome.is_failed() { 1 } else { 0 })
    })
}

fn print_dry_run(ctx: &RuntimeContext, dry_run: &DryRun) -> Result<()> {
    if ctx.common.json || ctx.common.yaml {
        return emit_output(&ctx.common, dry_run);
    }

    let message = &dry_run.prepared.message;
    println!("Subject: {}", message.subject);
    println!("To: {}", message.recipients.join("; "));
    println!("Cc: {}", message.cc_recipients.join("; "));
    println!();
    println!("{}", dry_run.preview.trim_end());
    println!();
    println!("dry-run: would run:");
    println!("{}", dry_run.prepared.command_line);
    Ok(())
}

fn handle_commands(ctx: &RuntimeContext) -> Result<()> {
    let registry = Registry::with_defaults();
    if ctx.common.json || ctx.common.yaml {
        return emit_output(&ctx.common, &registry);
    }
    println!("Commands:");
    for command in &registry.commands {
        println!("  {:<20} {}", command.id, command.name);
    }
    println!("Menu items:");
    for item in &registry.menu_items {
        println!("  {} ({})", item.title, item.icon);
    }
    Ok(())
}

fn handle_settings(ctx: &RuntimeContext, command: SettingsCommand) -> Result<()> {
    let store = ctx.settings_store()?;
    match command {
        SettingsCommand::Show => {
            let settings = store.load();
            if ctx.common.json || ctx.common.yaml {
                return emit_output(&ctx.common, &settings);
            }
            print_settings(&settings);
            Ok(())
        }
        SettingsCommand::Path => {
            println!("{}", store.backend().path().display());
            Ok(())
        }
        SettingsCommand::Set { field, value } => {
            let mut settings = store.load();
            if ctx.common.dry_run {
                println!("dry-run: would set {field} to '{value}'");
                return Ok(());
            }
            store
                .update(&mut settings, field, &value)
                .map_err(|e| anyhow!("{e}"))
        }
        SettingsCommand::Edit => edit_settings(&store),
    }
}

fn print_settings(settings: &Settings) {
    for field in SettingField::all() {
        let value = settings.get(*field);
        if value.is_empty() {
            println!("{}: <{}>", field.name(), field.placeholder());
        } else {
            println!("{}: {}", field.name(), value);
        }
    }
}

/// Interactive settings tab. Every field is saved as soon as it is entered.
fn edit_settings(store: &SettingsStore<JsonDataFile>) -> Result<()> {
    let mut settings = store.load();
    let registry = Registry::with_defaults();
    for tab in &registry.setting_tabs {
        for field in &tab.fields {
            println!("{}", field.description());
            let value: String = dialoguer::Input::new()
                .with_prompt(field.name())
                .with_initial_text(settings.get(*field))
                .allow_empty(true)
                .interact_text()
                .with_context(|| format!("reading {}", field.name()))?;
            if value != settings.get(*field) {
                store
                    .update(&mut settings, *field, &value)
                    .map_err(|e| anyhow!("{e}"))?;
            }
        }
    }
    Ok(())
}

fn handle_config(ctx: &RuntimeContext, command: ConfigCommand) -> Result<()> {
    match command {
        ConfigCommand::Show => emit_output(&ctx.common, &ctx.config),
        ConfigCommand::Path => {
            println!("{}", ctx.paths.global_config.display());
            Ok(())
        }
        ConfigCommand::Reset => {
            AppConfig::write_default(&ctx.paths.global_config).map_err(|e| anyhow!("{e}"))
        }
    }
}

fn handle_init(ctx: &RuntimeContext, cmd: InitCommand) -> Result<()> {
    if ctx.paths.global_config.exists() && !(cmd.force || ctx.common.assume_yes) {
        return Err(anyhow!(
            "config already exists at {} (use --force to overwrite)",
            ctx.paths.global_config.display()
        ));
    }
    if ctx.common.dry_run {
        println!(
            "dry-run: would write default config to {}",
            ctx.paths.global_config.display()
        );
        return Ok(());
    }
    AppConfig::write_default(&ctx.paths.global_config).map_err(|e| anyhow!("{e}"))
}

fn handle_completions(shell: Shell) -> Result<()> {
    let mut cmd = Cli::command();
    clap_complete::generate(shell, &mut cmd, APP_NAME, &mut io::stdout());
    Ok(())
}

fn emit_output<T: ?Sized + Serialize + std::fmt::Debug>(
    opts: &CommonOpts,
    value: &T,
) -> Result<()> {
    if opts.json {
        let json = serde_json::to_string_pretty(value)?;
        println!("{json}");
        return Ok(());
    }
    if opts.yaml {
        let yaml = serde_yaml::to_string(value)?;
        println!("{yaml}");
        return Ok(());
    }

    let v = serde_json::to_value(value)?;
    pretty_print_value(&v, 0);
    Ok(())
}

fn pretty_print_value(v: &Value, depth: usize) {
    let indent = "  ".repeat(depth);
    match v {
        Value::Object(map) => {
            for (key, value) in map {
                match value {
                    Value::Object(_) | Value::Array(_) => {
                        println!("{indent}{key}:");
                        pretty_print_value(value, depth + 1);
                    }
                    Value::String(s) => println!("{indent}{key}: {s}"),
                    other => println!("{indent}{key}: {other}"),
                }
            }
        }
        Value::Array(items) => {
            for item in items {
                match item {
                    Value::String(s) => println!("{indent}- {s}"),
                    Value::Object(_) | Value::Array(_) => pretty_print_value(item, depth),
                    other => println!("{indent}- {other}"),
                }
            }
        }
        Value::String(s) => println!("{indent}{s}"),
        other => println!("{indent}{other}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn context_in(dir: &Path, args: &[&str]) -> (RuntimeContext, Command) {
        let cli = Cli::try_parse_from(args).unwrap();
        let paths = AppPaths {
            global_config: dir.join("config").join("config.toml"),
            local_config: dir.join("config.toml"),
            cli_config: None,
            data_dir: dir.join("data"),
        };
        let create_config = !matches!(cli.command, Command::Init(_));
        let ctx = RuntimeContext::with_paths(cli.common, paths, create_config).unwrap();
        (ctx, cli.command)
    }

    fn init_args(command: Command) -> InitCommand {
        match command {
            Command::Init(cmd) => cmd,
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_send() {
        let cli = Cli::try_parse_from(["send2outlook", "send", "Notes.md", "--dry-run"]).unwrap();
        assert!(cli.common.dry_run);
        match cli.command {
            Command::Send(args) => assert_eq!(args.file, PathBuf::from("Notes.md")),
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_parse_settings_set() {
        let cli =
            Cli::try_parse_from(["send2outlook", "settings", "set", "cc", "a@x.com; b@x.com"])
                .unwrap();
        match cli.command {
            Command::Settings {
                command: SettingsCommand::Set { field, value },
            } => {
                assert_eq!(field, SettingField::DefaultCc);
                assert_eq!(value, "a@x.com; b@x.com");
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_parse_unknown_setting_fails() {
        assert!(Cli::try_parse_from(["send2outlook", "settings", "set", "bcc", "x"]).is_err());
    }

    #[test]
    fn test_init_on_fresh_install() {
        let temp = TempDir::new().unwrap();
        let (ctx, command) = context_in(temp.path(), &["send2outlook", "init"]);
        assert!(!ctx.paths.global_config.exists());

        handle_init(&ctx, init_args(command)).unwrap();
        assert!(ctx.paths.global_config.exists());
    }

    #[test]
    fn test_init_refuses_existing_config_without_force() {
        let temp = TempDir::new().unwrap();
        let (ctx, command) = context_in(temp.path(), &["send2outlook", "init"]);
        std::fs::create_dir_all(ctx.paths.global_config.parent().unwrap()).unwrap();
        std::fs::write(&ctx.paths.global_config, "# mine\n").unwrap();

        let err = handle_init(&ctx, init_args(command)).unwrap_err();
        assert!(err.to_string().contains("--force"));
        assert_eq!(
            std::fs::read_to_string(&ctx.paths.global_config).unwrap(),
            "# mine\n"
        );

        let (ctx, command) = context_in(temp.path(), &["send2outlook", "init", "--force"]);
        handle_init(&ctx, init_args(command)).unwrap();
        assert_ne!(
            std::fs::read_to_string(&ctx.paths.global_config).unwrap(),
            "# mine\n"
        );
    }

    #[test]
    fn test_other_commands_create_default_config() {
        let temp = TempDir::new().unwrap();
        let (ctx, _) = context_in(temp.path(), &["send2outlook", "commands"]);
        assert!(ctx.paths.global_config.exists());
    }
}
