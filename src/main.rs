//! Herald CLI entry point.
//!
//! Provides `check`, `classify`, `send-sms` and `send-email` subcommands for
//! inspecting the assembled pipelines and sending one-off messages.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use tracing::{debug, info};

use herald::addressing::{AddressRole, PhoneNumberTranslator};
use herald::builder::{AssemblyReport, MessagingBuilder, MessagingService};
use herald::config::{default_config_path, load_config, HeraldConfig};
use herald::message::{Content, Email, Sms, TemplateContent};

/// Herald: outbound SMS and email through condition-gated transports.
#[derive(Parser)]
#[command(name = "herald", version, about)]
struct Cli {
    /// Config file (default: ~/.herald/herald.toml).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log messages instead of failing when no transport matches.
    #[arg(long, global = true)]
    dry_run: bool,

    /// Write JSON logs to this directory in addition to stderr.
    #[arg(long, global = true)]
    log_dir: Option<PathBuf>,

    /// Subcommand to execute.
    #[command(subcommand)]
    command: Command,
}

/// Available CLI subcommands.
#[derive(Subcommand)]
enum Command {
    /// Assemble the pipelines and print what was registered.
    Check,
    /// Classify a phone number with the configured rules.
    Classify {
        /// Raw phone number or sender ID.
        number: String,
        /// Address role whose rules apply.
        #[arg(long, value_enum, default_value_t = Role::Recipient)]
        role: Role,
    },
    /// Send an SMS.
    SendSms {
        /// Recipient number (repeatable).
        #[arg(long, required = true)]
        to: Vec<String>,
        /// Sender number or ID; filled from properties when omitted.
        #[arg(long)]
        from: Option<String>,
        #[command(flatten)]
        body: BodyArgs,
    },
    /// Send an email.
    SendEmail {
        /// Recipient address (repeatable).
        #[arg(long, required = true)]
        to: Vec<String>,
        /// Subject line; filled from properties when omitted.
        #[arg(long)]
        subject: Option<String>,
        /// Sender address; filled from properties when omitted.
        #[arg(long)]
        from: Option<String>,
        #[command(flatten)]
        body: BodyArgs,
    },
}

/// Message body options.
#[derive(clap::Args)]
struct BodyArgs {
    /// Literal text.
    #[arg(long, conflicts_with = "template")]
    text: Option<String>,
    /// Template name, resolved with the configured prefix and suffix.
    #[arg(long)]
    template: Option<String>,
    /// Template variable as `key=value` (repeatable).
    #[arg(long = "var", value_parser = parse_variable)]
    variables: Vec<(String, String)>,
}

#[derive(Clone, Copy, ValueEnum)]
enum Role {
    Sender,
    Recipient,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let (mut config, base_dir) = resolve_config(cli.config.as_deref())?;
    config.dry_run |= cli.dry_run;

    let _logging_guard = herald::logging::init(&config.logging, cli.log_dir.as_deref())?;
    debug!(base_dir = %base_dir.display(), dry_run = config.dry_run, "configuration loaded");

    match cli.command {
        Command::Check => handle_check(&config, &base_dir),
        Command::Classify { number, role } => handle_classify(&config, &number, role),
        Command::SendSms { to, from, body } => {
            let sms = Sms {
                content: body.into_content()?,
                from: from.map(Into::into),
                to: to.into_iter().map(Into::into).collect(),
            };
            let (service, _) = assemble(&config, &base_dir)?;
            service.send(sms).await.context("failed to send sms")?;
            info!("sms sent");
            Ok(())
        }
        Command::SendEmail {
            to,
            subject,
            from,
            body,
        } => {
            let email = Email {
                content: body.into_content()?,
                subject,
                from,
                to,
                cc: Vec::new(),
                bcc: Vec::new(),
            };
            let (service, _) = assemble(&config, &base_dir)?;
            service.send(email).await.context("failed to send email")?;
            info!("email sent");
            Ok(())
        }
    }
}

/// Load the config file, falling back to defaults when the default path is absent.
fn resolve_config(explicit: Option<&Path>) -> anyhow::Result<(HeraldConfig, PathBuf)> {
    let path = match explicit {
        Some(path) => path.to_path_buf(),
        None => {
            let path = default_config_path()?;
            if !path.exists() {
                let cwd = std::env::current_dir().context("failed to read current directory")?;
                return Ok((HeraldConfig::default(), cwd));
            }
            path
        }
    };
    let config =
        load_config(&path).with_context(|| format!("failed to load {}", path.display()))?;
    let base_dir = path
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from("."));
    Ok((config, base_dir))
}

fn assemble(
    config: &HeraldConfig,
    base_dir: &Path,
) -> anyhow::Result<(MessagingService, AssemblyReport)> {
    let env = config.environment(base_dir)?;
    let (service, report) = MessagingBuilder::from_config(config, env)
        .context("invalid messaging configuration")?
        .build()
        .context("invalid messaging configuration")?;
    Ok((service, report))
}

fn handle_check(config: &HeraldConfig, base_dir: &Path) -> anyhow::Result<()> {
    let (_, report) = assemble(config, base_dir)?;
    print!("{report}");
    Ok(())
}

fn handle_classify(config: &HeraldConfig, number: &str, role: Role) -> anyhow::Result<()> {
    let translator = match role {
        Role::Sender => PhoneNumberTranslator::new(AddressRole::Sender, config.sms.sender_rules()),
        Role::Recipient => {
            PhoneNumberTranslator::new(AddressRole::Recipient, config.sms.recipient_rules())
        }
    };
    let addressed = translator
        .translate_raw(number)
        .with_context(|| format!("cannot address '{number}'"))?;
    let rendered = serde_json::to_string_pretty(&addressed)?;
    println!("{rendered}");
    println!(
        "ton={} npi={}",
        addressed.type_of_number.smpp_value(),
        addressed.npi.smpp_value()
    );
    Ok(())
}

impl BodyArgs {
    fn into_content(self) -> anyhow::Result<Content> {
        match (self.text, self.template) {
            (Some(text), None) => Ok(Content::text(text)),
            (None, Some(name)) => Ok(self
                .variables
                .into_iter()
                .fold(TemplateContent::path(name), |template, (key, value)| {
                    template.with_variable(key, value)
                })
                .into()),
            _ => Err(anyhow::anyhow!("exactly one of --text or --template is required")),
        }
    }
}

fn parse_variable(raw: &str) -> Result<(String, String), String> {
    raw.split_once('=')
        .map(|(key, value)| (key.trim().to_owned(), value.to_owned()))
        .filter(|(key, _)| !key.is_empty())
        .ok_or_else(|| format!("expected key=value, got '{raw}'"))
}
