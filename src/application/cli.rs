use std::env;
use std::io;
use std::path;

use anyhow::bail;
use anyhow::Result;
use clap::value_parser;
use clap::Arg;
use clap::ArgAction;
use clap::ArgMatches;
use clap::Command;
use clap_complete::generate;
use clap_complete::Generator;
use clap_complete::Shell;
use strum::VariantNames;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use yansi::Paint;

use crate::configuration::Config;
use crate::configuration::ConfigKey;
use crate::domain::services::actions::help_text;

/// What the user asked the binary to do once configuration is loaded.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Request {
    Chat,
    Login { email: Option<String> },
    Logout,
    Register {
        email: Option<String>,
        username: Option<String>,
    },
    WhoAmI,
    Health,
    Upload { files: Vec<path::PathBuf> },
    Ask { question: String },
    Clear { confirmation: Option<String> },
}

fn print_completions<G: Generator>(gen: G, cmd: &mut Command) {
    generate(gen, cmd, cmd.get_name().to_string(), &mut io::stdout());
    std::process::exit(0);
}

pub fn log_dir() -> path::PathBuf {
    if let Ok(dir) = env::var("BILLYBOT_LOG_DIR") {
        return path::PathBuf::from(dir);
    }

    return dirs::cache_dir()
        .unwrap_or_else(env::temp_dir)
        .join("billybot");
}

async fn create_config_file() -> Result<()> {
    let config_file_path_str = Config::default(ConfigKey::ConfigFile);
    let config_file_path = path::PathBuf::from(&config_file_path_str);
    if config_file_path.exists() {
        bail!(format!(
            "Config file already exists at {config_file_path_str}"
        ));
    }

    if let Some(parent) = config_file_path.parent() {
        if !parent.exists() {
            fs::create_dir_all(parent).await?;
        }
    }

    let mut file = fs::File::create(&config_file_path).await?;
    file.write_all(Config::serialize_default(build()).as_bytes())
        .await?;

    println!("Created default config file at {config_file_path_str}");
    return Ok(());
}

fn subcommand_completions() -> Command {
    return Command::new("completions")
        .about("Generates shell completions.")
        .arg(
            clap::Arg::new("shell")
                .short('s')
                .long("shell")
                .help("Which shell to generate completions for.")
                .action(ArgAction::Set)
                .value_parser(value_parser!(Shell))
                .required(true),
        );
}

fn subcommand_config() -> Command {
    return Command::new("config")
        .about("Configuration file options.")
        .subcommand(
            Command::new("create").about("Saves the default config file to the configuration file path. This command will fail if the file exists already.")
        )
        .subcommand(
            Command::new("default").about("Outputs the default configuration file to stdout.")
        )
        .subcommand(
            Command::new("path").about("Returns the default path for the configuration file.")
        );
}

fn subcommand_debug() -> Command {
    return Command::new("debug")
        .about("Debug helpers for BillyBot")
        .hide(true)
        .subcommand(
            Command::new("log-path").about("Output path to debug log file generated when running BillyBot with environment variable RUST_LOG=billybot")
        )
        .subcommand(
            Command::new("enum-config").about("List all config keys as strings.")
        );
}

fn arg_email() -> Arg {
    return Arg::new("email")
        .short('u')
        .long("email")
        .num_args(1)
        .help("Account email. Prompted for when omitted.");
}

fn subcommand_register() -> Command {
    return Command::new("register")
        .about("Creates a new account. Does not log you in.")
        .arg(arg_email())
        .arg(
            Arg::new("username")
                .long("username")
                .num_args(1)
                .help("Optional display name for the new account."),
        );
}

fn subcommand_upload() -> Command {
    return Command::new("upload")
        .about("Uploads PDF files to the knowledge base. Anything that isn't a PDF is skipped.")
        .arg(
            Arg::new("files")
                .help("Paths of the PDF files to upload.")
                .num_args(1..)
                .value_parser(value_parser!(path::PathBuf))
                .required(true),
        );
}

fn subcommand_ask() -> Command {
    return Command::new("ask")
        .about("Asks a single question against the knowledge base.")
        .arg(
            Arg::new("question")
                .help("The question to ask.")
                .num_args(1..)
                .required(true),
        );
}

fn subcommand_clear() -> Command {
    return Command::new("clear")
        .about("Deletes everything stored in the knowledge base.")
        .arg(
            Arg::new("confirm")
                .long("confirm")
                .num_args(1)
                .help("Pass DELETE to skip the confirmation prompt."),
        );
}

fn config_arg(key: ConfigKey, help: String) -> Arg {
    let env_name = format!(
        "BILLYBOT_{}",
        key.to_string().to_uppercase().replace('-', "_")
    );

    return Arg::new(key.to_string())
        .long(key.to_string())
        .env(env_name)
        .num_args(1)
        .help(help)
        .global(true);
}

fn config_args() -> Vec<Arg> {
    return vec![
        config_arg(
            ConfigKey::BackendURL,
            format!(
                "Base URL of the BillyBot backend. [default: {}]",
                Config::default(ConfigKey::BackendURL)
            ),
        ),
        config_arg(
            ConfigKey::BackendTimeout,
            format!(
                "Time to wait in milliseconds before timing out a backend request. [default: {}]",
                Config::default(ConfigKey::BackendTimeout)
            ),
        ),
        config_arg(
            ConfigKey::UploadTimeout,
            format!(
                "Time to wait in milliseconds before timing out an upload. Never less than 60000. [default: {}]",
                Config::default(ConfigKey::UploadTimeout)
            ),
        ),
        config_arg(
            ConfigKey::CredentialsFile,
            format!(
                "Path to the file holding the login token. [default: {}]",
                Config::default(ConfigKey::CredentialsFile)
            ),
        ),
        config_arg(
            ConfigKey::PersistDir,
            format!(
                "Storage location for the knowledge base on the backend. [default: {}]",
                Config::default(ConfigKey::PersistDir)
            ),
        ),
        config_arg(
            ConfigKey::EmbeddingModel,
            format!(
                "Model used to embed documents. [default: {}]",
                Config::default(ConfigKey::EmbeddingModel)
            ),
        ),
        config_arg(
            ConfigKey::LlmModel,
            format!(
                "Model used to answer questions. [default: {}]",
                Config::default(ConfigKey::LlmModel)
            ),
        ),
        config_arg(
            ConfigKey::TopK,
            format!(
                "Number of chunks retrieved per question, between 1 and 10. [default: {}]",
                Config::default(ConfigKey::TopK)
            ),
        ),
        config_arg(
            ConfigKey::ChunkSize,
            format!(
                "Characters per chunk when splitting documents. [default: {}]",
                Config::default(ConfigKey::ChunkSize)
            ),
        ),
        config_arg(
            ConfigKey::ChunkOverlap,
            format!(
                "Characters shared between neighbouring chunks. Must be smaller than chunk-size. [default: {}]",
                Config::default(ConfigKey::ChunkOverlap)
            ),
        ),
    ];
}

pub fn build() -> Command {
    let commands_text = help_text()
        .split('\n')
        .map(|line| {
            if line.starts_with('-') {
                return format!("  {line}");
            }
            if line.starts_with("COMMANDS:") {
                return Paint::new(format!("CHAT {line}"))
                    .underline()
                    .bold()
                    .to_string();
            }
            return line.to_string();
        })
        .collect::<Vec<String>>()
        .join("\n");

    let about = format!(
        "{}\n\nVersion: {}\nBuilt: {}",
        env!("CARGO_PKG_DESCRIPTION"),
        env!("CARGO_PKG_VERSION"),
        env!("VERGEN_BUILD_DATE")
    );

    return Command::new("billybot")
        .about(about)
        .author(env!("CARGO_PKG_AUTHORS"))
        .version(env!("CARGO_PKG_VERSION"))
        .after_help(commands_text)
        .arg_required_else_help(false)
        .subcommand(Command::new("chat").about("Starts an interactive session. This is the default."))
        .subcommand(
            Command::new("login")
                .about("Logs in and stores the token for later runs.")
                .arg(arg_email()),
        )
        .subcommand(Command::new("logout").about("Logs out and removes the stored token."))
        .subcommand(subcommand_register())
        .subcommand(Command::new("whoami").about("Shows who the stored token belongs to."))
        .subcommand(Command::new("health").about("Checks whether the backend is running."))
        .subcommand(subcommand_upload())
        .subcommand(subcommand_ask())
        .subcommand(subcommand_clear())
        .subcommand(subcommand_completions())
        .subcommand(subcommand_config())
        .subcommand(subcommand_debug())
        .arg(
            Arg::new(ConfigKey::ConfigFile.to_string())
                .short('c')
                .long(ConfigKey::ConfigFile.to_string())
                .env("BILLYBOT_CONFIG_FILE")
                .num_args(1)
                .help(format!("Path to configuration file [default: {}]", Config::default(ConfigKey::ConfigFile)))
                .global(true)
        )
        .args(config_args());
}

fn request_from(name: &str, matches: &ArgMatches) -> Request {
    let text = |id: &str| {
        return matches.get_one::<String>(id).map(|e| return e.to_string());
    };

    match name {
        "login" => return Request::Login { email: text("email") },
        "logout" => return Request::Logout,
        "register" => {
            return Request::Register {
                email: text("email"),
                username: text("username"),
            };
        }
        "whoami" => return Request::WhoAmI,
        "health" => return Request::Health,
        "upload" => {
            let files = matches
                .get_many::<path::PathBuf>("files")
                .map(|e| return e.cloned().collect::<Vec<path::PathBuf>>())
                .unwrap_or_default();
            return Request::Upload { files };
        }
        "ask" => {
            let question = matches
                .get_many::<String>("question")
                .map(|e| return e.cloned().collect::<Vec<String>>().join(" "))
                .unwrap_or_default();
            return Request::Ask { question };
        }
        "clear" => {
            return Request::Clear {
                confirmation: text("confirm"),
            };
        }
        _ => return Request::Chat,
    }
}

/// Parses arguments and loads configuration. Returns `None` when the command
/// was fully handled here.
pub async fn parse() -> Result<Option<Request>> {
    let matches = build().get_matches();

    match matches.subcommand() {
        Some(("debug", debug_matches)) => {
            match debug_matches.subcommand() {
                Some(("log-path", _)) => {
                    println!("{}", log_dir().join("debug.log").to_string_lossy());
                }
                Some(("enum-config", _)) => {
                    println!("{}", ConfigKey::VARIANTS.join("\n"));
                }
                _ => {
                    subcommand_debug().print_long_help()?;
                }
            }

            return Ok(None);
        }
        Some(("completions", subcmd_matches)) => {
            if let Some(completions) = subcmd_matches.get_one::<Shell>("shell").copied() {
                let mut app = build();
                print_completions(completions, &mut app);
            }
            return Ok(None);
        }
        Some(("config", subcmd_matches)) => match subcmd_matches.subcommand() {
            Some(("create", _)) => {
                create_config_file().await?;
                return Ok(None);
            }
            Some(("default", _)) => {
                println!("{}", Config::serialize_default(build()));
                return Ok(None);
            }
            Some(("path", _)) => {
                println!("{}", Config::default(ConfigKey::ConfigFile));
                return Ok(None);
            }
            _ => {
                subcommand_config().print_long_help()?;
                return Ok(None);
            }
        },
        Some((name, subcmd_matches)) => {
            Config::load(vec![&matches, subcmd_matches]).await?;
            return Ok(Some(request_from(name, subcmd_matches)));
        }
        None => {
            Config::load(vec![&matches]).await?;
            return Ok(Some(Request::Chat));
        }
    }
}
