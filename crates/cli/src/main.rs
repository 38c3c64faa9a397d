use clap::{Parser, Subcommand};
use lib::messaging::{MessagingClient, ProTalkClient};
use lib::planner::{AuthorityLevel, DelegationPlan, InstructionGenerator};
use lib::session::{Author, ConversationSession, Surface};
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "coach")]
#[command(about = "Delegation coach CLI", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Show version
    Version,

    /// Create the configuration directory and a default config file.
    Init {
        /// Config file path (default: DELEGATION_COACH_CONFIG or ~/.delegation-coach/config.json)
        #[arg(long, short, value_name = "PATH")]
        config: Option<PathBuf>,
    },

    /// Chat with the AI delegation coach (interactive). `/exit` or `/quit` to leave.
    Chat {
        /// Config file path (default: DELEGATION_COACH_CONFIG or ~/.delegation-coach/config.json)
        #[arg(long, short, value_name = "PATH")]
        config: Option<PathBuf>,
    },

    /// Send a single message and print the reply (offline fallback when the API is unavailable).
    Ask {
        /// Config file path (default: DELEGATION_COACH_CONFIG or ~/.delegation-coach/config.json)
        #[arg(long, short, value_name = "PATH")]
        config: Option<PathBuf>,

        /// Conversation id to use (default: a new coach_<millis> id).
        #[arg(long, value_name = "ID")]
        chat_id: Option<String>,

        /// Message text.
        message: String,
    },

    /// Draft a delegation instruction from a plan.
    Plan {
        /// Config file path (default: DELEGATION_COACH_CONFIG or ~/.delegation-coach/config.json)
        #[arg(long, short, value_name = "PATH")]
        config: Option<PathBuf>,

        /// Read the plan from a JSON file (camelCase fields); flags below override its values.
        #[arg(long, value_name = "PATH")]
        file: Option<PathBuf>,

        /// Task name.
        #[arg(long)]
        task: Option<String>,

        /// Why the task matters.
        #[arg(long)]
        purpose: Option<String>,

        /// Deadline.
        #[arg(long)]
        deadline: Option<String>,

        /// Expected result (KPI).
        #[arg(long)]
        goals: Option<String>,

        /// Who the task is delegated to.
        #[arg(long)]
        responsible: Option<String>,

        /// Authority level: all, some or none.
        #[arg(long)]
        authority: Option<AuthorityLevel>,

        /// Checkpoints.
        #[arg(long)]
        checkpoints: Option<String>,
    },
}

#[tokio::main]
async fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Version) => {
            println!("coach {}", env!("CARGO_PKG_VERSION"));
        }
        Some(Commands::Init { config }) => {
            if let Err(e) = run_init(config) {
                log::error!("init failed: {}", e);
                std::process::exit(1);
            }
        }
        Some(Commands::Chat { config }) => {
            if let Err(e) = run_chat(config).await {
                log::error!("chat failed: {:#}", e);
                std::process::exit(1);
            }
        }
        Some(Commands::Ask {
            config,
            chat_id,
            message,
        }) => {
            if let Err(e) = run_ask(config, chat_id, message).await {
                log::error!("ask failed: {:#}", e);
                std::process::exit(1);
            }
        }
        Some(Commands::Plan {
            config,
            file,
            task,
            purpose,
            deadline,
            goals,
            responsible,
            authority,
            checkpoints,
        }) => {
            let overrides = PlanOverrides {
                task,
                purpose,
                deadline,
                goals,
                responsible,
                authority,
                checkpoints,
            };
            if let Err(e) = run_plan(config, file, overrides).await {
                log::error!("plan failed: {:#}", e);
                std::process::exit(1);
            }
        }
        None => {
            println!("Run with --help for usage");
        }
    }
}

fn run_init(config_path: Option<PathBuf>) -> anyhow::Result<()> {
    let path = config_path.unwrap_or_else(lib::config::default_config_path);
    let dir = lib::init::init_config_dir(&path)?;
    println!("initialized configuration at {}", dir.display());
    Ok(())
}

/// Build the bot API client from config file and environment.
fn build_client(config_path: Option<PathBuf>) -> anyhow::Result<ProTalkClient> {
    let (config, path) = lib::config::load_config(config_path)?;
    log::debug!("using config {}", path.display());
    let credentials = lib::config::resolve_credentials(&config);
    let base_url = lib::config::resolve_base_url(&config);
    Ok(ProTalkClient::new(credentials, Some(base_url)))
}

async fn run_chat(config_path: Option<PathBuf>) -> anyhow::Result<()> {
    use std::io::{self, Write};

    let client = build_client(config_path)?;
    let session = ConversationSession::new(Surface::Coach, Arc::new(client));
    log::info!("chat session {}", session.id());

    for turn in session.transcript().await {
        print_turn(turn.author, &turn.body);
    }

    let stdin = io::stdin();
    let mut stdout = io::stdout();
    loop {
        write!(stdout, "> ")?;
        stdout.flush()?;
        let mut line = String::new();
        if stdin.read_line(&mut line)? == 0 {
            break;
        }
        let input = line.trim();
        if input.is_empty() {
            continue;
        }
        if input.eq_ignore_ascii_case("/exit") || input.eq_ignore_ascii_case("/quit") {
            break;
        }
        if let Some(turn) = session.send(input).await {
            print_turn(turn.author, &turn.body);
        }
    }

    Ok(())
}

fn print_turn(author: Author, body: &str) {
    match author {
        Author::Assistant => println!("< {}", body.trim_end()),
        Author::User => println!("> {}", body.trim_end()),
    }
}

async fn run_ask(
    config_path: Option<PathBuf>,
    chat_id: Option<String>,
    message: String,
) -> anyhow::Result<()> {
    if message.trim().is_empty() {
        anyhow::bail!("message is empty");
    }
    let client = build_client(config_path)?;
    let chat_id = chat_id.unwrap_or_else(|| {
        lib::session::ConversationId::generate(Surface::Coach.namespace()).to_string()
    });
    let reply = client.send_message(&chat_id, &message).await;
    println!("{}", reply);
    Ok(())
}

struct PlanOverrides {
    task: Option<String>,
    purpose: Option<String>,
    deadline: Option<String>,
    goals: Option<String>,
    responsible: Option<String>,
    authority: Option<AuthorityLevel>,
    checkpoints: Option<String>,
}

impl PlanOverrides {
    fn apply(self, plan: &mut DelegationPlan) {
        let set = |slot: &mut String, value: Option<String>| {
            if let Some(v) = value {
                *slot = v;
            }
        };
        set(&mut plan.task_name, self.task);
        set(&mut plan.purpose, self.purpose);
        set(&mut plan.deadline, self.deadline);
        set(&mut plan.goals, self.goals);
        set(&mut plan.responsible_person, self.responsible);
        set(&mut plan.checkpoints, self.checkpoints);
        if let Some(a) = self.authority {
            plan.authority_level = a;
        }
    }
}

async fn run_plan(
    config_path: Option<PathBuf>,
    file: Option<PathBuf>,
    overrides: PlanOverrides,
) -> anyhow::Result<()> {
    use anyhow::Context;

    let mut plan = match file {
        Some(path) => {
            let s = std::fs::read_to_string(&path)
                .with_context(|| format!("reading plan from {}", path.display()))?;
            serde_json::from_str::<DelegationPlan>(&s)
                .with_context(|| format!("parsing plan from {}", path.display()))?
        }
        None => DelegationPlan::default(),
    };
    overrides.apply(&mut plan);

    let client = build_client(config_path)?;
    let generator = InstructionGenerator::new(Arc::new(client));
    match generator.generate(&plan).await {
        Some(turn) => println!("{}", turn.body),
        None => anyhow::bail!("instruction generation did not run"),
    }
    Ok(())
}
