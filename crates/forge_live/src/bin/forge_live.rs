use std::fs;
use std::io::Read;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::{ArgAction, Args, Parser, Subcommand};
use forge_core::context::{with_context, Context, DEFAULT_CONFIG_FILE};
use forge_core::sink::{Color, PresentationSink};
use forge_core::tracking;
use forge_live::adapters::function::AwsFunctionService;
use forge_live::adapters::identity::AwsIdentityService;
use forge_live::adapters::load_sdk_config;
use forge_live::adapters::queue::AwsQueueService;
use forge_live::broker::LIVE_QUEUE_NAME;
use forge_live::logging::init_logging;
use forge_live::printer::ConsolePrinter;
use forge_live::prompt::DialoguerPrompt;
use forge_live::session::{LiveServices, PublishOutcome};
use forge_live::source::{open_source, EventSourceKind, LiveEventSource};
use serde_json::Value;
use tracing::info;

// ── CLI definition ─────────────────────────────────────────────────

#[derive(Parser)]
#[command(
    name = "forge_live",
    about = "Exercise a deployed function against a live queue trigger",
    long_about = "Provisions an ephemeral queue, binds it to an already deployed\n\
                  function and publishes interactively composed messages to it."
)]
struct Cli {
    /// Project configuration document
    #[arg(long, env = "FORGE_CONFIG", default_value = DEFAULT_CONFIG_FILE, global = true)]
    config: PathBuf,
    /// Deployment stage
    #[arg(long, env = "FORGE_STAGE", default_value = "dev", global = true)]
    stage: String,
    /// Resource group to resolve from the configuration
    #[arg(long, env = "FORGE_RESOURCES", default_value = "dev", global = true)]
    resources: String,
    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Bind the live queue to a deployed function
    Subscribe {
        /// Function name or ARN
        #[arg(long)]
        function: String,
        /// Display label for the function
        #[arg(long, default_value = "live")]
        label: String,
        #[command(flatten)]
        live: LiveArgs,
    },
    /// Compose a message and publish it to the live queue
    Publish {
        /// Message attributes as a JSON object
        #[arg(long)]
        attributes: Option<String>,
        #[command(flatten)]
        live: LiveArgs,
    },
    /// Reshape a captured trigger event for inspection (reads stdin without a file)
    Parse {
        event: Option<PathBuf>,
        #[arg(long, value_enum, default_value_t = EventSourceKind::Sqs)]
        source: EventSourceKind,
    },
    /// Print the resolved context
    Context,
}

#[derive(Args)]
struct LiveArgs {
    /// Event source to drive
    #[arg(long, value_enum, default_value_t = EventSourceKind::Sqs)]
    source: EventSourceKind,
    /// Name of the ephemeral queue
    #[arg(long, env = "FORGE_LIVE_QUEUE", default_value = LIVE_QUEUE_NAME)]
    queue_name: String,
}

enum LiveAction {
    Subscribe { function: String, label: String },
    Publish { attributes: Option<String> },
}

// ── commands ───────────────────────────────────────────────────────

fn run_live(context: &Context, live: &LiveArgs, action: LiveAction) -> ExitCode {
    let printer = ConsolePrinter::new();
    let sdk_config = load_sdk_config(context.region());
    let queues = AwsQueueService::new(&sdk_config);
    let functions = AwsFunctionService::new(&sdk_config);
    let identity = AwsIdentityService::new(&sdk_config);
    let services = LiveServices {
        queues: &queues,
        functions: &functions,
        identity: &identity,
    };

    let source = match open_source(live.source, context, &live.queue_name, services, &printer) {
        Ok(source) => source,
        Err(error) => {
            printer.print(
                &format!("Failed to open live {} session: {error}", live.source.as_str()),
                Color::Red,
                0,
                0,
            );
            return ExitCode::FAILURE;
        }
    };

    let succeeded = match action {
        LiveAction::Subscribe { function, label } => {
            source.subscribe(&function, &label).is_subscribed()
        }
        LiveAction::Publish { attributes } => matches!(
            source.publish(attributes.as_deref(), &DialoguerPrompt),
            PublishOutcome::Published { .. }
        ),
    };
    printer.finish();
    report_tracked(source.as_ref());

    if succeeded {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}

fn report_tracked(source: &dyn LiveEventSource) {
    for entry in tracking::tracked() {
        info!(
            source = source.kind().as_str(),
            kind = %entry.kind,
            id = %entry.id,
            "live resource in use"
        );
    }
}

fn run_context(context: &Context) -> ExitCode {
    let printer = ConsolePrinter::new();
    printer.show_banner("Context");
    printer.print(&context.to_string(), Color::White, 1, 1);
    for name in context.resources().keys() {
        for arn in context.resource_arns(name) {
            printer.print(&format!("{name}: {arn}"), Color::Gray, 0, 0);
        }
    }
    ExitCode::SUCCESS
}

fn run_parse(event: Option<PathBuf>, source: EventSourceKind) -> ExitCode {
    let printer = ConsolePrinter::new();
    let raw = match event {
        Some(path) => {
            fs::read_to_string(&path).map_err(|error| format!("{}: {error}", path.display()))
        }
        None => {
            let mut buffer = String::new();
            std::io::stdin()
                .read_to_string(&mut buffer)
                .map(|_| buffer)
                .map_err(|error| format!("stdin: {error}"))
        }
    };

    let reshaped = raw
        .and_then(|raw| serde_json::from_str::<Value>(&raw).map_err(|error| error.to_string()))
        .and_then(|event| source.reshape(&event).map_err(|error| error.to_string()))
        .and_then(|envelope| {
            serde_json::to_string_pretty(&envelope).map_err(|error| error.to_string())
        });

    match reshaped {
        Ok(rendered) => {
            println!("{rendered}");
            ExitCode::SUCCESS
        }
        Err(error) => {
            printer.print(&format!("Failed to parse event: {error}"), Color::Red, 0, 0);
            ExitCode::FAILURE
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    if let Err(error) = init_logging(cli.verbose) {
        eprintln!("{error}");
    }

    let Cli {
        config,
        stage,
        resources,
        command,
        ..
    } = cli;

    let outcome = match command {
        Commands::Parse { event, source } => return run_parse(event, source),
        Commands::Context => with_context(&config, &stage, &resources, |context| {
            run_context(&context)
        }),
        Commands::Subscribe {
            function,
            label,
            live,
        } => with_context(&config, &stage, &resources, |context| {
            run_live(&context, &live, LiveAction::Subscribe { function, label })
        }),
        Commands::Publish { attributes, live } => {
            with_context(&config, &stage, &resources, |context| {
                run_live(&context, &live, LiveAction::Publish { attributes })
            })
        }
    };

    match outcome {
        Ok(code) => code,
        Err(error) => {
            ConsolePrinter::new().print(&error.to_string(), Color::Red, 0, 0);
            ExitCode::FAILURE
        }
    }
}
