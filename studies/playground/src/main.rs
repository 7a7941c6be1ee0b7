use std::{ fs::{ self, File }, path::{ Path, PathBuf }, sync::Mutex };

use clap::{ Args, Parser, Subcommand };
use color_eyre::{ eyre::eyre, Result };
use tracing_subscriber::EnvFilter;

use playground::codegen::{ self, Framework };
use playground::contact::{ ContactChannel, ContactForm, EmailJsTransport };
use playground::params::{ Activation, Dataset, ModelType, Optimizer, Parameters };
use playground::scheduler::ThreadScheduler;
use playground::site::{ ProjectCatalog, ProjectLookup, Route };
use playground::{ dashboard, lock, start_training, PlaygroundConfig, Session, TrainingStatus };

#[derive(Parser)]
#[command(name = "playground")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Interactive machine learning playground", long_about = None)]
struct Cli {
    /// JSON configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the terminal dashboard (default)
    Tui {
        /// Where logs go while the terminal is taken over
        #[arg(long, default_value = "playground.log")]
        log_file: PathBuf,
    },

    /// Run one simulated training and print the metrics of every epoch
    Train {
        #[command(flatten)]
        params: ParamArgs,

        /// Print the final session snapshot as JSON
        #[arg(long)]
        json: bool,
    },

    /// Write the generated model code
    Export {
        #[command(flatten)]
        params: ParamArgs,

        #[arg(short, long, value_enum, default_value_t = Framework::Tensorflow)]
        framework: Framework,

        /// Output file or directory; stdout when omitted
        #[arg(short, long)]
        out: Option<PathBuf>,
    },

    /// Send the contact form
    Contact {
        #[arg(long)]
        name: String,

        #[arg(long)]
        email: String,

        #[arg(long)]
        message: String,
    },

    /// Resolve a portfolio path
    Route {
        path: String,
    },
}

/// Overrides on top of the configured parameters.
#[derive(Args, Debug, Default)]
struct ParamArgs {
    #[arg(long)]
    learning_rate: Option<f64>,

    #[arg(long)]
    epochs: Option<u32>,

    #[arg(long)]
    batch_size: Option<u32>,

    #[arg(long, value_enum)]
    optimizer: Option<Optimizer>,

    /// Hidden layer widths, e.g. 128,64
    #[arg(long, value_delimiter = ',')]
    layers: Option<Vec<u32>>,

    #[arg(long, value_enum)]
    activation: Option<Activation>,

    #[arg(long)]
    dropout: Option<f64>,

    #[arg(long, value_enum)]
    dataset: Option<Dataset>,

    #[arg(long, value_enum)]
    model_type: Option<ModelType>,

    /// Milliseconds per simulated epoch
    #[arg(long)]
    tick_ms: Option<u64>,
}

impl ParamArgs {
    fn apply(&self, config: &mut PlaygroundConfig) -> Result<()> {
        let p = &mut config.parameters;
        if let Some(lr) = self.learning_rate {
            p.learning_rate = lr;
        }
        if let Some(epochs) = self.epochs {
            p.epochs = epochs;
        }
        if let Some(batch) = self.batch_size {
            p.batch_size = batch;
        }
        if let Some(optimizer) = self.optimizer {
            p.optimizer = optimizer;
        }
        if let Some(layers) = &self.layers {
            p.neuron_layers = layers.clone();
        }
        if let Some(activation) = self.activation {
            p.activation_function = activation;
        }
        if let Some(dropout) = self.dropout {
            p.dropout = dropout;
        }
        if let Some(dataset) = self.dataset {
            p.dataset = dataset;
        }
        if let Some(model_type) = self.model_type {
            p.model_type = model_type;
        }
        if let Some(ms) = self.tick_ms {
            config.tick_interval_ms = ms;
        }
        config.validate()?;
        Ok(())
    }
}

fn init_tracing(log_file: Option<&Path>) -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| "playground=info,ui=info".into());
    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    match log_file {
        Some(path) => {
            let file = File::create(path)?;
            builder.with_writer(Mutex::new(file)).with_ansi(false).init();
        }
        None => builder.with_writer(std::io::stderr).init(),
    }
    Ok(())
}

fn main() -> Result<()> {
    color_eyre::install()?;
    let cli = Cli::parse();
    let command = cli.command.unwrap_or(Commands::Tui { log_file: PathBuf::from("playground.log") });

    match &command {
        Commands::Tui { log_file } => init_tracing(Some(log_file))?,
        _ => init_tracing(None)?,
    }
    let mut config = PlaygroundConfig::load(cli.config.as_deref())?;

    match command {
        Commands::Tui { .. } => dashboard::run(&config),
        Commands::Train { params, json } => {
            params.apply(&mut config)?;
            cmd_train(&config, json)
        }
        Commands::Export { params, framework, out } => {
            params.apply(&mut config)?;
            cmd_export(&config.parameters, framework, out.as_deref())
        }
        Commands::Contact { name, email, message } => cmd_contact(&config, ContactForm::new(name, email, message)),
        Commands::Route { path } => {
            cmd_route(&path);
            Ok(())
        }
    }
}

fn cmd_train(config: &PlaygroundConfig, json: bool) -> Result<()> {
    let session = Session::from_config(config)?.into_shared();
    let updates = lock(&session).subscribe();
    start_training(&session, &ThreadScheduler)?;

    let mut printed = 0;
    for snapshot in updates {
        let training = &snapshot.training;
        if training.status == TrainingStatus::Training && training.current_epoch > printed {
            printed = training.current_epoch;
            let m = &training.metrics;
            if !json {
                println!(
                    "epoch {:>2}/{}  accuracy {:.3}  loss {:.3}  precision {:.3}  recall {:.3}  f1 {:.3}",
                    training.current_epoch,
                    training.total_epochs,
                    m.accuracy,
                    m.loss,
                    m.precision,
                    m.recall,
                    m.f1_score
                );
            }
        }
        if training.status.is_finished() {
            if json {
                println!("{}", serde_json::to_string_pretty(&snapshot)?);
            } else if let Some(reason) = &training.failure {
                println!("Training Failed: {reason}");
            } else {
                let m = &training.metrics;
                println!(
                    "Training Complete  accuracy {:.3}  loss {:.3}  precision {:.3}  recall {:.3}  f1 {:.3}",
                    m.accuracy,
                    m.loss,
                    m.precision,
                    m.recall,
                    m.f1_score
                );
            }
            return Ok(());
        }
    }
    Err(eyre!("training stopped before completing"))
}

fn cmd_export(params: &Parameters, framework: Framework, out: Option<&Path>) -> Result<()> {
    let code = codegen::generate(params, framework);
    let Some(out) = out else {
        print!("{code}");
        return Ok(());
    };
    let path = if out.is_dir() { out.join(codegen::file_name(params, framework)) } else { out.to_path_buf() };
    fs::write(&path, code)?;
    tracing::info!(path = %path.display(), %framework, "code exported");
    println!("File saved as {}", path.display());
    Ok(())
}

fn cmd_contact(config: &PlaygroundConfig, form: ContactForm) -> Result<()> {
    // report field errors before asking for credentials
    form.validate().map_err(|errors| eyre!("Please fix the errors in the form: {errors}"))?;

    let mut channel = ContactChannel::new(EmailJsTransport::new(config.contact.clone())?);
    channel.form = form;
    let result = channel.submit();
    for line in channel.log() {
        println!("> {}", line.text);
    }
    result?;
    println!("Message sent successfully! I'll get back to you soon.");
    Ok(())
}

fn cmd_route(path: &str) {
    match Route::parse(path) {
        Route::Project(id) =>
            match ProjectCatalog::new().lookup(&id) {
                ProjectLookup::Found(project) => {
                    println!("project {}: {}", project.id, project.name);
                    println!("{}", project.brief);
                }
                ProjectLookup::NotFound { back } => {
                    println!("Project Not Found (back to {back})");
                }
            }
        Route::NotFound(path) => println!("not found: {path}"),
        route => println!("{route:?} ({route})"),
    }
}
