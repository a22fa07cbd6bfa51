use std::{
    fs,
    io::{self, IsTerminal},
    path::{Path, PathBuf},
};

use anyhow::{Context, anyhow};
use clap::{Parser, Subcommand};
use serde_json::Value as JsonValue;

use crate::configurator::{StageConfigurator, configure_stage};
use crate::error::OnboardError;
use crate::onboard::{OnboardOptions, run_onboarding};
use crate::onboard_log;
use crate::platform::PlatformSession;
use crate::report::{Report, ReportFormat};
use crate::secret_prompt::{FixedSecret, SecretSource, TerminalPrompt};
use crate::settings::{self, ENV_SHOPIFY_SECRET, OnboardSettings};
use crate::validation::validate_configurator;

#[derive(Parser)]
#[command(name = "stage-onboard")]
#[command(
    about = "Install a configured linked2 stage for a customer and print the webhook to register",
    version
)]
pub struct Cli {
    #[arg(long, global = true, help = "Settings file (default: platform config dir).")]
    config: Option<PathBuf>,
    #[arg(long, global = true, conflicts_with = "quiet")]
    verbose: bool,
    #[arg(long, global = true)]
    quiet: bool,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    #[command(about = "Authenticate, fill the product configurator and install the stage")]
    Run(RunArgs),
    #[command(about = "List the products available to the configured client")]
    Products,
    #[command(about = "Print the configurator template for a product")]
    Configurator(ConfiguratorArgs),
    #[command(about = "Validate a filled configurator against a template schema offline")]
    Validate(ValidateArgs),
    #[command(about = "Write a settings template to the config path")]
    Init(InitArgs),
}

#[derive(Parser)]
struct RunArgs {
    #[arg(long, help = "Product id (default: product_id from settings).")]
    product: Option<String>,
    #[arg(
        long,
        env = ENV_SHOPIFY_SECRET,
        hide_env_values = true,
        help = "Shopify shared secret; prompted for when omitted."
    )]
    shopify_secret: Option<String>,
    #[arg(long, help = "Install even if the filled configurator violates the schema.")]
    skip_validation: bool,
    #[arg(long, help = "Print one JSON summary instead of the step dump.")]
    json: bool,
}

#[derive(Parser)]
struct ConfiguratorArgs {
    #[arg(long)]
    product: Option<String>,
    #[arg(long, help = "Print the configurator with settings applied (schema stripped).")]
    filled: bool,
}

#[derive(Parser)]
struct ValidateArgs {
    #[arg(long, help = "Configurator template JSON (as returned by the platform).")]
    template: PathBuf,
    #[arg(long, help = "Filled configurator JSON; defaults to the template filled from settings.")]
    filled: Option<PathBuf>,
}

#[derive(Parser)]
struct InitArgs {
    #[arg(long)]
    force: bool,
}

impl Cli {
    pub fn run(self) -> anyhow::Result<()> {
        onboard_log::init(onboard_log::Level::from_flags(self.quiet, self.verbose))?;
        let config = self.config.as_deref();
        match self.command {
            Command::Run(args) => args.run(config),
            Command::Products => run_products(config),
            Command::Configurator(args) => args.run(config),
            Command::Validate(args) => args.run(config),
            Command::Init(args) => args.run(config),
        }
    }
}

impl RunArgs {
    fn run(self, config: Option<&Path>) -> anyhow::Result<()> {
        let settings = OnboardSettings::load(config)?;
        settings.require_complete()?;
        let product_id = resolve_product(self.product, &settings)?;
        let validate = settings.validation.enabled && !self.skip_validation;

        let mut secrets: Box<dyn SecretSource> = match self.shopify_secret {
            Some(value) => Box::new(FixedSecret::new(value)),
            None if io::stdin().is_terminal() => Box::new(TerminalPrompt::default()),
            None => {
                return Err(OnboardError::Prompt(format!(
                    "no Shopify shared secret given and stdin is not a terminal; pass --shopify-secret or set {ENV_SHOPIFY_SECRET}"
                ))
                .into());
            }
        };

        let format = if self.json {
            ReportFormat::Json
        } else {
            ReportFormat::Human
        };
        let mut report = Report::new(io::stdout().lock(), format);
        let options = OnboardOptions {
            product_id,
            validate,
        };
        let outcome = run_onboarding(&settings, &options, secrets.as_mut(), &mut report)?;
        onboard_log::info(
            module_path!(),
            format!(
                "onboarding finished steps={} notification={}",
                outcome.steps.len(),
                outcome
                    .notification
                    .as_ref()
                    .map(|note| note.note_type.as_str())
                    .unwrap_or("none")
            ),
        );
        Ok(())
    }
}

fn run_products(config: Option<&Path>) -> anyhow::Result<()> {
    let settings = OnboardSettings::load(config)?;
    settings.require_credentials()?;
    let session = PlatformSession::authenticate(&settings.platform, &settings.credentials)?;
    let products = session.list_products()?;
    Report::new(io::stdout().lock(), ReportFormat::Json).value(&products)?;
    Ok(())
}

impl ConfiguratorArgs {
    fn run(self, config: Option<&Path>) -> anyhow::Result<()> {
        let settings = OnboardSettings::load(config)?;
        settings.require_credentials()?;
        let product_id = resolve_product(self.product, &settings)?;
        let session = PlatformSession::authenticate(&settings.platform, &settings.credentials)?;
        let template = session.fetch_configurator(&product_id)?;
        let mut report = Report::new(io::stdout().lock(), ReportFormat::Json);
        if self.filled {
            report.value(&configure_stage(&template, &settings.stage).sections())?;
        } else {
            report.value(&template)?;
        }
        Ok(())
    }
}

impl ValidateArgs {
    fn run(self, config: Option<&Path>) -> anyhow::Result<()> {
        let template: StageConfigurator = serde_json::from_value(read_json(&self.template)?)
            .with_context(|| format!("{} is not a stage configurator", self.template.display()))?;
        let instance = match &self.filled {
            Some(path) => read_json(path)?,
            None => {
                let settings = OnboardSettings::load(config)?;
                configure_stage(&template, &settings.stage).sections()
            }
        };
        validate_configurator(&template.schema, &instance)?;
        println!("stage configurator is valid");
        Ok(())
    }
}

impl InitArgs {
    fn run(self, config: Option<&Path>) -> anyhow::Result<()> {
        let path = match config {
            Some(path) => path.to_path_buf(),
            None => settings::settings_path()?,
        };
        settings::write_settings_template(&path, self.force)?;
        println!("wrote {}", path.display());
        Ok(())
    }
}

fn resolve_product(flag: Option<String>, settings: &OnboardSettings) -> anyhow::Result<String> {
    flag.or_else(|| settings.product_id.clone())
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
        .ok_or_else(|| {
            anyhow!(OnboardError::Config(
                "no product id: pass --product or set product_id in settings".to_string()
            ))
        })
}

fn read_json(path: &Path) -> anyhow::Result<JsonValue> {
    let contents =
        fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))?;
    serde_json::from_str(&contents).with_context(|| format!("invalid JSON in {}", path.display()))
}
