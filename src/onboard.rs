//! The onboarding run: one linear pass from credentials to an installed stage.
//!
//! ```text
//! start -> authenticated -> products-listed -> configurator-fetched
//!       -> configurator-filled -> secret-collected -> (validated)
//!       -> installed -> notification-read -> done
//! ```
//!
//! Any failing step ends the run with its error. Nothing is persisted.

use std::fmt;
use std::io::Write;

use crate::configurator::configure_stage;
use crate::error::Result;
use crate::onboard_log;
use crate::platform::{self, InstalledStage, Notification, PlatformSession, Product};
use crate::report::Report;
use crate::secret_prompt::SecretSource;
use crate::settings::OnboardSettings;
use crate::validation::validate_configurator;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Step {
    Authenticated,
    ProductsListed,
    ConfiguratorFetched,
    ConfiguratorFilled,
    SecretCollected,
    Validated,
    Installed,
    NotificationRead,
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Step::Authenticated => "authenticated",
            Step::ProductsListed => "products-listed",
            Step::ConfiguratorFetched => "configurator-fetched",
            Step::ConfiguratorFilled => "configurator-filled",
            Step::SecretCollected => "secret-collected",
            Step::Validated => "validated",
            Step::Installed => "installed",
            Step::NotificationRead => "notification-read",
        };
        f.write_str(label)
    }
}

#[derive(Clone, Debug)]
pub struct OnboardOptions {
    pub product_id: String,
    /// Gate the install on schema validation.
    pub validate: bool,
}

#[derive(Clone, Debug)]
pub struct OnboardOutcome {
    pub products: Vec<Product>,
    pub installed: InstalledStage,
    pub notification: Option<Notification>,
    pub steps: Vec<Step>,
}

pub fn run_onboarding<W: Write>(
    settings: &OnboardSettings,
    options: &OnboardOptions,
    secrets: &mut dyn SecretSource,
    report: &mut Report<W>,
) -> Result<OnboardOutcome> {
    let mut steps = Vec::new();
    let mut reached = |step: Step| {
        onboard_log::info(module_path!(), format!("step: {step}"));
        steps.push(step);
    };

    let session = PlatformSession::authenticate(&settings.platform, &settings.credentials)?;
    reached(Step::Authenticated);

    let products = session.list_products()?;
    report.products(&products)?;
    onboard_log::debug(module_path!(), format!("{} product(s) available", products.len()));
    match products
        .iter()
        .find(|product| product.id().as_deref() == Some(options.product_id.as_str()))
    {
        Some(product) => onboard_log::info(
            module_path!(),
            format!(
                "installing product {} ({})",
                options.product_id,
                product.name().unwrap_or("unnamed")
            ),
        ),
        None => onboard_log::warn(
            module_path!(),
            format!(
                "product {} is not in the product list; fetching its configurator anyway",
                options.product_id
            ),
        ),
    }
    reached(Step::ProductsListed);

    let template = session.fetch_configurator(&options.product_id)?;
    report.configurator(&template)?;
    reached(Step::ConfiguratorFetched);

    let mut filled = configure_stage(&template, &settings.stage);
    report.filled(&filled)?;
    reached(Step::ConfiguratorFilled);

    filled.attach_shared_secret(secrets.shared_secret()?);
    reached(Step::SecretCollected);

    if options.validate {
        validate_configurator(&template.schema, &filled.sections())?;
        reached(Step::Validated);
    } else {
        onboard_log::warn(module_path!(), "schema validation skipped");
    }

    let installed = session.install_stage(&filled)?;
    onboard_log::info(
        module_path!(),
        format!("stage installed webhook_url={}", installed.webhook_url),
    );
    reached(Step::Installed);

    // The stage is live from here on; a failed read must not hide the webhook.
    let notification = match platform::read_first_notification(
        &session,
        &installed.success_notification_resource,
        &settings.notifications,
    ) {
        Ok(notification) => notification,
        Err(err) => {
            onboard_log::warn(module_path!(), format!("notification read failed: {err}"));
            None
        }
    };
    report.installed(&installed, notification.as_ref())?;
    report.summary(&options.product_id, &installed, notification.as_ref())?;
    reached(Step::NotificationRead);

    Ok(OnboardOutcome {
        products,
        installed,
        notification,
        steps,
    })
}
