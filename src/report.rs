use std::io::Write;

use serde::Serialize;
use serde_json::{Value, json};

use crate::configurator::{FilledConfigurator, StageConfigurator};
use crate::error::Result;
use crate::platform::{InstalledStage, Notification, Product};

const RULE: &str =
    "===========================================================================";

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum ReportFormat {
    #[default]
    Human,
    Json,
}

/// Console output of an onboarding run.
///
/// In human mode every step is printed as soon as it completes. In JSON mode
/// the step hooks stay silent and [`Report::summary`] prints one document.
pub struct Report<W: Write> {
    out: W,
    format: ReportFormat,
}

impl<W: Write> Report<W> {
    pub fn new(out: W, format: ReportFormat) -> Self {
        Self { out, format }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    pub fn products(&mut self, products: &[Product]) -> Result<()> {
        self.section("Products:", products)
    }

    pub fn configurator(&mut self, template: &StageConfigurator) -> Result<()> {
        self.section("Stage configurator:", template)
    }

    pub fn filled(&mut self, filled: &FilledConfigurator) -> Result<()> {
        self.section("Stage configurator with settings:", &filled.sections())
    }

    pub fn installed(
        &mut self,
        installed: &InstalledStage,
        notification: Option<&Notification>,
    ) -> Result<()> {
        if self.format != ReportFormat::Human {
            return Ok(());
        }
        match notification {
            Some(note) => {
                writeln!(self.out, "{}", note.note_type)?;
                writeln!(self.out, "{}", note.message)?;
            }
            None => writeln!(self.out, "No success notification published yet.")?,
        }
        self.rule()?;
        writeln!(
            self.out,
            "Webhook URL to copy into Shopify: {}",
            installed.webhook_url
        )?;
        writeln!(self.out)?;
        writeln!(self.out, "All installed stage end points:")?;
        writeln!(self.out, "{}", pretty(installed))?;
        Ok(())
    }

    /// Final document for JSON mode; a no-op for human output.
    pub fn summary(
        &mut self,
        product_id: &str,
        installed: &InstalledStage,
        notification: Option<&Notification>,
    ) -> Result<()> {
        if self.format != ReportFormat::Json {
            return Ok(());
        }
        let doc = json!({
            "productId": product_id,
            "webhookUrl": installed.webhook_url,
            "notification": notification,
            "installedStage": installed,
        });
        writeln!(self.out, "{}", pretty(&doc))?;
        Ok(())
    }

    /// Print a standalone JSON value regardless of format (used by the
    /// single-step subcommands).
    pub fn value<T: Serialize + ?Sized>(&mut self, value: &T) -> Result<()> {
        writeln!(self.out, "{}", pretty(value))?;
        Ok(())
    }

    fn section<T: Serialize + ?Sized>(&mut self, title: &str, value: &T) -> Result<()> {
        if self.format != ReportFormat::Human {
            return Ok(());
        }
        writeln!(self.out, "{title}")?;
        writeln!(self.out, "{}", pretty(value))?;
        self.rule()
    }

    fn rule(&mut self) -> Result<()> {
        writeln!(self.out)?;
        writeln!(self.out, "{RULE}")?;
        writeln!(self.out)?;
        Ok(())
    }
}

fn pretty<T: Serialize + ?Sized>(value: &T) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|_| Value::Null.to_string())
}
