use std::thread;
use std::time::Duration;

use crate::error::Result;
use crate::onboard_log;
use crate::platform::session::PlatformSession;
use crate::platform::types::Notification;
use crate::settings::NotificationSettings;

pub const PAGE_SIZE_PLACEHOLDER: &str = "{max}";
const MAX_POLL_INTERVAL: Duration = Duration::from_secs(8);

/// Substitute the page size into a notification resource template.
/// Templates without the placeholder are returned unchanged.
pub fn expand_page_size(resource: &str, page_size: u32) -> String {
    resource.replace(PAGE_SIZE_PLACEHOLDER, &page_size.to_string())
}

/// Read the first notification published for a freshly installed stage.
///
/// Waits `initial_delay_ms`, then reads the resource up to `poll_attempts`
/// times, doubling the pause between empty reads. `Ok(None)` means the
/// platform never published anything within the budget.
pub fn read_first_notification(
    session: &PlatformSession,
    resource: &str,
    settings: &NotificationSettings,
) -> Result<Option<Notification>> {
    if resource.trim().is_empty() {
        onboard_log::warn(module_path!(), "install result has no notification resource");
        return Ok(None);
    }
    let url = session.resolve(&expand_page_size(resource, settings.page_size));
    pause(Duration::from_millis(settings.initial_delay_ms));

    let attempts = settings.poll_attempts.max(1);
    let mut interval = Duration::from_millis(settings.poll_interval_ms);
    for attempt in 1..=attempts {
        let notifications = session.read_notifications(&url)?;
        if let Some(first) = notifications.into_iter().next() {
            onboard_log::debug(
                module_path!(),
                format!("notification found attempt={attempt} type={}", first.note_type),
            );
            return Ok(Some(first));
        }
        if attempt < attempts {
            onboard_log::debug(
                module_path!(),
                format!(
                    "no notification yet attempt={attempt}/{attempts} retry_in={}ms",
                    interval.as_millis()
                ),
            );
            pause(interval);
            interval = (interval * 2).min(MAX_POLL_INTERVAL);
        }
    }

    onboard_log::warn(
        module_path!(),
        format!("no notification published at {url} after {attempts} read(s)"),
    );
    Ok(None)
}

fn pause(duration: Duration) {
    if !duration.is_zero() {
        thread::sleep(duration);
    }
}
