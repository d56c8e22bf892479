//! Periodic self-ping keeping hosted instances from idling out

use std::time::Duration;

use tokio::{task::JoinHandle, time::MissedTickBehavior};
use tracing::{debug, info, warn};

pub fn spawn_keepalive(http: reqwest::Client, url: String, interval: Duration) -> JoinHandle<()> {
    info!(url = %url, interval_secs = interval.as_secs(), "keep-alive enabled");

    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // The first tick completes immediately.
        ticker.tick().await;

        loop {
            ticker.tick().await;
            ping_once(&http, &url).await;
        }
    })
}

/// Returns whether the target answered with a 2xx status.
pub async fn ping_once(http: &reqwest::Client, url: &str) -> bool {
    match http.get(url).send().await {
        Ok(response) if response.status().is_success() => {
            debug!(url = %url, status = response.status().as_u16(), "keep-alive ping ok");
            true
        }
        Ok(response) => {
            warn!(url = %url, status = response.status().as_u16(), "keep-alive ping rejected");
            false
        }
        Err(err) => {
            warn!(url = %url, error = %err, "keep-alive ping failed");
            false
        }
    }
}
