use std::time::Duration;

use async_trait::async_trait;
use colored::Colorize;
use rand::Rng;

use crate::config::DelayRange;

/// Waits between two downloads so the remote service isn't hammered.
#[async_trait]
pub trait Pacer: Send {
    async fn pause(&mut self);
}

#[derive(Debug, Clone)]
pub struct RandomDelay {
    min_secs: u64,
    max_secs: u64,
}

impl RandomDelay {
    pub fn new(range: DelayRange) -> Self {
        let DelayRange { min_secs, max_secs } = range;
        Self {
            min_secs: min_secs.min(max_secs),
            max_secs: min_secs.max(max_secs),
        }
    }

    pub fn next_delay(&self) -> Duration {
        let secs = rand::thread_rng().gen_range(self.min_secs..=self.max_secs);
        Duration::from_secs(secs)
    }
}

#[async_trait]
impl Pacer for RandomDelay {
    async fn pause(&mut self) {
        let delay = self.next_delay();
        println!(
            "⏳ Waiting {} seconds before the next track...",
            delay.as_secs().to_string().cyan()
        );
        tokio::time::sleep(delay).await;
    }
}
