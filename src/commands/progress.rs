//! Progress rendering with indicatif

use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};
use padflash_core::flash::{FlashProgress, FlashReport};

/// Create a standard progress bar style
fn bar_style(phase: &str) -> ProgressStyle {
    ProgressStyle::default_bar()
        .template(&format!(
            "{{spinner:.green}} [{{elapsed_precise}}] [{{bar:40.cyan/blue}}] \
             {{bytes}}/{{total_bytes}} ({{bytes_per_sec}}, {{eta}}) {}",
            phase
        ))
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("#>-")
}

fn spinner_style() -> ProgressStyle {
    ProgressStyle::default_spinner()
        .template("{spinner:.green} {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_spinner())
}

/// Flash progress reporter backed by an indicatif bar
pub struct FlashBar {
    current: Option<ProgressBar>,
}

impl FlashBar {
    pub fn new() -> Self {
        Self { current: None }
    }

    fn finish(&mut self, message: &str) {
        if let Some(pb) = self.current.take() {
            pb.finish_with_message(message.to_string());
        }
    }
}

impl Default for FlashBar {
    fn default() -> Self {
        Self::new()
    }
}

impl FlashProgress for FlashBar {
    fn transferring(&mut self, total_bytes: u64) {
        let pb = ProgressBar::new(total_bytes);
        pb.set_style(bar_style("Flashing"));
        self.current = Some(pb);
    }

    fn chunk_written(&mut self, bytes_sent: u64) {
        if let Some(pb) = &self.current {
            pb.set_position(bytes_sent);
        }
    }

    fn verifying(&mut self) {
        self.finish("Transfer complete");
        let pb = ProgressBar::new_spinner();
        pb.set_style(spinner_style());
        pb.set_message("Waiting for the controller to verify...");
        pb.enable_steady_tick(Duration::from_millis(100));
        self.current = Some(pb);
    }

    fn complete(&mut self, _report: &FlashReport) {
        self.finish("Verified");
    }
}

impl Drop for FlashBar {
    fn drop(&mut self) {
        // A failed flash leaves a live bar behind; don't let it swallow
        // the error output
        if let Some(pb) = self.current.take() {
            pb.abandon();
        }
    }
}

/// Download progress reporter; grows a bar lazily once bytes arrive
pub struct DownloadBar {
    current: Option<ProgressBar>,
}

impl Default for DownloadBar {
    fn default() -> Self {
        Self::new()
    }
}

impl DownloadBar {
    pub fn new() -> Self {
        Self { current: None }
    }

    /// Feed from the fetch progress callback
    pub fn update(&mut self, received: u64, total: Option<u64>) {
        let pb = self.current.get_or_insert_with(|| {
            match total {
                Some(total) => {
                    let pb = ProgressBar::new(total);
                    pb.set_style(bar_style("Downloading"));
                    pb
                }
                None => {
                    let pb = ProgressBar::new_spinner();
                    pb.set_style(spinner_style());
                    pb.enable_steady_tick(Duration::from_millis(100));
                    pb
                }
            }
        });

        if total.is_some() {
            pb.set_position(received);
        } else {
            pb.set_message(format!("Downloading... {} bytes", received));
        }
    }

    pub fn finish(mut self, message: &str) {
        if let Some(pb) = self.current.take() {
            pb.finish_with_message(message.to_string());
        }
    }
}
