//! Report delivery
//!
//! A `Mailer` receives a finished `ReportPayload`. `OutboxMailer` drops each
//! message as an `.eml` file (plus copies of its attachments) into an outbox
//! directory for a local MTA or mail client to pick up; `StdoutMailer`
//! prints the message instead, which is what `--dry-run` uses.

use anyhow::Context;
use chrono::{DateTime, Local};
use serde::Serialize;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::info;

use crate::config::MailerConfig;
use crate::error::Result;
use crate::utils::slugify;

/// A finished report, ready for delivery
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportPayload {
    pub subject: String,
    pub plain_body: String,
    pub files: Vec<PathBuf>,
}

pub trait Mailer {
    /// Deliver one message; returns where it went (file path or description)
    fn send(&self, payload: &ReportPayload) -> Result<String>;
}

/// Writes messages into `outbox_dir` as RFC 5322 text files
#[derive(Debug, Clone)]
pub struct OutboxMailer {
    from: String,
    to: Vec<String>,
    outbox_dir: PathBuf,
}

impl OutboxMailer {
    pub fn new(config: &MailerConfig) -> Self {
        Self {
            from: config.from.clone(),
            to: config.to.clone(),
            outbox_dir: config.outbox_dir.clone(),
        }
    }

    pub fn outbox_dir(&self) -> &Path {
        &self.outbox_dir
    }

    fn send_at(&self, payload: &ReportPayload, now: DateTime<Local>) -> Result<PathBuf> {
        std::fs::create_dir_all(&self.outbox_dir)
            .with_context(|| format!("Failed to create outbox {:?}", self.outbox_dir))?;

        let base = format!("{}-{}", now.format("%Y%m%dT%H%M%S"), slugify(&payload.subject));
        let (stem, mut out) = self.create_message_file(&base)?;
        let path = self.outbox_dir.join(format!("{}.eml", stem));
        let attachment_dir = self.outbox_dir.join(&stem);

        let mut attached = Vec::with_capacity(payload.files.len());
        if !payload.files.is_empty() {
            std::fs::create_dir_all(&attachment_dir)
                .with_context(|| format!("Failed to create {:?}", attachment_dir))?;
            for file in &payload.files {
                let name = file
                    .file_name()
                    .with_context(|| format!("Attachment {:?} has no file name", file))?;
                let target = attachment_dir.join(name);
                std::fs::copy(file, &target)
                    .with_context(|| format!("Failed to copy attachment {:?}", file))?;
                attached.push(target);
            }
        }

        out.write_all(format_message(&self.from, &self.to, payload, &attached, now).as_bytes())
            .with_context(|| format!("Failed to write message {:?}", path))?;

        info!("Queued '{}' in {:?}", payload.subject, path);
        Ok(path)
    }

    /// Create `<base>.eml`, or `<base>-2.eml`, `<base>-3.eml`, ... when a
    /// message with the same stem is already queued.
    fn create_message_file(&self, base: &str) -> Result<(String, std::fs::File)> {
        let mut n = 1;
        loop {
            let stem = if n == 1 {
                base.to_string()
            } else {
                format!("{}-{}", base, n)
            };
            n += 1;
            if self.outbox_dir.join(&stem).exists() {
                continue;
            }
            let path = self.outbox_dir.join(format!("{}.eml", stem));
            match std::fs::OpenOptions::new()
                .write(true)
                .create_new(true)
                .open(&path)
            {
                Ok(file) => return Ok((stem, file)),
                Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => continue,
                Err(e) => {
                    return Err(e).with_context(|| format!("Failed to create message {:?}", path))
                }
            }
        }
    }
}

impl Mailer for OutboxMailer {
    fn send(&self, payload: &ReportPayload) -> Result<String> {
        let path = self.send_at(payload, Local::now())?;
        Ok(path.display().to_string())
    }
}

/// Prints messages to stdout
#[derive(Debug, Clone, Default)]
pub struct StdoutMailer;

impl Mailer for StdoutMailer {
    fn send(&self, payload: &ReportPayload) -> Result<String> {
        let mut stdout = std::io::stdout().lock();
        writeln!(stdout, "Subject: {}", payload.subject)?;
        for file in &payload.files {
            writeln!(stdout, "Attachment: {}", file.display())?;
        }
        writeln!(stdout)?;
        write!(stdout, "{}", payload.plain_body)?;
        stdout.flush()?;
        Ok("stdout".to_string())
    }
}

/// Plain-text message with one `X-Attachment` header per attached file
fn format_message(
    from: &str,
    to: &[String],
    payload: &ReportPayload,
    attachments: &[PathBuf],
    date: DateTime<Local>,
) -> String {
    let mut message = String::new();
    message.push_str(&format!("From: {}\r\n", from));
    if !to.is_empty() {
        message.push_str(&format!("To: {}\r\n", to.join(", ")));
    }
    message.push_str(&format!("Subject: {}\r\n", payload.subject));
    message.push_str(&format!("Date: {}\r\n", date.to_rfc2822()));
    message.push_str("MIME-Version: 1.0\r\n");
    message.push_str("Content-Type: text/plain; charset=utf-8\r\n");
    for file in attachments {
        message.push_str(&format!("X-Attachment: {}\r\n", file.display()));
    }
    message.push_str("\r\n");
    for line in payload.plain_body.lines() {
        message.push_str(line);
        message.push_str("\r\n");
    }
    message
}
