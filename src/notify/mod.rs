//! Assignee notifications sent after an automatic commit.
//!
//! Delivery is best-effort from the pipeline's point of view: a
//! [`NotifyError`] is logged by the caller and never reverses a commit.

mod smtp;

pub use smtp::{SmtpConfig, SmtpNotifier};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::assignments::model::{Priority, WorkItem, Worker};
use crate::error::NotifyError;

/// Everything an assignee needs to know about a new task.
#[derive(Debug, Clone, PartialEq)]
pub struct AssignmentNotice {
    pub task_id: Uuid,
    pub task_title: String,
    pub task_description: String,
    pub priority: Priority,
    pub assignee_name: String,
    pub assignee_email: String,
    pub confidence: f64,
    pub reason: String,
    pub assigned_by: String,
    pub assigned_at: DateTime<Utc>,
    /// Deep link into the task UI, when one is configured.
    pub task_url: Option<String>,
}

impl AssignmentNotice {
    pub fn new(
        task: &WorkItem,
        worker: &Worker,
        confidence: f64,
        reason: impl Into<String>,
        assigned_by: impl Into<String>,
        task_url: Option<String>,
    ) -> Self {
        Self {
            task_id: task.id,
            task_title: task.title.clone(),
            task_description: task.description.clone(),
            priority: task.priority,
            assignee_name: worker.name.clone(),
            assignee_email: worker.email.clone(),
            confidence,
            reason: reason.into(),
            assigned_by: assigned_by.into(),
            assigned_at: Utc::now(),
            task_url,
        }
    }

    pub fn subject(&self) -> String {
        format!("[Assignment] New Task: {}", self.task_title)
    }

    fn summary_lines(&self) -> Vec<String> {
        vec![
            format!("Confidence Score: {:.2}", self.confidence),
            format!("Reason: {}", self.reason),
        ]
    }

    fn assigned_at_display(&self) -> String {
        self.assigned_at.format("%Y-%m-%d %H:%M").to_string()
    }

    /// Plain-text body.
    pub fn text_body(&self) -> String {
        let mut body = String::with_capacity(512);
        body.push_str(&format!("Hi {},\n\n", self.assignee_name));
        body.push_str("You have been assigned a new task.\n\n");
        body.push_str(&format!("Task: {}\n", self.task_title));
        if !self.task_description.is_empty() {
            body.push_str(&format!("Description: {}\n", self.task_description));
        }
        body.push_str(&format!("Priority: {}\n", self.priority.as_str()));
        body.push_str(&format!("Assigned by: {}\n", self.assigned_by));
        body.push_str(&format!("Assigned at: {} UTC\n\n", self.assigned_at_display()));
        for line in self.summary_lines() {
            body.push_str(&line);
            body.push('\n');
        }
        if let Some(url) = &self.task_url {
            body.push_str(&format!("\nView task: {url}\n"));
        }
        body
    }

    /// HTML body carrying the same content as [`Self::text_body`].
    pub fn html_body(&self) -> String {
        let mut html = String::with_capacity(1024);
        html.push_str("<html><body style=\"font-family: sans-serif;\">");
        html.push_str(&format!("<p>Hi {},</p>", escape_html(&self.assignee_name)));
        html.push_str("<p>You have been assigned a new task.</p>");
        html.push_str("<table cellpadding=\"4\">");
        let mut row = |label: &str, value: &str| {
            html.push_str(&format!(
                "<tr><td><strong>{label}</strong></td><td>{}</td></tr>",
                escape_html(value)
            ));
        };
        row("Task", &self.task_title);
        if !self.task_description.is_empty() {
            row("Description", &self.task_description);
        }
        row("Priority", self.priority.as_str());
        row("Assigned by", &self.assigned_by);
        row("Assigned at", &format!("{} UTC", self.assigned_at_display()));
        html.push_str("</table>");
        for line in self.summary_lines() {
            html.push_str(&format!("<p>{}</p>", escape_html(&line)));
        }
        if let Some(url) = &self.task_url {
            let url = escape_html(url);
            html.push_str(&format!("<p><a href=\"{url}\">View task</a></p>"));
        }
        html.push_str("</body></html>");
        html
    }
}

fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// Delivers assignment notices.
#[async_trait]
pub trait Notifier: Send + Sync {
    fn name(&self) -> &str;

    /// Deliver one notice. `Ok(true)` means it was sent; `Ok(false)` means
    /// this notifier deliberately sends nothing.
    async fn notify(&self, notice: &AssignmentNotice) -> Result<bool, NotifyError>;
}

/// Notifier used when delivery is turned off or unconfigured.
#[derive(Debug, Clone, Copy, Default)]
pub struct DisabledNotifier;

#[async_trait]
impl Notifier for DisabledNotifier {
    fn name(&self) -> &str {
        "disabled"
    }

    async fn notify(&self, notice: &AssignmentNotice) -> Result<bool, NotifyError> {
        tracing::debug!(task_id = %notice.task_id, "Notifications disabled, skipping");
        Ok(false)
    }
}
