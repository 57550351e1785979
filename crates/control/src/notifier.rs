use async_trait::async_trait;
use jetbuddy_models::{AnalysisOutput, EmailConfig, EngineError};
use lettre::message::{header::ContentType, Mailbox};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use tracing::{info, instrument, warn};

/// Delivery of a finished analysis to subscribers.
#[async_trait]
pub trait Notifier: Send + Sync {
    /// `Ok(false)` when delivery was skipped.
    async fn send_report(&self, output: &AnalysisOutput, recipients: &[String]) -> Result<bool, EngineError>;
}

fn email_error(e: impl ToString) -> EngineError {
    EngineError::EmailError { reason: e.to_string() }
}

fn title_case(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// A bare address that delivery will accept. Display-name forms are rejected.
pub fn parse_recipient(email: &str) -> Option<Mailbox> {
    email
        .trim()
        .parse::<Mailbox>()
        .ok()
        .filter(|mailbox| mailbox.name.is_none())
}

pub fn report_subject(symbol: &str) -> String {
    format!("Jet Buddy AI Analysis for {}", symbol)
}

fn escape_html(s: &str) -> String {
    let mut escaped = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

pub fn render_report(output: &AnalysisOutput) -> String {
    let field = |label: &str, value: &str| {
        format!(
            r#"<div class="field"><span class="label">{}:</span> <span class="value">{}</span></div>"#,
            label,
            escape_html(value)
        )
    };
    let predicted_tp = output
        .predicted_tp
        .map(|tp| tp.to_string())
        .unwrap_or_else(|| "N/A".to_string());

    let fields = [
        field("Overall Bias", &title_case(output.trend_direction.as_str())),
        field("Bias Confidence", &format!("{:.1}%", output.bias_confidence * 100.0)),
        field("News Sentiment", &title_case(output.sentiment.as_str())),
        "<hr>".to_string(),
        field("Entry Zone", &output.entry_zone),
        field("Est. Time to Entry", &output.estimated_entry_time),
        field("Predicted Take-Profit", &predicted_tp),
        field("Est. Time to TP", &output.tp_eta),
        "<hr>".to_string(),
        field("Risk Profile", &title_case(output.risk_profile.as_str())),
        field("Suggested Lot Size", &output.suggested_lot_size.to_string()),
    ];

    format!(
        r#"<html>
<body>
<div class="container">
<div class="header">AI Trading Signal: {symbol}</div>
{fields}
<p style="font-size: 12px; color: #888;">Note: {notes}</p>
</div>
</body>
</html>"#,
        symbol = escape_html(&output.symbol),
        fields = fields.join("\n"),
        notes = escape_html(output.notes.as_deref().unwrap_or("")),
    )
}

/// STARTTLS SMTP with login. Unconfigured credentials turn every send into a skip.
pub struct SmtpNotifier {
    config: EmailConfig,
}

impl SmtpNotifier {
    pub fn new(config: EmailConfig) -> Self {
        Self { config }
    }

    fn build_message(&self, output: &AnalysisOutput, recipients: &[String]) -> Result<Option<Message>, EngineError> {
        let sender = self
            .config
            .sender_email
            .as_deref()
            .or(self.config.smtp_username.as_deref())
            .unwrap_or_default();
        let from: Mailbox = sender.parse().map_err(email_error)?;

        let mut builder = Message::builder().from(from).subject(report_subject(&output.symbol));
        let mut any = false;
        for recipient in recipients {
            match parse_recipient(recipient) {
                Some(mailbox) => {
                    builder = builder.to(mailbox);
                    any = true;
                }
                None => warn!(recipient = %recipient, "Skipping invalid recipient"),
            }
        }
        if !any {
            return Ok(None);
        }

        let message = builder
            .header(ContentType::TEXT_HTML)
            .body(render_report(output))
            .map_err(email_error)?;
        Ok(Some(message))
    }
}

#[async_trait]
impl Notifier for SmtpNotifier {
    #[instrument(skip(self, output), fields(symbol = %output.symbol))]
    async fn send_report(&self, output: &AnalysisOutput, recipients: &[String]) -> Result<bool, EngineError> {
        if !self.config.is_configured() {
            info!("Email credentials not configured. Skipping email.");
            return Ok(false);
        }
        if recipients.is_empty() {
            return Ok(false);
        }
        let Some(message) = self.build_message(output, recipients)? else {
            return Ok(false);
        };

        let (Some(server), Some(username), Some(password)) = (
            self.config.smtp_server.as_deref(),
            self.config.smtp_username.clone(),
            self.config.smtp_password.clone(),
        ) else {
            return Ok(false);
        };

        let mailer = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(server)
            .map_err(email_error)?
            .port(self.config.smtp_port)
            .credentials(Credentials::new(username, password))
            .build();

        mailer.send(message).await.map_err(email_error)?;
        info!(recipients = recipients.len(), "Sent email report");
        Ok(true)
    }
}
