//! Outbound mail for the feedback form.

use chrono::{Datelike, Utc};
use lettre::{
    Address, AsyncFileTransport, AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
    message::{Mailbox, header::ContentType},
    transport::smtp::authentication::Credentials,
};
use std::sync::Arc;
use tracing::{info, warn};

use crate::config::{MailConfig, MailTransportConfig};
use crate::error::DermisError;

pub const FEEDBACK_SUBJECT: &str = "Reply for Tweaks";
pub const FEEDBACK_SENT_NOTICE: &str = "Your enquiry has been sent successfully.";

enum MailTransport {
    Smtp(AsyncSmtpTransport<Tokio1Executor>),
    File(AsyncFileTransport<Tokio1Executor>),
}

#[derive(Clone)]
pub struct Mailer {
    transport: Arc<MailTransport>,
    from: Mailbox,
    feedback_to: Mailbox,
    brand: String,
}

impl Mailer {
    pub fn new(cfg: &MailConfig) -> Result<Self, DermisError> {
        let transport = match &cfg.transport {
            MailTransportConfig::Smtp {
                host,
                port,
                username,
                password,
                use_tls,
            } => {
                if !use_tls {
                    warn!("SMTP TLS is disabled");
                }
                let builder = if *use_tls {
                    AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(host)
                        .map_err(|e| DermisError::Mail(format!("create SMTP transport: {e}")))?
                } else {
                    AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(host)
                };
                MailTransport::Smtp(
                    builder
                        .port(*port)
                        .credentials(Credentials::new(username.clone(), password.clone()))
                        .build(),
                )
            }
            MailTransportConfig::File { path } => {
                std::fs::create_dir_all(path)?;
                MailTransport::File(AsyncFileTransport::<Tokio1Executor>::new(path))
            }
        };

        let from_address: Address = cfg.from_email.parse()?;
        Ok(Self {
            transport: Arc::new(transport),
            from: Mailbox::new(Some(cfg.from_name.clone()), from_address),
            feedback_to: Mailbox::new(None, cfg.feedback_to.parse()?),
            brand: cfg.from_name.clone(),
        })
    }

    /// Forwards a feedback submission; replies go straight to the submitter.
    pub async fn send_feedback(&self, reply_to: Address, suggestion: &str) -> Result<(), DermisError> {
        let body = feedback_body(&self.brand, reply_to.as_ref(), suggestion, Utc::now().year());
        let message = Message::builder()
            .from(self.from.clone())
            .reply_to(Mailbox::new(None, reply_to))
            .to(self.feedback_to.clone())
            .subject(FEEDBACK_SUBJECT)
            .header(ContentType::TEXT_HTML)
            .body(body)?;

        match self.transport.as_ref() {
            MailTransport::Smtp(smtp) => {
                smtp.send(message)
                    .await
                    .map_err(|e| DermisError::Mail(format!("send SMTP email: {e}")))?;
            }
            MailTransport::File(file) => {
                file.send(message)
                    .await
                    .map_err(|e| DermisError::Mail(format!("send file email: {e}")))?;
            }
        }
        info!(to = %self.feedback_to, "feedback mail sent");
        Ok(())
    }
}

fn escape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
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

fn nl2br(input: &str) -> String {
    input.replace("\r\n", "\n").replace('\n', "<br />\n")
}

fn feedback_body(brand: &str, email: &str, suggestion: &str, year: i32) -> String {
    let brand = escape_html(brand);
    let email = escape_html(email);
    let message = nl2br(&escape_html(suggestion));
    format!(
        r#"<div style="font-family: Arial, sans-serif; background-color:#f9f9f9; padding:20px;">
    <table cellpadding="0" cellspacing="0" width="100%" style="max-width:600px; margin:auto; background:#ffffff; border-radius:10px; overflow:hidden;">
        <tr style="background:#0066cc;">
            <td style="padding:20px; text-align:center; color:#ffffff; font-size:20px; font-weight:bold;">{brand}</td>
        </tr>
        <tr>
            <td style="padding:20px; font-size:16px; color:#333333;">
                <p><strong>New tweak/feedback submission received!</strong></p>
                <table border="0" cellpadding="6" cellspacing="0" width="100%">
                    <tr>
                        <td width="35%" style="font-weight:bold;">Email Address:</td>
                        <td>{email}</td>
                    </tr>
                    <tr>
                        <td width="35%" style="font-weight:bold;">Message:</td>
                        <td>{message}</td>
                    </tr>
                </table>
                <p style="margin-top:20px; color:#555;">You can reply directly to this email to continue the conversation.</p>
            </td>
        </tr>
        <tr style="background:#f0f0f0;">
            <td style="padding:15px; text-align:center; font-size:13px; color:#777;">&copy; {year} {brand}. All rights reserved.</td>
        </tr>
    </table>
</div>"#
    )
}
