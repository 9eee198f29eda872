use std::sync::Arc;

use anyhow::Context;
use askama::Template;
use async_smtp::{
    authentication::{Credentials, Mechanism},
    EmailAddress, Envelope, SendableEmail, SmtpClient, SmtpTransport,
};
use chrono::{DateTime, Utc};
use tokio::{
    io::{AsyncBufRead, AsyncWrite, BufStream},
    net::TcpStream,
};
use tokio_rustls::{
    client::TlsStream,
    rustls::{self, pki_types::ServerName, ClientConfig, RootCertStore},
    TlsConnector,
};

use crate::{
    configuration::{EmailSettings, ReportFormat},
    domain::job_record::{JobRecord, TIMESTAMP_FORMAT},
};

/// Display-ready job, shared by the report and the dashboard templates.
pub struct JobRow {
    pub title: String,
    pub platform: String,
    pub search_term: String,
    pub budget: String,
    pub url: String,
    pub found: String,
}

impl From<&JobRecord> for JobRow {
    fn from(job: &JobRecord) -> Self {
        JobRow {
            title: job.title.clone(),
            platform: job.platform.clone(),
            search_term: job.search_term.clone(),
            budget: job.budget.to_string(),
            url: job.url.clone(),
            found: job.scraped_at.format(TIMESTAMP_FORMAT).to_string(),
        }
    }
}

#[derive(Template)]
#[template(path = "report.html")]
struct ReportTemplate {
    date: String,
    jobs: Vec<JobRow>,
}

pub fn report_subject(now: DateTime<Utc>) -> String {
    format!("Job Bot Report - {}", now.format("%Y-%m-%d"))
}

pub fn render_html_report(jobs: &[JobRecord], now: DateTime<Utc>) -> Result<String, askama::Error> {
    ReportTemplate {
        date: now.format("%Y-%m-%d").to_string(),
        jobs: jobs.iter().map(JobRow::from).collect(),
    }
    .render()
}

pub fn render_plain_text_report(jobs: &[JobRecord], now: DateTime<Utc>) -> String {
    let mut report = format!("Job Results - {}\n", now.format("%Y-%m-%d"));

    if jobs.is_empty() {
        report.push_str("\nNo matching jobs this run.\n");
        return report;
    }

    report.push_str(&format!("{} jobs found\n", jobs.len()));
    for (index, job) in jobs.iter().map(JobRow::from).enumerate() {
        report.push_str(&format!(
            "\n{}. {}\n   Platform: {}\n   Search Term: {}\n   Budget: {}\n   Link: {}\n   Found: {}\n",
            index + 1,
            job.title,
            job.platform,
            job.search_term,
            job.budget,
            job.url,
            job.found
        ));
    }

    report
}

pub struct EmailReporter {
    settings: EmailSettings,
}

impl EmailReporter {
    pub fn new(settings: EmailSettings) -> Self {
        EmailReporter { settings }
    }

    pub fn default_recipient(&self) -> Option<&str> {
        self.settings
            .default_recipient
            .as_deref()
            .filter(|r| !r.trim().is_empty())
    }

    /// Sends the jobs to `recipient`. Failures are logged and reported as
    /// `false`; they never touch the jobs themselves.
    pub async fn deliver(&self, jobs: &[JobRecord], recipient: &str) -> bool {
        if !self.settings.is_enabled() {
            log::warn!("Email delivery is disabled, not sending report to {}", recipient);
            return false;
        }

        match self.send(jobs, recipient).await {
            Ok(()) => {
                log::info!("Email sent to {} with {} jobs", recipient, jobs.len());
                true
            }
            Err(e) => {
                log::error!("Failed to send job report to {}: {:?}", recipient, e);
                false
            }
        }
    }

    /// Full RFC 5322 message: headers, blank line, body with CRLF endings.
    pub fn compose(
        &self,
        jobs: &[JobRecord],
        recipient: &str,
        now: DateTime<Utc>,
    ) -> anyhow::Result<String> {
        if has_line_break(recipient) || has_line_break(&self.settings.sender) {
            anyhow::bail!("Email addresses must not contain line breaks");
        }

        let (content_type, body) = match self.settings.format {
            ReportFormat::Html => (
                "text/html; charset=utf-8",
                render_html_report(jobs, now).context("Failed to render html report")?,
            ),
            ReportFormat::PlainText => (
                "text/plain; charset=utf-8",
                render_plain_text_report(jobs, now),
            ),
        };

        let headers = [
            format!("From: {}", self.settings.sender),
            format!("To: {}", recipient),
            format!("Subject: {}", report_subject(now)),
            format!("Date: {}", now.to_rfc2822()),
            "MIME-Version: 1.0".to_string(),
            format!("Content-Type: {}", content_type),
            "Content-Transfer-Encoding: 8bit".to_string(),
        ];
        let body: Vec<&str> = body.lines().collect();

        Ok(format!("{}\r\n\r\n{}\r\n", headers.join("\r\n"), body.join("\r\n")))
    }

    async fn send(&self, jobs: &[JobRecord], recipient: &str) -> anyhow::Result<()> {
        let message = self.compose(jobs, recipient, Utc::now())?;

        let from = parse_address(&self.settings.sender)
            .with_context(|| format!("Invalid sender address {}", self.settings.sender))?;
        let to = parse_address(recipient)
            .with_context(|| format!("Invalid recipient address {}", recipient))?;
        let envelope = Envelope::new(Some(from), vec![to]).context("Invalid envelope")?;

        if self.settings.credentials().is_some() && !self.settings.starttls {
            anyhow::bail!("Refusing to send SMTP credentials without STARTTLS");
        }

        let address = format!("{}:{}", self.settings.smtp_host, self.settings.smtp_port);
        let stream = tokio::time::timeout(self.settings.timeout(), TcpStream::connect(&address))
            .await
            .with_context(|| format!("Timed out connecting to {}", address))?
            .with_context(|| format!("Failed to connect to {}", address))?;

        let transport = SmtpTransport::new(SmtpClient::new(), BufStream::new(stream))
            .await
            .context("SMTP handshake failed")?;
        let email = SendableEmail::new(envelope, message);

        match self.settings.starttls {
            true => {
                let stream = transport
                    .starttls()
                    .await
                    .context("STARTTLS was refused")?
                    .into_inner();
                let stream = self.upgrade(stream).await?;
                let transport = SmtpTransport::new(
                    SmtpClient::new().without_greeting(),
                    BufStream::new(stream),
                )
                .await
                .context("SMTP handshake over TLS failed")?;
                self.transmit(transport, email).await
            }
            false => self.transmit(transport, email).await,
        }
    }

    async fn upgrade(&self, stream: TcpStream) -> anyhow::Result<TlsStream<TcpStream>> {
        let mut roots = RootCertStore::empty();
        roots.extend(webpki_roots::TLS_SERVER_ROOTS.iter().cloned());
        let config =
            ClientConfig::builder_with_provider(Arc::new(rustls::crypto::ring::default_provider()))
                .with_safe_default_protocol_versions()
                .context("Failed to set up TLS")?
                .with_root_certificates(roots)
                .with_no_client_auth();

        let server_name = ServerName::try_from(self.settings.smtp_host.trim().to_string())
            .with_context(|| format!("Invalid SMTP host name {}", self.settings.smtp_host))?;

        tokio::time::timeout(
            self.settings.timeout(),
            TlsConnector::from(Arc::new(config)).connect(server_name, stream),
        )
        .await
        .context("Timed out during TLS handshake")?
        .context("TLS handshake failed")
    }

    /// Logs in when credentials are configured, then sends and quits. Only
    /// reached with credentials once the stream is encrypted.
    async fn transmit<S>(
        &self,
        mut transport: SmtpTransport<S>,
        email: SendableEmail,
    ) -> anyhow::Result<()>
    where
        S: AsyncBufRead + AsyncWrite + Unpin + Send,
    {
        if let Some((username, password)) = self.settings.credentials() {
            let credentials = Credentials::new(username.to_string(), password.to_string());
            transport
                .try_login(&credentials, &[Mechanism::Plain, Mechanism::Login])
                .await
                .context("SMTP login failed")?;
        }

        tokio::time::timeout(self.settings.timeout(), transport.send(email))
            .await
            .context("Timed out sending report")?
            .context("SMTP server rejected the report")?;

        if let Err(e) = transport.quit().await {
            log::warn!("SMTP quit failed after sending report: {:?}", e);
        }

        Ok(())
    }
}

/// Accepts `local@domain` with no whitespace or angle brackets.
fn parse_address(value: &str) -> anyhow::Result<EmailAddress> {
    let valid = match value.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.is_empty()
                && !domain.contains('@')
                && !value.chars().any(|c| c.is_whitespace() || c == '<' || c == '>')
        }
        None => false,
    };
    if !valid {
        anyhow::bail!("Not an email address: {}", value);
    }

    value
        .parse()
        .map_err(|e| anyhow::anyhow!("Not an email address: {} ({:?})", value, e))
}

fn has_line_break(value: &str) -> bool {
    value.contains('\r') || value.contains('\n')
}
