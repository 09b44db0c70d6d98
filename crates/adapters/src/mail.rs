// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Sending a completion/report email through the configured SMTP relay.
//!
//! Grounded on the original service's `send_to_addr`: one message, from the
//! configured address, to either an explicit recipient list or the
//! configuration's default recipients, optionally authenticated with
//! STARTTLS. Where the original reached into Python's logging subsystem for
//! an already-configured `SMTPHandler`, this builds the transport directly
//! from `SmtpSettings` each call — there's no shared logging handler to
//! reuse in this design.

use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{Message, SmtpTransport, Transport};
use ltoarc_core::SmtpSettings;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum MailError {
    #[error("no recipients configured or supplied")]
    NoRecipients,
    #[error("invalid address: {0}")]
    Address(#[from] lettre::address::AddressError),
    #[error("failed to build message: {0}")]
    Build(#[from] lettre::error::Error),
    #[error("failed to send message: {0}")]
    Send(#[from] lettre::transport::smtp::Error),
}

/// Sends `content` with subject `header` to `recipients`, or the settings'
/// `default_recipients` when `recipients` is empty.
pub fn send(settings: &SmtpSettings, header: &str, content: &str, recipients: &[String]) -> Result<(), MailError> {
    let to: &[String] = if recipients.is_empty() {
        &settings.default_recipients
    } else {
        recipients
    };
    if to.is_empty() {
        return Err(MailError::NoRecipients);
    }

    let mut builder = Message::builder()
        .from(settings.from.parse::<Mailbox>()?)
        .subject(header);
    for addr in to {
        builder = builder.to(addr.parse::<Mailbox>()?);
    }
    let message = builder.body(content.to_string())?;

    let mut transport_builder = if settings.starttls {
        SmtpTransport::starttls_relay(&settings.host)?
    } else {
        SmtpTransport::builder_dangerous(&settings.host)
    }
    .port(settings.port);

    if let (Some(username), Some(password)) = (&settings.username, &settings.password) {
        transport_builder =
            transport_builder.credentials(Credentials::new(username.clone(), password.clone()));
    }

    transport_builder.build().send(&message)?;
    Ok(())
}

#[cfg(test)]
#[path = "mail_tests.rs"]
mod tests;
