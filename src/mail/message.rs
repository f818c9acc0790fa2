//! Contact message rendering.

use chrono::{DateTime, FixedOffset, Offset, Utc};
use uuid::Uuid;

use crate::contact::ContactRequest;

/// A fully rendered outbound message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MailMessage {
    pub from: String,
    pub to: String,
    /// Submitter's address, so replies skip the service account. `None`
    /// when the address is not a usable mailbox.
    pub reply_to: Option<String>,
    pub subject: String,
    pub html: String,
    /// RFC 5322 `Message-ID`, angle brackets included.
    pub message_id: String,
}

impl MailMessage {
    /// Render the notification for `request`.
    pub fn compose(
        request: &ContactRequest,
        from: &str,
        to: &str,
        site_name: &str,
        received_at: DateTime<FixedOffset>,
    ) -> Self {
        Self {
            from: from.to_string(),
            to: to.to_string(),
            reply_to: Some(request.email.clone()),
            subject: subject_for(&request.name),
            html: render_html(request, site_name, received_at),
            message_id: new_message_id(from),
        }
    }
}

/// Current time in the configured display offset.
pub fn local_now(offset_minutes: i32) -> DateTime<FixedOffset> {
    let offset = FixedOffset::east_opt(offset_minutes * 60).unwrap_or_else(|| Utc.fix());
    Utc::now().with_timezone(&offset)
}

pub fn subject_for(name: &str) -> String {
    // Header injection guard: subjects are single-line.
    let name: String = name.chars().filter(|c| !c.is_control()).collect();
    format!("📩 New message from your portfolio - {name}")
}

fn new_message_id(from: &str) -> String {
    let domain = from
        .rsplit_once('@')
        .map(|(_, domain)| domain)
        .filter(|d| !d.is_empty())
        .unwrap_or("localhost");
    format!("<{}@{}>", Uuid::new_v4(), domain)
}

/// Escape text for inclusion in HTML element content or attributes.
pub fn escape_html(input: &str) -> String {
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

fn render_html(
    request: &ContactRequest,
    site_name: &str,
    received_at: DateTime<FixedOffset>,
) -> String {
    let name = escape_html(&request.name);
    let email = escape_html(&request.email);
    // Line breaks are kept by the `pre-wrap` paragraph below.
    let message = escape_html(&request.message).replace("\r\n", "\n");
    let site = escape_html(site_name);
    let date = received_at.format("%d/%m/%Y, %H:%M:%S (UTC%:z)");

    format!(
        r##"<!DOCTYPE html>
<html>
<body style="margin: 0; padding: 0;">
  <div style="font-family: Arial, sans-serif; max-width: 600px; margin: 0 auto; background: #f8f9fa; padding: 20px; border-radius: 10px;">
    <div style="background: linear-gradient(135deg, #1a1d42 0%, #2d3068 100%); color: white; padding: 30px; border-radius: 10px; text-align: center; margin-bottom: 20px;">
      <h1 style="margin: 0; font-size: 24px;">💼 New Contact</h1>
      <p style="margin: 10px 0 0 0; opacity: 0.9;">Message from your portfolio site</p>
    </div>
    <div style="background: white; padding: 30px; border-radius: 10px;">
      <h3 style="color: #1a1d42; margin: 0 0 10px 0;">👤 Contact details</h3>
      <p style="margin: 5px 0; color: #555;"><strong>Name:</strong> {name}</p>
      <p style="margin: 5px 0; color: #555;"><strong>Email:</strong> {email}</p>
      <p style="margin: 5px 0; color: #666; font-size: 12px;"><strong>Date:</strong> {date}</p>
      <h3 style="color: #1a1d42; margin: 25px 0 15px 0;">💬 Message</h3>
      <div style="background: #f8f9fa; padding: 20px; border-left: 4px solid #1a1d42;">
        <p style="margin: 0; line-height: 1.6; color: #333; white-space: pre-wrap;">{message}</p>
      </div>
    </div>
    <div style="text-align: center; margin-top: 20px; padding: 15px; background: #e3f2fd; border-radius: 8px;">
      <p style="margin: 0; color: #1565c0; font-size: 14px;">
        📧 Reply to this email to answer {name} directly<br>
        🌐 Sent from: {site}
      </p>
    </div>
  </div>
</body>
</html>
"##
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn request() -> ContactRequest {
        ContactRequest {
            name: "Ana <b>".into(),
            email: "ana@example.com".into(),
            message: "Line one\r\nLine two & more".into(),
        }
    }

    fn at() -> DateTime<FixedOffset> {
        FixedOffset::west_opt(5 * 3600)
            .unwrap()
            .with_ymd_and_hms(2024, 3, 9, 14, 5, 0)
            .unwrap()
    }

    #[test]
    fn test_compose_addresses() {
        let msg = MailMessage::compose(&request(), "svc@gmail.com", "me@example.com", "site.dev", at());
        assert_eq!(msg.from, "svc@gmail.com");
        assert_eq!(msg.to, "me@example.com");
        assert_eq!(msg.reply_to.as_deref(), Some("ana@example.com"));
        assert!(msg.subject.contains("Ana <b>"));
        assert!(msg.message_id.starts_with('<'));
        assert!(msg.message_id.ends_with("@gmail.com>"));
    }

    #[test]
    fn test_body_escapes_and_keeps_line_breaks() {
        let msg = MailMessage::compose(&request(), "svc@gmail.com", "me@example.com", "site.dev", at());
        assert!(msg.html.contains("Ana &lt;b&gt;"));
        assert!(!msg.html.contains("Ana <b>"));
        assert!(msg.html.contains("Line one\nLine two &amp; more"));
        assert!(!msg.html.contains("Line one<br>"));
        assert!(msg.html.contains("white-space: pre-wrap"));
        assert!(msg.html.contains("09/03/2024, 14:05:00 (UTC-05:00)"));
    }

    #[test]
    fn test_subject_strips_control_characters() {
        assert_eq!(
            subject_for("Eve\r\nBcc: x@y.z"),
            "📩 New message from your portfolio - EveBcc: x@y.z"
        );
    }

    #[test]
    fn test_message_ids_are_unique() {
        let a = MailMessage::compose(&request(), "svc@gmail.com", "me@example.com", "s", at());
        let b = MailMessage::compose(&request(), "svc@gmail.com", "me@example.com", "s", at());
        assert_ne!(a.message_id, b.message_id);
    }

    #[test]
    fn test_local_now_applies_offset() {
        let now = local_now(-300);
        assert_eq!(now.offset().local_minus_utc(), -300 * 60);
    }
}
