//! Formatting for outbound relay text (Telegram HTML parse mode).

use chrono::{DateTime, Utc};

use crate::{messaging::types::Sender, resolver::ResolvedDestination};

/// Shown when a sender has neither a first nor a last name.
pub const UNKNOWN_NAME: &str = "Unknown";

const SEPARATOR_WIDTH: usize = 30;

/// Escape HTML special characters for Telegram HTML parse mode.
pub fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

/// Link that opens the sender's profile: the public `t.me` page when a username exists,
/// otherwise an app deep link built from the numeric id.
pub fn profile_link(sender: &Sender) -> String {
    match sender.username.as_deref().filter(|u| !u.is_empty()) {
        Some(username) => format!("https://t.me/{username}"),
        None => format!("tg://user?id={}", sender.user_id.0),
    }
}

/// Identity block sent immediately before each forwarded copy.
///
/// Names come straight from the sender's profile, so everything free-form is escaped before
/// it is embedded; a display name cannot inject tags or links.
pub fn format_identity(sender: &Sender) -> String {
    let name = sender.full_name();
    let name = if name.is_empty() {
        UNKNOWN_NAME.to_string()
    } else {
        name
    };

    let mut lines = vec![
        format!("👤 <b>From:</b> {}", escape_html(&name)),
        format!("🆔 <b>User ID:</b> <code>{}</code>", sender.user_id.0),
    ];

    match sender.username.as_deref().filter(|u| !u.is_empty()) {
        Some(username) => lines.push(format!("📝 <b>Username:</b> @{}", escape_html(username))),
        None => lines.push("📝 <b>Username:</b> Not set".to_string()),
    }
    lines.push(format!(
        "🔗 <b>Profile:</b> <a href=\"{}\">Open Profile</a>",
        escape_html(&profile_link(sender))
    ));

    if sender.is_verified {
        lines.push("✅ <b>Verified Account</b>".to_string());
    }
    if sender.is_premium {
        lines.push("⭐ <b>Premium User</b>".to_string());
    }
    if sender.is_bot {
        lines.push("🤖 <b>Bot Account</b>".to_string());
    }

    lines.push("─".repeat(SEPARATOR_WIDTH));
    lines.join("\n")
}

/// Identity block for platform-generated events (calls, pins, ...).
pub fn format_service_identity(sender: &Sender) -> String {
    format!("{}\n📞 <b>Service Message</b>", format_identity(sender))
}

/// The one-shot "now online" announcement.
pub fn startup_announcement(dest: &ResolvedDestination, started_at: DateTime<Utc>) -> String {
    let target = match dest.title() {
        Some(title) => format!("{} (<code>{}</code>)", escape_html(title), dest.chat_id()),
        None => format!("<code>{}</code>", dest.chat_id()),
    };
    format!(
        "🚀 <b>Relay online</b>\n\
         📨 Incoming direct messages will be copied here.\n\
         🎯 <b>Destination:</b> {target}\n\
         🧭 <b>Resolved via:</b> {}\n\
         🕒 <b>Started:</b> {}",
        dest.method(),
        started_at.format("%Y-%m-%d %H:%M:%S UTC")
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ChatId, UserId};
    use crate::resolver::ResolutionMethod;
    use chrono::TimeZone;

    fn sender() -> Sender {
        Sender {
            user_id: UserId(555),
            first_name: "Ann".to_string(),
            last_name: Some("Lee".to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn escapes_html() {
        let s = r#"<a href="x&y">"#;
        assert_eq!(escape_html(s), "&lt;a href=&quot;x&amp;y&quot;&gt;");
    }

    #[test]
    fn no_username_uses_deep_link() {
        let text = format_identity(&sender());
        assert!(text.contains("👤 <b>From:</b> Ann Lee"));
        assert!(text.contains("<code>555</code>"));
        assert!(text.contains("📝 <b>Username:</b> Not set"));
        assert!(text.contains(r#"<a href="tg://user?id=555">"#));
    }

    #[test]
    fn username_uses_public_link() {
        let s = Sender {
            username: Some("abc".to_string()),
            ..sender()
        };
        let text = format_identity(&s);
        assert!(text.contains("@abc"));
        assert!(text.contains(r#"<a href="https://t.me/abc">"#));
        assert!(!text.contains("tg://user"));
    }

    #[test]
    fn badges_follow_flags_in_fixed_order() {
        let none = format_identity(&sender());
        assert!(!none.contains("Verified"));
        assert!(!none.contains("Premium"));
        assert!(!none.contains("Bot Account"));

        let all = format_identity(&Sender {
            is_verified: true,
            is_premium: true,
            is_bot: true,
            ..sender()
        });
        let lines: Vec<&str> = all.lines().collect();
        let v = lines.iter().position(|l| *l == "✅ <b>Verified Account</b>");
        let p = lines.iter().position(|l| *l == "⭐ <b>Premium User</b>");
        let b = lines.iter().position(|l| *l == "🤖 <b>Bot Account</b>");
        assert!(v.is_some() && p.is_some() && b.is_some());
        assert!(v < p && p < b);

        let premium_only = format_identity(&Sender {
            is_premium: true,
            ..sender()
        });
        assert!(premium_only.contains("⭐ <b>Premium User</b>"));
        assert!(!premium_only.contains("Verified"));
    }

    #[test]
    fn empty_name_falls_back_to_placeholder() {
        let s = Sender {
            first_name: "  ".to_string(),
            last_name: None,
            ..sender()
        };
        assert!(format_identity(&s).contains("<b>From:</b> Unknown"));
    }

    #[test]
    fn hostile_names_cannot_inject_markup() {
        let s = Sender {
            first_name: r#"<a href="https://evil.example">click</a>"#.to_string(),
            last_name: Some("<b>&".to_string()),
            ..sender()
        };
        let text = format_identity(&s);
        assert!(!text.contains("evil.example\">"));
        assert!(text.contains("&lt;a href=&quot;https://evil.example&quot;&gt;click&lt;/a&gt;"));
        assert!(text.contains("&lt;b&gt;&amp;"));
    }

    #[test]
    fn service_identity_adds_label() {
        let text = format_service_identity(&sender());
        assert!(text.starts_with(&format_identity(&sender())));
        assert!(text.ends_with("📞 <b>Service Message</b>"));
    }

    #[test]
    fn startup_announcement_names_destination() {
        let dest = ResolvedDestination::new(
            ChatId(-100999),
            Some("Logs <backup>".to_string()),
            ResolutionMethod::Username,
        );
        let at = Utc.with_ymd_and_hms(2026, 1, 2, 3, 4, 5).unwrap();
        let text = startup_announcement(&dest, at);
        assert!(text.contains("Relay online"));
        assert!(text.contains("Logs &lt;backup&gt; (<code>-100999</code>)"));
        assert!(text.contains("username lookup"));
        assert!(text.contains("2026-01-02 03:04:05 UTC"));
    }
}
