//! Login page rendering
//!
//! Pure functions from an [`AuthOutcome`] to an HTML body. No I/O here.

use axum::response::Html;
use chrono::{DateTime, Utc};
use html_escape::{encode_double_quoted_attribute, encode_text};

use crate::auth::AuthOutcome;
use crate::data::RoomSummary;

/// Static bits of the page that do not depend on the outcome
#[derive(Debug, Clone)]
pub struct PageContext {
    /// Where the login button points
    pub login_url: String,
}

impl Default for PageContext {
    fn default() -> Self {
        Self {
            login_url: "/auth/github".to_string(),
        }
    }
}

/// Render the login page for an outcome
pub fn login_page(outcome: &AuthOutcome, context: &PageContext) -> Html<String> {
    let main = match outcome {
        AuthOutcome::LoggedOut => format!(
            r#"<p>Please sign in with GitHub</p>
            <a class="login" href="{}">Sign in with GitHub</a>"#,
            encode_double_quoted_attribute(&context.login_url)
        ),
        AuthOutcome::Rooms(rooms) => room_list(rooms),
    };

    Html(format!(
        r#"<!DOCTYPE html>
<html>
<head><title>deploychat</title></head>
<body>
    <h1>deploychat</h1>
    {main}
</body>
</html>
"#
    ))
}

fn room_list(rooms: &[RoomSummary]) -> String {
    if rooms.is_empty() {
        return r#"<p class="empty">No rooms yet</p>
    <form method="post" action="/logout"><button type="submit">Log out</button></form>"#
            .to_string();
    }

    let items: String = rooms
        .iter()
        .map(|room| {
            format!(
                r#"
        <li data-room-id="{}"><span class="name">{}</span> <span class="activity">{}</span></li>"#,
                room.id,
                encode_text(&room.name),
                last_activity(room.last_message_at)
            )
        })
        .collect();

    format!(
        r#"<ul class="rooms">{items}
    </ul>
    <form method="post" action="/logout"><button type="submit">Log out</button></form>"#
    )
}

fn last_activity(at: Option<DateTime<Utc>>) -> String {
    match at {
        Some(at) => format!(
            r#"<time datetime="{}">{}</time>"#,
            at.to_rfc3339(),
            at.format("%Y-%m-%d %H:%M UTC")
        ),
        None => "no messages yet".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn logged_out_page_has_login_button() {
        let Html(body) = login_page(&AuthOutcome::LoggedOut, &PageContext::default());

        assert!(body.contains("Sign in with GitHub"));
        assert!(body.contains(r#"href="/auth/github""#));
        assert!(!body.contains("class=\"rooms\""));
    }

    #[test]
    fn rooms_page_lists_rooms_in_order() {
        let rooms = vec![
            RoomSummary {
                id: 2,
                name: "random".to_string(),
                last_message_at: Some(Utc.with_ymd_and_hms(2024, 5, 1, 12, 30, 0).unwrap()),
            },
            RoomSummary {
                id: 1,
                name: "general".to_string(),
                last_message_at: None,
            },
        ];

        let Html(body) = login_page(&AuthOutcome::Rooms(rooms), &PageContext::default());

        let random = body.find("random").expect("random listed");
        let general = body.find("general").expect("general listed");
        assert!(random < general);
        assert!(body.contains("2024-05-01 12:30 UTC"));
        assert!(body.contains("no messages yet"));
        assert!(!body.contains("Sign in with GitHub"));
    }

    #[test]
    fn room_names_are_escaped() {
        let rooms = vec![RoomSummary {
            id: 1,
            name: "<script>alert(1)</script>".to_string(),
            last_message_at: None,
        }];

        let Html(body) = login_page(&AuthOutcome::Rooms(rooms), &PageContext::default());

        assert!(!body.contains("<script>"));
        assert!(body.contains("&lt;script&gt;"));
    }

    #[test]
    fn empty_room_list_still_renders_authenticated_view() {
        let Html(body) = login_page(&AuthOutcome::Rooms(Vec::new()), &PageContext::default());

        assert!(body.contains("No rooms yet"));
        assert!(body.contains("Log out"));
    }
}
