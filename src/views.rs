//! Server-rendered HTML for the admin pages.

use axum::response::Html;

/// Message shown for an `?error=` code on the login page. Unknown codes render nothing.
pub fn login_error_message(code: &str) -> Option<&'static str> {
    match code {
        "unauthorized" => Some("Please sign in to continue."),
        "invalid_credentials" => Some("Invalid username or password."),
        _ => None,
    }
}

/// Message shown for a `?status=` code on the login page.
pub fn login_status_message(code: &str) -> Option<&'static str> {
    match code {
        "logged_out" => Some("You have been signed out."),
        _ => None,
    }
}

/// login_page
///
/// The sign-in form. `errors` are listed above the form and `username` is pre-filled so a
/// rejected submission does not lose it.
pub fn login_page(errors: &[String], username: &str) -> Html<String> {
    let error_list = if errors.is_empty() {
        String::new()
    } else {
        let items: String = errors
            .iter()
            .map(|e| format!("<li>{}</li>", escape(e)))
            .collect();
        format!("<ul class=\"errors\">{items}</ul>")
    };

    let body = format!(
        r#"<h1>Admin sign in</h1>
{error_list}<form method="post" action="/admin/login">
<label>Username <input type="text" name="username" value="{username}" required></label>
<label>Password <input type="password" name="password" required></label>
<label><input type="checkbox" name="remember" value="1"> Remember me</label>
<button type="submit">Sign in</button>
</form>"#,
        username = escape(username),
    );

    Html(layout("Sign in", &body))
}

pub fn dashboard(admin_id: i64) -> Html<String> {
    let body = format!(
        r#"<h1>Dashboard</h1>
<p>Signed in as admin #{admin_id}.</p>
<form method="post" action="/admin/logout"><button type="submit">Sign out</button></form>"#
    );
    Html(layout("Dashboard", &body))
}

pub fn not_found() -> Html<String> {
    Html(layout("Not found", "<h1>Page not found</h1>"))
}

fn layout(title: &str, body: &str) -> String {
    format!(
        "<!doctype html>\n<html><head><meta charset=\"utf-8\"><title>{}</title></head><body>\n{}\n</body></html>",
        escape(title),
        body
    )
}

/// HTML-escapes text for use in element content and quoted attributes.
pub fn escape(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            _ => out.push(c),
        }
    }
    out
}
