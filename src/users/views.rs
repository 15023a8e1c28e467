use std::fmt::Write;

use time::format_description::well_known::Rfc3339;

use crate::users::{dto::format_birthday, repo_types::User};

/// Escape text for use in HTML element content and quoted attributes.
pub fn escape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
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

fn page(title: &str, body: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head><meta charset="utf-8"><title>{title}</title></head>
<body>
{body}
</body>
</html>
"#
    )
}

pub fn register_page(flash: Option<&str>) -> String {
    let notice = flash
        .map(|m| format!(r#"<p class="flash error">{}</p>"#, escape(m)))
        .unwrap_or_default();
    page(
        "Register",
        &format!(
            r#"<h1>Register</h1>
{notice}
<form method="post" action="/register">
  <label>Birthday <input type="date" name="birthday" required></label>
  <label>First name <input type="text" name="first_name" required></label>
  <label>Last name <input type="text" name="last_name" required></label>
  <label>Email <input type="email" name="email" required></label>
  <label>Password <input type="password" name="password" required></label>
  <label>Confirm password <input type="password" name="confirm_password" required></label>
  <button type="submit">Register</button>
</form>
<p><a href="/users">Registered users</a></p>"#
        ),
    )
}

pub fn success_page() -> String {
    page(
        "Registered",
        r#"<h1>Registration complete</h1>
<p><a href="/">Register another</a> | <a href="/users">Registered users</a></p>"#,
    )
}

pub fn users_page(users: &[User]) -> String {
    let mut rows = String::new();
    for u in users {
        let created = u
            .created_at
            .format(&Rfc3339)
            .unwrap_or_else(|_| u.created_at.to_string());
        // Writing into a String cannot fail.
        let _ = writeln!(
            rows,
            "<tr><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td></tr>",
            u.id,
            escape(&u.first_name),
            escape(&u.last_name),
            escape(&u.email),
            format_birthday(u.birthday),
            escape(&created),
        );
    }
    page(
        "Users",
        &format!(
            r#"<h1>Registered users</h1>
<table>
<thead><tr><th>ID</th><th>First name</th><th>Last name</th><th>Email</th><th>Birthday</th><th>Created</th></tr></thead>
<tbody>
{rows}</tbody>
</table>
<p><a href="/">Back to registration</a></p>"#
        ),
    )
}
