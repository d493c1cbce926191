use crate::{models::LoginNotice, routes::LOGIN_PATH};

/// What the gate page is rendered for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GatePage<'a> {
    Login {
        redirect_path: &'a str,
        notice: Option<LoginNotice>,
    },
    AccessDenied {
        surname: &'a str,
    },
}

/// Minimal HTML escaping for text and double-quoted attribute values.
pub fn escape_html(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
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

const IDENTITY_BAR_STYLES: &str = r#"<style>
  #identity-bar {
    background: #1a1a1a; color: #eee;
    padding: 0.5rem 1rem; display: flex; justify-content: space-between;
    align-items: center; font-size: 0.85rem; border-bottom: 1px solid #333; position: sticky;
    top: 0; z-index: 1000; font-family: system-ui, -apple-system, sans-serif;
  }
  #identity-bar a.logout-link { color: #ff4136; text-decoration: none; font-weight: bold; }
  #identity-bar a.logout-link:hover { color: #fff; }
  #identity-bar strong { color: #fff; }
</style>"#;

/// identity_bar
///
/// Banner injected at the top of every authorized HTML page. The logout link
/// submits a POST to the login endpoint with `logout=1`.
pub fn identity_bar(surname: &str) -> String {
    format!(
        r#"<div class="id-bar" id="identity-bar">{IDENTITY_BAR_STYLES}
  <span>Logged in as: <strong>{surname}</strong></span>
  <a href="{LOGIN_PATH}?logout=1"
     onclick="const f=document.createElement('form');f.method='POST';f.action=this.href;document.body.appendChild(f);f.submit();return false;"
     class="logout-link">Logout</a>
</div>"#,
        surname = escape_html(surname),
    )
}

/// render
///
/// Full page for the login prompt or the access-denied prompt.
pub fn render(page: GatePage<'_>) -> String {
    let (title, heading, sub_heading) = match page {
        GatePage::Login { .. } => (
            "Login Required",
            "Login".to_string(),
            "Please enter your details to access this site.".to_string(),
        ),
        GatePage::AccessDenied { surname } => (
            "Access Denied",
            "Access Denied".to_string(),
            format!(
                "Sorry {}, you don't have permission to access this content.",
                escape_html(surname)
            ),
        ),
    };

    let notice = match page {
        GatePage::Login {
            notice: Some(LoginNotice::EmptyFields),
            ..
        } => r#"<p class="error">Please fill in all fields.</p>"#,
        GatePage::Login {
            notice: Some(LoginNotice::UnknownUser),
            ..
        } => r#"<p class="error">Your details are not in our database. Please try again.</p>"#,
        _ => "",
    };

    let actions = match page {
        GatePage::Login { redirect_path, .. } => format!(
            r#"<form method="post" action="{LOGIN_PATH}">
          <input type="hidden" name="redirect" value="{redirect}" />
          <input type="text" name="surname" placeholder="Surname" aria-label="Surname" required autofocus>
          <input type="text" name="id_number" placeholder="Member Number" aria-label="Member Number" inputmode="numeric" required>
          <button type="submit" class="contrast">Login</button>
        </form>"#,
            redirect = escape_html(redirect_path),
        ),
        GatePage::AccessDenied { .. } => format!(
            r#"<div style="display: flex; gap: 1rem; margin-top: 2rem; align-items: flex-start;">
          <button onclick="history.back()" class="secondary">Go Back</button>
          <form method="post" action="{LOGIN_PATH}?logout=1" style="flex: 1;">
            <button type="submit" class="contrast">Logout / Switch User</button>
          </form>
        </div>"#
        ),
    };

    format!(
        r#"<!doctype html>
<html lang="en" data-theme="dark">
  <head>
    <meta charset="utf-8">
    <meta name="viewport" content="width=device-width, initial-scale=1">
    <title>{title}</title>
    <link rel="stylesheet" href="https://unpkg.com/@picocss/pico@latest/css/pico.min.css">
    <style>
      body > main {{ display: flex; flex-direction: column; justify-content: center; min-height: calc(100vh - 7rem); padding: 1rem 0; max-width: 600px; margin: 0 auto; }}
      .error {{ background: #ff4136; border-radius: 10px; color: white; padding: 0.5em 1em; margin-bottom: 1rem; }}
    </style>
  </head>
  <body>
    <main>
      <article>
        <hgroup>
          <h1>{heading}</h1>
          <h2>{sub_heading}</h2>
        </hgroup>
        {notice}
        {actions}
      </article>
    </main>
  </body>
</html>
"#
    )
}
