//! HTML pages.
//!
//! Every page goes through [`layout`], which sets the `<title>` from
//! [`full_title`] and renders the request's notices. All interpolated text is
//! escaped.

use crate::auth::{LoginForm, Notice, UserRecord};

pub const BASE_TITLE: &str = "Ruby on Rails Tutorial Sample App";

/// Full page title: the base title alone, or `"{page} | {base}"`.
#[must_use]
pub fn full_title(page_title: &str) -> String {
    if page_title.is_empty() {
        BASE_TITLE.to_string()
    } else {
        format!("{page_title} | {BASE_TITLE}")
    }
}

#[must_use]
pub fn escape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for ch in input.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
    out
}

fn layout(page_title: &str, notices: &[Notice], body: &str) -> String {
    let title = escape_html(&full_title(page_title));
    let alerts: String = notices
        .iter()
        .map(|notice| {
            format!(
                "<div class=\"alert alert-{}\">{}</div>\n",
                notice.severity,
                escape_html(&notice.message)
            )
        })
        .collect();

    format!(
        "<!DOCTYPE html>\n\
         <html>\n\
         <head>\n\
         <meta charset=\"utf-8\">\n\
         <title>{title}</title>\n\
         </head>\n\
         <body>\n\
         <header><a href=\"/\">sample app</a> <a href=\"/login\">Log in</a></header>\n\
         <div class=\"container\">\n\
         {alerts}{body}\n\
         </div>\n\
         </body>\n\
         </html>\n"
    )
}

#[must_use]
pub fn home_page() -> String {
    layout(
        "",
        &[],
        "<h1>Welcome to the Sample App</h1>\n<a href=\"/signup\">Sign up now!</a>",
    )
}

#[must_use]
pub fn login_page(form: &LoginForm, notices: &[Notice]) -> String {
    let body = format!(
        "<h1>Log in</h1>\n\
         <form action=\"/login\" method=\"post\">\n\
         <label for=\"session_email\">Email</label>\n\
         <input id=\"session_email\" type=\"email\" name=\"email\" value=\"{}\">\n\
         <label for=\"session_password\">Password</label>\n\
         <input id=\"session_password\" type=\"password\" name=\"password\">\n\
         <input type=\"submit\" value=\"Log in\">\n\
         </form>\n\
         <p>New user? <a href=\"/signup\">Sign up now!</a></p>",
        escape_html(&form.email)
    );
    layout("Log in", notices, &body)
}

#[must_use]
pub fn signup_page() -> String {
    layout(
        "Sign up",
        &[],
        "<h1>Sign up</h1>\n<p>Accounts are created by an administrator.</p>\n\
         <p>Already have one? <a href=\"/login\">Log in</a></p>",
    )
}

#[must_use]
pub fn user_page(user: &UserRecord) -> String {
    let name = escape_html(&user.name);
    let body = format!(
        "<h1>{name}</h1>\n\
         <form action=\"/logout\" method=\"post\">\n\
         <input type=\"submit\" value=\"Log out\">\n\
         </form>"
    );
    layout(&user.name, &[], &body)
}
