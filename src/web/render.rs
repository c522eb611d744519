//! HTML pages
//!
//! Plain string rendering; every piece of filesystem- or user-derived text
//! goes through [`html_escape`], every URL path through [`encode_path`].

use chrono::{DateTime, Local, Utc};
use std::time::SystemTime;

use crate::auth::Principal;
use crate::storage::{DirEntry, RelativePath};

const STYLE: &str = "body{font-family:system-ui,Segoe UI,Helvetica,Arial,sans-serif;margin:24px;line-height:1.45}table{border-collapse:collapse}td,th{padding:4px 10px;border-bottom:1px solid #ddd;text-align:left}td.size{text-align:right}.notice{color:#b00020}";

pub fn html_escape(s: impl AsRef<str>) -> String {
    s.as_ref()
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

/// Percent-encodes a `/`-separated path for use in a URL, keeping the
/// separators.
pub fn encode_path(path: &str) -> String {
    let mut out = String::with_capacity(path.len());
    for byte in path.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' | b'/' => {
                out.push(byte as char)
            }
            _ => out.push_str(&format!("%{byte:02X}")),
        }
    }
    out
}

/// URL of the listing page for `dir`.
pub fn browse_href(dir: &RelativePath) -> String {
    if dir.is_root() {
        "/browse/".to_string()
    } else {
        format!("/browse/{}/", encode_path(&dir.to_string()))
    }
}

fn child_path(dir: &RelativePath, name: &str) -> String {
    if dir.is_root() {
        name.to_string()
    } else {
        format!("{dir}/{name}")
    }
}

fn format_time(entry: &DirEntry) -> String {
    DateTime::<Local>::from(entry.modified_at)
        .format("%Y-%m-%d %H:%M:%S")
        .to_string()
}

/// IMF-fixdate, as used by `Last-Modified`.
pub fn http_date(time: SystemTime) -> String {
    DateTime::<Utc>::from(time)
        .format("%a, %d %b %Y %H:%M:%S GMT")
        .to_string()
}

fn page(title: &str, body: &str) -> String {
    let mut s = String::new();
    s.push_str("<!doctype html>\n<html><head><meta charset=\"utf-8\">");
    s.push_str("<title>");
    s.push_str(&html_escape(title));
    s.push_str("</title><style>");
    s.push_str(STYLE);
    s.push_str("</style></head><body>");
    s.push_str(body);
    s.push_str("</body></html>\n");
    s
}

fn session_links(dir: &RelativePath, principal: Option<&Principal>) -> String {
    match principal {
        Some(principal) => {
            let upload = if dir.is_root() {
                "/upload/".to_string()
            } else {
                format!("/upload/{}/", encode_path(&dir.to_string()))
            };
            format!(
                "<p>Logged in as <b>{}</b> | <a href=\"{}\">Upload here</a> | <a href=\"/logout\">Log out</a></p>",
                html_escape(principal.username()),
                upload
            )
        }
        None => "<p><a href=\"/login\">Log in</a> to upload or remove files</p>".to_string(),
    }
}

/// Directory listing page.
pub fn browse_page(
    dir: &RelativePath,
    entries: &[DirEntry],
    principal: Option<&Principal>,
) -> String {
    let title = format!("/{dir}");
    let mut body = String::new();
    body.push_str("<h1>Index of ");
    body.push_str(&html_escape(&title));
    body.push_str("</h1>");
    body.push_str(&session_links(dir, principal));
    body.push_str("<table><tr><th>Name</th><th>Size</th><th>Modified</th>");
    if principal.is_some() {
        body.push_str("<th></th>");
    }
    body.push_str("</tr>");

    for entry in entries {
        let (href, remove_path) = if entry.is_parent() {
            (browse_href(&dir.parent().unwrap_or_default()), None)
        } else {
            let path = child_path(dir, &entry.name);
            let href = if entry.is_directory {
                format!("/browse/{}/", encode_path(&path))
            } else {
                format!("/browse/{}", encode_path(&path))
            };
            (href, Some(path))
        };
        let label = if entry.is_directory && !entry.is_parent() {
            format!("{}/", entry.name)
        } else {
            entry.name.clone()
        };

        body.push_str("<tr><td><a href=\"");
        body.push_str(&href);
        body.push_str("\">");
        body.push_str(&html_escape(&label));
        body.push_str("</a></td><td class=\"size\">");
        body.push_str(&entry.size.to_string());
        body.push_str("</td><td>");
        body.push_str(&format_time(entry));
        body.push_str("</td>");
        if principal.is_some() {
            body.push_str("<td>");
            if let Some(path) = remove_path {
                body.push_str("<a href=\"/remove/");
                body.push_str(&encode_path(&path));
                body.push_str("\">remove</a>");
            }
            body.push_str("</td>");
        }
        body.push_str("</tr>");
    }
    body.push_str("</table>");

    page(&title, &body)
}

pub fn login_page(incorrect: bool) -> String {
    let mut body = String::from("<h1>Log in</h1>");
    if incorrect {
        body.push_str("<p class=\"notice\">Incorrect username or password</p>");
    }
    body.push_str(
        "<form method=\"post\" action=\"/login\">\
         <p><label>Username <input name=\"username\" autofocus></label></p>\
         <p><label>Password <input name=\"password\" type=\"password\"></label></p>\
         <p><button type=\"submit\">Log in</button></p></form>\
         <p><a href=\"/browse/\">Back to files</a></p>",
    );
    page("Log in", &body)
}

pub fn upload_page(dir: &RelativePath) -> String {
    let action = if dir.is_root() {
        "/upload/".to_string()
    } else {
        format!("/upload/{}/", encode_path(&dir.to_string()))
    };
    let mut body = String::from("<h1>Upload to ");
    body.push_str(&html_escape(format!("/{dir}")));
    body.push_str("</h1><form method=\"post\" enctype=\"multipart/form-data\" action=\"");
    body.push_str(&action);
    body.push_str(
        "\"><p><input type=\"file\" name=\"uploadedFile\"></p>\
         <p><button type=\"submit\">Upload</button></p></form><p><a href=\"",
    );
    body.push_str(&browse_href(dir));
    body.push_str("\">Back</a></p>");
    page("Upload", &body)
}
