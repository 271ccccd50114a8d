//! Server-rendered reply page.

use maud::{html, Markup, PreEscaped, DOCTYPE};

use crate::state::AppState;

const PAGE_CSS: &str = r#"
body { margin: 0; font-family: Inter, system-ui, sans-serif; background: #f5f5f5; color: #333; }
.layout { display: flex; min-height: 100vh; }
aside { width: 18rem; padding: 1.5rem; background: #111827; color: #e5e7eb; }
aside code { color: #a7f3d0; word-break: break-all; }
aside hr { border-color: #374151; }
main { flex: 1; padding: 2rem; max-width: 52rem; margin: 0 auto; }
h1 { text-align: center; color: #2c3e50; }
.card { background: #fff; border: 1px solid #e0e0e0; border-radius: 12px; padding: 20px; margin: 20px 0; box-shadow: 0 4px 6px rgba(0,0,0,.1); }
textarea { width: 100%; min-height: 200px; border: 1px solid #ccc; border-radius: 8px; padding: 12px; font: inherit; box-sizing: border-box; }
button { background: #4CAF50; color: #fff; border: none; border-radius: 8px; padding: 10px 20px; font-weight: bold; cursor: pointer; margin-top: .75rem; }
button:hover { background: #45a049; }
.reply { white-space: pre-wrap; }
.banner { border-radius: 8px; padding: .75rem 1rem; margin-bottom: 1rem; }
.banner.warning { background: #fef3c7; color: #92400e; }
.banner.error { background: #fee2e2; color: #991b1b; }
"#;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BannerLevel {
    Warning,
    Error,
}

impl BannerLevel {
    fn class(&self) -> &'static str {
        match self {
            BannerLevel::Warning => "banner warning",
            BannerLevel::Error => "banner error",
        }
    }
}

#[derive(Debug, Clone)]
pub struct Banner {
    pub level: BannerLevel,
    pub text: String,
}

/// What the main panel shows after a submission.
#[derive(Debug, Clone, Default)]
pub struct PageView {
    pub email: String,
    pub reply: Option<String>,
    pub banner: Option<Banner>,
}

pub fn render(state: &AppState, view: &PageView) -> Markup {
    html! {
        (DOCTYPE)
        html lang="en" {
            head {
                meta charset="utf-8";
                meta name="viewport" content="width=device-width, initial-scale=1";
                title { "Referral Email Assistant" }
                style { (PreEscaped(PAGE_CSS)) }
            }
            body {
                div class="layout" {
                    (sidebar(state))
                    main {
                        h1 { "Welcome to Your Email Assistant" }
                        p {
                            "Draft professional and compliant email replies from the internal knowledge base."
                        }
                        div class="card" {
                            h2 { "Client Email" }
                            @if let Some(banner) = &view.banner {
                                div class=(banner.level.class()) role="alert" { (banner.text) }
                            }
                            form method="post" action="/" {
                                label for="email" { "Paste the client's email here:" }
                                textarea id="email" name="email" placeholder="Enter the email content..." {
                                    (view.email)
                                }
                                button type="submit" { "Generate Reply" }
                            }
                        }
                        div class="card" {
                            h2 { "Drafted Reply" }
                            @if let Some(reply) = &view.reply {
                                div class="reply" { (reply) }
                            }
                        }
                    }
                }
            }
        }
    }
}

fn sidebar(state: &AppState) -> Markup {
    let settings = &state.settings;
    html! {
        aside {
            h2 { "Status" }
            p { strong { "Knowledge base" } }
            p { "File: " code { (settings.kb_path.display().to_string()) } }
            p { "Index: " code { (settings.vectordb_path.display().to_string()) } }
            p { "Status: " (state.kb_status().label()) }
            hr;
            p { strong { "Model" } }
            p { "Groq model: " code { (settings.groq_model_name) } }
            hr;
            p { strong { "Usage tips" } }
            ul {
                li { "Paste the full client email (subject + body)." }
                li { "The reply is generated strictly from the internal KB." }
                li { "If the KB does not cover the query, the fixed escalation message is returned." }
            }
        }
    }
}
