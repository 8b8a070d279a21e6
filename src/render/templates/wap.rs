//! Templates for WAP 1.x phones: WML 1.1 decks, one card per page.
//!
//! Decks must stay tiny (old gateways cap compiled decks around 1.4 kB),
//! so these pages are the tersest of the five modes. Forms use WML
//! variable substitution (`$(query:e)`) instead of HTML form submission.

use maud::{html, Markup, PreEscaped};

use super::copy::StaticCopy;
use super::*;

const WML_PROLOGUE: &str = "<?xml version=\"1.0\" encoding=\"utf-8\"?>\n<!DOCTYPE wml PUBLIC \"-//WAPFORUM//DTD WML 1.1//EN\" \"http://www.wapforum.org/DTD/wml_1.1.xml\">\n";

pub fn register(registry: &mut TemplateRegistry) {
    registry.insert("wap/index", |ctx| index(home_data(ctx)?));
    registry.insert("wap/message", |ctx| message(message_data(ctx)?));
    registry.insert("wap/notfound", |ctx| notfound(notfound_data(ctx)?));
    registry.insert("wap/web", |ctx| web(web_data(ctx)?));
    registry.insert("wap/download", |ctx| download(download_data(ctx)?));
    registry.insert("wap/details", |ctx| details(details_data(ctx)?));
    registry.insert("wap/results", |ctx| results(results_data(ctx)?));
    for (name, page_copy) in copy::STATIC_PAGES {
        registry.insert(&format!("wap/{name}"), |_| Ok(static_page(page_copy)));
    }
}

fn deck(title: &str, content: Markup) -> Markup {
    html! {
        (PreEscaped(WML_PROLOGUE))
        wml {
            card id="main" title=(title) {
                (content)
                p {
                    small {
                        a href="/" { "home" }
                        " "
                        a href="/search" { "find" }
                        " "
                        a href="/web" { "wayback" }
                    }
                }
            }
        }
    }
}

fn index(data: &HomePage) -> Result<Markup, RenderError> {
    Ok(deck("Internet Archive", html! {
        p { b { "Internet Archive" } }
        p {
            @for count in &data.media_counts {
                (count.label) ": " (count.count) br;
            }
        }
        p {
            @for collection in &data.top_collections {
                a href=(details_url(&collection.identifier)) { (collection.title) } br;
            }
        }
    }))
}

fn message(message: &str) -> Result<Markup, RenderError> {
    Ok(deck("Notice", html! {
        p { (message) }
    }))
}

fn notfound(identifier: &str) -> Result<Markup, RenderError> {
    Ok(deck("Not found", html! {
        p { "No item \"" (identifier) "\"." }
    }))
}

fn web(data: &WebPage) -> Result<Markup, RenderError> {
    Ok(deck("Wayback", html! {
        p { "URL: " input name="query" type="text" value=(data.query); }
        p { a href="/web?query=$(query:e)" { "Find snapshots" } }
        @if let Some(rows) = &data.results {
            @if rows.is_empty() {
                p { "No snapshots." }
            } @else {
                p {
                    @for row in rows {
                        a href=(snapshot_url(&row.timestamp, &row.original)) { (row.date) }
                        " [" (row.status_code) "]"
                        br;
                    }
                }
            }
        }
    }))
}

fn download(data: &DownloadPage) -> Result<Markup, RenderError> {
    Ok(deck("Files", html! {
        p { b { (data.identifier) } }
        p {
            @for file in &data.files {
                a href=(file_url(&data.identifier, &file.name)) { (file.name) }
                " " (file.size)
                br;
            }
        }
    }))
}

fn details(data: &DetailsPage) -> Result<Markup, RenderError> {
    Ok(deck("Item", html! {
        p { b { (data.title) } }
        p {
            img src=(thumb_url(&data.identifier, 64, true)) alt=(data.title);
        }
        p {
            @if !data.creators.is_empty() {
                "by " (data.creators.join(", ")) br;
            }
            @if let Some(date) = &data.pub_date {
                (date) br;
            }
            "size " (data.item_size)
        }
        p { small { (data.description) } }
        p { a href={ "/download/" (data.identifier) } { "files" } }
    }))
}

fn results(data: &ResultsPage) -> Result<Markup, RenderError> {
    Ok(deck("Find", html! {
        p { "Find: " input name="query" type="text" value=(data.query); }
        p { a href="/search?query=$(query:e)" { "Search" } }
        @if let Some(rows) = &data.results {
            p { (data.num_found) " found, p." (data.page) }
            p {
                @for row in rows {
                    a href=(details_url(&row.identifier)) { (row.title) } br;
                }
            }
            p {
                @if data.page > 1 {
                    a href=(search_url(&data.query, data.page - 1)) { "prev" }
                    " "
                }
                @if data.has_next {
                    a href=(search_url(&data.query, data.page + 1)) { "next" }
                }
            }
        }
    }))
}

fn static_page(page_copy: &StaticCopy) -> Markup {
    deck(page_copy.title, html! {
        p { b { (page_copy.title) } }
        @for paragraph in page_copy.paragraphs {
            p { (paragraph) }
        }
        p {
            @for (href, label) in page_copy.links {
                a href=(href) { (label) } br;
            }
        }
    })
}
