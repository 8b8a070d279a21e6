//! Templates for WAP 2.0 phones: XHTML Mobile Profile.
//!
//! Strict XHTML subset, small screens, real form support. GIF thumbnails
//! are fine here; WBMP is only for the WML deck mode.

use maud::{html, Markup, PreEscaped};

use super::copy::StaticCopy;
use super::*;

const XHTML_MP_PROLOGUE: &str = "<?xml version=\"1.0\" encoding=\"utf-8\"?>\n<!DOCTYPE html PUBLIC \"-//WAPFORUM//DTD XHTML Mobile 1.0//EN\" \"http://www.wapforum.org/DTD/xhtml-mobile10.dtd\">\n";

pub fn register(registry: &mut TemplateRegistry) {
    registry.insert("wap2/index", |ctx| index(home_data(ctx)?));
    registry.insert("wap2/message", |ctx| message(message_data(ctx)?));
    registry.insert("wap2/notfound", |ctx| notfound(notfound_data(ctx)?));
    registry.insert("wap2/web", |ctx| web(web_data(ctx)?));
    registry.insert("wap2/download", |ctx| download(download_data(ctx)?));
    registry.insert("wap2/details", |ctx| details(details_data(ctx)?));
    registry.insert("wap2/results", |ctx| results(results_data(ctx)?));
    for (name, page_copy) in copy::STATIC_PAGES {
        registry.insert(&format!("wap2/{name}"), |_| Ok(static_page(page_copy)));
    }
}

fn shell(title: &str, content: Markup) -> Markup {
    html! {
        (PreEscaped(XHTML_MP_PROLOGUE))
        html xmlns="http://www.w3.org/1999/xhtml" {
            head { title { (title) " - IA" } }
            body {
                p {
                    a href="/" { "home" }
                    " "
                    a href="/search" { "search" }
                    " "
                    a href="/web" { "wayback" }
                    " "
                    a href="/about" { "about" }
                }
                (content)
                p { small { a href="/donate" { "donate" } } }
            }
        }
    }
}

fn index(data: &HomePage) -> Result<Markup, RenderError> {
    Ok(shell("Home", html! {
        h1 { "Internet Archive" }
        p { "A free library for books, movies, software, music and the web." }
        p {
            @for count in &data.media_counts {
                (count.label) ": " b { (count.count) } br;
            }
        }
        h2 { "News" }
        p {
            @for note in &data.announcements {
                a href=(note.url) { (note.title) } br;
            }
        }
        h2 { "Collections" }
        p {
            @for collection in &data.top_collections {
                a href=(details_url(&collection.identifier)) { (collection.title) } br;
            }
        }
    }))
}

fn message(message: &str) -> Result<Markup, RenderError> {
    Ok(shell("Notice", html! {
        h1 { "Notice" }
        p { (message) }
    }))
}

fn notfound(identifier: &str) -> Result<Markup, RenderError> {
    Ok(shell("Not found", html! {
        h1 { "Item not found" }
        p { "No item named \"" (identifier) "\"." }
        p { a href="/search" { "Try a search" } }
    }))
}

fn web(data: &WebPage) -> Result<Markup, RenderError> {
    Ok(shell("Wayback", html! {
        h1 { "Wayback Machine" }
        form action="/web" method="get" {
            p {
                input type="text" name="query" size="24" value=(data.query);
                input type="submit" value="Find";
            }
        }
        @if let Some(rows) = &data.results {
            @if rows.is_empty() {
                p { "No snapshots archived." }
            } @else {
                p {
                    @for row in rows {
                        a href=(snapshot_url(&row.timestamp, &row.original)) { (row.date) }
                        " [" (row.status_code) "] " (row.original)
                        br;
                    }
                }
            }
        }
    }))
}

fn download(data: &DownloadPage) -> Result<Markup, RenderError> {
    Ok(shell("Files", html! {
        h1 { (data.identifier) }
        p {
            @for file in &data.files {
                a href=(file_url(&data.identifier, &file.name)) { (file.name) }
                " (" (file.size) ", " (file.date) ")"
                br;
            }
        }
        p { a href=(details_url(&data.identifier)) { "Item details" } }
    }))
}

fn details(data: &DetailsPage) -> Result<Markup, RenderError> {
    Ok(shell(&data.title, html! {
        h1 { (data.title) }
        p {
            img src=(thumb_url(&data.identifier, 96, false)) alt=(data.title);
        }
        p {
            @if !data.creators.is_empty() {
                "by " (data.creators.join(", ")) br;
            }
            @if let Some(date) = &data.pub_date {
                "published " (date) br;
            }
            @if !data.topics.is_empty() {
                "topics: " (data.topics.join(", ")) br;
            }
            "size: " (data.item_size)
        }
        p { (data.description) }
        @if !data.collections.is_empty() {
            p {
                "in: "
                @for (i, collection) in data.collections.iter().enumerate() {
                    @if i > 0 { ", " }
                    a href=(details_url(&collection.identifier)) { (collection.title) }
                }
            }
        }
        p { a href={ "/download/" (data.identifier) } { "All files" } }
    }))
}

fn results(data: &ResultsPage) -> Result<Markup, RenderError> {
    Ok(shell("Search", html! {
        h1 { "Search" }
        form action="/search" method="get" {
            p {
                input type="text" name="query" size="24" value=(data.query);
                input type="submit" value="Go";
            }
        }
        @if let Some(rows) = &data.results {
            p { (data.num_found) " results, page " (data.page) }
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
    shell(page_copy.title, html! {
        h1 { (page_copy.title) }
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
