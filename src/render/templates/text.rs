//! Templates for text-mode browsers (Lynx, Links, w3m).
//!
//! HTML 2.0 era markup: headings, lists, rules. No tables, no images, no
//! forms fancier than a single text input.

use maud::{html, Markup, PreEscaped};

use super::copy::StaticCopy;
use super::*;

const DOCTYPE_HTML2: &str = "<!DOCTYPE HTML PUBLIC \"-//IETF//DTD HTML 2.0//EN\">\n";

pub fn register(registry: &mut TemplateRegistry) {
    registry.insert("text/index", |ctx| index(home_data(ctx)?));
    registry.insert("text/message", |ctx| message(message_data(ctx)?));
    registry.insert("text/notfound", |ctx| notfound(notfound_data(ctx)?));
    registry.insert("text/web", |ctx| web(web_data(ctx)?));
    registry.insert("text/download", |ctx| download(download_data(ctx)?));
    registry.insert("text/details", |ctx| details(details_data(ctx)?));
    registry.insert("text/results", |ctx| results(results_data(ctx)?));
    for (name, page_copy) in copy::STATIC_PAGES {
        registry.insert(&format!("text/{name}"), |_| Ok(static_page(page_copy)));
    }
}

fn shell(title: &str, content: Markup) -> Markup {
    html! {
        (PreEscaped(DOCTYPE_HTML2))
        html {
            head { title { (title) " - Internet Archive" } }
            body {
                p {
                    a href="/" { "home" }
                    " | "
                    a href="/search" { "search" }
                    " | "
                    a href="/web" { "wayback" }
                    " | "
                    a href="/about" { "about" }
                    " | "
                    a href="/donate" { "donate" }
                }
                hr;
                (content)
                hr;
                address { "Internet Archive, text edition" }
            }
        }
    }
}

fn index(data: &HomePage) -> Result<Markup, RenderError> {
    Ok(shell("Home", html! {
        h1 { "Internet Archive" }
        p { "A free library of books, movies, software, music and the web." }
        h2 { "In the collections" }
        ul {
            @for count in &data.media_counts {
                li { (count.label) ": " (count.count) }
            }
        }
        h2 { "Announcements" }
        ul {
            @for note in &data.announcements {
                li { a href=(note.url) { (note.title) } }
            }
        }
        h2 { "Popular collections" }
        ul {
            @for collection in &data.top_collections {
                li { a href=(details_url(&collection.identifier)) { (collection.title) } }
            }
        }
    }))
}

fn message(message: &str) -> Result<Markup, RenderError> {
    Ok(shell("Notice", html! {
        h1 { "Notice" }
        p { (message) }
        p { a href="/" { "Back to the library" } }
    }))
}

fn notfound(identifier: &str) -> Result<Markup, RenderError> {
    Ok(shell("Not found", html! {
        h1 { "Item not found" }
        p { "There is no item named \"" (identifier) "\" in the library." }
        p { a href="/search" { "Try a search" } }
    }))
}

fn web(data: &WebPage) -> Result<Markup, RenderError> {
    Ok(shell("Wayback Machine", html! {
        h1 { "Wayback Machine" }
        form action="/web" method="get" {
            p {
                "URL: "
                input type="text" name="query" size="40" value=(data.query);
                " "
                input type="submit" value="Find snapshots";
            }
        }
        @if let Some(rows) = &data.results {
            @if rows.is_empty() {
                p { "No snapshots of \"" (data.query) "\" have been archived." }
            } @else {
                h2 { "Snapshots of " (data.query) }
                ul {
                    @for row in rows {
                        li {
                            a href=(snapshot_url(&row.timestamp, &row.original)) { (row.date) }
                            " [" (row.status_code) "] " (row.original)
                        }
                    }
                }
            }
        }
    }))
}

fn download(data: &DownloadPage) -> Result<Markup, RenderError> {
    Ok(shell("Files", html! {
        h1 { "Files in " (data.identifier) }
        ul {
            @for file in &data.files {
                li {
                    a href=(file_url(&data.identifier, &file.name)) { (file.name) }
                    " (" (file.size) ", " (file.date) ")"
                }
            }
        }
        p { a href=(details_url(&data.identifier)) { "Item details" } }
    }))
}

fn details(data: &DetailsPage) -> Result<Markup, RenderError> {
    Ok(shell(&data.title, html! {
        h1 { (data.title) }
        dl {
            @if !data.creators.is_empty() {
                dt { "Creator" }
                dd { (data.creators.join(", ")) }
            }
            @if let Some(date) = &data.pub_date {
                dt { "Published" }
                dd { (date) }
            }
            @if !data.topics.is_empty() {
                dt { "Topics" }
                dd { (data.topics.join(", ")) }
            }
            dt { "Size" }
            dd { (data.item_size) }
            @if let Some(uploader) = &data.uploader {
                dt { "Uploaded by" }
                dd {
                    (uploader)
                    @if let Some(date) = &data.upload_date { " on " (date) }
                }
            }
            @if !data.collections.is_empty() {
                dt { "Collections" }
                dd {
                    @for (i, collection) in data.collections.iter().enumerate() {
                        @if i > 0 { ", " }
                        a href=(details_url(&collection.identifier)) { (collection.title) }
                    }
                }
            }
        }
        p { (data.description) }
        p { a href={ "/download/" (data.identifier) } { "All files" } }
    }))
}

fn results(data: &ResultsPage) -> Result<Markup, RenderError> {
    Ok(shell("Search", html! {
        h1 { "Search the library" }
        form action="/search" method="get" {
            p {
                input type="text" name="query" size="40" value=(data.query);
                " "
                input type="submit" value="Search";
            }
        }
        @if let Some(rows) = &data.results {
            p { (data.num_found) " results for \"" (data.query) "\", page " (data.page) }
            ul {
                @for row in rows {
                    li { a href=(details_url(&row.identifier)) { (row.title) } }
                }
            }
            p {
                @if data.page > 1 {
                    a href=(search_url(&data.query, data.page - 1)) { "Previous page" }
                    " "
                }
                @if data.has_next {
                    a href=(search_url(&data.query, data.page + 1)) { "Next page" }
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
        ul {
            @for (href, label) in page_copy.links {
                li { a href=(href) { (label) } }
            }
        }
    })
}
