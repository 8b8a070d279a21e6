//! Templates for PocketPC / PDA browsers on 240x320 screens.
//!
//! Single narrow column, small type, short labels, tiny thumbnails. These
//! browsers parse HTML 4 but choke on wide tables.

use maud::{html, Markup, PreEscaped};

use super::copy::StaticCopy;
use super::*;

const DOCTYPE_HTML4: &str = "<!DOCTYPE HTML PUBLIC \"-//W3C//DTD HTML 4.01 Transitional//EN\" \"http://www.w3.org/TR/html4/loose.dtd\">\n";

pub fn register(registry: &mut TemplateRegistry) {
    registry.insert("ppc/index", |ctx| index(home_data(ctx)?));
    registry.insert("ppc/message", |ctx| message(message_data(ctx)?));
    registry.insert("ppc/notfound", |ctx| notfound(notfound_data(ctx)?));
    registry.insert("ppc/web", |ctx| web(web_data(ctx)?));
    registry.insert("ppc/download", |ctx| download(download_data(ctx)?));
    registry.insert("ppc/details", |ctx| details(details_data(ctx)?));
    registry.insert("ppc/results", |ctx| results(results_data(ctx)?));
    for (name, page_copy) in copy::STATIC_PAGES {
        registry.insert(&format!("ppc/{name}"), |_| Ok(static_page(page_copy)));
    }
}

fn shell(title: &str, content: Markup) -> Markup {
    html! {
        (PreEscaped(DOCTYPE_HTML4))
        html {
            head {
                meta http-equiv="Content-Type" content="text/html; charset=utf-8";
                title { (title) " - IA" }
            }
            body {
                p {
                    b { "Internet Archive" }
                    br;
                    small {
                        a href="/" { "home" }
                        " "
                        a href="/search" { "search" }
                        " "
                        a href="/web" { "wayback" }
                        " "
                        a href="/about" { "about" }
                    }
                }
                hr;
                (content)
                hr;
                p { small { a href="/donate" { "donate" } " " a href="/contact" { "contact" } } }
            }
        }
    }
}

fn index(data: &HomePage) -> Result<Markup, RenderError> {
    Ok(shell("Home", html! {
        p { small { "A free library of books, movies, software, music and the web." } }
        p {
            @for count in &data.media_counts {
                small { (count.label) " " b { (count.count) } }
                br;
            }
        }
        p { b { "News" } }
        @for note in &data.announcements {
            p { small { a href=(note.url) { (note.title) } } }
        }
        p { b { "Collections" } }
        @for collection in &data.top_collections {
            p { small { a href=(details_url(&collection.identifier)) { (collection.title) } } }
        }
    }))
}

fn message(message: &str) -> Result<Markup, RenderError> {
    Ok(shell("Notice", html! {
        p { b { "Notice" } }
        p { (message) }
        p { a href="/" { "back" } }
    }))
}

fn notfound(identifier: &str) -> Result<Markup, RenderError> {
    Ok(shell("Not found", html! {
        p { b { "Item not found" } }
        p { "No item named \"" (identifier) "\"." }
        p { a href="/search" { "search" } }
    }))
}

fn web(data: &WebPage) -> Result<Markup, RenderError> {
    Ok(shell("Wayback", html! {
        p { b { "Wayback Machine" } }
        form action="/web" method="get" {
            input type="text" name="query" size="24" value=(data.query);
            input type="submit" value="go";
        }
        @if let Some(rows) = &data.results {
            @if rows.is_empty() {
                p { small { "No snapshots archived." } }
            } @else {
                @for row in rows {
                    p {
                        small {
                            a href=(snapshot_url(&row.timestamp, &row.original)) { (row.date) }
                            " [" (row.status_code) "]"
                            br;
                            (row.original)
                        }
                    }
                }
            }
        }
    }))
}

fn download(data: &DownloadPage) -> Result<Markup, RenderError> {
    Ok(shell("Files", html! {
        p { b { "Files: " (data.identifier) } }
        @for file in &data.files {
            p {
                small {
                    a href=(file_url(&data.identifier, &file.name)) { (file.name) }
                    br;
                    (file.size) " " (file.date)
                }
            }
        }
        p { small { a href=(details_url(&data.identifier)) { "details" } } }
    }))
}

fn details(data: &DetailsPage) -> Result<Markup, RenderError> {
    Ok(shell(&data.title, html! {
        p { b { (data.title) } }
        p {
            img src=(thumb_url(&data.identifier, 80, false)) width="80" alt=(data.title);
        }
        p {
            small {
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
        }
        p { small { (data.description) } }
        @if !data.collections.is_empty() {
            p {
                small {
                    "in: "
                    @for (i, collection) in data.collections.iter().enumerate() {
                        @if i > 0 { ", " }
                        a href=(details_url(&collection.identifier)) { (collection.title) }
                    }
                }
            }
        }
        p { small { a href={ "/download/" (data.identifier) } { "all files" } } }
    }))
}

fn results(data: &ResultsPage) -> Result<Markup, RenderError> {
    Ok(shell("Search", html! {
        p { b { "Search" } }
        form action="/search" method="get" {
            input type="text" name="query" size="24" value=(data.query);
            input type="submit" value="go";
        }
        @if let Some(rows) = &data.results {
            p { small { (data.num_found) " results, page " (data.page) } }
            @for row in rows {
                p { small { a href=(details_url(&row.identifier)) { (row.title) } } }
            }
            p {
                small {
                    @if data.page > 1 {
                        a href=(search_url(&data.query, data.page - 1)) { "prev" }
                        " "
                    }
                    @if data.has_next {
                        a href=(search_url(&data.query, data.page + 1)) { "next" }
                    }
                }
            }
        }
    }))
}

fn static_page(page_copy: &StaticCopy) -> Markup {
    shell(page_copy.title, html! {
        p { b { (page_copy.title) } }
        @for paragraph in page_copy.paragraphs {
            p { small { (paragraph) } }
        }
        @for (href, label) in page_copy.links {
            p { small { a href=(href) { (label) } } }
        }
    })
}
