//! Templates for desktop-era HTML 4 browsers (MSIE 3-6, Netscape 4,
//! Pocket IE). Table layout, attribute styling, no CSS dependence.

use maud::{html, Markup, PreEscaped};

use super::copy::StaticCopy;
use super::*;

const DOCTYPE_HTML4: &str = "<!DOCTYPE HTML PUBLIC \"-//W3C//DTD HTML 4.01 Transitional//EN\" \"http://www.w3.org/TR/html4/loose.dtd\">\n";

pub fn register(registry: &mut TemplateRegistry) {
    registry.insert("html4/index", |ctx| index(home_data(ctx)?));
    registry.insert("html4/message", |ctx| message(message_data(ctx)?));
    registry.insert("html4/notfound", |ctx| notfound(notfound_data(ctx)?));
    registry.insert("html4/web", |ctx| web(web_data(ctx)?));
    registry.insert("html4/download", |ctx| download(download_data(ctx)?));
    registry.insert("html4/details", |ctx| details(details_data(ctx)?));
    registry.insert("html4/results", |ctx| results(results_data(ctx)?));
    for (name, page_copy) in copy::STATIC_PAGES {
        registry.insert(&format!("html4/{name}"), |_| Ok(static_page(page_copy)));
    }
}

fn shell(title: &str, content: Markup) -> Markup {
    html! {
        (PreEscaped(DOCTYPE_HTML4))
        html {
            head {
                meta http-equiv="Content-Type" content="text/html; charset=utf-8";
                title { (title) " - Internet Archive" }
            }
            body bgcolor="#ffffff" text="#000000" link="#0000cc" {
                table width="640" border="0" cellpadding="4" cellspacing="0" align="center" {
                    tr bgcolor="#666699" {
                        td {
                            font color="#ffffff" size="4" { b { "Internet Archive" } }
                        }
                    }
                    tr bgcolor="#eeeeee" {
                        td {
                            a href="/" { "Home" }
                            " · "
                            a href="/search" { "Search" }
                            " · "
                            a href="/web" { "Wayback Machine" }
                            " · "
                            a href="/about" { "About" }
                            " · "
                            a href="/donate" { "Donate" }
                        }
                    }
                    tr {
                        td { (content) }
                    }
                    tr bgcolor="#eeeeee" {
                        td {
                            font size="1" {
                                a href="/projects" { "Projects" }
                                " | "
                                a href="/people" { "People" }
                                " | "
                                a href="/volunteer" { "Volunteer" }
                                " | "
                                a href="/contact" { "Contact" }
                            }
                        }
                    }
                }
            }
        }
    }
}

fn index(data: &HomePage) -> Result<Markup, RenderError> {
    Ok(shell("Home", html! {
        h2 { "Universal access to all knowledge" }
        p { "A free library of books, movies, software, music and the web itself." }
        table border="0" cellpadding="2" {
            tr {
                @for count in &data.media_counts {
                    td align="center" {
                        b { (count.count) } br; (count.label)
                    }
                }
            }
        }
        h3 { "Announcements" }
        ul {
            @for note in &data.announcements {
                li { a href=(note.url) { (note.title) } }
            }
        }
        h3 { "Popular collections" }
        ul {
            @for collection in &data.top_collections {
                li { a href=(details_url(&collection.identifier)) { (collection.title) } }
            }
        }
    }))
}

fn message(message: &str) -> Result<Markup, RenderError> {
    Ok(shell("Notice", html! {
        h2 { "Notice" }
        p { (message) }
        p { a href="/" { "Back to the library" } }
    }))
}

fn notfound(identifier: &str) -> Result<Markup, RenderError> {
    Ok(shell("Not found", html! {
        h2 { "Item not found" }
        p { "There is no item named " b { (identifier) } " in the library." }
        p { a href="/search" { "Try a search" } }
    }))
}

fn web(data: &WebPage) -> Result<Markup, RenderError> {
    Ok(shell("Wayback Machine", html! {
        h2 { "Wayback Machine" }
        p { "Browse the web as it was." }
        form action="/web" method="get" {
            input type="text" name="query" size="50" value=(data.query);
            " "
            input type="submit" value="Find snapshots";
        }
        @if let Some(rows) = &data.results {
            @if rows.is_empty() {
                p { "No snapshots of " b { (data.query) } " have been archived." }
            } @else {
                h3 { "Snapshots of " (data.query) }
                table border="0" cellpadding="2" width="100%" {
                    tr bgcolor="#eeeeee" {
                        th align="left" { "Date" }
                        th align="left" { "Status" }
                        th align="left" { "URL" }
                    }
                    @for row in rows {
                        tr {
                            td { a href=(snapshot_url(&row.timestamp, &row.original)) { (row.date) } }
                            td { (row.status_code) }
                            td { (row.original) }
                        }
                    }
                }
            }
        }
    }))
}

fn download(data: &DownloadPage) -> Result<Markup, RenderError> {
    Ok(shell("Files", html! {
        h2 { "Files in " (data.identifier) }
        table border="0" cellpadding="2" width="100%" {
            tr bgcolor="#eeeeee" {
                th align="left" { "Name" }
                th align="right" { "Size" }
                th align="left" { "Date" }
            }
            @for file in &data.files {
                tr {
                    td { a href=(file_url(&data.identifier, &file.name)) { (file.name) } }
                    td align="right" { (file.size) }
                    td { (file.date) }
                }
            }
        }
        p { a href=(details_url(&data.identifier)) { "Item details" } }
    }))
}

fn details(data: &DetailsPage) -> Result<Markup, RenderError> {
    Ok(shell(&data.title, html! {
        h2 { (data.title) }
        table border="0" cellpadding="4" {
            tr {
                td valign="top" {
                    img src=(thumb_url(&data.identifier, 160, false))
                        width="160" alt=(data.title);
                }
                td valign="top" {
                    table border="0" cellpadding="2" {
                        @if !data.creators.is_empty() {
                            tr { td { b { "Creator" } } td { (data.creators.join(", ")) } }
                        }
                        @if let Some(date) = &data.pub_date {
                            tr { td { b { "Published" } } td { (date) } }
                        }
                        @if !data.topics.is_empty() {
                            tr { td { b { "Topics" } } td { (data.topics.join(", ")) } }
                        }
                        tr { td { b { "Size" } } td { (data.item_size) } }
                        @if let Some(uploader) = &data.uploader {
                            tr {
                                td { b { "Uploader" } }
                                td {
                                    (uploader)
                                    @if let Some(date) = &data.upload_date { " on " (date) }
                                }
                            }
                        }
                        @if !data.collections.is_empty() {
                            tr {
                                td { b { "Collections" } }
                                td {
                                    @for (i, collection) in data.collections.iter().enumerate() {
                                        @if i > 0 { ", " }
                                        a href=(details_url(&collection.identifier)) { (collection.title) }
                                    }
                                }
                            }
                        }
                    }
                }
            }
        }
        p { (data.description) }
        p {
            a href={ "/download/" (data.identifier) } { "All files" }
            " | "
            a href={ "https://archive.org/details/" (data.identifier) } { "Full site version" }
        }
    }))
}

fn results(data: &ResultsPage) -> Result<Markup, RenderError> {
    Ok(shell("Search", html! {
        h2 { "Search the library" }
        form action="/search" method="get" {
            input type="text" name="query" size="50" value=(data.query);
            " "
            input type="submit" value="Search";
        }
        @if let Some(rows) = &data.results {
            p { b { (data.num_found) } " results for " b { (data.query) } ", page " (data.page) }
            ul {
                @for row in rows {
                    li { a href=(details_url(&row.identifier)) { (row.title) } }
                }
            }
            p {
                @if data.page > 1 {
                    a href=(search_url(&data.query, data.page - 1)) { "« Previous" }
                    " "
                }
                @if data.has_next {
                    a href=(search_url(&data.query, data.page + 1)) { "Next »" }
                }
            }
        }
    }))
}

fn static_page(page_copy: &StaticCopy) -> Markup {
    shell(page_copy.title, html! {
        h2 { (page_copy.title) }
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
