//! Site copy for the static pages, shared by every mode's templates.
//!
//! Content lives here once; each mode renders it in its own markup dialect.

pub struct StaticCopy {
    pub title: &'static str,
    pub paragraphs: &'static [&'static str],
    pub links: &'static [(&'static str, &'static str)],
}

pub const ABOUT: StaticCopy = StaticCopy {
    title: "About the Archive",
    paragraphs: &[
        "The Internet Archive is a non-profit library of millions of free \
         books, movies, software, music, websites, and more.",
        "This edition of the site is built for the machines most sites left \
         behind: WAP phones, PDAs, and text-mode browsers. Every page is \
         served in a dialect your device can actually parse.",
    ],
    links: &[
        ("/projects", "Our projects"),
        ("/people", "The people behind it"),
        ("/contact", "Contact us"),
    ],
};

pub const CONTACT: StaticCopy = StaticCopy {
    title: "Contact",
    paragraphs: &[
        "General questions: info@archive.org",
        "For issues with this legacy edition, include your device model and \
         browser version. The User-Agent echo at /ua shows what your \
         browser sends.",
    ],
    links: &[("/ua", "Show my User-Agent")],
};

pub const PROJECTS: StaticCopy = StaticCopy {
    title: "Projects",
    paragraphs: &[
        "The Wayback Machine preserves snapshots of the web as it was.",
        "Open Library catalogs every book ever published and lends many of \
         them.",
        "The software collection keeps decades of programs runnable, from \
         mainframe tapes to shareware CDs.",
    ],
    links: &[("/web", "Search the Wayback Machine"), ("/search", "Search the collections")],
};

pub const PEOPLE: StaticCopy = StaticCopy {
    title: "People",
    paragraphs: &[
        "Librarians, engineers, and volunteers around the world keep the \
         Archive running and growing.",
        "Collections are curated by staff and by the communities that care \
         about them.",
    ],
    links: &[("/volunteer", "Join as a volunteer")],
};

pub const VOLUNTEER: StaticCopy = StaticCopy {
    title: "Volunteer",
    paragraphs: &[
        "Help scan books, proofread texts, or curate collections.",
        "Most volunteer work needs nothing more than a browser. Even the one \
         you are using right now.",
    ],
    links: &[("/contact", "Get in touch")],
};

pub const DONATE: StaticCopy = StaticCopy {
    title: "Donate",
    paragraphs: &[
        "The Archive is funded by donations from people who use it.",
        "Storage, bandwidth, and scanning all cost money; every contribution \
         keeps the library free for everyone.",
    ],
    links: &[("/about", "Where the money goes")],
};

/// The static pages, keyed by route-facing template name.
pub const STATIC_PAGES: &[(&str, &StaticCopy)] = &[
    ("about", &ABOUT),
    ("contact", &CONTACT),
    ("projects", &PROJECTS),
    ("people", &PEOPLE),
    ("volunteer", &VOLUNTEER),
    ("donate", &DONATE),
];
