//! Forum document extraction.
//!
//! Selector matching works on a parsed [`Html`] that is not `Send`, so every
//! function here is synchronous and takes the raw page text; callers never
//! hold a parsed document across an await point.

use scraper::{ElementRef, Html, Selector};
use url::Url;

use crate::scrape::{CommentRecord, ScrapeError, NOT_FOUND};

const AUTHOR: &str = ".atc_info .atc_nickname a";
const PAGE_LINKS: &str = ".paging a.page_num";
const COMMENT_UNIT: &str = "#comment .cmt_unit";
const NICKNAME: &str = ".nickname";
const AVATAR: &str = ".inkpf_img";
const CONTENT: &str = ".xe_content";

/// Compiled selectors for the forum's article layout.
#[derive(Debug, Clone)]
pub struct ForumSelectors {
    author: Selector,
    page_links: Selector,
    comment_unit: Selector,
    nickname: Selector,
    avatar: Selector,
    content: Selector,
}

fn compile(css: &str) -> Result<Selector, ScrapeError> {
    Selector::parse(css).map_err(|e| ScrapeError::Selector(format!("{}: {:?}", css, e)))
}

fn text_of(element: ElementRef<'_>) -> String {
    element.text().collect::<String>().trim().to_string()
}

impl ForumSelectors {
    pub fn new() -> Result<Self, ScrapeError> {
        Ok(Self {
            author: compile(AUTHOR)?,
            page_links: compile(PAGE_LINKS)?,
            comment_unit: compile(COMMENT_UNIT)?,
            nickname: compile(NICKNAME)?,
            avatar: compile(AVATAR)?,
            content: compile(CONTENT)?,
        })
    }

    /// Author nickname and total comment pages from the article page.
    pub fn landing(&self, html: &str) -> (String, u32) {
        let document = Html::parse_document(html);

        let author = document
            .select(&self.author)
            .next()
            .map(text_of)
            .unwrap_or_else(|| NOT_FOUND.to_string());

        // Highest numeric page label; non-numeric labels ("next", "…") are ignored.
        let total_pages = document
            .select(&self.page_links)
            .filter_map(|a| text_of(a).parse::<u32>().ok())
            .max()
            .filter(|n| *n >= 1)
            .unwrap_or(1);

        (author, total_pages)
    }

    /// Comment records on one page, in document order.
    ///
    /// Units missing a nickname or content element are skipped.
    pub fn comments(&self, html: &str, origin: &Url) -> Vec<CommentRecord> {
        let document = Html::parse_document(html);

        document
            .select(&self.comment_unit)
            .filter_map(|unit| {
                let nickname = unit.select(&self.nickname).next()?;
                let content = unit.select(&self.content).next()?;

                let avatar_url = unit
                    .select(&self.avatar)
                    .next()
                    .and_then(|img| img.value().attr("src"))
                    .map(|src| resolve_avatar(src, origin))
                    .unwrap_or_else(|| NOT_FOUND.to_string());

                Some(CommentRecord {
                    user_nickname: text_of(nickname),
                    avatar_url,
                    content: text_of(content),
                })
            })
            .collect()
    }
}

/// Make an avatar `src` absolute against the forum origin.
pub fn resolve_avatar(src: &str, origin: &Url) -> String {
    if src.starts_with("http://") || src.starts_with("https://") {
        return src.to_string();
    }
    match origin.join(src) {
        Ok(url) => url.to_string(),
        Err(_) => format!("{}{}", origin.as_str().trim_end_matches('/'), src),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn origin() -> Url {
        Url::parse("https://www.0db.co.kr").unwrap()
    }

    #[test]
    fn author_and_pages_are_discovered() {
        let html = r#"
            <div class="atc_info"><span class="atc_nickname"><a href="/m/1">  writer  </a></span></div>
            <div class="paging">
                <a class="page_num" href="?cpage=1">1</a>
                <a class="page_num" href="?cpage=3">3</a>
                <a class="page_num" href="?cpage=2">2</a>
                <a class="page_num" href="?cpage=2">next</a>
            </div>"#;
        let (author, pages) = ForumSelectors::new().unwrap().landing(html);
        assert_eq!(author, "writer");
        assert_eq!(pages, 3);
    }

    #[test]
    fn missing_author_and_paging_use_fallbacks() {
        let (author, pages) = ForumSelectors::new().unwrap().landing("<p>empty</p>");
        assert_eq!(author, NOT_FOUND);
        assert_eq!(pages, 1);
    }

    #[test]
    fn incomplete_units_are_dropped() {
        let html = r#"
            <div id="comment">
                <div class="cmt_unit"><span class="nickname">ghost</span></div>
                <div class="cmt_unit">
                    <span class="nickname"> alice </span>
                    <img class="inkpf_img" src="/files/alice.png">
                    <div class="xe_content"> hello <b>there</b> </div>
                </div>
                <div class="cmt_unit"><div class="xe_content">orphan</div></div>
            </div>"#;
        let comments = ForumSelectors::new().unwrap().comments(html, &origin());
        assert_eq!(
            comments,
            vec![CommentRecord {
                user_nickname: "alice".into(),
                avatar_url: "https://www.0db.co.kr/files/alice.png".into(),
                content: "hello there".into(),
            }]
        );
    }

    #[test]
    fn units_outside_comment_section_are_ignored() {
        let html = r#"
            <div class="cmt_unit"><span class="nickname">x</span><div class="xe_content">y</div></div>
            <div id="comment"></div>"#;
        assert!(ForumSelectors::new().unwrap().comments(html, &origin()).is_empty());
    }

    #[test]
    fn avatar_fallbacks() {
        let html = r#"
            <div id="comment">
                <div class="cmt_unit"><span class="nickname">a</span><div class="xe_content">1</div></div>
                <div class="cmt_unit"><span class="nickname">b</span><img class="inkpf_img"><div class="xe_content">2</div></div>
                <div class="cmt_unit"><span class="nickname">a</span><div class="xe_content">1</div></div>
            </div>"#;
        let comments = ForumSelectors::new().unwrap().comments(html, &origin());
        assert_eq!(comments.len(), 3, "duplicates are preserved");
        assert!(comments.iter().all(|c| c.avatar_url == NOT_FOUND));
        assert_eq!(comments[0], comments[2]);
    }

    #[test]
    fn avatar_resolution() {
        assert_eq!(resolve_avatar("/img/x.png", &origin()), "https://www.0db.co.kr/img/x.png");
        assert_eq!(
            resolve_avatar("https://cdn.example.com/x.png", &origin()),
            "https://cdn.example.com/x.png"
        );
        assert_eq!(resolve_avatar("http://cdn.example.com/x.png?v=1", &origin()), "http://cdn.example.com/x.png?v=1");
    }
}
