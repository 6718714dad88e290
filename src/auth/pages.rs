// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! Page-shape extractors for the login flow
//!
//! Each helper parses one page and drops the document before returning, so
//! the async login flow never holds a (non-`Send`) DOM across an await point.

use regex::Regex;
use url::Url;

use crate::error::{Error, Result};
use crate::html::Document;

/// URL of the network login page.
///
/// The sign-in endpoint answers with the login page URL as its body. A body
/// that is not an absolute URL means we were redirected straight to the page.
pub(crate) fn login_page_url(body: &str, response_url: &Url) -> Url {
    Url::parse(body.trim())
        .ok()
        .filter(|url| matches!(url.scheme(), "http" | "https"))
        .unwrap_or_else(|| response_url.clone())
}

/// Hidden `fkey` field of the network login form
pub(crate) fn form_fkey(html: &str) -> Result<String> {
    let doc = Document::parse(html)?;
    doc.select_first("input#fkey")?
        .and_then(|el| el.attr("value"))
        .filter(|value| !value.is_empty())
        .ok_or(Error::TokenNotFound)
}

/// Follow-up URL from the `<noscript>` block of the login submit response
pub(crate) fn auth_url(html: &str, base: &Url) -> Result<Url> {
    let doc = Document::parse(html)?;
    for nested in doc.noscript_documents()? {
        let href = nested.select_first("a[href]")?.and_then(|el| el.attr("href"));
        if let Some(href) = href {
            return base.join(href.trim()).map_err(|_| Error::AuthUrlNotFound);
        }
    }
    Err(Error::AuthUrlNotFound)
}

/// Hidden `session` and `fkey` fields of the OpenID consent prompt
pub(crate) fn prompt_fields(html: &str, path: &str) -> Result<(String, String)> {
    let doc = Document::parse(html)?;
    let field = |name: &str| -> Result<Option<String>> {
        Ok(doc
            .select_first(&format!("input[name=\"{}\"]", name))?
            .and_then(|el| el.attr("value")))
    };

    match (field("session")?, field("fkey")?) {
        (Some(session), Some(fkey)) => Ok((session, fkey)),
        _ => Err(Error::incomplete_login(path)),
    }
}

/// Chat `fkey` and user id from the chat home page
pub(crate) fn chat_bootstrap(html: &str) -> Result<(String, u64)> {
    let doc = Document::parse(html)?;

    let fkey = doc
        .select_first("input#fkey")?
        .and_then(|el| el.attr("value"))
        .filter(|value| !value.is_empty())
        .ok_or(Error::ChatTokenNotFound)?;

    let user_pattern = Regex::new(r"^/users/(\d+)").map_err(|e| Error::other(e.to_string()))?;
    let user_id = doc
        .select_all(r#"a[href^="/users/"]"#)?
        .into_iter()
        .filter_map(|el| el.attr("href"))
        .find_map(|href| {
            user_pattern
                .captures(&href)
                .and_then(|caps| caps.get(1))
                .and_then(|id| id.as_str().parse::<u64>().ok())
        })
        .ok_or(Error::ChatUserIdNotFound)?;

    Ok((fkey, user_id))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_login_page_url() {
        let response_url = Url::parse("https://stackexchange.com/users/signin").unwrap();

        let url = login_page_url(
            "https://openid.stackexchange.com/affiliate/form?affId=11\n",
            &response_url,
        );
        assert_eq!(url.host_str(), Some("openid.stackexchange.com"));

        let url = login_page_url("<html>login form</html>", &response_url);
        assert_eq!(url, response_url);
    }

    #[test]
    fn test_form_fkey() {
        let html = r#"<form><input type="hidden" id="fkey" name="fkey" value="abc-123" /></form>"#;
        assert_eq!(form_fkey(html).unwrap(), "abc-123");

        let err = form_fkey("<form><input name=\"email\"></form>").unwrap_err();
        assert!(matches!(err, Error::TokenNotFound));
    }

    #[test]
    fn test_auth_url_only_inside_noscript() {
        let base = Url::parse("https://openid.stackexchange.com/affiliate/form/login/submit").unwrap();
        let html = r#"<html><body>
            <a href="/decoy">decoy</a>
            <noscript><a href="/affiliate/form/login/complete?token=xyz" target="_top">Continue</a></noscript>
            </body></html>"#;

        let url = auth_url(html, &base).unwrap();
        assert_eq!(url.path(), "/affiliate/form/login/complete");
        assert_eq!(url.query(), Some("token=xyz"));

        let err = auth_url(r#"<a href="/decoy">x</a>"#, &base).unwrap_err();
        assert!(matches!(err, Error::AuthUrlNotFound));
    }

    #[test]
    fn test_prompt_fields() {
        let html = r#"<form>
            <input type="hidden" name="session" value="s-1" />
            <input type="hidden" name="fkey" value="f-1" />
        </form>"#;
        assert_eq!(
            prompt_fields(html, "/account/prompt").unwrap(),
            ("s-1".to_string(), "f-1".to_string())
        );

        let err = prompt_fields("<form></form>", "/account/prompt").unwrap_err();
        assert!(matches!(err, Error::IncompleteLogin { ref path } if path == "/account/prompt"));
    }

    #[test]
    fn test_chat_bootstrap() {
        let html = r#"<html><body>
            <input id="fkey" name="fkey" type="hidden" value="0123abcd" />
            <a href="/users/login">log in</a>
            <a href="/users/12345/some-user">some user</a>
        </body></html>"#;
        assert_eq!(chat_bootstrap(html).unwrap(), ("0123abcd".to_string(), 12345));

        let err = chat_bootstrap(r#"<a href="/users/1/x">x</a>"#).unwrap_err();
        assert!(matches!(err, Error::ChatTokenNotFound));

        let err = chat_bootstrap(r#"<input id="fkey" value="k" /><a href="/users/login">x</a>"#)
            .unwrap_err();
        assert!(matches!(err, Error::ChatUserIdNotFound));
    }
}
