//! Rewrites board-internal references in image descriptions into fully
//! qualified links pointing back at the source board.
use once_cell::sync::Lazy;
use regex::{Captures, Regex};

// `>>1234`, `>>1234t` or `>>1234p` cross references. The suffix stays in the
// visible label; the link always targets the image page itself.
static IN_SITE_LINK: Lazy<Regex> = Lazy::new(|| Regex::new(r">>([0-9]+)(t|p?)").unwrap());

// Textile-style links with a root-relative target, `"label":/path`.
static RELATIVE_LINK: Lazy<Regex> = Lazy::new(|| Regex::new(r#""(.+)":(/.+)"#).unwrap());

/// Pure description transform, bound to the source board host captured before
/// the pipeline starts. Applied exactly once per image, before any upload
/// attempt.
#[derive(Debug, Clone)]
pub struct LinkRewriter {
    host: String,
}

impl LinkRewriter {
    pub fn new(source_host: &str) -> Self {
        Self {
            host: source_host.to_string(),
        }
    }

    /// Expands all in-site cross references, then promotes all root-relative
    /// links to absolute ones. Already-absolute links never match either
    /// pattern, so rewriting is idempotent.
    pub fn rewrite(&self, description: &str) -> String {
        let expanded = IN_SITE_LINK.replace_all(description, |caps: &Captures| {
            format!(
                "\">> {id}{kind}\":https://{host}/images/{id} ",
                id = &caps[1],
                kind = &caps[2],
                host = self.host
            )
        });

        RELATIVE_LINK
            .replace_all(&expanded, |caps: &Captures| {
                format!("\"{}\":https://{}{}", &caps[1], self.host, &caps[2])
            })
            .into_owned()
    }
}
