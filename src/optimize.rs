//! SVG minimizer
//!
//! Produces a canonical minimized form of downloaded vector markup:
//! strips non-rendering metadata, normalizes color notation and numeric
//! precision, and collapses redundant markup. The transformation is
//! deterministic and idempotent; rendering output is unchanged.
//!
//! Optimization failure is never fatal to the pipeline — callers fall
//! back to the raw content.

use regex::Regex;
use std::sync::LazyLock;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum OptimizeError {
    #[error("content has no <svg> root element")]
    NotSvg,
}

pub type Result<T> = std::result::Result<T, OptimizeError>;

static XML_PROLOG: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?s)<\?xml.*?\?>").unwrap());
static DOCTYPE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?is)<!DOCTYPE[^>]*>").unwrap());
static COMMENT: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?s)<!--.*?-->").unwrap());

// Non-rendering elements; regex has no backreferences, one pattern each
static METADATA_EL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<metadata\b[^>]*>.*?</metadata\s*>|<metadata\b[^>]*/>").unwrap());
static TITLE_EL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<title\b[^>]*>.*?</title\s*>|<title\b[^>]*/>").unwrap());
static DESC_EL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<desc\b[^>]*>.*?</desc\s*>|<desc\b[^>]*/>").unwrap());

// Editor-specific attributes and their namespace declarations
static EDITOR_ATTR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"\s+(?:xmlns:)?(?:inkscape|sodipodi|sketch|figma)(?::[A-Za-z0-9_.-]+)?\s*=\s*"[^"]*""#)
        .unwrap()
});
static EMPTY_ATTR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"\s+[A-Za-z_][-A-Za-z0-9_.:]*\s*=\s*"""#).unwrap());

static EMPTY_GROUP: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<g\b[^>]*>\s*</g\s*>|<g\b[^>]*/>").unwrap());

static RGB_COLOR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"rgb\(\s*(\d{1,3})\s*,\s*(\d{1,3})\s*,\s*(\d{1,3})\s*\)").unwrap());
static HEX6_COLOR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"#([0-9a-fA-F]{6})\b").unwrap());
static HEX3_COLOR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"#([0-9a-fA-F]{3})\b").unwrap());

static LONG_DECIMAL: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"-?\d+\.\d{4,}").unwrap());
static INTER_TAG_SPACE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r">\s+<").unwrap());

/// Minimize vector markup into its canonical form.
///
/// `optimize(optimize(x))` equals `optimize(x)` for any accepted input.
pub fn optimize(raw: &str) -> Result<String> {
    if !raw.contains("<svg") {
        return Err(OptimizeError::NotSvg);
    }

    let out = XML_PROLOG.replace_all(raw, "");
    let out = DOCTYPE.replace_all(&out, "");
    let out = COMMENT.replace_all(&out, "");
    let out = METADATA_EL.replace_all(&out, "");
    let out = TITLE_EL.replace_all(&out, "");
    let out = DESC_EL.replace_all(&out, "");
    let out = EDITOR_ATTR.replace_all(&out, "");
    let out = EMPTY_ATTR.replace_all(&out, "");

    let out = strip_empty_groups(&out);
    let out = normalize_colors(&out);
    let out = round_decimals(&out);

    let out = INTER_TAG_SPACE.replace_all(&out, "><");
    Ok(out.trim().to_string())
}

/// Removing a group can expose an enclosing empty group, so iterate to
/// a fixed point (nesting depth in practice is shallow).
fn strip_empty_groups(content: &str) -> String {
    let mut current = content.to_string();
    loop {
        let next = EMPTY_GROUP.replace_all(&current, "").into_owned();
        if next == current {
            return next;
        }
        current = next;
    }
}

fn normalize_colors(content: &str) -> String {
    let content = RGB_COLOR.replace_all(content, |caps: &regex::Captures| {
        let channel = |i: usize| caps[i].parse::<u64>().unwrap_or(0).min(255);
        format!("#{:02x}{:02x}{:02x}", channel(1), channel(2), channel(3))
    });

    let content = HEX6_COLOR.replace_all(&content, |caps: &regex::Captures| {
        let hex = caps[1].to_ascii_lowercase();
        let b = hex.as_bytes();
        if b[0] == b[1] && b[2] == b[3] && b[4] == b[5] {
            format!("#{}{}{}", &hex[0..1], &hex[2..3], &hex[4..5])
        } else {
            format!("#{}", hex)
        }
    });

    HEX3_COLOR
        .replace_all(&content, |caps: &regex::Captures| {
            format!("#{}", caps[1].to_ascii_lowercase())
        })
        .into_owned()
}

fn round_decimals(content: &str) -> String {
    LONG_DECIMAL
        .replace_all(content, |caps: &regex::Captures| {
            match caps[0].parse::<f64>() {
                Ok(value) => {
                    let rounded = format!("{:.3}", value);
                    rounded
                        .trim_end_matches('0')
                        .trim_end_matches('.')
                        .to_string()
                }
                Err(_) => caps[0].to_string(),
            }
        })
        .into_owned()
}
