//! Locale resolution for the tool front-end.
//!
//! A raw locale may come from the URL segment, the locale cookie, or the
//! `Accept-Language` header, checked in that order. Anything that does not match a
//! supported locale falls through to the next source and finally to [`Locale::default`].

use regex::Regex;
use serde::Serialize;
use std::sync::OnceLock;
use utoipa::ToSchema;

/// Max-age of the persisted locale cookie.
pub const LOCALE_COOKIE_MAX_AGE_DAYS: i64 = 365;

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, ToSchema, strum::EnumString, strum::Display, strum::EnumIter,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum Locale {
    #[default]
    Zh,
    En,
}

impl Locale {
    /// Matches a BCP 47 tag (`zh-CN`, `en_US`, `EN`) by its primary subtag.
    #[must_use]
    pub fn match_tag(tag: &str) -> Option<Self> {
        let primary = tag.trim().split(['-', '_']).next()?;
        primary.parse().ok()
    }

    /// Language name substituted into tool prompt templates.
    #[must_use]
    pub const fn language_name(self) -> &'static str {
        match self {
            Locale::Zh => "Simplified Chinese",
            Locale::En => "English",
        }
    }
}

static ACCEPT_LANGUAGE_ENTRY: OnceLock<Regex> = OnceLock::new();

fn accept_language_entry() -> &'static Regex {
    ACCEPT_LANGUAGE_ENTRY.get_or_init(|| {
        Regex::new(r"^\s*([A-Za-z]{1,8}(?:[-_][A-Za-z0-9]{1,8})*|\*)\s*(?:;\s*q\s*=\s*([01](?:\.[0-9]{0,3})?))?\s*$")
            .expect("accept-language pattern is valid")
    })
}

/// Parses an `Accept-Language` header into tags ordered by descending quality.
///
/// Malformed entries and entries with `q=0` are dropped; ties keep header order.
#[must_use]
pub fn parse_accept_language(header: &str) -> Vec<String> {
    let pattern = accept_language_entry();
    let mut entries: Vec<(String, f32)> = header
        .split(',')
        .filter_map(|entry| {
            let caps = pattern.captures(entry)?;
            let quality = caps
                .get(2)
                .map_or(Ok(1.0), |q| q.as_str().parse::<f32>())
                .ok()?;
            (quality > 0.0).then(|| (caps[1].to_string(), quality))
        })
        .collect();

    entries.sort_by(|a, b| b.1.total_cmp(&a.1));
    entries.into_iter().map(|(tag, _)| tag).collect()
}

/// Resolves the effective locale. Pure; persisting the result is up to the caller.
#[must_use]
pub fn resolve_locale(
    segment: Option<&str>,
    cookie: Option<&str>,
    accept_language: Option<&str>,
) -> Locale {
    segment
        .and_then(Locale::match_tag)
        .or_else(|| cookie.and_then(Locale::match_tag))
        .or_else(|| {
            accept_language.and_then(|header| {
                parse_accept_language(header)
                    .iter()
                    .find_map(|tag| Locale::match_tag(tag))
            })
        })
        .unwrap_or_default()
}
