//! Legacy monarch name → canonical monarch id.
//!
//! Older person records carry free-text references such as
//! "Gustav Vasa (1523–1560)". Resolution runs a fixed, ordered list of
//! match strategies over the registry and stops at the first hit. The
//! order is part of the contract: cheaper, stricter strategies first.

use lineage_types::Monarch;
use regex::Regex;
use serde::Serialize;
use tracing::debug;

// ── Strategies ───────────────────────────────────────────────────────

/// One way of matching a display name against a registry entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum MatchStrategy {
    /// Verbatim equality with the monarch's name
    Exact,
    /// "<Name> (<start>–<end>)" with matching reign years
    ParentheticalYears,
    /// Case-insensitive containment, either direction
    Substring,
    /// Every word of one name occurs inside some word of the other
    WordSet,
    /// "Gustav Vasa" ↔ "Gustav I Vasa"
    RomanInfix,
}

/// The order strategies are tried in.
///
/// `RomanInfix` never wins in this chain: a two-word query equal to the
/// first and last words of a three-word name already satisfies `WordSet`.
/// It stays last so it can still be tested and reported on its own.
pub const RESOLUTION_ORDER: [MatchStrategy; 5] = [
    MatchStrategy::Exact,
    MatchStrategy::ParentheticalYears,
    MatchStrategy::Substring,
    MatchStrategy::WordSet,
    MatchStrategy::RomanInfix,
];

impl MatchStrategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Exact => "exact",
            Self::ParentheticalYears => "parenthetical-years",
            Self::Substring => "substring",
            Self::WordSet => "word-set",
            Self::RomanInfix => "roman-infix",
        }
    }

    /// Whether `monarch` matches `query` under this strategy alone.
    pub fn matches(&self, query: &NameQuery, monarch: &Monarch) -> bool {
        match self {
            Self::Exact => monarch.name == query.raw,
            Self::ParentheticalYears => match &query.dated {
                Some(dated) => {
                    let names_overlap = monarch.name.contains(dated.name.as_str())
                        || dated.name.contains(monarch.name.as_str());
                    names_overlap
                        && monarch.reign_start_year() == Some(dated.from)
                        && monarch.reign_end_year() == Some(dated.to)
                }
                None => false,
            },
            Self::Substring => {
                let name = monarch.name.to_lowercase();
                !query.bare.is_empty()
                    && !name.is_empty()
                    && (name.contains(&query.bare) || query.bare.contains(&name))
            }
            Self::WordSet => {
                let name = monarch.name.to_lowercase();
                let words = split_words(&name);
                let search = split_words(&query.bare);
                !search.is_empty()
                    && !words.is_empty()
                    && (all_inside(&search, &words) || all_inside(&words, &search))
            }
            Self::RomanInfix => {
                let name = monarch.name.to_lowercase();
                let words = split_words(&name);
                let search = split_words(&query.bare);
                search.len() == 2
                    && words.len() == 3
                    && is_roman_numeral(words[1])
                    && search[0] == words[0]
                    && search[1] == words[2]
            }
        }
    }
}

/// Every word in `needles` is a substring of at least one word in `haystack`.
fn all_inside(needles: &[&str], haystack: &[&str]) -> bool {
    needles
        .iter()
        .all(|n| haystack.iter().any(|h| h.contains(n)))
}

fn split_words(s: &str) -> Vec<&str> {
    s.split_whitespace().collect()
}

/// Regnal numbers I through MMMCMXCIX, case-insensitive.
pub fn is_roman_numeral(word: &str) -> bool {
    !word.is_empty()
        && word.chars().all(|c| "ivxlcdmIVXLCDM".contains(c))
        && roman_regex().is_match(word)
}

fn roman_regex() -> &'static Regex {
    static ROMAN: std::sync::LazyLock<Regex> = std::sync::LazyLock::new(|| {
        Regex::new(r"(?i)^m{0,3}(cm|cd|d?c{0,3})(xc|xl|l?x{0,3})(ix|iv|v?i{0,3})$")
            .expect("roman numeral regex")
    });
    &ROMAN
}

// ── Parsed query ─────────────────────────────────────────────────────

/// "<Name> (<from>–<to>)" split into its parts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatedName {
    pub name: String,
    pub from: i32,
    pub to: i32,
}

/// A legacy display name, pre-processed once for all strategies.
#[derive(Debug, Clone)]
pub struct NameQuery<'q> {
    pub raw: &'q str,
    pub dated: Option<DatedName>,
    /// Lower-cased, trailing parenthetical removed.
    pub bare: String,
}

impl<'q> NameQuery<'q> {
    fn parse(raw: &'q str, patterns: &Patterns) -> NameQuery<'q> {
        let dated = patterns.re_dated.captures(raw).and_then(|caps| {
            Some(DatedName {
                name: caps.get(1)?.as_str().trim().to_string(),
                from: caps.get(2)?.as_str().parse().ok()?,
                to: caps.get(3)?.as_str().parse().ok()?,
            })
        });
        let bare = patterns
            .re_trailing_paren
            .replace(raw, "")
            .trim()
            .to_lowercase();
        NameQuery { raw, dated, bare }
    }
}

// ── Resolver ─────────────────────────────────────────────────────────

struct Patterns {
    /// ^(name) (from–to)$ ; en dash, em dash or hyphen
    re_dated: Regex,
    /// trailing "(...)"
    re_trailing_paren: Regex,
}

impl Patterns {
    fn new() -> Self {
        Patterns {
            re_dated: Regex::new(r"^(.+?)\s*\(\s*(\d{1,4})\s*[–—-]\s*(\d{1,4})\s*\)\s*$")
                .expect("dated name regex"),
            re_trailing_paren: Regex::new(r"\s*\([^()]*\)\s*$").expect("trailing paren regex"),
        }
    }
}

/// Which registry entry a name resolved to, and how.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Resolution {
    pub monarch_id: String,
    pub strategy: MatchStrategy,
}

/// Resolves legacy names against one monarch registry.
pub struct NameResolver<'a> {
    monarchs: &'a [Monarch],
    patterns: Patterns,
}

impl<'a> NameResolver<'a> {
    pub fn new(monarchs: &'a [Monarch]) -> Self {
        NameResolver {
            monarchs,
            patterns: Patterns::new(),
        }
    }

    pub fn query<'q>(&self, display_name: &'q str) -> NameQuery<'q> {
        NameQuery::parse(display_name, &self.patterns)
    }

    /// Try each strategy in `RESOLUTION_ORDER` across the whole registry.
    pub fn resolve(&self, display_name: &str) -> Option<Resolution> {
        let query = self.query(display_name);
        for strategy in RESOLUTION_ORDER {
            if let Some(m) = self.monarchs.iter().find(|m| strategy.matches(&query, m)) {
                debug!(name = display_name, monarch = %m.id, strategy = strategy.as_str(), "resolved");
                return Some(Resolution {
                    monarch_id: m.id.clone(),
                    strategy,
                });
            }
        }
        debug!(name = display_name, "no registry match");
        None
    }

    pub fn resolve_id(&self, display_name: &str) -> Option<String> {
        self.resolve(display_name).map(|r| r.monarch_id)
    }
}

/// Resolve one legacy display name to a canonical monarch id.
pub fn resolve_monarch_name_to_id(display_name: &str, monarchs: &[Monarch]) -> Option<String> {
    NameResolver::new(monarchs).resolve_id(display_name)
}
