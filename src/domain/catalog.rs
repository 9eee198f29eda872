use anyhow::{anyhow, Context};
use url::{form_urlencoded, Url};

const TERM_PLACEHOLDER: &str = "{term}";
const CUSTOM_CATEGORY: &str = "custom";

const REFERENCE_CATEGORIES: [(&str, &[&str]); 4] = [
    (
        "translation",
        &[
            "english hebrew translation",
            "english to hebrew translator",
            "hebrew translation",
            "תרגום מעברית לאנגלית",
            "מתרגם מעברית לאנגלית",
        ],
    ),
    (
        "song_translation",
        &[
            "english hebrew song translation",
            "song translation hebrew",
            "music translation hebrew",
            "תרגום שירים",
            "תרגום שירים מאנגלית",
        ],
    ),
    (
        "piano_recording",
        &[
            "piano recording",
            "pianist recording",
            "piano session musician",
            "הקלטת פסנתר",
            "פסנתרן להקלטה",
        ],
    ),
    (
        "vocal_recording",
        &[
            "vocal recording",
            "vocalist recording",
            "singer recording",
            "voice recording",
            "הקלטת שירה",
            "זמרת להקלטה",
            "שירה מקצועית",
        ],
    ),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpaceEncoding {
    Percent,
    Hyphen,
}

impl SpaceEncoding {
    fn apply(self, term: &str) -> String {
        match self {
            SpaceEncoding::Percent => term.to_string(),
            SpaceEncoding::Hyphen => term.replace(' ', "-"),
        }
    }
}

/// Percent-encodes a query value. Literal '+' is already escaped as %2B here,
/// so the remaining '+' signs are spaces.
fn encode_query_value(value: &str) -> String {
    form_urlencoded::byte_serialize(value.as_bytes())
        .collect::<String>()
        .replace('+', "%20")
}

#[derive(Debug, Clone, PartialEq)]
pub struct Category {
    pub name: String,
    pub terms: Vec<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Platform {
    pub name: String,
    pub url_template: String,
    pub spaces: SpaceEncoding,
}

/// A single fetch: one term on one platform.
#[derive(Debug, Clone, PartialEq)]
pub struct PlatformTarget {
    pub platform: String,
    pub url: String,
    pub search_term: String,
}

impl Platform {
    pub fn new(name: &str, url_template: &str, spaces: SpaceEncoding) -> Self {
        Platform {
            name: name.to_string(),
            url_template: url_template.to_string(),
            spaces,
        }
    }

    /// Builds the search url for a term. The placeholder position decides the
    /// component: after a '?' the term is a query value, otherwise it is a
    /// single path segment. Either way reserved characters in the term are
    /// escaped and cannot change the url structure.
    pub fn search_url(&self, term: &str) -> anyhow::Result<Url> {
        let (prefix, suffix) = self
            .url_template
            .split_once(TERM_PLACEHOLDER)
            .ok_or_else(|| anyhow!("Url template of {} has no {}", self.name, TERM_PLACEHOLDER))?;
        let mut url = Url::parse(prefix)
            .with_context(|| format!("Invalid url template for {}", self.name))?;
        let term = self.spaces.apply(term.trim());

        match url.query() {
            Some(query) => {
                let query = format!("{}{}{}", query, encode_query_value(&term), suffix);
                url.set_query(Some(&query));
            }
            None => {
                let mut segments = url
                    .path_segments_mut()
                    .map_err(|_| anyhow!("Url template of {} cannot take a path", self.name))?;
                segments.pop_if_empty().push(&term);
                for segment in suffix.split('/').skip(1) {
                    segments.push(segment);
                }
            }
        }

        Ok(url)
    }

    pub fn target_for(&self, term: &str) -> anyhow::Result<PlatformTarget> {
        Ok(PlatformTarget {
            platform: self.name.clone(),
            url: self.search_url(term)?.to_string(),
            search_term: term.to_string(),
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Catalog {
    pub categories: Vec<Category>,
    pub platforms: Vec<Platform>,
}

impl Default for Catalog {
    fn default() -> Self {
        let categories = REFERENCE_CATEGORIES
            .iter()
            .map(|(name, terms)| Category {
                name: name.to_string(),
                terms: terms.iter().map(|t| t.to_string()).collect(),
            })
            .collect();

        Catalog {
            categories,
            platforms: reference_platforms(),
        }
    }
}

impl Catalog {
    /// Builds a single "custom" category from a comma separated keyword list,
    /// swept over the reference platforms. Returns None when no keyword is left
    /// after trimming.
    pub fn from_keywords(keywords: &str) -> Option<Self> {
        let terms: Vec<String> = keywords
            .split(',')
            .map(|k| k.trim())
            .filter(|k| !k.is_empty())
            .map(|k| k.to_string())
            .collect();

        match terms.is_empty() {
            true => None,
            false => Some(Catalog {
                categories: vec![Category {
                    name: CUSTOM_CATEGORY.to_string(),
                    terms,
                }],
                platforms: reference_platforms(),
            }),
        }
    }

    pub fn target_count(&self) -> usize {
        let terms: usize = self.categories.iter().map(|c| c.terms.len()).sum();
        terms * self.platforms.len()
    }
}

pub fn reference_platforms() -> Vec<Platform> {
    vec![
        Platform::new(
            "Upwork",
            "https://www.upwork.com/nx/search/jobs/?q={term}",
            SpaceEncoding::Percent,
        ),
        Platform::new(
            "Freelancer",
            "https://www.freelancer.com/jobs/{term}/",
            SpaceEncoding::Hyphen,
        ),
        Platform::new(
            "Fiverr",
            "https://www.fiverr.com/search/gigs?query={term}",
            SpaceEncoding::Percent,
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::{reference_platforms, Catalog, Platform, SpaceEncoding};

    #[test]
    fn reference_urls_follow_each_platform_rule() {
        let platforms = reference_platforms();
        let urls: Vec<String> = platforms
            .iter()
            .map(|p| p.search_url("piano recording").unwrap().to_string())
            .collect();

        assert_eq!(
            urls,
            vec![
                "https://www.upwork.com/nx/search/jobs/?q=piano%20recording",
                "https://www.freelancer.com/jobs/piano-recording/",
                "https://www.fiverr.com/search/gigs?query=piano%20recording",
            ]
        );
    }

    #[test]
    fn hebrew_terms_are_percent_encoded() {
        let platforms = reference_platforms();
        let url = platforms[1].search_url("הקלטת פסנתר").unwrap();

        assert!(url.as_str().is_ascii());
        assert!(url.as_str().starts_with("https://www.freelancer.com/jobs/%D7%94"));
    }

    #[test]
    fn reserved_characters_stay_inside_the_term() {
        let platforms = reference_platforms();

        let hash: Vec<String> = platforms
            .iter()
            .map(|p| p.search_url("c# developer").unwrap().to_string())
            .collect();
        assert_eq!(
            hash,
            vec![
                "https://www.upwork.com/nx/search/jobs/?q=c%23%20developer",
                "https://www.freelancer.com/jobs/c%23-developer/",
                "https://www.fiverr.com/search/gigs?query=c%23%20developer",
            ]
        );

        let ampersand: Vec<String> = platforms
            .iter()
            .map(|p| p.search_url("R&B vocals").unwrap().to_string())
            .collect();
        assert_eq!(
            ampersand,
            vec![
                "https://www.upwork.com/nx/search/jobs/?q=R%26B%20vocals",
                "https://www.freelancer.com/jobs/R&B-vocals/",
                "https://www.fiverr.com/search/gigs?query=R%26B%20vocals",
            ]
        );

        for term in ["c# developer", "R&B vocals"] {
            let upwork = platforms[0].search_url(term).unwrap();
            assert_eq!(upwork.fragment(), None);
            assert_eq!(upwork.query_pairs().count(), 1);
            assert_eq!(upwork.query_pairs().next().unwrap().1, term);

            let freelancer = platforms[1].search_url(term).unwrap();
            assert_eq!(freelancer.fragment(), None);
            assert_eq!(freelancer.query(), None);
            assert_eq!(freelancer.path_segments().unwrap().count(), 3);
        }
    }

    #[test]
    fn plus_and_slash_are_escaped() {
        let platforms = reference_platforms();

        let upwork = platforms[0].search_url("c++ tutor").unwrap();
        assert_eq!(upwork.query_pairs().next().unwrap().1, "c++ tutor");

        let freelancer = platforms[1].search_url("AC/DC covers").unwrap();
        assert_eq!(
            freelancer.as_str(),
            "https://www.freelancer.com/jobs/AC%2FDC-covers/"
        );
    }

    #[test]
    fn template_without_placeholder_is_an_error() {
        let platform = Platform::new("Broken", "https://broken.test/jobs", SpaceEncoding::Percent);

        assert!(platform.search_url("piano").is_err());
    }

    #[test]
    fn reference_catalog_order_is_stable() {
        let catalog = Catalog::default();
        let names: Vec<&str> = catalog.categories.iter().map(|c| c.name.as_str()).collect();
        let platforms: Vec<&str> = catalog.platforms.iter().map(|p| p.name.as_str()).collect();

        assert_eq!(
            names,
            vec![
                "translation",
                "song_translation",
                "piano_recording",
                "vocal_recording"
            ]
        );
        assert_eq!(platforms, vec!["Upwork", "Freelancer", "Fiverr"]);
        assert_eq!(catalog.target_count(), 22 * 3);
    }

    #[test]
    fn keywords_become_a_custom_category() {
        let catalog = Catalog::from_keywords(" piano , , mixing engineer,").unwrap();

        assert_eq!(catalog.categories.len(), 1);
        assert_eq!(catalog.categories[0].name, "custom");
        assert_eq!(catalog.categories[0].terms, vec!["piano", "mixing engineer"]);
        assert_eq!(catalog.platforms.len(), 3);
    }

    #[test]
    fn blank_keywords_give_no_catalog() {
        assert!(Catalog::from_keywords(" , ,").is_none());
        assert!(Catalog::from_keywords("").is_none());
    }
}
