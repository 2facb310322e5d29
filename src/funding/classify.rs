use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use utoipa::ToSchema;

// Monetary phrasing: "$12.5M", "€8m", "raised $1.2 billion", "USD 750k".
static AMOUNT_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)(?:[\$€£]|\busd\s?)\s?(\d[\d,]*(?:\.\d+)?)\s*(thousand|million|billion|bn|mn|k|m|b)?\b")
        .expect("amount regex is valid")
});

// Order matters: the first matching pattern wins, so specific stages come before generic ones.
static STAGE_PATTERNS: Lazy<Vec<(Regex, FundingStage)>> = Lazy::new(|| {
    [
        (r"\bpre[- ]?seed\b", FundingStage::PreSeed),
        (r"\bseries[- ]a\b", FundingStage::SeriesA),
        (r"\bseries[- ]b\b", FundingStage::SeriesB),
        (r"\bseries[- ]c\b", FundingStage::SeriesC),
        (r"\bseries[- ]d\b", FundingStage::SeriesD),
        (r"\bseries[- ]e\b", FundingStage::SeriesE),
        (r"\bseries[- ][f-z]\b|\bgrowth\b|\blate[- ]stage\b|\bprivate equity\b", FundingStage::Growth),
        (r"\bseed\b|\bangel\b", FundingStage::Seed),
        (r"\bdebt\b|\bloan\b|\bcredit facility\b|\bventure debt\b", FundingStage::Debt),
        (r"\bgrant\b", FundingStage::Grant),
    ]
    .into_iter()
    .map(|(pattern, stage)| {
        let re = Regex::new(&format!("(?i){}", pattern)).expect("stage regex is valid");
        (re, stage)
    })
    .collect()
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "kebab-case")]
pub enum FundingStage {
    PreSeed,
    Seed,
    SeriesA,
    SeriesB,
    SeriesC,
    SeriesD,
    SeriesE,
    Growth,
    Debt,
    Grant,
    Unknown,
}

impl FundingStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            FundingStage::PreSeed => "pre-seed",
            FundingStage::Seed => "seed",
            FundingStage::SeriesA => "series-a",
            FundingStage::SeriesB => "series-b",
            FundingStage::SeriesC => "series-c",
            FundingStage::SeriesD => "series-d",
            FundingStage::SeriesE => "series-e",
            FundingStage::Growth => "growth",
            FundingStage::Debt => "debt",
            FundingStage::Grant => "grant",
            FundingStage::Unknown => "unknown",
        }
    }

    pub fn is_early_stage(&self) -> bool {
        matches!(self, FundingStage::PreSeed | FundingStage::Seed | FundingStage::SeriesA)
    }
}

impl fmt::Display for FundingStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Map free text ("Series A", "seed round", "pre-seed") to a canonical stage.
pub fn normalize_stage(text: &str) -> FundingStage {
    // Accept already-canonical slugs such as "series-a" as-is.
    let spaced = text.replace('_', " ");
    STAGE_PATTERNS
        .iter()
        .find(|(re, _)| re.is_match(&spaced))
        .map(|(_, stage)| *stage)
        .unwrap_or(FundingStage::Unknown)
}

/// Extract the first monetary amount from `text` as whole units of currency.
///
/// Currency symbols are only used as a signal; amounts are taken at face value
/// without conversion. Returns `None` if no amount is present.
pub fn parse_amount(text: &str) -> Option<i64> {
    let caps = AMOUNT_RE.captures(text)?;
    let number: f64 = caps.get(1)?.as_str().replace(',', "").parse().ok()?;
    let multiplier = match caps.get(2).map(|m| m.as_str().to_lowercase()) {
        Some(suffix) => match suffix.as_str() {
            "k" | "thousand" => 1e3,
            "m" | "mn" | "million" => 1e6,
            "b" | "bn" | "billion" => 1e9,
            _ => 1.0,
        },
        None => 1.0,
    };
    Some((number * multiplier).round() as i64)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "kebab-case")]
pub enum Category {
    Identity,
    CloudSecurity,
    NetworkSecurity,
    Endpoint,
    ApplicationSecurity,
    DataSecurity,
    ThreatIntel,
    SecurityOperations,
    GovernanceRisk,
    Other,
}

// Table order doubles as tie-break order.
const CATEGORY_KEYWORDS: &[(Category, &[&str])] = &[
    (Category::Identity, &["identity", "iam", "authentication", "passwordless", "access management", "sso", "privileged access"]),
    (Category::CloudSecurity, &["cloud", "cnapp", "cspm", "kubernetes", "container", "serverless", "saas security"]),
    (Category::NetworkSecurity, &["network", "firewall", "zero trust", "sase", "vpn", "ddos", "microsegmentation"]),
    (Category::Endpoint, &["endpoint", "edr", "xdr", "antivirus", "device", "mobile security"]),
    (Category::ApplicationSecurity, &["application security", "appsec", "code", "api security", "software supply chain", "sast", "dast", "devsecops"]),
    (Category::DataSecurity, &["data security", "dlp", "encryption", "privacy", "data loss", "tokenization", "dspm"]),
    (Category::ThreatIntel, &["threat intelligence", "threat intel", "dark web", "attack surface", "vulnerability", "exposure"]),
    (Category::SecurityOperations, &["siem", "soar", "soc", "detection", "incident response", "security operations", "mdr"]),
    (Category::GovernanceRisk, &["compliance", "governance", "risk", "grc", "audit", "third-party risk"]),
];

impl Category {
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Identity => "identity",
            Category::CloudSecurity => "cloud-security",
            Category::NetworkSecurity => "network-security",
            Category::Endpoint => "endpoint",
            Category::ApplicationSecurity => "application-security",
            Category::DataSecurity => "data-security",
            Category::ThreatIntel => "threat-intel",
            Category::SecurityOperations => "security-operations",
            Category::GovernanceRisk => "governance-risk",
            Category::Other => "other",
        }
    }

    pub fn from_slug(slug: &str) -> Option<Category> {
        CATEGORY_KEYWORDS
            .iter()
            .map(|(c, _)| *c)
            .chain(std::iter::once(Category::Other))
            .find(|c| c.as_str() == slug)
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Pick the cybersecurity category whose keywords appear most often in the name and description.
pub fn classify_category(name: &str, description: Option<&str>) -> Category {
    let text = format!("{} {}", name, description.unwrap_or_default()).to_lowercase();

    let mut best = (Category::Other, 0usize);
    for (category, keywords) in CATEGORY_KEYWORDS {
        let score = keywords.iter().filter(|kw| contains_word(&text, kw)).count();
        // Strictly greater keeps the earlier table entry on ties.
        if score > best.1 {
            best = (*category, score);
        }
    }
    best.0
}

fn contains_word(text: &str, keyword: &str) -> bool {
    text.match_indices(keyword).any(|(start, _)| {
        let end = start + keyword.len();
        let before_ok = text[..start].chars().next_back().map_or(true, |c| !c.is_alphanumeric());
        let after_ok = text[end..].chars().next().map_or(true, |c| !c.is_alphanumeric());
        before_ok && after_ok
    })
}
