//! PII redaction engine.
//!
//! Scrubs emails, IP addresses (v4 and v6), phone numbers, and credit-card
//! numbers from raw log text before it crosses the trust boundary to the
//! report provider. Masking runs as a fixed sequence of regex passes, each
//! operating on the output of the previous one, so a replacement token can
//! never be re-matched by a later pass.
//!
//! Pass order is load-bearing: credit cards first (the most specific shape),
//! then emails, IPv6 before IPv4 (an IPv4-looking fragment can sit inside an
//! IPv6 literal), and phone numbers last because their patterns are the most
//! permissive and would otherwise consume fragments of the other categories.
//! The permissive phone pattern will over-match long digit runs in ordinary
//! log fields; that bias is deliberate for a privacy shield.

use once_cell::sync::Lazy;
use regex::{Regex, RegexBuilder};

/// PII categories this redactor detects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum PiiCategory {
    CreditCard,
    Email,
    Ip,
    Phone,
}

/// Result of a sanitization run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SanitizationResult {
    pub sanitized_content: String,
    pub total_masked_entities: u32,
    /// Categories with at least one match, in pass order, each at most once.
    pub detected_categories: Vec<PiiCategory>,
}

const CC_REDACTED: &str = "[CC_REDACTED]";
const EMAIL_REDACTED: &str = "[EMAIL_REDACTED]";
const IP_REDACTED: &str = "[IP_REDACTED]";
const PHONE_REDACTED: &str = "[PHONE_REDACTED]";

static EMAIL_PATTERN: Lazy<Regex> = Lazy::new(|| {
    RegexBuilder::new(r"[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}")
        .case_insensitive(true)
        .build()
        .expect("email pattern")
});

static IPV4_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"\b(?:(?:25[0-5]|2[0-4][0-9]|[01]?[0-9][0-9]?)\.){3}(?:25[0-5]|2[0-4][0-9]|[01]?[0-9][0-9]?)\b",
    )
    .expect("ipv4 pattern")
});

// Full and abbreviated (`::`) forms, plus the IPv4-mapped `::ffff:a.b.c.d`
// shorthand.
static IPV6_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(concat!(
        r"(?:[0-9a-fA-F]{1,4}:){7}[0-9a-fA-F]{1,4}|",
        r"(?:[0-9a-fA-F]{1,4}:){1,7}:|",
        r"(?:[0-9a-fA-F]{1,4}:){1,6}:[0-9a-fA-F]{1,4}|",
        r"(?:[0-9a-fA-F]{1,4}:){1,5}(?::[0-9a-fA-F]{1,4}){1,2}|",
        r"(?:[0-9a-fA-F]{1,4}:){1,4}(?::[0-9a-fA-F]{1,4}){1,3}|",
        r"(?:[0-9a-fA-F]{1,4}:){1,3}(?::[0-9a-fA-F]{1,4}){1,4}|",
        r"(?:[0-9a-fA-F]{1,4}:){1,2}(?::[0-9a-fA-F]{1,4}){1,5}|",
        r"[0-9a-fA-F]{1,4}:(?::[0-9a-fA-F]{1,4}){1,6}|",
        r":(?::[0-9a-fA-F]{1,4}){1,7}|",
        r"::(?:[fF]{4}:)?(?:(?:25[0-5]|2[0-4][0-9]|[01]?[0-9][0-9]?)\.){3}(?:25[0-5]|2[0-4][0-9]|[01]?[0-9][0-9]?)",
    ))
    .expect("ipv6 pattern")
});

// North-American 10-digit forms with optional +1 and separators, then a
// generic international form (+ country code, 6-12 digits), then a bare
// 3-3-4 form.
static PHONE_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(concat!(
        r"(?:\+?1[-.\s]?)?\(?[0-9]{3}\)?[-.\s]?[0-9]{3}[-.\s]?[0-9]{4}|",
        r"\+?[0-9]{1,4}[-.\s]?[0-9]{6,12}|",
        r"\b[0-9]{3}[-.\s]?[0-9]{3}[-.\s]?[0-9]{4}\b",
    ))
    .expect("phone pattern")
});

// Visa, MasterCard, Amex, Discover, and JCB prefixes at canonical lengths,
// plus a generic four-blocks-of-four form with dash or space separators.
static CREDIT_CARD_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(concat!(
        r"\b(?:4[0-9]{12}(?:[0-9]{3})?|",
        r"5[1-5][0-9]{14}|",
        r"3[47][0-9]{13}|",
        r"6(?:011|5[0-9]{2})[0-9]{12}|",
        r"(?:2131|1800|35[0-9]{3})[0-9]{11})\b|",
        r"\b[0-9]{4}[- ]?[0-9]{4}[- ]?[0-9]{4}[- ]?[0-9]{4}\b",
    ))
    .expect("credit card pattern")
});

fn masking_passes() -> [(&'static Regex, &'static str, PiiCategory); 5] {
    [
        (&CREDIT_CARD_PATTERN, CC_REDACTED, PiiCategory::CreditCard),
        (&EMAIL_PATTERN, EMAIL_REDACTED, PiiCategory::Email),
        (&IPV6_PATTERN, IP_REDACTED, PiiCategory::Ip),
        (&IPV4_PATTERN, IP_REDACTED, PiiCategory::Ip),
        (&PHONE_PATTERN, PHONE_REDACTED, PiiCategory::Phone),
    ]
}

/// Sanitize `content` by masking all detected PII entities.
///
/// Each category's match count is taken before its substitution, so earlier
/// passes are immune to token insertions from later ones. Blank input yields
/// an empty result without error.
pub fn sanitize(content: &str) -> SanitizationResult {
    if content.trim().is_empty() {
        return SanitizationResult {
            sanitized_content: String::new(),
            total_masked_entities: 0,
            detected_categories: Vec::new(),
        };
    }

    let mut sanitized = content.to_string();
    let mut total_masked: u32 = 0;
    let mut detected: Vec<PiiCategory> = Vec::new();

    for (pattern, token, category) in masking_passes() {
        let count = pattern.find_iter(&sanitized).count() as u32;
        if count == 0 {
            continue;
        }
        sanitized = pattern.replace_all(&sanitized, token).into_owned();
        total_masked += count;
        if !detected.contains(&category) {
            detected.push(category);
        }
    }

    if total_masked > 0 {
        // Audit trail for compliance; fire-and-forget, never fails the call.
        let categories: Vec<String> = detected.iter().map(ToString::to_string).collect();
        tracing::warn!(
            masked = total_masked,
            categories = ?categories,
            "privacy shield: masked PII entities before external transmission"
        );
        metrics::counter!("pii_entities_masked_total").increment(u64::from(total_masked));
    }

    SanitizationResult {
        sanitized_content: sanitized,
        total_masked_entities: total_masked,
        detected_categories: detected,
    }
}
