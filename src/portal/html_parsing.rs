//! Page classification for the e-st portal.
//!
//! The session controller and the extractor poll the live page and hand the
//! current URL and DOM to the functions here. Every decision about what the
//! portal is showing (login form, CAPTCHA, second factor, rendered chart, error
//! notice) is made from HTML alone, so it can be tested against saved pages.

use crate::error::ExtractionError;
use crate::portal::helper::{
    attribute_of, document_text, first_match, has_element, html_selector, values_of,
};
use scraper::Html;

/// Login form inputs.
pub const LOGIN_INPUT: &str = "input[name='login']";
pub const PASSWORD_INPUT: &str = "input[name='password']";
pub const SUBMIT_BUTTON: &str = "button[type='submit'], input[type='submit']";

/// Cookie consent accept buttons, tried in order.
pub const COOKIE_ACCEPT_SELECTORS: &[&str] = &[
    "button#accept",
    "button[data-action='consent'][data-action-type='accept']",
    "button.uc-accept-button",
    "button[aria-label*='Piekrītu']",
];
pub const COOKIE_ACCEPT_XPATHS: &[&str] = &[
    "//button[contains(text(), 'Piekrītu')]",
    "//button[contains(@aria-label, 'Piekrītu')]",
];

const CHALLENGE_SELECTORS: &[&str] = &[
    "iframe[src*='recaptcha']",
    ".g-recaptcha",
    ".h-captcha",
    "iframe[src*='hcaptcha']",
    ".cf-turnstile",
    "#challenge-form",
    "#cf-challenge-running",
    "#px-captcha",
];
const CHALLENGE_PHRASES: &[&str] = &[
    "the requested url was rejected",
    "request blocked",
    "access denied",
];

const SECOND_FACTOR_SELECTORS: &[&str] = &[
    "input[autocomplete='one-time-code']",
    "input[name='otp']",
    "input[name*='verification']",
    "form[action*='two-factor']",
    "#two-factor",
];
const SECOND_FACTOR_PHRASES: &[&str] = &["verifikācijas kods", "verification code"];

const ERROR_NOTICE_SELECTORS: &[&str] = &[
    ".alert-danger",
    ".alert--error",
    ".notification--error",
    ".form-error",
    ".error-message",
    ".invalid-feedback",
    "[role='alert']",
];
const INVALID_CREDENTIAL_PHRASES: &[&str] = &[
    "nepareizs",
    "nepareiza",
    "invalid username",
    "incorrect password",
    "wrong password",
];

const LOGGED_IN_SELECTORS: &[&str] = &["a[href*='logout']", "a[href*='iziet']", ".user-menu"];

pub const CHART_SELECTOR: &str = "div.chart";
pub const CHART_DATA_ATTRIBUTE: &str = "data-values";
const LOADING_SELECTORS: &[&str] = &[
    ".chart--loading",
    ".loading",
    ".spinner",
    ".preloader",
    "[aria-busy='true']",
];
const NO_DATA_SELECTORS: &[&str] = &[".no-data", ".chart-empty", ".empty-state"];
const NO_DATA_PHRASES: &[&str] = &["nav datu", "no data"];
const OBJECT_OPTIONS: &str = "select[name='objectEic'] option";
const METER_OPTIONS: &str = "select[name='counterNumber'] option";

/// What the login flow is currently looking at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoginPage {
    /// Login form shown, nothing rejected yet
    Form,
    /// Login form shown together with a credential error
    InvalidCredentials,
    /// A one-time code is requested
    SecondFactor,
    /// CAPTCHA or WAF block page; carries the matching indicator
    Challenge(String),
    /// Left the login surface without a login form in sight
    LoggedIn,
    /// Still loading or in between navigations
    Pending,
}

/// What the report page is currently showing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReportPage {
    /// The session was bounced back to the login surface
    LoginRequired,
    /// No readiness signal yet
    Loading,
    /// Chart rendered; carries the raw `data-values` JSON
    Ready(String),
    /// The portal says the range has no readings
    NoData,
    /// The object/meter pair was refused; carries the reason
    UnknownAsset(String),
}

/// True for URLs that belong to the portal's login surface.
pub fn is_login_url(url: &str) -> bool {
    let url = url.to_lowercase();
    url.contains("authentification") || url.contains("login")
}

fn find_phrase<'a>(text: &str, phrases: &[&'a str]) -> Option<&'a str> {
    phrases.iter().copied().find(|phrase| text.contains(phrase))
}

/// Text of the first visible error notice, if any.
fn error_notice(document: &Html) -> Option<String> {
    let selector = first_match(document, ERROR_NOTICE_SELECTORS)?;
    let selector = html_selector(selector).ok()?;
    let text = document
        .select(&selector)
        .map(|element| element.text().collect::<String>())
        .map(|text| text.split_whitespace().collect::<Vec<_>>().join(" "))
        .find(|text| !text.is_empty())?;
    Some(text)
}

/// Classifies a page seen during login.
///
/// Challenges are checked first: a CAPTCHA page may also contain an error
/// notice, and must not be reported as a password problem.
pub fn classify_login_page(current_url: &str, html: &str) -> LoginPage {
    let document = Html::parse_document(html);
    let text = document_text(&document);

    if let Some(selector) = first_match(&document, CHALLENGE_SELECTORS) {
        return LoginPage::Challenge(selector.to_string());
    }
    if let Some(phrase) = find_phrase(&text, CHALLENGE_PHRASES) {
        return LoginPage::Challenge(phrase.to_string());
    }
    if first_match(&document, SECOND_FACTOR_SELECTORS).is_some()
        || find_phrase(&text, SECOND_FACTOR_PHRASES).is_some()
    {
        return LoginPage::SecondFactor;
    }

    let has_form = has_element(&document, LOGIN_INPUT);
    if has_form {
        let rejected = error_notice(&document)
            .map(|notice| find_phrase(&notice.to_lowercase(), INVALID_CREDENTIAL_PHRASES).is_some())
            .unwrap_or(false);
        return if rejected {
            LoginPage::InvalidCredentials
        } else {
            LoginPage::Form
        };
    }

    if first_match(&document, LOGGED_IN_SELECTORS).is_some() || !is_login_url(current_url) {
        LoginPage::LoggedIn
    } else {
        LoginPage::Pending
    }
}

/// Classifies the report page for the given object/meter pair.
pub fn classify_report_page(
    current_url: &str,
    html: &str,
    object_id: &str,
    meter_id: &str,
) -> Result<ReportPage, ExtractionError> {
    let document = Html::parse_document(html);

    if is_login_url(current_url) || has_element(&document, LOGIN_INPUT) {
        return Ok(ReportPage::LoginRequired);
    }
    if first_match(&document, LOADING_SELECTORS).is_some() {
        return Ok(ReportPage::Loading);
    }

    // an empty chart shell stays Loading unless a notice below says otherwise
    if let Some(Some(payload)) = attribute_of(&document, CHART_SELECTOR, CHART_DATA_ATTRIBUTE)? {
        if !payload.trim().is_empty() {
            return Ok(ReportPage::Ready(payload));
        }
    }

    let objects = values_of(&document, OBJECT_OPTIONS)?;
    if !objects.is_empty() && !objects.iter().any(|value| value == object_id) {
        return Ok(ReportPage::UnknownAsset(format!(
            "object is not one of {:?}",
            objects
        )));
    }
    let meters = values_of(&document, METER_OPTIONS)?;
    if !meters.is_empty() && !meters.iter().any(|value| value == meter_id) {
        return Ok(ReportPage::UnknownAsset(format!(
            "meter is not one of {:?}",
            meters
        )));
    }

    if first_match(&document, NO_DATA_SELECTORS).is_some()
        || find_phrase(&document_text(&document), NO_DATA_PHRASES).is_some()
    {
        return Ok(ReportPage::NoData);
    }
    if let Some(notice) = error_notice(&document) {
        return Ok(ReportPage::UnknownAsset(notice));
    }

    Ok(ReportPage::Loading)
}
