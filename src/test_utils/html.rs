//! HTML generation utilities for testing.
//!
//! Saved-page stand-ins for the e-st portal: login surface, challenge pages
//! and report pages in their various rendering states.

/// Wraps body content in a minimal document.
pub fn page(body: &str) -> String {
    format!(
        r#"<!DOCTYPE html><html lang="lv"><head><title>e-st</title></head><body>{}</body></html>"#,
        body
    )
}

const LOGIN_FORM: &str = r#"
    <form method="post" action="/lv/private/user-authentification/">
        <input type="text" name="login">
        <input type="password" name="password">
        <button type="submit">Pieslēgties</button>
    </form>"#;

pub fn login_form() -> String {
    page(LOGIN_FORM)
}

pub fn login_form_with_cookie_banner() -> String {
    page(&format!(
        r#"<div class="uc-banner"><button class="uc-accept-button">Piekrītu</button></div>{}"#,
        LOGIN_FORM
    ))
}

pub fn login_form_with_error(message: &str) -> String {
    page(&format!(r#"<div class="alert-danger">{}</div>{}"#, message, LOGIN_FORM))
}

pub fn captcha_page() -> String {
    page(
        r#"<div class="captcha-wrapper">
            <iframe src="https://www.google.com/recaptcha/api2/anchor?k=abc"></iframe>
        </div>"#,
    )
}

pub fn waf_block_page() -> String {
    page("<h1>Request Rejected</h1><p>The requested URL was rejected. Please consult with your administrator.</p>")
}

pub fn second_factor_page() -> String {
    page(
        r#"<form><label>Ievadiet verifikācijas kodu</label>
            <input type="text" name="code" autocomplete="one-time-code"></form>"#,
    )
}

pub fn dashboard_page() -> String {
    page(r#"<nav><a href="/lv/private/logout/">Iziet</a></nav><h1>Mani objekti</h1>"#)
}

/// Report page with a chart carrying `payload` as its data attribute.
///
/// `payload` must not contain single quotes.
pub fn report_page(payload: &str) -> String {
    page(&format!(
        r#"<select name="objectEic"><option value="OBJ1">Māja</option></select>
           <select name="counterNumber"><option value="M1">Skaitītājs</option></select>
           <div class="chart" data-values='{}'></div>"#,
        payload
    ))
}

pub fn report_loading_page() -> String {
    page(r#"<div class="chart-wrapper"><div class="spinner"></div></div>"#)
}

pub fn report_no_data_page() -> String {
    page(
        r#"<select name="objectEic"><option value="OBJ1">Māja</option></select>
           <p class="no-data">Nav datu izvēlētajam periodam</p>"#,
    )
}

/// Chart container rendered without data next to the no-data notice.
pub fn report_empty_chart_page() -> String {
    page(
        r#"<select name="objectEic"><option value="OBJ1">Māja</option></select>
           <div class="chart" data-values=""></div>
           <p>Nav datu izvēlētajam periodam</p>"#,
    )
}

pub fn report_error_page(message: &str) -> String {
    page(&format!(r#"<div class="notification--error">{}</div>"#, message))
}

/// Report page whose selectors offer only the given objects and meters.
pub fn asset_picker_page(objects: &[&str], meters: &[&str]) -> String {
    let options = |values: &[&str]| {
        values
            .iter()
            .map(|value| format!(r#"<option value="{0}">{0}</option>"#, value))
            .collect::<String>()
    };
    page(&format!(
        r#"<select name="objectEic">{}</select><select name="counterNumber">{}</select>"#,
        options(objects),
        options(meters)
    ))
}
