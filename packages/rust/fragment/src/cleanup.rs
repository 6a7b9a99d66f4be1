//! Text passes applied to raw Doxygen HTML before it is parsed.
//!
//! Each pass is a function `&str -> String` applied in sequence.

/// Run the full cleanup pipeline on raw page HTML.
pub(crate) fn run_pipeline(html: &str) -> String {
    let mut result = html.to_string();

    result = undo_dash_conversion(&result);

    result
}

/// Doxygen turns `--` into an en/em dash; put the double hyphen back so
/// quoted command-line options survive.
fn undo_dash_conversion(html: &str) -> String {
    html.replace('\u{2013}', "--")
        .replace("&mdash;", "--")
        .replace("&ndash;", "--")
}
