//! Imitation of the MWS endpoint for tests and local experiments.
//!
//! Serves `GET /` with MWS-style query parameters and answers in the MWS XML
//! response shape. Data is a fixed in-memory fixture.

use std::{collections::HashMap, sync::Arc};

use axum::{
    extract::{Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use tokio::net::TcpListener;

/// Credentials the mock accepts as `SessionToken`.
#[derive(Debug, Clone)]
pub struct MockConfig {
    pub username: String,
    pub password: String,
}

impl Default for MockConfig {
    fn default() -> Self {
        Self {
            username: "demo".to_string(),
            password: "demo".to_string(),
        }
    }
}

impl MockConfig {
    /// Read `MWS_MOCK_USERNAME` / `MWS_MOCK_PASSWORD`, falling back to `demo`.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            username: std::env::var("MWS_MOCK_USERNAME").unwrap_or(defaults.username),
            password: std::env::var("MWS_MOCK_PASSWORD").unwrap_or(defaults.password),
        }
    }

    fn session_token(&self) -> String {
        format!("{};{}", self.username, self.password)
    }
}

/// A fixture layout: plural/singular element names, columns and rows.
struct Layout {
    name: &'static str,
    plural: &'static str,
    singular: &'static str,
    columns: &'static [&'static str],
    rows: &'static [&'static [&'static str]],
}

const LAYOUTS: &[Layout] = &[
    Layout {
        name: "Leerlingen",
        plural: "Leerlingen",
        singular: "Leerling",
        columns: &["Stamnummer", "Roepnaam", "Klas"],
        rows: &[
            &["1001", "Anna", "1A"],
            &["1002", "Bram", "1A"],
            &["1003", "Chris & Co", "2B"],
        ],
    },
    Layout {
        name: "Docenten",
        plural: "Docenten",
        singular: "Docent",
        columns: &["Code", "Naam"],
        rows: &[&["ABC", "A. Bakker"], &["DEF", "D. de Vries"]],
    },
];

type Params = HashMap<String, String>;

pub fn app() -> Router {
    app_with(MockConfig::default())
}

pub fn app_with(config: MockConfig) -> Router {
    Router::new()
        .route("/", get(call))
        .with_state(Arc::new(config))
}

pub async fn run(listener: TcpListener, config: MockConfig) -> Result<(), std::io::Error> {
    axum::serve(listener, app_with(config)).await
}

async fn call(State(config): State<Arc<MockConfig>>, Query(params): Query<Params>) -> Response {
    let (Some(library), Some(function)) = (params.get("Library"), params.get("Function")) else {
        return (StatusCode::BAD_REQUEST, "Library and Function are required").into_response();
    };
    if params.get("Type").map(String::as_str) != Some("xml") {
        return (StatusCode::BAD_REQUEST, "only Type=xml is supported").into_response();
    }

    tracing::info!(%library, %function, "mws call");

    match (library.as_str(), function.as_str()) {
        ("Algemeen", "Status") => xml(success(
            "Statussen",
            "Status",
            &["Versie", "Omgeving"],
            &[vec!["1.0", "mock"]],
        )),
        ("Data", "GetData") => xml(get_data(&config, &params)),
        ("Debug", "InternalError") => {
            (StatusCode::INTERNAL_SERVER_ERROR, "internal error").into_response()
        }
        ("Debug", "Malformed") => xml("<Response><Result>True</Result><Table>".to_string()),
        _ => xml(exception(
            "Onbekende functie",
            &format!("{library}.{function} bestaat niet"),
        )),
    }
}

fn get_data(config: &MockConfig, params: &Params) -> String {
    if params.get("SessionToken") != Some(&config.session_token()) {
        return failure(&[("Ongeldige inloggegevens", "1")]);
    }

    let Some(layout) = params
        .get("Layout")
        .and_then(|name| LAYOUTS.iter().find(|l| l.name == name))
    else {
        return failure(&[("Onbekende layout", "2")]);
    };

    let filters = match params.get("Parameters") {
        Some(raw) => match parse_filters(raw) {
            Some(filters) => filters,
            None => return failure(&[("Ongeldige parameters", "3")]),
        },
        None => Vec::new(),
    };

    let mut indices = Vec::with_capacity(filters.len());
    for (column, _) in &filters {
        match layout.columns.iter().position(|c| c == column) {
            Some(index) => indices.push(index),
            None => return failure(&[("Onbekende kolom", "4")]),
        }
    }

    let rows: Vec<Vec<&str>> = layout
        .rows
        .iter()
        .filter(|row| {
            indices
                .iter()
                .zip(&filters)
                .all(|(&index, (_, value))| row[index] == value.as_str())
        })
        .map(|row| row.to_vec())
        .collect();

    success(layout.plural, layout.singular, layout.columns, &rows)
}

/// `k=v;k=v`; an empty string is no filter.
fn parse_filters(raw: &str) -> Option<Vec<(String, String)>> {
    if raw.is_empty() {
        return Some(Vec::new());
    }
    raw.split(';')
        .map(|entry| {
            entry
                .split_once('=')
                .map(|(k, v)| (k.to_string(), v.to_string()))
        })
        .collect()
}

fn xml(body: String) -> Response {
    ([(header::CONTENT_TYPE, "text/xml; charset=utf-8")], body).into_response()
}

fn success(plural: &str, singular: &str, columns: &[&str], rows: &[Vec<&str>]) -> String {
    let mut out = String::from("<Response><Result>True</Result><Table>");
    out.push_str(&format!("<{plural}>"));
    for row in rows {
        out.push_str(&format!("<{singular}>"));
        for (column, value) in columns.iter().zip(row) {
            out.push_str(&format!("<{column}>{}</{column}>", escape(value)));
        }
        out.push_str(&format!("</{singular}>"));
    }
    out.push_str(&format!("</{plural}></Table></Response>"));
    out
}

fn failure(errors: &[(&str, &str)]) -> String {
    let mut out = String::from("<Response><Result>False</Result><Table><Fouten>");
    for (summary, code) in errors {
        out.push_str(&format!(
            "<Fout><Fout_omschrijving>{}</Fout_omschrijving><Fout_nummer>{}</Fout_nummer></Fout>",
            escape(summary),
            escape(code)
        ));
    }
    out.push_str("</Fouten></Table></Response>");
    out
}

fn exception(exception: &str, message: &str) -> String {
    format!(
        "<Response><Exception>{}</Exception><ExceptionMsg>{}</ExceptionMsg></Response>",
        escape(exception),
        escape(message)
    )
}

fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            c => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(pairs: &[(&str, &str)]) -> Params {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn escape_replaces_markup_characters() {
        assert_eq!(escape("a & <b>"), "a &amp; &lt;b&gt;");
        assert_eq!(escape("plain"), "plain");
    }

    #[test]
    fn parse_filters_splits_entries() {
        assert_eq!(
            parse_filters("Klas=1A;Roepnaam=Anna"),
            Some(vec![
                ("Klas".to_string(), "1A".to_string()),
                ("Roepnaam".to_string(), "Anna".to_string()),
            ])
        );
        assert_eq!(parse_filters(""), Some(Vec::new()));
        assert_eq!(parse_filters("broken"), None);
    }

    #[test]
    fn get_data_rejects_wrong_token() {
        let body = get_data(
            &MockConfig::default(),
            &params(&[("Layout", "Leerlingen"), ("SessionToken", "demo;wrong")]),
        );
        assert!(body.contains("<Result>False</Result>"));
        assert!(body.contains("<Fout_nummer>1</Fout_nummer>"));
    }

    #[test]
    fn get_data_filters_rows() {
        let body = get_data(
            &MockConfig::default(),
            &params(&[
                ("Layout", "Leerlingen"),
                ("SessionToken", "demo;demo"),
                ("Parameters", "Klas=1A"),
            ]),
        );
        assert!(body.contains("<Roepnaam>Anna</Roepnaam>"));
        assert!(body.contains("<Roepnaam>Bram</Roepnaam>"));
        assert!(!body.contains("Chris"));
    }

    #[test]
    fn get_data_rejects_unknown_column() {
        let body = get_data(
            &MockConfig::default(),
            &params(&[
                ("Layout", "Docenten"),
                ("SessionToken", "demo;demo"),
                ("Parameters", "Klas=1A"),
            ]),
        );
        assert!(body.contains("Onbekende kolom"));
    }

    #[test]
    fn success_escapes_values() {
        let body = success("Rows", "Row", &["A"], &[vec!["x & y"]]);
        assert_eq!(
            body,
            "<Response><Result>True</Result><Table><Rows><Row><A>x &amp; y</A></Row></Rows></Table></Response>"
        );
    }
}
