//! End-to-end calls against the live mock server.
//!
//! # Design
//! Starts the mock server on a random port, then drives `MwsClient` over real
//! HTTP with the ureq transport. The client only accepts `https` base URLs,
//! so the test transport downgrades the scheme to reach the local listener.

use std::net::SocketAddr;
use std::time::Duration;

use mws_core::{
    ArgumentError, ClientError, FailedRequestError, HttpRequest, HttpResponse, InterpretationError,
    MwsClient, Parameters, Transport, TransportError, UreqTransport,
};
use mws_mock_server::MockConfig;

/// Sends the request over plain HTTP to the same host and port.
struct LocalTransport(UreqTransport);

impl Transport for LocalTransport {
    fn get(&self, request: &HttpRequest) -> Result<HttpResponse, TransportError> {
        let mut url = request.url.clone();
        url.set_scheme("http").expect("https to http is a valid scheme change");
        self.0.get(&HttpRequest {
            url,
            timeout: request.timeout,
        })
    }
}

fn start_server() -> SocketAddr {
    let std_listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = std_listener.local_addr().unwrap();
    std_listener.set_nonblocking(true).unwrap();

    std::thread::spawn(move || {
        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();
        rt.block_on(async {
            let listener = tokio::net::TcpListener::from_std(std_listener).unwrap();
            mws_mock_server::run(listener, MockConfig::default()).await
        })
        .unwrap();
    });

    addr
}

fn client(addr: SocketAddr) -> MwsClient<LocalTransport> {
    MwsClient::with_transport(
        &format!("https://{addr}"),
        LocalTransport(UreqTransport::default()),
    )
    .unwrap()
}

#[test]
fn get_data_lifecycle() {
    let addr = start_server();
    let mut client = client(addr);

    // Step 1: a call that needs no credentials.
    let rows = client.call("Algemeen", "Status", &Parameters::new()).unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].get("Omgeving"), Some("mock"));

    // Step 2: get_data refuses to run without credentials.
    let err = client.get_data("Leerlingen", [("Klas", "1A")]).unwrap_err();
    assert!(matches!(err, ClientError::NoCredentials));

    // Step 3: wrong credentials come back as an error table.
    client.set_credentials("demo", "wrong");
    let err = client.get_data("Leerlingen", [("Klas", "1A")]).unwrap_err();
    match &err {
        ClientError::Interpretation(InterpretationError::Unsuccessful { summaries, .. }) => {
            assert_eq!(summaries, "Ongeldige inloggegevens (1)");
        }
        other => panic!("unexpected error: {other:?}"),
    }

    // Step 4: correct credentials, filtered layout.
    client.set_credentials("demo", "demo");
    let rows = client.get_data("Leerlingen", [("Klas", "1A")]).unwrap();
    let names: Vec<_> = rows.iter().filter_map(|r| r.get("Roepnaam")).collect();
    assert_eq!(names, ["Anna", "Bram"]);
    for row in &rows {
        assert_eq!(
            row.column_names().collect::<Vec<_>>(),
            ["Stamnummer", "Roepnaam", "Klas"]
        );
    }

    // Step 5: escaped markup in values is decoded.
    let rows = client.get_data("Leerlingen", [("Klas", "2B")]).unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].get("Roepnaam"), Some("Chris & Co"));

    // Step 6: a filter matching nothing gives an empty table.
    let rows = client.get_data("Leerlingen", [("Klas", "9Z")]).unwrap();
    assert!(rows.is_empty());

    // Step 7: a sequence is not accepted as GetData parameters.
    let err = client.get_data("Leerlingen", vec!["1A"]).unwrap_err();
    assert!(matches!(err, ClientError::Argument(ArgumentError::NotKeyed { .. })));

    // Step 8: clearing credentials brings back the local check.
    client.clear_credentials();
    let err = client.get_data("Docenten", [("Code", "ABC")]).unwrap_err();
    assert!(matches!(err, ClientError::NoCredentials));
}

#[test]
fn remote_failures_are_classified() {
    let addr = start_server();
    let client = client(addr);

    let err = client.call("Nope", "Nothing", &Parameters::new()).unwrap_err();
    match &err {
        ClientError::Interpretation(InterpretationError::RemoteException { exception, message, .. }) => {
            assert_eq!(exception, "Onbekende functie");
            assert_eq!(message, "Nope.Nothing bestaat niet");
        }
        other => panic!("unexpected error: {other:?}"),
    }

    let err = client.call("Debug", "InternalError", &Parameters::new()).unwrap_err();
    assert!(matches!(
        err,
        ClientError::FailedRequest(FailedRequestError::UnexpectedStatus { status: 500, .. })
    ));

    let err = client.call("Debug", "Malformed", &Parameters::new()).unwrap_err();
    assert!(matches!(
        err,
        ClientError::Interpretation(InterpretationError::MalformedXml { .. })
    ));
}

#[test]
fn unreachable_server_is_failed_request() {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let client = client(addr).with_timeout(Duration::from_secs(2));
    let err = client.call("Algemeen", "Status", &Parameters::new()).unwrap_err();
    assert!(matches!(
        err,
        ClientError::FailedRequest(FailedRequestError::Transport(_))
    ));
}

#[test]
fn body_over_limit_is_failed_request() {
    let addr = start_server();
    let transport = LocalTransport(UreqTransport::default().with_body_limit(16));
    let client = MwsClient::with_transport(&format!("https://{addr}"), transport).unwrap();

    let err = client.call("Algemeen", "Status", &Parameters::new()).unwrap_err();
    assert!(matches!(
        err,
        ClientError::FailedRequest(FailedRequestError::Transport(_))
    ));
}
