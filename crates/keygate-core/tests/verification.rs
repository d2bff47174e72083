use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use keygate_core::{
    AmbiguityPolicy, AmbiguousCause, ConfirmStep, CredentialPlacement, DialogProps,
    GeminiVerifier, KeyDialog, KeyRules, Locale, RejectReason, ValidationResult,
    VerificationOutcome, VerifierSettings, validate_key,
};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

const GOOD_KEY: &str = "AIzaSyA1234567890abcdefghijklmnopqrs";

/// Minimal provider stand-in: answers every request with a fixed status and
/// records the raw request head.
struct FakeProvider {
    addr: SocketAddr,
    requests: Arc<Mutex<Vec<String>>>,
}

impl FakeProvider {
    async fn start(status: u16) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
        let addr = listener.local_addr().expect("local addr");
        let requests = Arc::new(Mutex::new(Vec::new()));
        let recorded = requests.clone();

        tokio::spawn(async move {
            loop {
                let Ok((mut stream, _)) = listener.accept().await else {
                    break;
                };
                let mut head = Vec::new();
                let mut buffer = [0u8; 1024];
                while !head.windows(4).any(|w| w == b"\r\n\r\n") {
                    match stream.read(&mut buffer).await {
                        Ok(0) | Err(_) => break,
                        Ok(n) => head.extend_from_slice(&buffer[..n]),
                    }
                }
                recorded
                    .lock()
                    .unwrap()
                    .push(String::from_utf8_lossy(&head).to_string());

                let body = if status == 200 {
                    r#"{"models":[]}"#.to_string()
                } else {
                    format!(r#"{{"error":{{"code":{status},"message":"nope","status":"X"}}}}"#)
                };
                let response = format!(
                    "HTTP/1.1 {status} Status\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                    body.len()
                );
                let _ = stream.write_all(response.as_bytes()).await;
                let _ = stream.flush().await;
            }
        });

        Self { addr, requests }
    }

    fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    fn request_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    fn first_request(&self) -> String {
        self.requests.lock().unwrap()[0].clone()
    }

    fn verifier(&self, placement: CredentialPlacement) -> GeminiVerifier {
        GeminiVerifier::new(&VerifierSettings {
            api_base: self.base_url(),
            placement,
            timeout: Some(Duration::from_secs(10)),
        })
        .expect("verifier")
    }
}

#[tokio::test]
async fn ok_status_accepts_trimmed_key() {
    let provider = FakeProvider::start(200).await;
    let verifier = provider.verifier(CredentialPlacement::Query);

    let result = validate_key(
        &format!("  {GOOD_KEY}\n"),
        &KeyRules::default(),
        Some(&verifier),
        AmbiguityPolicy::FailOpen,
    )
    .await;

    assert_eq!(result, ValidationResult::Accepted(GOOD_KEY.to_string()));
    assert_eq!(provider.request_count(), 1);
}

#[tokio::test]
async fn query_placement_carries_key_in_url() {
    let provider = FakeProvider::start(200).await;
    let verifier = provider.verifier(CredentialPlacement::Query);

    assert_eq!(verifier.verify(GOOD_KEY).await, VerificationOutcome::Valid);

    let head = provider.first_request();
    assert!(
        head.starts_with(&format!("GET /v1beta/models?key={GOOD_KEY} HTTP/1.1")),
        "{head}"
    );
    assert!(
        head.to_ascii_lowercase()
            .contains("content-type: application/json"),
        "{head}"
    );
}

#[tokio::test]
async fn header_placement_keeps_key_out_of_url() {
    let provider = FakeProvider::start(200).await;
    let verifier = provider.verifier(CredentialPlacement::Header);

    assert_eq!(verifier.verify(GOOD_KEY).await, VerificationOutcome::Valid);

    let head = provider.first_request();
    assert!(head.starts_with("GET /v1beta/models HTTP/1.1"), "{head}");
    assert!(
        head.to_ascii_lowercase()
            .contains(&format!("x-goog-api-key: {}", GOOD_KEY.to_ascii_lowercase())),
        "{head}"
    );
}

#[tokio::test]
async fn header_placement_rejects_key_that_cannot_be_a_header() {
    let provider = FakeProvider::start(200).await;
    let verifier = provider.verifier(CredentialPlacement::Header);
    let key = format!("AIza{}", "é".repeat(26));

    assert_eq!(verifier.verify(&key).await, VerificationOutcome::Unsendable);
    for policy in [AmbiguityPolicy::FailOpen, AmbiguityPolicy::FailClosed] {
        let result = validate_key(&key, &KeyRules::default(), Some(&verifier), policy).await;
        assert_eq!(result, ValidationResult::Rejected(RejectReason::BadFormat));
    }
    assert_eq!(provider.request_count(), 0);

    // The same key is fine as a query parameter once percent-encoded.
    let query = provider.verifier(CredentialPlacement::Query);
    assert_eq!(query.verify(&key).await, VerificationOutcome::Valid);
    assert_eq!(provider.request_count(), 1);
}

#[tokio::test]
async fn forbidden_and_bad_request_reject() {
    for status in [400, 403] {
        let provider = FakeProvider::start(status).await;
        let verifier = provider.verifier(CredentialPlacement::Query);

        assert_eq!(
            verifier.verify(GOOD_KEY).await,
            VerificationOutcome::Invalid { status }
        );
        let result = validate_key(
            GOOD_KEY,
            &KeyRules::default(),
            Some(&verifier),
            AmbiguityPolicy::FailOpen,
        )
        .await;
        assert_eq!(
            result,
            ValidationResult::Rejected(RejectReason::RemoteRejected)
        );
    }
}

#[tokio::test]
async fn server_error_is_ambiguous_and_fails_open() {
    let provider = FakeProvider::start(500).await;
    let verifier = provider.verifier(CredentialPlacement::Query);

    assert_eq!(
        verifier.verify(GOOD_KEY).await,
        VerificationOutcome::Ambiguous(AmbiguousCause::UnexpectedStatus(500))
    );

    let open = validate_key(
        GOOD_KEY,
        &KeyRules::default(),
        Some(&verifier),
        AmbiguityPolicy::FailOpen,
    )
    .await;
    assert_eq!(open, ValidationResult::Accepted(GOOD_KEY.to_string()));

    let closed = validate_key(
        GOOD_KEY,
        &KeyRules::default(),
        Some(&verifier),
        AmbiguityPolicy::FailClosed,
    )
    .await;
    assert_eq!(closed, ValidationResult::Rejected(RejectReason::Unverified));
}

#[tokio::test]
async fn connection_refused_fails_open() {
    let addr = {
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
        listener.local_addr().expect("local addr")
    };
    let verifier = GeminiVerifier::new(&VerifierSettings {
        api_base: format!("http://{addr}"),
        ..VerifierSettings::default()
    })
    .expect("verifier");

    let outcome = verifier.verify(GOOD_KEY).await;
    match &outcome {
        VerificationOutcome::Ambiguous(AmbiguousCause::Transport(message)) => {
            assert!(!message.contains(GOOD_KEY), "key leaked: {message}");
        }
        other => panic!("expected transport failure, got {other:?}"),
    }

    let result = validate_key(
        GOOD_KEY,
        &KeyRules::default(),
        Some(&verifier),
        AmbiguityPolicy::FailOpen,
    )
    .await;
    assert_eq!(result, ValidationResult::Accepted(GOOD_KEY.to_string()));
}

#[tokio::test]
async fn silent_server_hits_configured_timeout() {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("local addr");
    tokio::spawn(async move {
        let mut held = Vec::new();
        while let Ok((stream, _)) = listener.accept().await {
            held.push(stream);
        }
    });

    let verifier = GeminiVerifier::new(&VerifierSettings {
        api_base: format!("http://{addr}"),
        placement: CredentialPlacement::Query,
        timeout: Some(Duration::from_millis(300)),
    })
    .expect("verifier");

    assert!(matches!(
        verifier.verify(GOOD_KEY).await,
        VerificationOutcome::Ambiguous(AmbiguousCause::Transport(_))
    ));
}

#[tokio::test]
async fn local_rejections_never_reach_the_network() {
    let provider = FakeProvider::start(200).await;
    let verifier = provider.verifier(CredentialPlacement::Query);
    let rules = KeyRules::default();

    let cases = [
        ("", RejectReason::EmptyInput),
        ("   ", RejectReason::EmptyInput),
        ("sk-1234567890abcdefghijklmnopqrstuvwxyz", RejectReason::BadFormat),
        ("AIza123", RejectReason::TooShort),
    ];
    for (input, reason) in cases {
        let result = validate_key(input, &rules, Some(&verifier), AmbiguityPolicy::FailOpen).await;
        assert_eq!(result, ValidationResult::Rejected(reason), "input {input:?}");
    }

    assert_eq!(provider.request_count(), 0);
}

#[tokio::test]
async fn dialog_issues_one_request_per_confirm() {
    let provider = FakeProvider::start(200).await;
    let verifier = provider.verifier(CredentialPlacement::Query);

    let mut dialog = KeyDialog::new(KeyRules::default(), Locale::En);
    dialog.sync(&DialogProps::new(true, format!(" {GOOD_KEY} "), false));

    let ticket = match dialog.request_confirm() {
        ConfirmStep::Verify(ticket) => ticket,
        other => panic!("expected verify ticket, got {other:?}"),
    };
    // A second confirm while the first is outstanding does nothing.
    assert_eq!(dialog.request_confirm(), ConfirmStep::Ignored);

    let outcome = verifier.verify(&ticket.key).await;
    let result = dialog.complete_verification(ticket, &outcome, AmbiguityPolicy::FailOpen);

    assert_eq!(result, Some(ValidationResult::Accepted(GOOD_KEY.to_string())));
    assert_eq!(provider.request_count(), 1);
}
