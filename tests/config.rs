use chrono::NaiveDate;
use mockito::Server;
use sosapi::{Client, Query};
use std::sync::Mutex;

// `set_var` is unsafe in edition 2024; the lock serializes these tests and
// no other test in this binary reads the environment.
static ENV_LOCK: Mutex<()> = Mutex::new(());

fn with_env(vars: &[(&str, Option<&str>)], f: impl FnOnce()) {
    let _guard = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
    let saved: Vec<(String, Option<String>)> = vars
        .iter()
        .map(|(k, _)| (k.to_string(), std::env::var(k).ok()))
        .collect();
    for (k, v) in vars {
        unsafe {
            match v {
                Some(v) => std::env::set_var(k, v),
                None => std::env::remove_var(k),
            }
        }
    }
    f();
    for (k, v) in saved {
        unsafe {
            match v {
                Some(v) => std::env::set_var(&k, v),
                None => std::env::remove_var(&k),
            }
        }
    }
}

fn query() -> Query {
    Query::builder()
        .start_date(NaiveDate::from_ymd_opt(2024, 5, 1).unwrap())
        .end_date(NaiveDate::from_ymd_opt(2024, 5, 31).unwrap())
        .build()
        .unwrap()
}

#[test]
fn explicit_arguments_win_over_environment() {
    let mut server = Server::new();
    let m = server
        .mock("POST", "/Observations/Count")
        .match_header("ocp-apim-subscription-key", "explicit-key")
        .with_body("7")
        .create();
    let url = server.url();

    with_env(
        &[
            // A dead address: only reached if precedence is broken.
            ("SOS_API_URL", Some("http://127.0.0.1:9/")),
            ("SOS_API_KEY", Some("env-key")),
            ("SOS_API_RC", Some("/nonexistent/.sosapirc")),
        ],
        || {
            let client = Client::new(Some(url.clone()), Some("explicit-key".into()), Some(true))
                .unwrap()
                .with_progress(false);
            assert_eq!(client.get_count(&query()).unwrap(), 7);
        },
    );
    m.assert();
}

#[test]
fn environment_supplies_configuration_when_arguments_are_omitted() {
    let mut server = Server::new();
    let m = server
        .mock("POST", "/Observations/Count")
        .match_header("ocp-apim-subscription-key", "env-key")
        .with_body("3")
        .create();
    let url = server.url();

    with_env(
        &[
            ("SOS_API_URL", Some(url.as_str())),
            ("SOS_API_KEY", Some("env-key")),
            ("SOS_API_RC", Some("/nonexistent/.sosapirc")),
        ],
        || {
            let client = Client::from_env().unwrap().with_progress(false);
            assert_eq!(client.get_count(&query()).unwrap(), 3);
        },
    );
    m.assert();
}

#[test]
fn rc_file_supplies_configuration_when_env_is_absent() {
    let mut server = Server::new();
    let m = server
        .mock("POST", "/Observations/Count")
        .match_header("ocp-apim-subscription-key", "rc-key")
        .with_body("1")
        .create();

    let dir = tempfile::tempdir().unwrap();
    let rc = dir.path().join("sosapirc");
    std::fs::write(&rc, format!("url: {}\nkey: rc-key\n", server.url())).unwrap();
    let rc_path = rc.display().to_string();

    with_env(
        &[
            ("SOS_API_URL", None),
            ("SOS_API_KEY", None),
            ("SOS_API_RC", Some(rc_path.as_str())),
        ],
        || {
            let client = Client::from_env().unwrap().with_progress(false);
            assert_eq!(client.get_count(&query()).unwrap(), 1);
        },
    );
    m.assert();
}
